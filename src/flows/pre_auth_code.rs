//! Pre-auth code acquisition and the authorization login page URL built from it.
//!
//! The pre-auth code is cached under a single process-wide key, so every tenant starting an
//! authorization within the code's TTL receives the same value.

// self
use crate::{
	_prelude::*,
	auth::{AuthorizerAppId, PreAuthCode, Secret},
	dispatch::{Outcome, RequestEnvelope},
	error::ConfigError,
	flows::{Broker, common},
	http::{ApiHttpClient, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Pre-auth code endpoint path.
pub const PRE_AUTH_CODE_PATH: &str = "/cgi-bin/component/api_create_preauthcode";
/// Desktop (QR code) authorization page.
pub const DESKTOP_LOGIN_PAGE: &str = "https://mp.weixin.qq.com/cgi-bin/componentloginpage";
/// Mobile (in-app) authorization page.
pub const MOBILE_LOGIN_PAGE: &str = "https://open.weixin.qq.com/wxaopen/safe/bindcomponent";

#[derive(Deserialize)]
struct PreAuthCodeResponse {
	pre_auth_code: String,
	#[serde(default)]
	expires_in: Option<i64>,
}

/// Account types a tenant may authorize on the login page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthType {
	/// Official accounts only.
	OfficialAccount,
	/// Mini programs only.
	MiniProgram,
	/// Both official accounts and mini programs.
	#[default]
	All,
}
impl AuthType {
	/// Numeric value sent as `auth_type`.
	pub const fn code(self) -> u8 {
		match self {
			Self::OfficialAccount => 1,
			Self::MiniProgram => 2,
			Self::All => 3,
		}
	}
}

/// Which login page variant to build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoginPage {
	/// QR code page opened in a desktop browser.
	#[default]
	Desktop,
	/// Page opened inside the WeChat client.
	Mobile,
}

/// Parameters for [`Broker::authorization_url`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthorizationRequest {
	/// Account types offered to the tenant.
	pub auth_type: AuthType,
	/// Page variant.
	pub page: LoginPage,
	/// Redirect URL overriding the configured one.
	pub redirect_url: Option<Url>,
	/// Restricts authorization to this account.
	pub biz_appid: Option<AuthorizerAppId>,
}
impl AuthorizationRequest {
	/// Sets the account types offered to the tenant.
	pub fn auth_type(mut self, auth_type: AuthType) -> Self {
		self.auth_type = auth_type;

		self
	}

	/// Sets the page variant.
	pub fn page(mut self, page: LoginPage) -> Self {
		self.page = page;

		self
	}

	/// Overrides the configured redirect URL.
	pub fn redirect_url(mut self, url: Url) -> Self {
		self.redirect_url = Some(url);

		self
	}

	/// Restricts authorization to one account.
	pub fn biz_appid(mut self, appid: AuthorizerAppId) -> Self {
		self.biz_appid = Some(appid);

		self
	}
}

impl<C, M> Broker<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Returns the cached pre-auth code, requesting a new one when the cache is cold.
	///
	/// Fails with [`Error::Remote`] when the endpoint answers without a code, and with
	/// [`Error::MissingVerifyTicket`] when no component token can be obtained for lack of a
	/// ticket.
	pub async fn create_pre_auth_code(&self) -> Result<PreAuthCode> {
		const KIND: FlowKind = FlowKind::PreAuthCode;

		let span = FlowSpan::new(KIND, "create_pre_auth_code");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let key = self.config.cache_keys.pre_auth_code.as_str();

				if let Some(code) = self.cached_pre_auth_code().await? {
					self.metrics.record_cache_hit();

					return Ok(code);
				}

				let guard = common::flow_guard(self, key);
				let _singleflight = guard.lock().await;

				if let Some(code) = self.cached_pre_auth_code().await? {
					self.metrics.record_cache_hit();

					return Ok(code);
				}

				self.metrics.record_remote_fetch();

				let (code, ttl) = self.fetch_pre_auth_code().await.inspect_err(|_| {
					self.metrics.record_failure();
				})?;

				common::write_cached(self.store.as_ref(), key, &code, ttl).await?;

				Ok(code)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Builds the login page URL a tenant administrator opens to authorize the component.
	///
	/// The redirect URL is checked before any network traffic so a misconfigured broker fails
	/// with [`ConfigError::MissingRedirectUrl`] without spending a pre-auth code.
	pub async fn authorization_url(&self, request: AuthorizationRequest) -> Result<Url> {
		let redirect_url = request
			.redirect_url
			.as_ref()
			.or(self.config.auth_redirect_url.as_ref())
			.cloned()
			.ok_or(ConfigError::MissingRedirectUrl)?;
		let code = self.create_pre_auth_code().await?;

		login_page_url(&self.config.component_appid, &code, &redirect_url, &request)
	}

	async fn cached_pre_auth_code(&self) -> Result<Option<PreAuthCode>> {
		common::read_cached(
			self.store.as_ref(),
			&self.config.cache_keys.pre_auth_code,
			self.clock.now(),
		)
		.await
	}

	async fn fetch_pre_auth_code(&self) -> Result<(PreAuthCode, Duration)> {
		let envelope = RequestEnvelope::post(PRE_AUTH_CODE_PATH)
			.field("component_appid", self.config.component_appid.to_string());
		let response = self.send(envelope).await?;
		let max_ttl = self.config.pre_auth_code_ttl;
		let now = self.clock.now();
		let outcome = common::typed_outcome(response, |wire: PreAuthCodeResponse| {
			let ttl = match wire.expires_in {
				Some(seconds) => common::positive_seconds(seconds)?.min(max_ttl),
				None => max_ttl,
			};

			(!wire.pre_auth_code.is_empty()).then(|| {
				let code =
					PreAuthCode { value: Secret::new(wire.pre_auth_code), expires_at: now + ttl };

				(code, ttl)
			})
		});

		match outcome {
			Outcome::Success(fetched) => Ok(fetched),
			Outcome::Failure(response) => Err(Error::Remote { response }),
		}
	}
}

fn login_page_url(
	component_appid: &impl Display,
	code: &PreAuthCode,
	redirect_url: &Url,
	request: &AuthorizationRequest,
) -> Result<Url> {
	let base = match request.page {
		LoginPage::Desktop => DESKTOP_LOGIN_PAGE,
		LoginPage::Mobile => MOBILE_LOGIN_PAGE,
	};
	let mut url = Url::parse(base)
		.map_err(|source| ConfigError::InvalidPath { path: base.to_owned(), source })?;

	{
		let mut query = url.query_pairs_mut();

		if request.page == LoginPage::Mobile {
			query.append_pair("action", "bindcomponent").append_pair("no_scan", "1");
		}

		query
			.append_pair("component_appid", &component_appid.to_string())
			.append_pair("pre_auth_code", code.expose())
			.append_pair("redirect_uri", redirect_url.as_str())
			.append_pair("auth_type", &request.auth_type.code().to_string());

		if let Some(biz_appid) = &request.biz_appid {
			query.append_pair("biz_appid", biz_appid.as_str());
		}
	}

	if request.page == LoginPage::Mobile {
		url.set_fragment(Some("wechat_redirect"));
	}

	Ok(url)
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn code() -> PreAuthCode {
		PreAuthCode {
			value: Secret::new("preauthcode@@@P1"),
			expires_at: macros::datetime!(2025-01-01 00:10 UTC),
		}
	}

	fn redirect() -> Url {
		Url::parse("https://example.com/wechat/callback?tenant=7")
			.expect("Redirect fixture should parse.")
	}

	#[test]
	fn desktop_url_carries_every_parameter() {
		let request = AuthorizationRequest::default().auth_type(AuthType::MiniProgram);
		let url = login_page_url(&"wx-component", &code(), &redirect(), &request)
			.expect("Desktop login URL should build.");
		let pairs = url.query_pairs().into_owned().collect::<BTreeMap<_, _>>();

		assert!(url.as_str().starts_with(DESKTOP_LOGIN_PAGE));
		assert_eq!(pairs.get("component_appid").map(String::as_str), Some("wx-component"));
		assert_eq!(pairs.get("pre_auth_code").map(String::as_str), Some("preauthcode@@@P1"));
		assert_eq!(
			pairs.get("redirect_uri").map(String::as_str),
			Some("https://example.com/wechat/callback?tenant=7")
		);
		assert_eq!(pairs.get("auth_type").map(String::as_str), Some("2"));
		assert!(!pairs.contains_key("biz_appid"));
		assert_eq!(url.fragment(), None);
	}

	#[test]
	fn mobile_url_uses_bindcomponent_with_fragment() {
		let biz = AuthorizerAppId::new("wx-tenant").expect("Tenant fixture should be valid.");
		let request = AuthorizationRequest::default().page(LoginPage::Mobile).biz_appid(biz);
		let url = login_page_url(&"wx-component", &code(), &redirect(), &request)
			.expect("Mobile login URL should build.");
		let pairs = url.query_pairs().into_owned().collect::<BTreeMap<_, _>>();

		assert!(url.as_str().starts_with(MOBILE_LOGIN_PAGE));
		assert_eq!(pairs.get("action").map(String::as_str), Some("bindcomponent"));
		assert_eq!(pairs.get("no_scan").map(String::as_str), Some("1"));
		assert_eq!(pairs.get("auth_type").map(String::as_str), Some("3"));
		assert_eq!(pairs.get("biz_appid").map(String::as_str), Some("wx-tenant"));
		assert_eq!(url.fragment(), Some("wechat_redirect"));
	}
}
