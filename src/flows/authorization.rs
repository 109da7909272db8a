//! Per-tenant authorization exchanges.
//!
//! Neither exchange is cached: the resulting credentials belong to one tenant and the caller
//! owns their persistence. Remote error payloads come back untouched as
//! [`Outcome::Failure`].

// self
use crate::{
	_prelude::*,
	auth::{AuthorizationInfo, AuthorizerAppId, AuthorizerCredentials, Secret},
	dispatch::{Outcome, RequestEnvelope},
	flows::{Broker, common},
	http::{ApiHttpClient, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Authorization code exchange path.
pub const QUERY_AUTH_PATH: &str = "/cgi-bin/component/api_query_auth";
/// Authorizer token refresh path.
pub const AUTHORIZER_TOKEN_PATH: &str = "/cgi-bin/component/api_authorizer_token";

#[derive(Deserialize)]
struct QueryAuthResponse {
	authorization_info: AuthorizationInfoWire,
}

#[derive(Deserialize)]
struct AuthorizationInfoWire {
	authorizer_appid: AuthorizerAppId,
	authorizer_access_token: String,
	expires_in: i64,
	authorizer_refresh_token: String,
	#[serde(default)]
	func_info: Vec<FuncInfoWire>,
}

#[derive(Deserialize)]
struct FuncInfoWire {
	funcscope_category: FuncScopeCategoryWire,
}

#[derive(Deserialize)]
struct FuncScopeCategoryWire {
	id: u32,
}

#[derive(Deserialize)]
struct AuthorizerTokenResponse {
	authorizer_access_token: String,
	expires_in: i64,
	#[serde(default)]
	authorizer_refresh_token: Option<String>,
}

impl<C, M> Broker<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Exchanges the authorization code from the login page callback for tenant credentials.
	pub async fn query_auth(&self, authorization_code: &str) -> Result<Outcome<AuthorizationInfo>> {
		const KIND: FlowKind = FlowKind::QueryAuth;

		let span = FlowSpan::new(KIND, "query_auth");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let envelope = RequestEnvelope::post(QUERY_AUTH_PATH)
					.field("component_appid", self.config.component_appid.to_string())
					.field("authorization_code", authorization_code);
				let response = self.send(envelope).await?;
				let now = self.clock.now();

				Ok(common::typed_outcome(response, |wire: QueryAuthResponse| {
					let info = wire.authorization_info;
					let expires_at = now + common::positive_seconds(info.expires_in)?;

					Some(AuthorizationInfo {
						credentials: AuthorizerCredentials {
							authorizer_appid: info.authorizer_appid,
							authorizer_access_token: Secret::new(info.authorizer_access_token),
							authorizer_refresh_token: Secret::new(info.authorizer_refresh_token),
							expires_at,
						},
						granted_categories: info
							.func_info
							.into_iter()
							.map(|func| func.funcscope_category.id)
							.collect(),
					})
				}))
			})
			.await;

		record_exchange_outcome(KIND, &result);

		result
	}

	/// Mints a fresh authorizer access token from a stored refresh token.
	///
	/// When the response omits a new refresh token, `authorizer_refresh_token` is carried over
	/// into the returned credentials.
	pub async fn refresh_authorizer_access_token(
		&self,
		authorizer_appid: &AuthorizerAppId,
		authorizer_refresh_token: &str,
	) -> Result<Outcome<AuthorizerCredentials>> {
		const KIND: FlowKind = FlowKind::AuthorizerRefresh;

		let span = FlowSpan::new(KIND, "refresh_authorizer_access_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let envelope = RequestEnvelope::post(AUTHORIZER_TOKEN_PATH)
					.field("component_appid", self.config.component_appid.to_string())
					.field("authorizer_appid", authorizer_appid.to_string())
					.field("authorizer_refresh_token", authorizer_refresh_token);
				let response = self.send(envelope).await?;
				let now = self.clock.now();

				Ok(common::typed_outcome(response, |wire: AuthorizerTokenResponse| {
					let expires_at = now + common::positive_seconds(wire.expires_in)?;
					let refresh_token = wire
						.authorizer_refresh_token
						.filter(|token| !token.is_empty())
						.unwrap_or_else(|| authorizer_refresh_token.to_owned());

					Some(AuthorizerCredentials {
						authorizer_appid: authorizer_appid.clone(),
						authorizer_access_token: Secret::new(wire.authorizer_access_token),
						authorizer_refresh_token: Secret::new(refresh_token),
						expires_at,
					})
				}))
			})
			.await;

		record_exchange_outcome(KIND, &result);

		result
	}
}

fn record_exchange_outcome<T>(kind: FlowKind, result: &Result<Outcome<T>>) {
	match result {
		Ok(Outcome::Success(_)) => obs::record_flow_outcome(kind, FlowOutcome::Success),
		_ => obs::record_flow_outcome(kind, FlowOutcome::Failure),
	}
}
