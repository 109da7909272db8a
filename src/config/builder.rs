// std
use std::{net::IpAddr, time::Duration as StdDuration};
// self
use crate::{
	_prelude::*,
	auth::{ComponentAppId, Secret},
	config::{CacheKeys, ComponentConfig, DEFAULT_API_BASE},
};

const MESSAGE_KEY_LEN: usize = 43;

/// Errors raised while constructing or validating component configuration.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ComponentConfigError {
	/// The component app secret was empty.
	#[error("Component app secret cannot be empty.")]
	EmptyAppSecret,
	/// The API base must use HTTPS unless it points at a loopback host.
	#[error("The API base must use HTTPS: {url}.")]
	InsecureApiBase {
		/// URL that failed validation.
		url: String,
	},
	/// The API base cannot carry paths (e.g., `mailto:` or `data:` URLs).
	#[error("The API base cannot be used as a base URL: {url}.")]
	InvalidApiBase {
		/// URL that failed validation.
		url: String,
	},
	/// Redirect URLs must be HTTP(S).
	#[error("The authorization redirect URL must use HTTP or HTTPS: {url}.")]
	InvalidRedirectUrl {
		/// URL that failed validation.
		url: String,
	},
	/// The message encryption key must be exactly 43 characters.
	#[error("Message key must be {expected} characters, got {actual}.")]
	InvalidMessageKeyLength {
		/// Required length.
		expected: usize,
		/// Supplied length.
		actual: usize,
	},
	/// The tenant model name was empty.
	#[error("Tenant model name cannot be empty.")]
	EmptyTenantModel,
	/// Zero timeouts would fail every request.
	#[error("Request timeout must be greater than zero.")]
	ZeroRequestTimeout,
	/// A duration setting was zero or negative.
	#[error("The {setting} setting must be positive.")]
	NonPositiveDuration {
		/// Setting name.
		setting: &'static str,
	},
	/// Cache keys must be non-empty and distinct.
	#[error("Cache keys must be non-empty and distinct.")]
	InvalidCacheKeys,
}

/// Builder for [`ComponentConfig`] values.
#[derive(Debug)]
pub struct ComponentConfigBuilder {
	/// Component app id.
	pub component_appid: ComponentAppId,
	/// Component app secret.
	pub component_appsecret: Secret,
	/// Optional message verification token.
	pub message_token: Option<Secret>,
	/// Optional message encryption key.
	pub message_key: Option<Secret>,
	/// Optional authorization redirect URL.
	pub auth_redirect_url: Option<Url>,
	/// Tenant model name (defaults to `Application`).
	pub tenant_model: String,
	/// Optional API base override.
	pub api_base: Option<Url>,
	/// Per-request timeout (defaults to 5 seconds).
	pub request_timeout: StdDuration,
	/// Token eviction margin (defaults to 5 minutes).
	pub token_safety_margin: Duration,
	/// Pre-auth code reuse window (defaults to 10 minutes).
	pub pre_auth_code_ttl: Duration,
	/// Verify ticket TTL (defaults to 12 hours).
	pub verify_ticket_ttl: Duration,
	/// Cache keys.
	pub cache_keys: CacheKeys,
}
impl ComponentConfigBuilder {
	const DEFAULT_PRE_AUTH_CODE_TTL: Duration = Duration::minutes(10);
	const DEFAULT_REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(5);
	const DEFAULT_TENANT_MODEL: &str = "Application";
	const DEFAULT_TOKEN_SAFETY_MARGIN: Duration = Duration::minutes(5);
	const DEFAULT_VERIFY_TICKET_TTL: Duration = Duration::hours(12);

	/// Creates a new builder seeded with the component credentials.
	pub fn new(component_appid: ComponentAppId, component_appsecret: Secret) -> Self {
		Self {
			component_appid,
			component_appsecret,
			message_token: None,
			message_key: None,
			auth_redirect_url: None,
			tenant_model: Self::DEFAULT_TENANT_MODEL.into(),
			api_base: None,
			request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
			token_safety_margin: Self::DEFAULT_TOKEN_SAFETY_MARGIN,
			pre_auth_code_ttl: Self::DEFAULT_PRE_AUTH_CODE_TTL,
			verify_ticket_ttl: Self::DEFAULT_VERIFY_TICKET_TTL,
			cache_keys: CacheKeys::default(),
		}
	}

	/// Sets the message verification token.
	pub fn message_token(mut self, token: impl Into<Secret>) -> Self {
		self.message_token = Some(token.into());

		self
	}

	/// Sets the message encryption key.
	pub fn message_key(mut self, key: impl Into<Secret>) -> Self {
		self.message_key = Some(key.into());

		self
	}

	/// Sets the default authorization redirect URL.
	pub fn auth_redirect_url(mut self, url: Url) -> Self {
		self.auth_redirect_url = Some(url);

		self
	}

	/// Overrides the tenant model name.
	pub fn tenant_model(mut self, name: impl Into<String>) -> Self {
		self.tenant_model = name.into();

		self
	}

	/// Overrides the API base URL.
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = Some(url);

		self
	}

	/// Overrides the per-request timeout.
	pub fn request_timeout(mut self, timeout: StdDuration) -> Self {
		self.request_timeout = timeout;

		self
	}

	/// Overrides the component token eviction margin.
	pub fn token_safety_margin(mut self, margin: Duration) -> Self {
		self.token_safety_margin = margin;

		self
	}

	/// Overrides the pre-auth code reuse window.
	pub fn pre_auth_code_ttl(mut self, ttl: Duration) -> Self {
		self.pre_auth_code_ttl = ttl;

		self
	}

	/// Overrides the verify ticket TTL.
	pub fn verify_ticket_ttl(mut self, ttl: Duration) -> Self {
		self.verify_ticket_ttl = ttl;

		self
	}

	/// Overrides the cache keys.
	pub fn cache_keys(mut self, keys: CacheKeys) -> Self {
		self.cache_keys = keys;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ComponentConfig, ComponentConfigError> {
		let api_base = match self.api_base {
			Some(url) => url,
			None => Url::parse(DEFAULT_API_BASE).map_err(|_| {
				ComponentConfigError::InvalidApiBase { url: DEFAULT_API_BASE.into() }
			})?,
		};
		let config = ComponentConfig {
			component_appid: self.component_appid,
			component_appsecret: self.component_appsecret,
			message_token: self.message_token,
			message_key: self.message_key,
			auth_redirect_url: self.auth_redirect_url,
			tenant_model: self.tenant_model,
			api_base,
			request_timeout: self.request_timeout,
			token_safety_margin: self.token_safety_margin,
			pre_auth_code_ttl: self.pre_auth_code_ttl,
			verify_ticket_ttl: self.verify_ticket_ttl,
			cache_keys: self.cache_keys,
		};

		config.validate()?;

		Ok(config)
	}
}

impl ComponentConfig {
	fn validate(&self) -> Result<(), ComponentConfigError> {
		if self.component_appsecret.expose().is_empty() {
			return Err(ComponentConfigError::EmptyAppSecret);
		}
		if self.tenant_model.trim().is_empty() {
			return Err(ComponentConfigError::EmptyTenantModel);
		}
		if self.request_timeout.is_zero() {
			return Err(ComponentConfigError::ZeroRequestTimeout);
		}

		validate_positive("token_safety_margin", self.token_safety_margin)?;
		validate_positive("pre_auth_code_ttl", self.pre_auth_code_ttl)?;
		validate_positive("verify_ticket_ttl", self.verify_ticket_ttl)?;
		validate_api_base(&self.api_base)?;

		if let Some(url) = self.auth_redirect_url.as_ref() {
			validate_redirect(url)?;
		}
		if let Some(key) = self.message_key.as_ref() {
			let actual = key.expose().chars().count();

			if actual != MESSAGE_KEY_LEN {
				return Err(ComponentConfigError::InvalidMessageKeyLength {
					expected: MESSAGE_KEY_LEN,
					actual,
				});
			}
		}

		validate_cache_keys(&self.cache_keys)
	}
}

fn validate_positive(setting: &'static str, value: Duration) -> Result<(), ComponentConfigError> {
	if value.is_positive() {
		Ok(())
	} else {
		Err(ComponentConfigError::NonPositiveDuration { setting })
	}
}

fn validate_api_base(url: &Url) -> Result<(), ComponentConfigError> {
	if url.cannot_be_a_base() {
		return Err(ComponentConfigError::InvalidApiBase { url: url.to_string() });
	}

	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		_ => Err(ComponentConfigError::InsecureApiBase { url: url.to_string() }),
	}
}

fn validate_redirect(url: &Url) -> Result<(), ComponentConfigError> {
	if matches!(url.scheme(), "http" | "https") {
		Ok(())
	} else {
		Err(ComponentConfigError::InvalidRedirectUrl { url: url.to_string() })
	}
}

fn validate_cache_keys(keys: &CacheKeys) -> Result<(), ComponentConfigError> {
	let all = [&keys.component_access_token, &keys.pre_auth_code, &keys.verify_ticket];

	if all.iter().any(|key| key.is_empty()) {
		return Err(ComponentConfigError::InvalidCacheKeys);
	}
	if all[0] == all[1] || all[0] == all[2] || all[1] == all[2] {
		return Err(ComponentConfigError::InvalidCacheKeys);
	}

	Ok(())
}

fn is_loopback(url: &Url) -> bool {
	match url.host_str() {
		Some("localhost") => true,
		Some(host) => host
			.trim_start_matches('[')
			.trim_end_matches(']')
			.parse::<IpAddr>()
			.map(|ip| ip.is_loopback())
			.unwrap_or(false),
		None => false,
	}
}
