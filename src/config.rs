//! Immutable component configuration consumed by the broker.
//!
//! Process-wide component settings live on a single [`ComponentConfig`] value that is
//! validated once by [`ComponentConfigBuilder`] and then shared read-only by every broker
//! clone.

/// Builder API for assembling component configuration.
pub mod builder;

pub use builder::*;

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	auth::{ComponentAppId, Secret},
};

/// Production open platform API base.
pub const DEFAULT_API_BASE: &str = "https://api.weixin.qq.com";

/// Cache keys shared with the webhook collaborator and other processes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheKeys {
	/// Key holding the cached component access token.
	pub component_access_token: String,
	/// Key holding the cached pre-auth code.
	pub pre_auth_code: String,
	/// Key under which the webhook collaborator stores the verify ticket.
	pub verify_ticket: String,
}
impl Default for CacheKeys {
	fn default() -> Self {
		Self {
			component_access_token: "wtpp_access_token".into(),
			pre_auth_code: "wtpp_pre_auth_code".into(),
			verify_ticket: "wtpp_verify_ticket".into(),
		}
	}
}

/// Validated, process-wide component settings.
#[derive(Clone)]
pub struct ComponentConfig {
	/// Component app id.
	pub component_appid: ComponentAppId,
	/// Component app secret.
	pub component_appsecret: Secret,
	/// Message verification token used by the webhook decryption collaborator.
	pub message_token: Option<Secret>,
	/// 43-character message encryption key used by the webhook decryption collaborator.
	pub message_key: Option<Secret>,
	/// Default redirect target for the authorization page.
	pub auth_redirect_url: Option<Url>,
	/// Host-application model name that represents a tenant.
	pub tenant_model: String,
	/// API base URL every request path is joined onto.
	pub api_base: Url,
	/// Per-request timeout.
	pub request_timeout: StdDuration,
	/// How much earlier than the remote lifetime a cached component token is evicted.
	pub token_safety_margin: Duration,
	/// Upper bound on how long a pre-auth code is reused.
	pub pre_auth_code_ttl: Duration,
	/// TTL applied by [`Broker::record_verify_ticket`](crate::flows::Broker::record_verify_ticket).
	pub verify_ticket_ttl: Duration,
	/// Cache keys for the shared store.
	pub cache_keys: CacheKeys,
}
impl ComponentConfig {
	/// Creates a new builder for the provided component credentials.
	pub fn builder(
		component_appid: ComponentAppId,
		component_appsecret: impl Into<Secret>,
	) -> ComponentConfigBuilder {
		ComponentConfigBuilder::new(component_appid, component_appsecret.into())
	}
}
impl Debug for ComponentConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ComponentConfig")
			.field("component_appid", &self.component_appid)
			.field("message_token_set", &self.message_token.is_some())
			.field("message_key_set", &self.message_key.is_some())
			.field("auth_redirect_url", &self.auth_redirect_url)
			.field("tenant_model", &self.tenant_model)
			.field("api_base", &self.api_base)
			.field("request_timeout", &self.request_timeout)
			.field("token_safety_margin", &self.token_safety_margin)
			.field("pre_auth_code_ttl", &self.pre_auth_code_ttl)
			.field("verify_ticket_ttl", &self.verify_ticket_ttl)
			.field("cache_keys", &self.cache_keys)
			.finish()
	}
}
