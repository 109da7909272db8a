//! Credential records produced by the broker.
//!
//! [`ComponentAccessToken`] and [`PreAuthCode`] are process-wide and cached by the broker;
//! [`AuthorizerCredentials`] belong to a single tenant and are only ever handed back to the
//! caller, which owns their persistence.

// self
use crate::{
	_prelude::*,
	auth::{AuthorizerAppId, Secret},
};

/// Short-lived bearer credential authenticating component-level API calls.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentAccessToken {
	/// Token value; callers must avoid logging it.
	pub value: Secret,
	/// Instant after which the broker stops handing the token out.
	pub expires_at: OffsetDateTime,
}
impl ComponentAccessToken {
	/// Returns the inner token string.
	pub fn expose(&self) -> &str {
		self.value.expose()
	}

	/// Returns `true` once `instant` reaches the expiry.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}
}
impl Debug for ComponentAccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ComponentAccessToken")
			.field("value", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Code used to start a tenant's authorization flow.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreAuthCode {
	/// Code value.
	pub value: Secret,
	/// Instant after which the cached code is discarded.
	pub expires_at: OffsetDateTime,
}
impl PreAuthCode {
	/// Returns the inner code string.
	pub fn expose(&self) -> &str {
		self.value.expose()
	}

	/// Returns `true` once `instant` reaches the expiry.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}
}
impl Debug for PreAuthCode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PreAuthCode")
			.field("value", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Per-tenant credentials minted by `api_query_auth` or `api_authorizer_token`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizerCredentials {
	/// Tenant app id.
	pub authorizer_appid: AuthorizerAppId,
	/// Access token for calls made on behalf of the tenant.
	pub authorizer_access_token: Secret,
	/// Long-lived refresh token; persist it, it is the only way back in.
	pub authorizer_refresh_token: Secret,
	/// Expiry of `authorizer_access_token`.
	pub expires_at: OffsetDateTime,
}
impl AuthorizerCredentials {
	/// Returns `true` once `instant` reaches the access token expiry.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}
}
impl Debug for AuthorizerCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizerCredentials")
			.field("authorizer_appid", &self.authorizer_appid)
			.field("authorizer_access_token", &"<redacted>")
			.field("authorizer_refresh_token", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Authorization details returned when exchanging an authorization code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationInfo {
	/// Freshly minted tenant credentials.
	pub credentials: AuthorizerCredentials,
	/// Permission-set category ids the tenant granted (`func_info[].funcscope_category.id`).
	pub granted_categories: Vec<u32>,
}
impl AuthorizationInfo {
	/// Returns `true` when the tenant granted the permission-set category `id`.
	pub fn grants(&self, id: u32) -> bool {
		self.granted_categories.contains(&id)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn expiry_is_exclusive_of_the_deadline() {
		let token = ComponentAccessToken {
			value: Secret::new("A1"),
			expires_at: macros::datetime!(2025-01-01 01:55 UTC),
		};

		assert!(!token.is_expired_at(macros::datetime!(2025-01-01 01:54:59 UTC)));
		assert!(token.is_expired_at(macros::datetime!(2025-01-01 01:55 UTC)));
	}

	#[test]
	fn debug_output_redacts_credentials() {
		let credentials = AuthorizerCredentials {
			authorizer_appid: AuthorizerAppId::new("wx-tenant")
				.expect("Authorizer fixture should be valid."),
			authorizer_access_token: Secret::new("access-secret"),
			authorizer_refresh_token: Secret::new("refresh-secret"),
			expires_at: macros::datetime!(2025-01-01 02:00 UTC),
		};
		let rendered = format!("{credentials:?}");

		assert!(!rendered.contains("access-secret"));
		assert!(!rendered.contains("refresh-secret"));
		assert!(rendered.contains("wx-tenant"));
	}

	#[test]
	fn cached_code_round_trips_through_json() {
		let code = PreAuthCode {
			value: Secret::new("preauthcode@@@xyz"),
			expires_at: macros::datetime!(2025-01-01 00:10 UTC),
		};
		let payload = serde_json::to_string(&code).expect("Pre-auth code should serialize.");
		let decoded: PreAuthCode =
			serde_json::from_str(&payload).expect("Pre-auth code should deserialize.");

		assert_eq!(decoded, code);
	}
}
