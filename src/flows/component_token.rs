//! Component access token acquisition with caching + single-flight guards.
//!
//! [`Broker::get_component_access_token`] serves the cached token while it is live and
//! otherwise exchanges the component credentials plus the most recent verify ticket for a new
//! one. A per-key single-flight guard makes concurrent callers on a cold cache share one
//! exchange; the token is cached for its declared lifetime minus the configured safety margin.

// self
use crate::{
	_prelude::*,
	auth::{ComponentAccessToken, Secret},
	dispatch::{Outcome, RequestEnvelope},
	flows::{Broker, common},
	http::{ApiHttpClient, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Token endpoint path.
pub const COMPONENT_TOKEN_PATH: &str = "/cgi-bin/component/api_component_token";
/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::seconds(7200);

#[derive(Deserialize)]
struct ComponentTokenResponse {
	component_access_token: String,
	#[serde(default)]
	expires_in: Option<i64>,
}

impl<C, M> Broker<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Returns a live component access token, fetching a new one when the cache is cold.
	///
	/// # Errors
	///
	/// - [`Error::MissingVerifyTicket`] when no verify ticket has been recorded yet; no request
	///   is sent.
	/// - [`Error::Remote`] when the token endpoint answers without a usable token; nothing is
	///   cached and the payload is carried untouched.
	pub async fn get_component_access_token(&self) -> Result<ComponentAccessToken> {
		const KIND: FlowKind = FlowKind::ComponentToken;

		let span = FlowSpan::new(KIND, "get_component_access_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let key = self.config.cache_keys.component_access_token.as_str();

				if let Some(token) = self.cached_component_token().await? {
					self.metrics.record_cache_hit();

					return Ok(token);
				}

				let guard = common::flow_guard(self, key);
				let _singleflight = guard.lock().await;

				if let Some(token) = self.cached_component_token().await? {
					self.metrics.record_cache_hit();

					return Ok(token);
				}

				self.metrics.record_remote_fetch();

				let (token, ttl) = self.fetch_component_token().await.inspect_err(|_| {
					self.metrics.record_failure();
				})?;

				common::write_cached(self.store.as_ref(), key, &token, ttl).await?;

				Ok(token)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Stores a verify ticket pushed by the platform so the next token exchange can use it.
	pub async fn record_verify_ticket(&self, ticket: impl Into<String>) -> Result<()> {
		let key = &self.config.cache_keys.verify_ticket;

		self.store.write(key, ticket.into(), self.config.verify_ticket_ttl).await?;

		Ok(())
	}

	/// Drops the cached component access token, returning `true` if a live one was present.
	pub async fn invalidate_component_access_token(&self) -> Result<bool> {
		Ok(self.store.delete(&self.config.cache_keys.component_access_token).await?)
	}

	async fn cached_component_token(&self) -> Result<Option<ComponentAccessToken>> {
		common::read_cached(
			self.store.as_ref(),
			&self.config.cache_keys.component_access_token,
			self.clock.now(),
		)
		.await
	}

	async fn fetch_component_token(&self) -> Result<(ComponentAccessToken, Duration)> {
		let ticket = self
			.store
			.fetch(&self.config.cache_keys.verify_ticket)
			.await?
			.filter(|ticket| !ticket.is_empty())
			.ok_or(Error::MissingVerifyTicket)?;
		let envelope = RequestEnvelope::post(COMPONENT_TOKEN_PATH)
			.without_token()
			.field("component_appid", self.config.component_appid.to_string())
			.field("component_appsecret", self.config.component_appsecret.expose())
			.field("component_verify_ticket", ticket);
		let response = self.execute(&envelope, None).await?;
		let margin = self.config.token_safety_margin;
		let now = self.clock.now();
		let outcome = common::typed_outcome(response, |wire: ComponentTokenResponse| {
			let lifetime = match wire.expires_in {
				Some(seconds) => common::positive_seconds(seconds)?,
				None => DEFAULT_TOKEN_LIFETIME,
			};
			let ttl = common::cache_ttl(lifetime, margin);

			(!wire.component_access_token.is_empty()).then(|| {
				let token = ComponentAccessToken {
					value: Secret::new(wire.component_access_token),
					expires_at: now + ttl,
				};

				(token, ttl)
			})
		});

		match outcome {
			Outcome::Success(fetched) => Ok(fetched),
			Outcome::Failure(response) => Err(Error::Remote { response }),
		}
	}
}
