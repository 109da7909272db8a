//! Shared helpers for flow implementations (cache codecs, TTL math, single-flight guards).

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::{ComponentAccessToken, PreAuthCode},
	dispatch::{ApiResponse, Outcome},
	flows::Broker,
	http::{ApiHttpClient, TransportErrorMapper},
	obs,
	store::{CacheStore, StoreError},
};

/// Credential the broker caches under a process-wide key.
pub(crate) trait CachedCredential
where
	Self: Serialize + DeserializeOwned,
{
	fn expires_at(&self) -> OffsetDateTime;
}
impl CachedCredential for ComponentAccessToken {
	fn expires_at(&self) -> OffsetDateTime {
		self.expires_at
	}
}
impl CachedCredential for PreAuthCode {
	fn expires_at(&self) -> OffsetDateTime {
		self.expires_at
	}
}

/// Returns (and creates on demand) the single-flight guard for a cache key.
pub(crate) fn flow_guard<C, M>(broker: &Broker<C, M>, key: &str) -> Arc<AsyncMutex<()>>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let mut guards = broker.flow_guards.lock();

	guards.entry(key.to_owned()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
}

/// Reads a cached credential, treating undecodable or expired entries as misses.
pub(crate) async fn read_cached<T>(
	store: &dyn CacheStore,
	key: &str,
	now: OffsetDateTime,
) -> Result<Option<T>>
where
	T: CachedCredential,
{
	let Some(raw) = store.fetch(key).await? else {
		return Ok(None);
	};

	match serde_json::from_str::<T>(&raw) {
		Ok(credential) if now < credential.expires_at() => Ok(Some(credential)),
		Ok(_) => Ok(None),
		Err(e) => {
			obs::log_cache_decode_failure(key, &e);

			Ok(None)
		},
	}
}

/// Writes a credential that the store should drop after `ttl`.
pub(crate) async fn write_cached<T>(
	store: &dyn CacheStore,
	key: &str,
	credential: &T,
	ttl: Duration,
) -> Result<()>
where
	T: CachedCredential,
{
	let raw = serde_json::to_string(credential)
		.map_err(|e| StoreError::Serialization { message: e.to_string() })?;

	store.write(key, raw, ttl).await?;

	Ok(())
}

/// Cache lifetime for a credential the remote declared valid for `expires_in`.
///
/// The result is always strictly shorter than `expires_in`; when `margin` would consume the
/// whole lifetime, half of it is used instead.
pub(crate) fn cache_ttl(expires_in: Duration, margin: Duration) -> Duration {
	if expires_in > margin && margin.is_positive() {
		expires_in - margin
	} else {
		expires_in / 2
	}
}

/// Converts a positive `expires_in` seconds value.
pub(crate) fn positive_seconds(expires_in: i64) -> Option<Duration> {
	(expires_in > 0).then(|| Duration::seconds(expires_in))
}

/// Decodes a successful response into `W` and converts it, keeping the payload on failure.
pub(crate) fn typed_outcome<W, T>(
	response: ApiResponse,
	convert: impl FnOnce(W) -> Option<T>,
) -> Outcome<T>
where
	W: DeserializeOwned,
{
	if !response.is_success() {
		return Outcome::Failure(response);
	}

	match response.decode::<W>().ok().and_then(convert) {
		Some(value) => Outcome::Success(value),
		None => Outcome::Failure(response),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn cache_ttl_is_always_shorter_than_the_declared_lifetime() {
		assert_eq!(cache_ttl(Duration::seconds(7200), Duration::minutes(5)), Duration::minutes(115));
		assert_eq!(cache_ttl(Duration::seconds(240), Duration::minutes(5)), Duration::seconds(120));
		assert_eq!(cache_ttl(Duration::seconds(600), Duration::ZERO), Duration::seconds(300));
	}

	#[test]
	fn positive_seconds_rejects_non_positive_values() {
		assert_eq!(positive_seconds(7200), Some(Duration::seconds(7200)));
		assert_eq!(positive_seconds(0), None);
		assert_eq!(positive_seconds(-1), None);
	}

	#[test]
	fn typed_outcome_keeps_failures_untouched() {
		#[derive(Deserialize)]
		struct Wire {
			pre_auth_code: String,
		}

		let ok = ApiResponse::Json(json!({ "pre_auth_code": "P1", "expires_in": 600 }));
		let remote = ApiResponse::Json(json!({ "errcode": 61007, "errmsg": "api unauthorized" }));
		let shapeless = ApiResponse::Json(json!({ "unexpected": true }));

		assert_eq!(
			typed_outcome(ok, |wire: Wire| Some(wire.pre_auth_code)),
			Outcome::Success("P1".to_owned())
		);
		assert_eq!(
			typed_outcome(remote.clone(), |wire: Wire| Some(wire.pre_auth_code)),
			Outcome::Failure(remote)
		);
		assert_eq!(
			typed_outcome(shapeless.clone(), |wire: Wire| Some(wire.pre_auth_code)),
			Outcome::Failure(shapeless)
		);
	}
}
