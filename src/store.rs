//! Cache store contract and built-in implementations.
//!
//! The broker treats the store as the only shared mutable resource: the component access
//! token, the pre-auth code, and the verify ticket all live there under process-wide keys.
//! Values are plain strings so the webhook collaborator can write the verify ticket without
//! knowing anything about the broker's own encoding.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::_prelude::*;

/// Boxed future returned by [`CacheStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Key/value store with per-key expiry.
pub trait CacheStore
where
	Self: Send + Sync,
{
	/// Fetches the value stored under `key`, returning `None` when absent or expired.
	fn fetch<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

	/// Stores `value` under `key`, replacing any previous value; it expires after `ttl`.
	fn write<'a>(&'a self, key: &'a str, value: String, ttl: Duration) -> StoreFuture<'a, ()>;

	/// Removes `key`, returning `true` when a live value was present.
	fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, bool>;
}

/// Error type produced by [`CacheStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Stored value paired with its absolute expiry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
	/// Stored value.
	pub value: String,
	/// Instant at which the entry stops being visible.
	pub expires_at: OffsetDateTime,
}
impl CacheEntry {
	/// Builds an entry that expires `ttl` after `now`.
	pub fn new(value: String, now: OffsetDateTime, ttl: Duration) -> Self {
		Self { value, expires_at: now + ttl }
	}

	/// Returns `true` while `instant` is before the expiry.
	pub fn is_live_at(&self, instant: OffsetDateTime) -> bool {
		instant < self.expires_at
	}
}
