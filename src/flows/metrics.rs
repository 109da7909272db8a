//! Counters for cached credential lookups.

// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters shared by the component token and pre-auth code flows.
#[derive(Debug, Default)]
pub struct CredentialMetrics {
	cache_hits: AtomicU64,
	remote_fetches: AtomicU64,
	failures: AtomicU64,
}
impl CredentialMetrics {
	/// Returns how many lookups were served from the cache.
	pub fn cache_hits(&self) -> u64 {
		self.cache_hits.load(Ordering::Relaxed)
	}

	/// Returns how many lookups went to the remote endpoint.
	pub fn remote_fetches(&self) -> u64 {
		self.remote_fetches.load(Ordering::Relaxed)
	}

	/// Returns how many remote lookups failed.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_cache_hit(&self) {
		self.cache_hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_remote_fetch(&self) {
		self.remote_fetches.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
