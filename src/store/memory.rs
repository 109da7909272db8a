//! Thread-safe in-memory [`CacheStore`] implementation for single-process deployments and tests.

// self
use crate::{
	_prelude::*,
	clock::{Clock, SystemClock},
	store::{CacheEntry, CacheStore, StoreError, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<String, CacheEntry>>>;

/// Thread-safe storage backend that keeps entries in-process.
///
/// Expired entries are invisible to [`CacheStore::fetch`] and are pruned lazily on access.
#[derive(Clone)]
pub struct MemoryStore {
	map: StoreMap,
	clock: Arc<dyn Clock>,
}
impl MemoryStore {
	/// Creates a store that evaluates TTLs against `clock`.
	pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
		Self { map: Default::default(), clock }
	}

	/// Returns the number of live entries.
	pub fn len(&self) -> usize {
		let now = self.clock.now();

		self.map.read().values().filter(|entry| entry.is_live_at(now)).count()
	}

	/// Returns `true` when no live entries remain.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Returns the raw entry (including its expiry) if it is still live.
	pub fn entry(&self, key: &str) -> Option<CacheEntry> {
		let now = self.clock.now();

		self.map.read().get(key).filter(|entry| entry.is_live_at(now)).cloned()
	}

	fn fetch_now(map: &StoreMap, key: &str, now: OffsetDateTime) -> Option<String> {
		{
			let guard = map.read();

			match guard.get(key) {
				Some(entry) if entry.is_live_at(now) => return Some(entry.value.clone()),
				Some(_) => {},
				None => return None,
			}
		}

		let mut guard = map.write();

		if guard.get(key).is_some_and(|entry| !entry.is_live_at(now)) {
			guard.remove(key);
		}

		None
	}

	fn delete_now(map: &StoreMap, key: &str, now: OffsetDateTime) -> bool {
		map.write().remove(key).is_some_and(|entry| entry.is_live_at(now))
	}
}
impl Default for MemoryStore {
	fn default() -> Self {
		Self::with_clock(Arc::new(SystemClock))
	}
}
impl Debug for MemoryStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MemoryStore").field("entries", &self.map.read().len()).finish()
	}
}
impl CacheStore for MemoryStore {
	fn fetch<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		let now = self.clock.now();

		Box::pin(async move { Ok(Self::fetch_now(&self.map, key, now)) })
	}

	fn write<'a>(&'a self, key: &'a str, value: String, ttl: Duration) -> StoreFuture<'a, ()> {
		let now = self.clock.now();

		Box::pin(async move {
			if !ttl.is_positive() {
				return Err(StoreError::Backend {
					message: format!("TTL for `{key}` must be positive, got {ttl}"),
				});
			}

			self.map.write().insert(key.to_owned(), CacheEntry::new(value, now, ttl));

			Ok(())
		})
	}

	fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, bool> {
		let now = self.clock.now();

		Box::pin(async move { Ok(Self::delete_now(&self.map, key, now)) })
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;
	use crate::clock::ManualClock;

	#[test]
	fn entries_expire_with_the_clock() {
		let clock = Arc::new(ManualClock::default());
		let store = MemoryStore::with_clock(clock.clone());
		let rt = Runtime::new().expect("Failed to build Tokio runtime for memory store test.");

		rt.block_on(store.write("wtpp_access_token", "A1".into(), Duration::minutes(115)))
			.expect("Write should succeed.");

		assert_eq!(
			rt.block_on(store.fetch("wtpp_access_token")).expect("Fetch should succeed."),
			Some("A1".into())
		);

		clock.advance(Duration::minutes(115));

		assert_eq!(rt.block_on(store.fetch("wtpp_access_token")).expect("Fetch should succeed."), None);
		assert!(store.is_empty());
		assert!(store.map.read().is_empty(), "Expired entries should be pruned on access.");
	}

	#[test]
	fn delete_reports_live_entries_only() {
		let clock = Arc::new(ManualClock::default());
		let store = MemoryStore::with_clock(clock.clone());
		let rt = Runtime::new().expect("Failed to build Tokio runtime for memory store test.");

		rt.block_on(store.write("a", "1".into(), Duration::seconds(10))).expect("Write a.");
		rt.block_on(store.write("b", "2".into(), Duration::seconds(10))).expect("Write b.");

		assert!(rt.block_on(store.delete("a")).expect("Delete should succeed."));

		clock.advance(Duration::seconds(10));

		assert!(!rt.block_on(store.delete("b")).expect("Delete should succeed."));
		assert!(!rt.block_on(store.delete("missing")).expect("Delete should succeed."));
	}

	#[test]
	fn non_positive_ttl_is_rejected() {
		let store = MemoryStore::default();
		let rt = Runtime::new().expect("Failed to build Tokio runtime for memory store test.");
		let err = rt
			.block_on(store.write("k", "v".into(), Duration::ZERO))
			.expect_err("Zero TTL should be rejected.");

		assert!(matches!(err, StoreError::Backend { .. }));
	}
}
