//! Simple file-backed [`CacheStore`] so cached tokens and the verify ticket survive restarts.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	clock::{Clock, SystemClock},
	store::{CacheEntry, CacheStore, StoreError, StoreFuture},
};

/// Persists cache entries to a JSON file after each mutation.
///
/// The snapshot is loaded once by [`FileStore::open`]; expired entries are dropped on load and
/// whenever the file is rewritten.
#[derive(Clone)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<HashMap<String, CacheEntry>>>,
	clock: Arc<dyn Clock>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		Self::open_with_clock(path, Arc::new(SystemClock))
	}

	/// Same as [`FileStore::open`] but evaluates TTLs against `clock`.
	pub fn open_with_clock(
		path: impl Into<PathBuf>,
		clock: Arc<dyn Clock>,
	) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let now = clock.now();
		let mut snapshot = if path.exists() { Self::load_snapshot(&path)? } else { HashMap::new() };

		snapshot.retain(|_, entry| entry.is_live_at(now));

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)), clock })
	}

	fn load_snapshot(path: &Path) -> Result<HashMap<String, CacheEntry>, StoreError> {
		let metadata = path.metadata().map_err(|e| StoreError::Backend {
			message: format!("Failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(HashMap::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &HashMap<String, CacheEntry>) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(contents).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl Debug for FileStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FileStore")
			.field("path", &self.path)
			.field("entries", &self.inner.read().len())
			.finish()
	}
}
impl CacheStore for FileStore {
	fn fetch<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		Box::pin(async move {
			let now = self.clock.now();

			Ok(self
				.inner
				.read()
				.get(key)
				.filter(|entry| entry.is_live_at(now))
				.map(|entry| entry.value.clone()))
		})
	}

	fn write<'a>(&'a self, key: &'a str, value: String, ttl: Duration) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			if !ttl.is_positive() {
				return Err(StoreError::Backend {
					message: format!("TTL for `{key}` must be positive, got {ttl}"),
				});
			}

			let now = self.clock.now();
			let mut guard = self.inner.write();

			guard.retain(|_, entry| entry.is_live_at(now));
			guard.insert(key.to_owned(), CacheEntry::new(value, now, ttl));
			self.persist_locked(&guard)?;

			Ok(())
		})
	}

	fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, bool> {
		Box::pin(async move {
			let now = self.clock.now();
			let mut guard = self.inner.write();
			let removed = guard.remove(key);

			if removed.is_none() {
				return Ok(false);
			}

			guard.retain(|_, entry| entry.is_live_at(now));
			self.persist_locked(&guard)?;

			Ok(removed.is_some_and(|entry| entry.is_live_at(now)))
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;
	use crate::clock::ManualClock;

	fn temp_path() -> PathBuf {
		let unique = format!(
			"wechat_component_broker_file_store_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	#[test]
	fn entries_survive_reopen_until_they_expire() {
		let path = temp_path();
		let clock = Arc::new(ManualClock::default());
		let store = FileStore::open_with_clock(&path, clock.clone())
			.expect("Failed to open file store snapshot.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.write("wtpp_verify_ticket", "T1".into(), Duration::hours(12)))
			.expect("Failed to write verify ticket to file store.");
		rt.block_on(store.write("wtpp_pre_auth_code", "P1".into(), Duration::minutes(10)))
			.expect("Failed to write pre-auth code to file store.");
		drop(store);

		clock.advance(Duration::minutes(30));

		let reopened = FileStore::open_with_clock(&path, clock.clone())
			.expect("Failed to reopen file store snapshot.");

		assert_eq!(
			rt.block_on(reopened.fetch("wtpp_verify_ticket")).expect("Fetch should succeed."),
			Some("T1".into())
		);
		assert_eq!(
			rt.block_on(reopened.fetch("wtpp_pre_auth_code")).expect("Fetch should succeed."),
			None,
			"Expired entries must be dropped on load."
		);
		assert!(rt.block_on(reopened.delete("wtpp_verify_ticket")).expect("Delete should succeed."));

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}
}
