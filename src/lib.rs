//! WeChat open-platform component broker: cached component access tokens, single-flight
//! refreshes, authorizer exchanges, and a uniform response envelope for every third-party
//! platform call.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod flows;
pub mod http;
pub mod obs;
pub mod store;
#[cfg(feature = "reqwest")]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for unit and integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::ComponentAppId,
		clock::{Clock, ManualClock},
		config::{ComponentConfig, ComponentConfigBuilder},
		flows::Broker,
		http::{ReqwestHttpClient, ReqwestTransportErrorMapper},
		store::{CacheStore, MemoryStore},
	};

	/// Broker type alias used by reqwest-backed integration tests.
	pub type ReqwestTestBroker = Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Component app id shared by test fixtures.
	pub const TEST_COMPONENT_APPID: &str = "wx-component-test";
	/// Component app secret shared by test fixtures.
	pub const TEST_COMPONENT_APPSECRET: &str = "component-secret-test";

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Returns a config builder pointed at the provided mock API base URL.
	pub fn test_config_builder(api_base: &str) -> ComponentConfigBuilder {
		let appid = ComponentAppId::new(TEST_COMPONENT_APPID)
			.expect("Test component app id should be valid.");
		let api_base = Url::parse(api_base).expect("Mock API base URL should parse.");

		ComponentConfig::builder(appid, TEST_COMPONENT_APPSECRET).api_base(api_base)
	}

	/// Constructs a [`Broker`] backed by an in-memory store sharing a manual clock with the
	/// broker, plus the reqwest transport used across integration tests.
	pub fn build_reqwest_test_broker(
		config: ComponentConfig,
	) -> (ReqwestTestBroker, Arc<MemoryStore>, Arc<ManualClock>) {
		let clock = Arc::new(ManualClock::default());
		let store_backend = Arc::new(MemoryStore::with_clock(clock.clone()));
		let store: Arc<dyn CacheStore> = store_backend.clone();
		let broker_clock: Arc<dyn Clock> = clock.clone();
		let broker = Broker::with_http_client(
			store,
			config,
			test_reqwest_http_client(),
			Arc::new(ReqwestTransportErrorMapper),
		)
		.with_clock(broker_clock);

		(broker, store_backend, clock)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map as JsonMap, Value as JsonValue};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
