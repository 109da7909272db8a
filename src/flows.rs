//! Credential flows orchestrated by the broker.
//!
//! The broker owns the HTTP client, cache store, configuration, and clock so individual flows
//! can focus on their exchange: the cached component access token, the cached pre-auth code,
//! and the uncached per-tenant authorization exchanges.

pub mod authorization;
pub mod component_token;
pub mod metrics;
pub mod pre_auth_code;

mod common;

pub use authorization::*;
pub use component_token::*;
pub use metrics::*;
pub use pre_auth_code::*;

// self
use crate::{
	_prelude::*,
	clock::{Clock, SystemClock},
	config::ComponentConfig,
	http::{ApiHttpClient, TransportErrorMapper},
	store::CacheStore,
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Broker specialized for the crate's default reqwest transport stack.
pub type ReqwestBroker = Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Credential and authorization broker for one open platform component.
///
/// Clones share the transport, store, metrics, and single-flight guards, so a cloned broker
/// handed to another task still coalesces concurrent refreshes with the original.
pub struct Broker<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Shared cache holding the component token, pre-auth code, and verify ticket.
	pub store: Arc<dyn CacheStore>,
	/// Validated component settings.
	pub config: Arc<ComponentConfig>,
	/// Time source used for expiry decisions.
	pub clock: Arc<dyn Clock>,
	/// Counters for cached credential lookups.
	pub metrics: Arc<CredentialMetrics>,
	flow_guards: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}
impl<C, M> Broker<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a broker that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		store: Arc<dyn CacheStore>,
		config: ComponentConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			store,
			config: Arc::new(config),
			clock: Arc::new(SystemClock),
			metrics: Default::default(),
			flow_guards: Default::default(),
		}
	}

	/// Replaces the time source.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}
}
#[cfg(feature = "reqwest")]
impl Broker<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a broker with its own reqwest-backed transport.
	pub fn new(store: Arc<dyn CacheStore>, config: ComponentConfig) -> Self {
		Self::with_http_client(
			store,
			config,
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}
impl<C, M> Clone for Broker<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			store: self.store.clone(),
			config: self.config.clone(),
			clock: self.clock.clone(),
			metrics: self.metrics.clone(),
			flow_guards: self.flow_guards.clone(),
		}
	}
}
impl<C, M> Debug for Broker<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("config", &self.config)
			.field("metrics", &self.metrics)
			.finish()
	}
}
