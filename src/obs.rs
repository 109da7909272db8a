//! Optional observability helpers for broker flows and dispatched calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `wechat_broker.flow` with the `flow` and
//!   `stage` (call site) fields, plus debug events for every request/response pair keyed by a
//!   per-call `request_id`.
//! - Enable `metrics` to increment the `wechat_broker_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Flow kinds observed by the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Component access token acquisition.
	ComponentToken,
	/// Pre-auth code acquisition and login page URLs.
	PreAuthCode,
	/// Authorization code exchange.
	QueryAuth,
	/// Authorizer access token refresh.
	AuthorizerRefresh,
	/// Pass-through facade call.
	Api,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::ComponentToken => "component_token",
			FlowKind::PreAuthCode => "pre_auth_code",
			FlowKind::QueryAuth => "query_auth",
			FlowKind::AuthorizerRefresh => "authorizer_refresh",
			FlowKind::Api => "api",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a broker helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
