// crates.io
use uuid::Uuid;
// self
use crate::{
	_prelude::*,
	dispatch::{ApiResponse, RequestEnvelope},
	obs::FlowKind,
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by broker flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("wechat_broker.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits the outbound half of a request/response log pair.
///
/// `url` must not carry the access token; `authenticated` records whether one was attached.
pub(crate) fn log_request(
	request_id: Uuid,
	envelope: &RequestEnvelope,
	url: &Url,
	authenticated: bool,
) {
	#[cfg(feature = "tracing")]
	{
		let body = JsonValue::Object(envelope.redacted_payload());

		tracing::debug!(
			%request_id,
			method = %envelope.method,
			%url,
			authenticated,
			%body,
			headers = ?envelope.redacted_headers(),
			"Dispatching open platform request."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (request_id, envelope, url, authenticated);
	}
}

/// Emits the inbound half of a request/response log pair.
pub(crate) fn log_response(request_id: Uuid, status: Option<u16>, response: &ApiResponse) {
	#[cfg(feature = "tracing")]
	{
		if let Some(failure) = response.transport_failure() {
			tracing::warn!(
				%request_id,
				kind = failure.kind.as_str(),
				detail = %failure.detail,
				"Transport failure returned as response."
			);
		} else {
			tracing::debug!(%request_id, ?status, %response, "Received open platform response.");
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (request_id, status, response);
	}
}

/// Notes a cache entry that no longer decodes; the broker treats it as a miss.
pub(crate) fn log_cache_decode_failure(key: &str, err: &serde_json::Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(key, error = %err, "Ignoring undecodable cache entry.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (key, err);
	}
}
