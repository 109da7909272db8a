// std
use std::io::ErrorKind;
// crates.io
use oauth2::HttpClientError;
// self
use crate::{
	_prelude::*,
	dispatch::{TransportFailure, TransportFailureKind},
};
#[cfg(feature = "reqwest")] use crate::error::ConfigError;
use crate::error::TransportError;

/// Splits transport failures into the recoverable set and everything else.
///
/// Returning `Ok` turns the failure into an
/// [`ApiResponse::Transport`](crate::dispatch::ApiResponse) value handed back to the caller like
/// any other response; returning `Err` propagates the error out of the dispatcher unchanged.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Classifies an [`HttpClientError`] emitted by the transport.
	fn map_transport_error(&self, error: HttpClientError<E>) -> Result<TransportFailure>;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, err: HttpClientError<ReqwestError>) -> Result<TransportFailure> {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(*inner),
			HttpClientError::Http(inner) => Err(ConfigError::from(inner).into()),
			HttpClientError::Io(inner) => map_io_error(inner),
			other => Err(TransportError::network(other).into()),
		}
	}
}

/// Maps an [`std::io::ErrorKind`] onto the recoverable failure set, if it belongs there.
pub fn classify_io_kind(kind: ErrorKind) -> Option<TransportFailureKind> {
	match kind {
		ErrorKind::TimedOut | ErrorKind::WouldBlock => Some(TransportFailureKind::Timeout),
		ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe =>
			Some(TransportFailureKind::ConnectionReset),
		ErrorKind::ConnectionRefused | ErrorKind::NotConnected | ErrorKind::AddrNotAvailable =>
			Some(TransportFailureKind::Connection),
		ErrorKind::UnexpectedEof => Some(TransportFailureKind::UnexpectedEof),
		ErrorKind::InvalidData => Some(TransportFailureKind::MalformedResponse),
		ErrorKind::InvalidInput => Some(TransportFailureKind::InvalidInput),
		_ => None,
	}
}

/// Recoverable I/O failures become a [`TransportFailure`]; the rest propagate.
pub fn map_io_error(err: std::io::Error) -> Result<TransportFailure> {
	match classify_io_kind(err.kind()) {
		Some(kind) => Ok(TransportFailure::new(kind, error_chain(&err))),
		None => Err(TransportError::Io(err).into()),
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(err: ReqwestError) -> Result<TransportFailure> {
	if err.is_builder() {
		return Err(ConfigError::from(err).into());
	}

	let kind = if err.is_timeout() {
		Some(TransportFailureKind::Timeout)
	} else if let Some(kind) = io_kind_in_chain(&err) {
		Some(kind)
	} else if err.is_connect() {
		Some(TransportFailureKind::Connection)
	} else if err.is_body() || err.is_decode() {
		Some(TransportFailureKind::UnexpectedEof)
	} else if err.is_request() || err.is_redirect() {
		Some(TransportFailureKind::Protocol)
	} else {
		None
	};

	match kind {
		Some(kind) => Ok(TransportFailure::new(kind, error_chain(&err))),
		None => Err(TransportError::from(err).into()),
	}
}

#[cfg(feature = "reqwest")]
fn io_kind_in_chain(err: &(dyn StdError + 'static)) -> Option<TransportFailureKind> {
	let mut current = err.source();

	while let Some(source) = current {
		if let Some(io) = source.downcast_ref::<std::io::Error>() {
			return classify_io_kind(io.kind());
		}

		current = source.source();
	}

	None
}

fn error_chain(err: &dyn StdError) -> String {
	let mut rendered = err.to_string();
	let mut current = err.source();

	while let Some(source) = current {
		rendered.push_str(": ");
		rendered.push_str(&source.to_string());

		current = source.source();
	}

	rendered
}
