//! Broker-level error types shared across flows, the dispatcher, and stores.

// self
use crate::{_prelude::*, dispatch::ApiResponse};

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
///
/// Only local failures surface here. Remote `errcode`/`errmsg` payloads and the closed set of
/// transport failures are returned as ordinary [`ApiResponse`] values by the dispatcher; the
/// single exception is [`Error::Remote`], raised by operations that must yield a credential.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure outside the recoverable set (unclassified client errors, I/O failures
	/// such as permission denied). DNS and connect failures are recoverable and never land here.
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// No verify ticket has been pushed by the platform yet.
	#[error("Component verify ticket has not been received yet.")]
	MissingVerifyTicket,
	/// The remote API did not yield the credential the broker asked for.
	#[error("Remote API did not return a usable credential: {response}.")]
	Remote {
		/// Untouched response payload (errcode/errmsg, raw body, or transport failure).
		response: ApiResponse,
	},
}
impl Error {
	/// Returns the pass-through payload carried by [`Error::Remote`].
	pub fn remote_response(&self) -> Option<&ApiResponse> {
		match self {
			Self::Remote { response } => Some(response),
			_ => None,
		}
	}
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Request path could not be joined onto the API base URL.
	#[error("Request path `{path}` is invalid.")]
	InvalidPath {
		/// Offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Caller supplied a header name or value that HTTP cannot carry.
	#[error("Header `{name}` is invalid.")]
	InvalidHeader {
		/// Offending header name.
		name: String,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	BodySerialize(#[source] serde_json::Error),
	/// No redirect URL was configured or supplied for the authorization page.
	#[error("An authorization redirect URL is required to build the login page URL.")]
	MissingRedirectUrl,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures that fall outside the recoverable set.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the open platform API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the open platform API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
