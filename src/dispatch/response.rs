//! Uniform response envelope returned by every dispatched call.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::_prelude::*;

/// `errcode` carried by synthetic transport failure payloads.
pub const TRANSPORT_ERRCODE: i64 = -1;

/// Closed set of transport failures converted into ordinary responses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportFailureKind {
	/// No response arrived within the configured request timeout.
	Timeout,
	/// The connection could not be established.
	Connection,
	/// The peer reset or aborted an established connection.
	ConnectionReset,
	/// The body ended before the response was complete.
	UnexpectedEof,
	/// The response could not be parsed as HTTP.
	MalformedResponse,
	/// HTTP protocol violation (bad redirect, invalid framing).
	Protocol,
	/// The request was rejected locally before it reached the wire.
	InvalidInput,
}
impl TransportFailureKind {
	/// Stable code rendered into the `errmsg` field of the synthetic payload.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Timeout => "transport_timeout",
			Self::Connection => "connection_error",
			Self::ConnectionReset => "connection_reset",
			Self::UnexpectedEof => "unexpected_eof",
			Self::MalformedResponse => "malformed_response",
			Self::Protocol => "protocol_error",
			Self::InvalidInput => "invalid_input",
		}
	}
}
impl Display for TransportFailureKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Recoverable transport failure handed back in place of a remote payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportFailure {
	/// Failure category.
	pub kind: TransportFailureKind,
	/// Human-readable message from the transport.
	pub detail: String,
}
impl TransportFailure {
	/// Creates a failure of `kind` with the transport's message.
	pub fn new(kind: TransportFailureKind, detail: impl Into<String>) -> Self {
		Self { kind, detail: detail.into() }
	}

	/// Renders the uniform `{"errcode": -1, "errmsg": .., "detail": ..}` payload.
	pub fn payload(&self) -> JsonValue {
		serde_json::json!({
			"errcode": TRANSPORT_ERRCODE,
			"errmsg": self.kind.as_str(),
			"detail": self.detail,
		})
	}
}
impl Display for TransportFailure {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}: {}", self.kind, self.detail)
	}
}

/// Result of a dispatched call.
///
/// Remote errors are not errors here: an `errcode` payload is an ordinary [`ApiResponse::Json`]
/// and callers inspect it with [`ApiResponse::errcode`] or [`ApiResponse::is_success`].
#[derive(Clone, Debug, PartialEq)]
pub enum ApiResponse {
	/// Body parsed as JSON.
	Json(JsonValue),
	/// Body that was not valid JSON, kept verbatim.
	Raw(String),
	/// Recoverable transport failure; no body was received.
	Transport(TransportFailure),
}
impl ApiResponse {
	/// Parses a response body, falling back to [`ApiResponse::Raw`] when it is not JSON.
	pub fn parse(body: &[u8]) -> Self {
		match serde_json::from_slice(body) {
			Ok(value) => Self::Json(value),
			Err(_) => Self::Raw(String::from_utf8_lossy(body).into_owned()),
		}
	}

	/// JSON view of the response: the parsed body, the raw text as a JSON string, or the
	/// synthetic transport payload.
	pub fn payload(&self) -> JsonValue {
		match self {
			Self::Json(value) => value.clone(),
			Self::Raw(text) => JsonValue::String(text.clone()),
			Self::Transport(failure) => failure.payload(),
		}
	}

	/// Looks up a top-level field of a JSON object body.
	pub fn get(&self, key: &str) -> Option<&JsonValue> {
		match self {
			Self::Json(value) => value.get(key),
			_ => None,
		}
	}

	/// Returns the `errcode` field, or [`TRANSPORT_ERRCODE`] for transport failures.
	pub fn errcode(&self) -> Option<i64> {
		match self {
			Self::Json(_) => self.get("errcode").and_then(JsonValue::as_i64),
			Self::Raw(_) => None,
			Self::Transport(_) => Some(TRANSPORT_ERRCODE),
		}
	}

	/// Returns the `errmsg` field, or the failure code for transport failures.
	pub fn errmsg(&self) -> Option<&str> {
		match self {
			Self::Json(_) => self.get("errmsg").and_then(JsonValue::as_str),
			Self::Raw(_) => None,
			Self::Transport(failure) => Some(failure.kind.as_str()),
		}
	}

	/// `true` for a JSON body without a non-zero `errcode`.
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Json(_)) && self.errcode().is_none_or(|code| code == 0)
	}

	/// Returns the transport failure, if this response stands in for one.
	pub fn transport_failure(&self) -> Option<&TransportFailure> {
		match self {
			Self::Transport(failure) => Some(failure),
			_ => None,
		}
	}

	/// Decodes a JSON body into `T`, reporting the failing field path on mismatch.
	pub fn decode<T>(&self) -> Result<T, DecodeError>
	where
		T: DeserializeOwned,
	{
		match self {
			Self::Json(value) => serde_path_to_error::deserialize(value).map_err(DecodeError::Shape),
			_ => Err(DecodeError::NotJson),
		}
	}
}
impl Display for ApiResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Json(value) => write!(f, "{value}"),
			Self::Raw(text) => f.write_str(text),
			Self::Transport(failure) => write!(f, "{}", failure.payload()),
		}
	}
}

/// Failure to decode an [`ApiResponse`] into a typed payload.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// The response carried no JSON body.
	#[error("Response body is not JSON.")]
	NotJson,
	/// The JSON body did not match the expected shape.
	#[error("Response body has an unexpected shape at `{}`.", .0.path())]
	Shape(#[source] serde_path_to_error::Error<serde_json::Error>),
}

/// Typed result of an exchange whose failures are part of the normal contract.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome<T> {
	/// The call produced the expected value.
	Success(T),
	/// The remote (or transport) failure payload, untouched.
	Failure(ApiResponse),
}
impl<T> Outcome<T> {
	/// Returns `true` for [`Outcome::Success`].
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success(_))
	}

	/// Returns the success value, discarding a failure.
	pub fn success(self) -> Option<T> {
		match self {
			Self::Success(value) => Some(value),
			Self::Failure(_) => None,
		}
	}

	/// Returns the failure payload, if any.
	pub fn failure(&self) -> Option<&ApiResponse> {
		match self {
			Self::Success(_) => None,
			Self::Failure(response) => Some(response),
		}
	}

	/// Maps the success value.
	pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
		match self {
			Self::Success(value) => Outcome::Success(f(value)),
			Self::Failure(response) => Outcome::Failure(response),
		}
	}

	/// Converts into a standard [`Result`](std::result::Result).
	pub fn into_result(self) -> std::result::Result<T, ApiResponse> {
		match self {
			Self::Success(value) => Ok(value),
			Self::Failure(response) => Err(response),
		}
	}
}
