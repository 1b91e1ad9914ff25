//! Dispatcher-level error types shared across construction, refresh, and dispatch.

// self
use crate::_prelude::*;

/// Dispatcher-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical dispatcher error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem raised while building a dispatcher or transport.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Credential acquisition or decoding failed during a refresh attempt.
	#[error(transparent)]
	Credential(#[from] CredentialError),
	/// Transport failure (DNS, TCP, TLS, HTTP status).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The endpoint answered with a GraphQL `errors` array.
	#[error("GraphQL endpoint returned {} error(s).", errors.len())]
	GraphQl {
		/// Raw error objects returned by the endpoint.
		errors: Vec<serde_json::Value>,
	},
	/// The request waited in the waitlist longer than the configured bound.
	#[error("Request waited {waited} for a credential and timed out.")]
	JobTimeout {
		/// How long the request waited before giving up.
		waited: Duration,
	},
	/// The dispatcher has been closed.
	#[error("Transport is closed.")]
	Closed,
}

/// Configuration and validation failures raised by the dispatcher.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// No endpoint was supplied.
	#[error("Endpoint is required.")]
	MissingEndpoint,
	/// The endpoint string cannot be parsed as a URL.
	#[error("Endpoint is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// No credential provider was supplied.
	#[error("Refresh function is required.")]
	MissingProvider,
	/// No transport factory was supplied and no default transport is compiled in.
	#[error("Transport factory is required when the `reqwest` feature is disabled.")]
	MissingTransportFactory,
	/// The caller tried to set a header the dispatcher owns.
	#[error("The \"{header}\" header should not exist.")]
	ReservedHeader {
		/// Reserved header name as supplied by the caller.
		header: String,
	},
	/// A configured header cannot be encoded for the transport.
	#[error("Header `{header}` is invalid.")]
	InvalidHeader {
		/// Header name that failed validation.
		header: String,
	},
	/// Dispatcher timers need a Tokio runtime.
	#[error("A Tokio runtime is required to host refresh timers.")]
	NoRuntime,
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
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

/// Failures raised while acquiring or interpreting a bearer token.
#[derive(Debug, ThisError)]
pub enum CredentialError {
	/// The credential provider failed.
	#[error("Credential provider failed.")]
	Provider {
		/// Provider-specific failure.
		#[source]
		source: BoxError,
	},
	/// The credential provider returned an empty token.
	#[error("Credential provider returned an empty token.")]
	EmptyToken,
	/// The token could not be decoded.
	#[error("Token could not be decoded: {reason}.")]
	Decode {
		/// Human-readable decoding failure.
		reason: String,
	},
	/// The token claims could not be deserialized.
	#[error("Token claims are malformed.")]
	Claims {
		/// Structured parsing failure pointing at the offending claim.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// The token carries no expiry.
	#[error("Token has no expiration time.")]
	MissingExpiry,
}
impl CredentialError {
	/// Wraps a credential provider failure.
	pub fn provider(src: impl Into<BoxError>) -> Self {
		Self::Provider { source: src.into() }
	}

	/// Builds a decode failure with the provided reason.
	pub fn decode(reason: impl Into<String>) -> Self {
		Self::Decode { reason: reason.into() }
	}
}

/// Transport-level failures (network, IO, HTTP status).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The endpoint answered with a non-success HTTP status.
	#[error("Endpoint responded with HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Response body, kept for diagnostics.
		body: String,
	},
	/// The response body is not a GraphQL response document.
	#[error("Endpoint returned a malformed response.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
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
