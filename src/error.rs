//! Crate-level error taxonomy shared across the token flows, the gateway, and the services.

// self
use crate::{_prelude::*, audience::Audience};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
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
	/// Credentials, tickets, or refresh tokens were rejected or are missing.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Upstream response body did not have the expected shape.
	#[error(transparent)]
	MalformedResponse(#[from] MalformedError),

	/// A data endpoint answered with an HTTP error status.
	#[error("Bad credentials: {path} answered with HTTP {status}.")]
	Upstream {
		/// HTTP status code returned by the endpoint.
		status: u16,
		/// Endpoint path relative to the audience base URL.
		path: String,
	},
	/// The requested HTTP method is not supported by the gateway.
	#[error("Bad HTTP method: {method}.")]
	UnsupportedMethod {
		/// Method name that was rejected.
		method: String,
	},
}
impl Error {
	/// Renders the error into the uniform `{ "error": ... }` payload.
	pub fn payload(&self) -> ErrorPayload {
		ErrorPayload::from(self)
	}

	/// Returns `true` when the error stems from rejected or missing credentials.
	pub fn is_auth(&self) -> bool {
		matches!(self, Self::Auth(_) | Self::Upstream { status: 401 | 403, .. })
	}
}

/// Single uniform error shape handed to non-technical callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
	/// Human-readable failure message.
	pub error: String,
}
impl From<&Error> for ErrorPayload {
	fn from(e: &Error) -> Self {
		Self { error: e.to_string() }
	}
}
impl From<Error> for ErrorPayload {
	fn from(e: Error) -> Self {
		Self::from(&e)
	}
}

/// Authentication failures raised by the login and refresh handshakes.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// The login endpoint or a ticket exchange rejected the credentials.
	#[error("Invalid credentials ({stage} answered with HTTP {status}).")]
	InvalidCredentials {
		/// Handshake stage that failed.
		stage: &'static str,
		/// HTTP status code returned by the endpoint.
		status: u16,
	},
	/// No refresh token is stored for the audience.
	#[error("No refresh token is stored for the {audience} audience.")]
	MissingRefreshToken {
		/// Audience whose refresh token is missing.
		audience: Audience,
	},
	/// The refresh endpoint rejected the stored refresh token.
	#[error("Refresh token for the {audience} audience was rejected with HTTP {status}.")]
	RefreshRejected {
		/// Audience whose refresh failed.
		audience: Audience,
		/// HTTP status code returned by the refresh endpoint.
		status: u16,
	},
	/// No account identifier is stored for the connected user.
	#[error("No account identifier is stored for the {audience} audience.")]
	MissingAccountId {
		/// Audience whose account identifier is missing.
		audience: Audience,
	},
}

/// Upstream responses that could not be interpreted.
#[derive(Debug, ThisError)]
pub enum MalformedError {
	/// Response body is not the expected JSON document.
	#[error("{context} returned malformed JSON.")]
	Json {
		/// Endpoint or handshake stage that produced the body.
		context: String,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Response body lacks a required field.
	#[error("{context} response is missing the `{field}` field.")]
	MissingField {
		/// Endpoint or handshake stage that produced the body.
		context: &'static str,
		/// Missing field name.
		field: &'static str,
	},
	/// Access token claims cannot be decoded.
	#[error("Access token claims cannot be decoded: {reason}.")]
	InvalidTokenClaims {
		/// Decoder-supplied reason string.
		reason: String,
	},
	/// Response body is not valid UTF-8.
	#[error("{context} returned a non UTF-8 body.")]
	NotUtf8 {
		/// Endpoint that produced the body.
		context: String,
	},
}

/// Configuration and request-construction failures.
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
	/// Endpoint path cannot be joined to the audience base URL.
	#[error("Path `{path}` cannot be joined to the audience base URL.")]
	InvalidPath {
		/// Offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request parameters cannot be serialized.
	#[error("Request parameters cannot be serialized.")]
	Params(#[source] serde_json::Error),
	/// Configuration failed validation.
	#[error(transparent)]
	Invalid(#[from] crate::config::ConfigBuildError),
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

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {target}.")]
	Network {
		/// Endpoint being called.
		target: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
	/// The HTTP client reported a failure without a typed source.
	#[error("HTTP client error occurred while calling {target}: {message}.")]
	Other {
		/// Endpoint being called.
		target: String,
		/// Client-supplied message.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		target: impl Into<String>,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { target: target.into(), source: Box::new(src) }
	}
}
