//! Crate-level error types shared by configuration, transport, and exchange code.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Every variant leaves the previously held token state untouched; callers may retry later.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem (incomplete credentials, malformed endpoint, load failure).
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Token endpoint answered 2xx with a body that is not a usable token response.
	#[error(transparent)]
	Response(#[from] ResponseError),

	/// Client authentication failed or credentials are malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider-supplied reason string.
		reason: String,
		/// HTTP status returned by the token endpoint.
		status: u16,
	},
	/// Token endpoint rejected the grant request itself.
	#[error("Token endpoint rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider-supplied reason string.
		reason: String,
		/// HTTP status returned by the token endpoint.
		status: u16,
	},
	/// Requested scope is not available to this client.
	#[error("Requested scope was refused: {reason}.")]
	InsufficientScope {
		/// Provider-supplied reason string.
		reason: String,
		/// HTTP status returned by the token endpoint.
		status: u16,
	},
}
impl Error {
	/// Returns the HTTP status received from the token endpoint, if the request got that far.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::InvalidClient { status, .. }
			| Self::InvalidGrant { status, .. }
			| Self::InsufficientScope { status, .. } => Some(*status),
			Self::Transient(TransientError::TokenEndpoint { status, .. }) => *status,
			Self::Response(ResponseError::Malformed { status, .. }) => Some(*status),
			_ => None,
		}
	}
}

/// Configuration and validation failures detected before any network I/O.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A field required by the client-credentials grant is empty.
	#[error("OAuth2 credential field `{field}` must not be empty.")]
	IncompleteCredentials {
		/// Configuration key of the first empty field.
		field: &'static str,
	},
	/// Token endpoint URL cannot be parsed.
	#[error("Token endpoint URL `{url}` is invalid.")]
	InvalidTokenEndpoint {
		/// Raw URL as configured.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
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
	/// Thing configuration document could not be deserialized.
	#[error("Thing configuration is invalid.")]
	Load {
		/// Structured parsing failure including the offending key path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
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

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Token endpoint timed out or returned a retryable status.
	#[error("{message}")]
	TokenEndpoint {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
}

/// Failures while reading a successful token endpoint response.
#[derive(Debug, ThisError)]
pub enum ResponseError {
	/// Body is not JSON or lacks `access_token`, `token_type`, or `expires_in`.
	#[error("Token endpoint returned a malformed token response.")]
	Malformed {
		/// Structured parsing failure including the offending key path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// `expires_in` does not fit the supported time range.
	#[error("The expires_in value {value} exceeds the supported range.")]
	ExpiresInOutOfRange {
		/// Raw lifetime in seconds.
		value: u64,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
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
