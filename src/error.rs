//! Client-level error types shared across the transport, store, and refresh layers.

// self
use crate::{_prelude::*, http::HttpResponse};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credential storage failure outside of a refresh exchange.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration or request construction problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeouts).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The credential refresh exchange failed; the session has been terminated.
	#[error(transparent)]
	Refresh(#[from] RefreshError),

	/// Server answered with a non-success status that the client did not recover from.
	#[error("Server responded with HTTP {status}.")]
	Status {
		/// Response status code.
		status: StatusCode,
		/// Full response, handed back unchanged.
		response: Box<HttpResponse>,
	},
}
impl Error {
	/// Returns the HTTP status carried by [`Error::Status`] or [`RefreshError::Rejected`].
	pub fn status(&self) -> Option<StatusCode> {
		match self {
			Self::Status { status, .. } => Some(*status),
			Self::Refresh(RefreshError::Rejected { status, .. }) => StatusCode::from_u16(*status).ok(),
			_ => None,
		}
	}

	/// Returns `true` for 401 responses that were surfaced to the caller.
	pub fn is_unauthorized(&self) -> bool {
		matches!(self, Self::Status { status, .. } if *status == StatusCode::UNAUTHORIZED)
	}

	/// Returns the `Retry-After` hint attached to an [`Error::Status`] response, if any.
	pub fn retry_after(&self) -> Option<Duration> {
		match self {
			Self::Status { response, .. } => crate::http::parse_retry_after(response.headers()),
			_ => None,
		}
	}
}

/// Configuration and request construction failures.
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
	/// Request path could not be resolved against the base URL.
	#[error("Request target `{target}` is not a valid URL.")]
	InvalidTarget {
		/// Path or URL supplied by the caller.
		target: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Header value contains bytes that cannot be sent.
	#[error("Header value is invalid.")]
	InvalidHeader(#[from] oauth2::http::header::InvalidHeaderValue),
	/// Request body could not be encoded as JSON.
	#[error("Request body could not be encoded as JSON.")]
	RequestEncode(#[source] serde_json::Error),
	/// Response body could not be decoded into the requested type.
	#[error("Response body could not be decoded.")]
	ResponseDecode(#[from] serde_path_to_error::Error<serde_json::Error>),
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
	#[error("Network error occurred while calling {url}.")]
	Network {
		/// Request URL that failed.
		url: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(url: impl Into<String>, src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { url: url.into(), source: Box::new(src) }
	}
}

/// Failure of the credential refresh exchange.
///
/// One refresh outcome is fanned out to every request waiting on it, so the error is [`Clone`]
/// and carries rendered messages instead of source chains.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RefreshError {
	/// Refresh endpoint answered with a non-success status.
	#[error("Refresh endpoint rejected the session with HTTP {status}.")]
	Rejected {
		/// HTTP status code.
		status: u16,
		/// Response body preview.
		body: String,
	},
	/// Refresh endpoint could not be reached.
	#[error("Refresh endpoint could not be reached: {message}.")]
	Transport {
		/// Rendered transport failure.
		message: String,
	},
	/// Refresh endpoint returned a body that is not a credential pair.
	#[error("Refresh endpoint returned a malformed body: {message}.")]
	MalformedResponse {
		/// Rendered parsing failure.
		message: String,
	},
	/// No refresh token is stored, so the session cannot be renewed.
	#[error("No refresh token is stored.")]
	MissingRefreshToken,
	/// Renewed credentials could not be read or persisted.
	#[error("Credential store failed during refresh: {message}.")]
	Storage {
		/// Rendered store failure.
		message: String,
	},
	/// The task driving the refresh was dropped before the exchange settled.
	#[error("Refresh was abandoned before it settled.")]
	Abandoned,
}
