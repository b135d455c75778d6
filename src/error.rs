//! Client-level error types shared by the dispatcher, authenticators, and transports.

mod api;

pub use api::*;

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The API answered with a failure status.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Credentials could not be obtained or refreshed.
	#[error(transparent)]
	Credentials(#[from] CredentialsError),
	/// Transport failure before an HTTP status was known (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// A resolved payload did not match the requested type.
	#[error("Response payload could not be decoded.")]
	Decode {
		/// Structured decoding failure, including the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl Error {
	/// Returns the [`ApiError`] when the failure came from an HTTP status.
	pub fn as_api(&self) -> Option<&ApiError> {
		match self {
			Self::Api(e) => Some(e),
			_ => None,
		}
	}

	/// Returns the HTTP status associated with the failure, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Api(e) => Some(e.status()),
			Self::Credentials(CredentialsError::TokenEndpoint { status, .. }) => *status,
			_ => None,
		}
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// An operation required an authenticator but none is configured.
	#[error("No authenticator is configured.")]
	MissingAuthenticator,
	/// Outbound request could not be built (unparsable URL, invalid header name or value).
	#[error("HTTP request could not be built.")]
	RequestBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// An OAuth endpoint URL cannot be parsed.
	#[error("OAuth endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's request-builder failure inside [`ConfigError`].
	pub fn request_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::RequestBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::request_build(e)
	}
}

/// Failures raised while acquiring or refreshing credentials.
#[derive(Debug, ThisError)]
pub enum CredentialsError {
	/// No refresh token is held, so expired credentials cannot be renewed.
	#[error("Credentials are missing a refresh token.")]
	MissingRefreshToken,
	/// Credentials need a refresh but the authenticator has no refresher configured.
	#[error("Credentials need a refresh but no refresher is configured.")]
	NoRefresher,
	/// The `state` returned by the authorization redirect does not match the session.
	#[error("Authorization state does not match the pending session.")]
	StateMismatch,
	/// Token endpoint rejected the grant (bad code or refresh token).
	#[error("Token endpoint rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or credentials are malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Token endpoint returned an unexpected response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Transport-level failures (network, IO) raised before an HTTP status is known.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the Asana API.")]
	Network {
		/// Transport-specific network error, kept as reported.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the Asana API.")]
	Io(#[from] std::io::Error),
	/// Request body could not be serialized.
	#[error("Request body could not be encoded as JSON.")]
	Encode {
		/// Serialization failure.
		#[source]
		source: serde_json::Error,
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
