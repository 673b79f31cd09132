//! Error type shared by handlers, middleware and the tagging pipeline.

use thiserror::Error;

/// Errors raised while processing a request.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
	/// Options failed validation (unknown key, wrong type).
	#[error("Configuration error: {0}")]
	Configuration(String),

	/// A body could not be serialized.
	#[error("Serialization error: {0}")]
	Serialization(String),

	/// Malformed request or header value.
	#[error("HTTP error: {0}")]
	Http(String),

	/// Handler failure.
	#[error("Internal server error: {0}")]
	Internal(String),
}

impl Error {
	/// HTTP status code reported when this error reaches the client.
	pub fn status_code(&self) -> u16 {
		match self {
			Error::Http(_) => 400,
			Error::Configuration(_) | Error::Serialization(_) | Error::Internal(_) => 500,
		}
	}
}

impl From<serde_json::Error> for Error {
	fn from(error: serde_json::Error) -> Self {
		Error::Serialization(error.to_string())
	}
}

/// Result type alias for request processing.
pub type Result<T> = std::result::Result<T, Error>;
