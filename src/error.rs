//! Error types for seam-rpc.

use thiserror::Error;

/// Main error type for all seam-rpc operations.
#[derive(Debug, Error)]
pub enum SeamError {
    /// Network-level failure: the request never produced a response.
    #[error("failed to send request: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with an unexpected non-success status.
    #[error("request failed with status {status} {reason}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase, if known.
        reason: String,
    },

    /// The handler explicitly rejected the call.
    #[error("{0}")]
    Api(String),

    /// Content type recognized by neither the JSON nor the multipart path.
    #[error("unsupported content type: {0}")]
    UnsupportedEncoding(String),

    /// An attachment path does not resolve against its skeleton.
    ///
    /// This indicates corrupted or hand-crafted wire data; it must never
    /// occur for frames produced by a matching `extract`.
    #[error("attachment path does not resolve: {0}")]
    MalformedPath(String),

    /// Protocol error (missing part, bad part label, wrong envelope shape).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Multipart parse error.
    #[error("multipart error: {0}")]
    Multipart(#[from] multer::Error),
}

/// Result type alias using SeamError.
pub type Result<T> = std::result::Result<T, SeamError>;

/// Error returned by an application handler to reject a call.
///
/// The `Display` form of this error is the canonical stringification that
/// travels back to the caller in the `{"error": …}` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    /// Create a handler error from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The rejection message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}
