use thiserror::Error;

/// Errors from the records client and layout sources.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server answered with a non-success status.
    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Reading a layout file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Request could not be formed.
    #[error("Invalid request: {0}")]
    Invalid(String),
}

impl Error {
    /// HTTP status of a server rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
