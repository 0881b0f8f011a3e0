//! Error types for token storage and renewal

use crate::detail::ErrorDetail;

/// Errors from token storage and the refresh endpoint.
///
/// `Clone` so one refresh failure can be delivered to every request that
/// was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("token refresh rejected ({status}): {detail}")]
    Rejected { status: u16, detail: ErrorDetail },

    #[error("invalid token response: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("token file parse error: {0}")]
    StoreParse(String),
}

impl Error {
    /// Status code returned by the backend, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout(e.to_string())
        } else if e.is_decode() {
            Error::Decode(e.to_string())
        } else {
            Error::Http(e.to_string())
        }
    }
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
