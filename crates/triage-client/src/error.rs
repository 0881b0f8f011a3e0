//! Client error type and message normalization

use triage_auth::ErrorDetail;

/// Errors returned by `ApiClient` calls.
///
/// `Clone` because a failed refresh is delivered to every request that was
/// queued behind it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("request failed with status code {status}: {detail}")]
    Api { status: u16, detail: ErrorDetail },

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("session refresh failed: {0}")]
    Refresh(triage_auth::Error),

    #[error("session refresh was abandoned before completing")]
    RefreshAbandoned,

    #[error("token store error: {0}")]
    Store(String),

    #[error("OAuth callback failed: {0}")]
    OAuthCallback(String),
}

impl Error {
    /// Build an `Api` error from a non-success response, consuming its body.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.bytes().await.unwrap_or_default();
        Error::Api {
            status,
            detail: ErrorDetail::from_body(&body),
        }
    }

    pub fn store(e: triage_auth::Error) -> Self {
        Error::Store(e.to_string())
    }

    /// HTTP status behind this error, including a rejected refresh.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Refresh(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout(e.to_string())
        } else if e.is_decode() {
            Error::Decode(e.to_string())
        } else if e.is_builder() {
            Error::InvalidRequest(e.to_string())
        } else {
            Error::Http(e.to_string())
        }
    }
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// One human-readable line for display next to a form.
///
/// Prefers the backend's `detail` text; falls back to the status code, then
/// to the error's own description.
pub fn error_message(err: &Error) -> String {
    match err {
        Error::Api { status, detail }
        | Error::Refresh(triage_auth::Error::Rejected { status, detail }) => detail
            .message()
            .unwrap_or_else(|| format!("Request failed with status code {status}")),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_auth::FieldError;

    #[test]
    fn message_prefers_detail_text() {
        let err = Error::Api {
            status: 400,
            detail: ErrorDetail::Message("Email already registered".into()),
        };
        assert_eq!(error_message(&err), "Email already registered");
    }

    #[test]
    fn message_joins_validation_errors() {
        let err = Error::Api {
            status: 422,
            detail: ErrorDetail::Validation(vec![FieldError {
                loc: vec!["body".into(), "age".into()],
                msg: "ensure this value is greater than 0".into(),
                kind: "value_error".into(),
            }]),
        };
        assert_eq!(error_message(&err), "age: ensure this value is greater than 0");
    }

    #[test]
    fn message_falls_back_to_status_code() {
        let err = Error::Api {
            status: 500,
            detail: ErrorDetail::Unknown,
        };
        assert_eq!(error_message(&err), "Request failed with status code 500");
    }

    #[test]
    fn message_reads_rejected_refresh_detail() {
        let err = Error::Refresh(triage_auth::Error::Rejected {
            status: 401,
            detail: ErrorDetail::Message("Refresh token revoked".into()),
        });
        assert_eq!(error_message(&err), "Refresh token revoked");
        assert!(err.is_unauthorized());
    }

    #[test]
    fn message_for_transport_errors_is_display() {
        let err = Error::Http("connection refused".into());
        assert_eq!(error_message(&err), "HTTP request failed: connection refused");
        assert_eq!(err.status(), None);
    }
}
