//! Token renewal
//!
//! The refresh call goes straight through the raw `reqwest::Client`, never
//! through the API client's request pipeline. A 401 from `/auth/refresh`
//! must surface as a refresh failure, not trigger another refresh.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::REFRESH_PATH;
use crate::detail::ErrorDetail;
use crate::error::{Error, Result};

/// Token pair returned by login, register and refresh.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Seconds until the access token expires, when the backend reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthTokens")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Join the configured base URL and an endpoint path.
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Exchange a refresh token for a new token pair.
///
/// Non-success responses become `Error::Rejected` with the parsed `detail`.
pub async fn refresh_tokens(
    client: &reqwest::Client,
    base_url: &str,
    refresh: &str,
) -> Result<AuthTokens> {
    let url = endpoint_url(base_url, REFRESH_PATH);
    debug!(url = %url, "requesting token refresh");

    let response = client
        .post(&url)
        .json(&RefreshRequest {
            refresh_token: refresh,
        })
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.bytes().await.unwrap_or_default();
        return Err(Error::Rejected {
            status: status.as_u16(),
            detail: ErrorDetail::from_body(&body),
        });
    }

    response
        .json::<AuthTokens>()
        .await
        .map_err(|e| Error::Decode(format!("invalid refresh response: {e}")))
}
