//! Authenticated request pipeline
//!
//! `ApiClient::send()` is the single entry point for backend calls. Status
//! handling:
//! - 2xx: returned to the caller
//! - 401 on a fresh, non-auth request: `SessionManager::recover()`, then one replay
//! - 401 on login/register/refresh, or on a replay: returned as `Error::Api`
//! - anything else: returned as `Error::Api` with the parsed `detail`

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use triage_auth::{DEFAULT_API_URL, TokenStore, is_auth_path};

use crate::error::{Error, Result};
use crate::metrics;
use crate::request::ApiRequest;
use crate::session::{SessionExpiredHandler, SessionManager, insert_bearer};

/// Connection settings for `ApiClient`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL including the `/api` prefix
    pub base_url: String,
    /// Per-attempt timeout applied to every request, including the refresh call
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Cheap to clone; clones share one `SessionManager`.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionManager>,
}

impl ApiClient {
    pub fn new(
        config: ClientConfig,
        store: Arc<dyn TokenStore>,
        on_expired: Arc<dyn SessionExpiredHandler>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Http(format!("building HTTP client: {e}")))?;
        let session = Arc::new(SessionManager::new(
            store,
            http.clone(),
            config.base_url.clone(),
            on_expired,
        ));
        Ok(Self {
            http,
            base_url: config.base_url,
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        self.session.store()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send `request`, recovering once from an expired access token.
    #[instrument(skip_all, fields(request_id = %request.request_id(), method = %request.method(), path = %request.path()))]
    pub async fn send(&self, request: ApiRequest) -> Result<reqwest::Response> {
        let response = self.dispatch(&request, None).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return ensure_success(response).await;
        }

        let unauthorized = Error::from_response(response).await;
        if request.is_retried() || is_auth_path(request.path()) {
            debug!("401 passed through without refresh");
            return Err(unauthorized);
        }

        let replay = request.into_retry();
        let token = self.session.recover(unauthorized).await?;
        debug!("replaying request with refreshed access token");
        let response = self.dispatch(&replay, Some(&token)).await?;
        ensure_success(response).await
    }

    /// Send and decode a JSON response body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| Error::Decode(format!("decoding response body: {e}")))
    }

    /// Send and discard the response body.
    pub async fn send_empty(&self, request: ApiRequest) -> Result<()> {
        self.send(request).await.map(|_| ())
    }

    /// One attempt. `token` overrides the stored access token (used by replays).
    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> Result<reqwest::Response> {
        let mut headers = HeaderMap::new();
        match token {
            Some(token) => insert_bearer(&mut headers, token),
            None => self.session.authorize(&mut headers),
        }

        let response = request
            .build(&self.http, &self.base_url)?
            .headers(headers)
            .send()
            .await?;

        let status = response.status();
        metrics::record_request(request.method().as_str(), status.as_u16());
        debug!(status = status.as_u16(), retried = request.is_retried(), "backend responded");
        Ok(response)
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(Error::from_response(response).await)
    }
}
