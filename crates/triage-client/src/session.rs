//! Session recovery and single-flight token refresh
//!
//! `SessionManager` is the only place that renews tokens. It owns the token
//! store, a raw HTTP client for the refresh call, and the refresh state:
//!
//! - `refreshing`: whether a refresh call is in flight
//! - `waiters`: requests that hit a 401 while it was in flight
//!
//! Both live under one `std::sync::Mutex` that is never held across an
//! `.await`. Checking the flag and enqueueing, or draining the queue and
//! resetting the flag, each happen under a single lock acquisition, so a
//! waiter can never be enqueued after the drain that should have settled it.
//!
//! Transitions per failed request:
//! - idle → refreshing (this request leads; others that arrive now queue)
//! - refreshing → idle on success (store updated, waiters get the new token)
//! - refreshing → idle on failure (store cleared, host notified, waiters get the error)

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use triage_auth::{LOGIN_ROUTE, TokenStore, is_public_auth_route};

use crate::error::{Error, Result};
use crate::metrics;

/// Capability the host registers to learn that the session is over.
///
/// Called after the token store has been cleared, either because no refresh
/// token was stored or because the refresh call failed. The host decides
/// where to navigate.
pub trait SessionExpiredHandler: Send + Sync {
    fn session_expired(&self);
}

/// Handler that ignores session expiry.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl SessionExpiredHandler for NoopHandler {
    fn session_expired(&self) {}
}

/// Tracks the host's current route and moves it to `/login` on expiry.
///
/// A host already showing `/login` or `/register` stays where it is.
#[derive(Debug)]
pub struct LoginRedirect {
    route: Mutex<String>,
}

impl LoginRedirect {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: Mutex::new(route.into()),
        }
    }

    pub fn current_route(&self) -> String {
        self.route
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Record a navigation performed by the host.
    pub fn navigate(&self, route: impl Into<String>) {
        *self.route.lock().unwrap_or_else(PoisonError::into_inner) = route.into();
    }
}

impl SessionExpiredHandler for LoginRedirect {
    fn session_expired(&self) {
        let mut route = self.route.lock().unwrap_or_else(PoisonError::into_inner);
        if is_public_auth_route(&route) {
            debug!(route = %route, "session expired on a public auth route, not redirecting");
            return;
        }
        info!(from = %route, to = LOGIN_ROUTE, "session expired, redirecting to login");
        *route = LOGIN_ROUTE.to_string();
    }
}

type Waiter = oneshot::Sender<Result<String>>;

#[derive(Default)]
struct RefreshState {
    refreshing: bool,
    waiters: Vec<Waiter>,
}

/// Per-client session state: token store, refresh coordination, expiry hook.
pub struct SessionManager {
    store: Arc<dyn TokenStore>,
    http: reqwest::Client,
    base_url: String,
    on_expired: Arc<dyn SessionExpiredHandler>,
    state: Mutex<RefreshState>,
}

impl SessionManager {
    /// `http` must be a plain client: the refresh call bypasses the
    /// interceptors so a 401 from `/auth/refresh` cannot recurse.
    pub fn new(
        store: Arc<dyn TokenStore>,
        http: reqwest::Client,
        base_url: impl Into<String>,
        on_expired: Arc<dyn SessionExpiredHandler>,
    ) -> Self {
        Self {
            store,
            http,
            base_url: base_url.into(),
            on_expired,
            state: Mutex::new(RefreshState::default()),
        }
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Request interceptor: attach the stored access token, if any.
    pub fn authorize(&self, headers: &mut HeaderMap) {
        if let Some(token) = self.store.access() {
            insert_bearer(headers, &token);
        }
    }

    /// Whether a refresh call is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        self.lock_state().refreshing
    }

    /// Number of requests queued behind the in-flight refresh.
    pub fn pending(&self) -> usize {
        self.lock_state().waiters.len()
    }

    /// Recover from a 401 on `unauthorized`'s request.
    ///
    /// Returns the access token to replay with. Exactly one caller runs the
    /// refresh; callers arriving while it is in flight wait for its outcome.
    pub async fn recover(&self, unauthorized: Error) -> Result<String> {
        let queued = {
            let mut state = self.lock_state();
            if state.refreshing {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                debug!(pending = state.waiters.len(), "refresh in flight, queueing request");
                Some(rx)
            } else {
                state.refreshing = true;
                None
            }
        };

        if let Some(rx) = queued {
            return rx.await.unwrap_or(Err(Error::RefreshAbandoned));
        }

        let mut guard = RefreshGuard {
            manager: self,
            settled: false,
        };
        let outcome = self.refresh(unauthorized).await;
        guard.settle(&outcome);
        outcome
    }

    /// Run the refresh call and apply its outcome to the store.
    async fn refresh(&self, unauthorized: Error) -> Result<String> {
        let Some(refresh) = self.store.refresh() else {
            warn!("no refresh token stored, ending session");
            metrics::record_refresh("missing_token");
            self.end_session();
            return Err(unauthorized);
        };

        match triage_auth::refresh_tokens(&self.http, &self.base_url, &refresh).await {
            Ok(tokens) => {
                if let Err(e) = self.store.set(&tokens.access_token, &tokens.refresh_token) {
                    warn!(error = %e, "failed to persist refreshed tokens");
                }
                metrics::record_refresh("success");
                info!("access token refreshed");
                Ok(tokens.access_token)
            }
            Err(e) => {
                warn!(error = %e, "token refresh failed, ending session");
                metrics::record_refresh("failure");
                self.end_session();
                Err(Error::Refresh(e))
            }
        }
    }

    fn end_session(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to clear session tokens");
        }
        metrics::record_session_expired();
        self.on_expired.session_expired();
    }

    fn lock_state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reset the flag and take the queue in one step.
    fn finish(&self) -> Vec<Waiter> {
        let mut state = self.lock_state();
        state.refreshing = false;
        std::mem::take(&mut state.waiters)
    }
}

/// Resets the refresh state when the leading request finishes or is dropped.
struct RefreshGuard<'a> {
    manager: &'a SessionManager,
    settled: bool,
}

impl RefreshGuard<'_> {
    fn settle(&mut self, outcome: &Result<String>) {
        self.settled = true;
        let waiters = self.manager.finish();
        if !waiters.is_empty() {
            debug!(waiters = waiters.len(), ok = outcome.is_ok(), "releasing queued requests");
        }
        for waiter in waiters {
            // A receiver that went away has nothing left to settle
            let _ = waiter.send(outcome.clone());
        }
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        // Dropping the senders wakes every waiter with RefreshAbandoned
        let waiters = self.manager.finish();
        warn!(waiters = waiters.len(), "token refresh abandoned before completing");
    }
}

/// Set `Authorization: Bearer <token>`; tokens that are not valid header values are skipped.
pub(crate) fn insert_bearer(headers: &mut HeaderMap, token: &str) {
    match HeaderValue::from_str(&format!("Bearer {token}")) {
        Ok(mut value) => {
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Err(e) => warn!(error = %e, "skipping access token that is not a valid header value"),
    }
}
