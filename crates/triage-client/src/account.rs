//! Signed-in user state
//!
//! `Account` wraps an `ApiClient` with the user profile hydrated from
//! `/auth/me` and the last user-facing error. Every operation clears the
//! error first and records `error_message()` of its failure.

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::client::ApiClient;
use crate::error::{Result, error_message};
use crate::oauth::parse_oauth_fragment;
use crate::types::{AuthTokens, LoginRequest, ProfileUpdate, RegisterRequest, UserProfile};

#[derive(Default)]
struct AccountState {
    user: Option<UserProfile>,
    error: Option<String>,
}

pub struct Account {
    client: ApiClient,
    state: RwLock<AccountState>,
}

impl Account {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: RwLock::new(AccountState::default()),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Hydrate the user from a stored session, e.g. at start-up.
    ///
    /// Tokens the backend no longer accepts are cleared. Never records an error.
    pub async fn restore(&self) -> Option<UserProfile> {
        if !self.client.is_authenticated() {
            return None;
        }
        match self.client.current_user().await {
            Ok(user) => {
                self.state.write().await.user = Some(user.clone());
                Some(user)
            }
            Err(e) => {
                warn!(error = %e, "stored session rejected, clearing tokens");
                if let Err(e) = self.client.logout() {
                    warn!(error = %e, "failed to clear rejected session");
                }
                None
            }
        }
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<UserProfile> {
        self.clear_error().await;
        let response = self.track(self.client.login(request).await).await?;
        self.set_user(response.user.clone()).await;
        Ok(response.user)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<UserProfile> {
        self.clear_error().await;
        let response = self.track(self.client.register(request).await).await?;
        self.set_user(response.user.clone()).await;
        Ok(response.user)
    }

    /// Drop the user and the stored tokens.
    pub async fn logout(&self) -> Result<()> {
        {
            let mut state = self.state.write().await;
            state.user = None;
            state.error = None;
        }
        self.client.logout()
    }

    pub async fn google_oauth_url(&self) -> Result<String> {
        self.clear_error().await;
        self.track(self.client.google_oauth_url().await).await
    }

    /// Finish an OAuth sign-in from the redirect URL or its fragment.
    pub async fn complete_oauth(&self, redirect: &str) -> Result<UserProfile> {
        self.clear_error().await;
        let tokens = self.track(parse_oauth_fragment(redirect)).await?;
        self.handle_oauth_callback(&tokens).await
    }

    /// Adopt an externally obtained token pair and hydrate the user.
    ///
    /// The tokens are cleared again if `/auth/me` rejects them.
    pub async fn handle_oauth_callback(&self, tokens: &AuthTokens) -> Result<UserProfile> {
        self.clear_error().await;
        self.track(self.client.persist(tokens)).await?;
        match self.client.current_user().await {
            Ok(user) => {
                info!(user_id = %user.id, "signed in via OAuth");
                self.set_user(user.clone()).await;
                Ok(user)
            }
            Err(e) => {
                if let Err(clear) = self.client.logout() {
                    warn!(error = %clear, "failed to clear OAuth tokens");
                }
                self.track(Err(e)).await
            }
        }
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        self.clear_error().await;
        let user = self.track(self.client.update_profile(update).await).await?;
        self.set_user(user.clone()).await;
        Ok(user)
    }

    pub async fn user(&self) -> Option<UserProfile> {
        self.state.read().await.user.clone()
    }

    /// A user is hydrated and the store still holds their tokens.
    ///
    /// Turns false as soon as a failed refresh clears the store.
    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.user.is_some() && self.client.is_authenticated()
    }

    pub fn has_session(&self) -> bool {
        self.client.is_authenticated()
    }

    /// Last error message, suitable for display.
    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }

    async fn set_user(&self, user: UserProfile) {
        self.state.write().await.user = Some(user);
    }

    async fn track<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.state.write().await.error = Some(error_message(e));
        }
        result
    }
}
