//! `/auth` endpoints

use tracing::info;
use triage_auth::{LOGIN_PATH, REFRESH_PATH, REGISTER_PATH};

use crate::client::ApiClient;
use crate::error::{Error, Result};
use crate::request::ApiRequest;
use crate::types::{
    AuthResponse, AuthTokens, LoginRequest, OAuthUrl, ProfileUpdate, RegisterRequest, UserProfile,
};

const ME_PATH: &str = "/auth/me";
const GOOGLE_OAUTH_PATH: &str = "/auth/oauth/google";

impl ApiClient {
    /// Create an account and start a session with the returned tokens.
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        let response: AuthResponse = self
            .send_json(ApiRequest::post(REGISTER_PATH).json(request)?)
            .await?;
        self.persist(&response.tokens)?;
        info!(user_id = %response.user.id, "registered");
        Ok(response)
    }

    /// Sign in and start a session with the returned tokens.
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse> {
        let response: AuthResponse = self
            .send_json(ApiRequest::post(LOGIN_PATH).json(request)?)
            .await?;
        self.persist(&response.tokens)?;
        info!(user_id = %response.user.id, "logged in");
        Ok(response)
    }

    /// Exchange the stored refresh token for a new pair and store it.
    ///
    /// Explicit counterpart of the automatic renewal in `send()`. A rejected
    /// refresh is returned as `Error::Api` and leaves the store untouched.
    pub async fn refresh_session(&self) -> Result<AuthTokens> {
        let refresh = self
            .store()
            .refresh()
            .ok_or_else(|| Error::Store("no refresh token stored".to_string()))?;
        let body = serde_json::json!({ "refresh_token": refresh });
        let tokens: AuthTokens = self
            .send_json(ApiRequest::post(REFRESH_PATH).json(&body)?)
            .await?;
        self.persist(&tokens)?;
        Ok(tokens)
    }

    /// URL of the Google consent page. The host opens it; the backend
    /// redirects back with the tokens in the URL fragment.
    pub async fn google_oauth_url(&self) -> Result<String> {
        let OAuthUrl { url } = self
            .send_json::<OAuthUrl>(ApiRequest::get(GOOGLE_OAUTH_PATH))
            .await?;
        Ok(url)
    }

    pub async fn current_user(&self) -> Result<UserProfile> {
        self.send_json(ApiRequest::get(ME_PATH)).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        self.send_json(ApiRequest::patch(ME_PATH).json(update)?).await
    }

    /// Forget the session locally. The backend keeps no session to revoke.
    pub fn logout(&self) -> Result<()> {
        self.store().clear().map_err(Error::store)?;
        info!("logged out");
        Ok(())
    }

    /// Whether tokens are stored. Says nothing about their validity.
    pub fn is_authenticated(&self) -> bool {
        self.store().has_session()
    }

    pub(crate) fn persist(&self, tokens: &AuthTokens) -> Result<()> {
        self.store()
            .set(&tokens.access_token, &tokens.refresh_token)
            .map_err(Error::store)
    }
}
