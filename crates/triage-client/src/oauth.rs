//! OAuth redirect handling
//!
//! After Google sign-in the backend redirects to the app with the session in
//! the URL fragment: `#access_token=..&refresh_token=..`, or
//! `#error=..&error_description=..` when sign-in failed.

use url::form_urlencoded;

use crate::error::{Error, Result};
use crate::types::AuthTokens;

const DEFAULT_FAILURE: &str = "Authentication failed";

/// Extract the token pair from an OAuth redirect.
///
/// Accepts the bare fragment, the fragment with its leading `#`, or the full
/// redirect URL.
pub fn parse_oauth_fragment(input: &str) -> Result<AuthTokens> {
    let fragment = match input.split_once('#') {
        Some((_, fragment)) => fragment,
        None => input,
    };

    let mut access = None;
    let mut refresh = None;
    let mut token_type = None;
    let mut expires_in = None;
    let mut description = None;
    for (key, value) in form_urlencoded::parse(fragment.as_bytes()) {
        match key.as_ref() {
            "access_token" => access = Some(value.into_owned()),
            "refresh_token" => refresh = Some(value.into_owned()),
            "token_type" => token_type = Some(value.into_owned()),
            "expires_in" => expires_in = value.parse().ok(),
            "error_description" => description = Some(value.into_owned()),
            _ => {}
        }
    }

    match (access, refresh) {
        (Some(access_token), Some(refresh_token))
            if !access_token.is_empty() && !refresh_token.is_empty() =>
        {
            Ok(AuthTokens {
                access_token,
                refresh_token,
                token_type: token_type.unwrap_or_else(|| "bearer".to_string()),
                expires_in,
            })
        }
        _ => Err(Error::OAuthCallback(
            description
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| DEFAULT_FAILURE.to_string()),
        )),
    }
}
