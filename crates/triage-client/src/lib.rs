//! Authenticated client for the triage backend
//!
//! Every call goes through `ApiClient::send()`, which:
//! 1. Attaches `Authorization: Bearer <access>` from the token store
//! 2. On a 401 from a non-auth endpoint, hands the failure to `SessionManager`
//! 3. `SessionManager` runs a single refresh for all concurrent 401s
//! 4. The request is replayed once with the renewed access token
//! 5. If renewal is impossible the store is cleared and the host's
//!    `SessionExpiredHandler` is told the session is over
//!
//! Typed endpoint wrappers live in `api`, the hydrated user in `account`.

pub mod account;
pub mod api;
pub mod client;
pub mod error;
pub mod metrics;
pub mod oauth;
pub mod request;
pub mod session;
pub mod types;

#[cfg(test)]
mod test_support;

pub use account::Account;
pub use api::PrescriptionImage;
pub use client::{ApiClient, ClientConfig};
pub use error::{Error, Result, error_message};
pub use oauth::parse_oauth_fragment;
pub use request::{ApiRequest, FormPart, RequestBody};
pub use session::{LoginRedirect, NoopHandler, SessionExpiredHandler, SessionManager};
pub use triage_auth::{
    AuthTokens, ErrorDetail, FieldError, FileTokenStore, MemoryTokenStore, TokenStore,
};
