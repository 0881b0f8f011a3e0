//! Session credentials for the triage API
//!
//! Owns everything about the access/refresh token pair that does not depend
//! on the request pipeline: where the pair is stored, how it is renewed, and
//! how the backend's `{"detail": ...}` error bodies are read.
//!
//! Token lifecycle:
//! 1. Login/register/OAuth callback persists a pair via `TokenStore::set()`
//! 2. Every request reads `TokenStore::access()` for its bearer header
//! 3. On a 401, the client calls `token::refresh_tokens()` with `TokenStore::refresh()`
//! 4. The renewed pair replaces the old one via `TokenStore::set()`
//! 5. Logout or a failed refresh calls `TokenStore::clear()`

pub mod constants;
pub mod detail;
pub mod error;
pub mod store;
pub mod token;

pub use constants::*;
pub use detail::{ErrorDetail, FieldError};
pub use error::{Error, Result};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use token::{AuthTokens, endpoint_url, refresh_tokens};
