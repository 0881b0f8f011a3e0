//! Shared types for the triage workspace

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
