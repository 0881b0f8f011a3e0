//! Typed endpoint wrappers
//!
//! Each submodule adds `ApiClient` methods for one backend router. All of
//! them go through `ApiClient::send()`, so they share token refresh.

mod auth;
mod dashboard;
mod patients;
mod prescriptions;

pub use prescriptions::PrescriptionImage;
