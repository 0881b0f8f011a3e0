//! Client-side metrics
//!
//! Emitted through the `metrics` facade; the host decides whether a recorder
//! is installed. Without one every call is a no-op.
//!
//! - `api_requests_total` (counter): labels `method`, `status`
//! - `api_token_refresh_total` (counter): label `outcome` (`success`, `failure`, `missing_token`)
//! - `api_session_expired_total` (counter)

/// Record one HTTP attempt (the original and its replay count separately).
pub fn record_request(method: &str, status: u16) {
    metrics::counter!(
        "api_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_refresh(outcome: &'static str) {
    metrics::counter!("api_token_refresh_total", "outcome" => outcome).increment(1);
}

pub fn record_session_expired() {
    metrics::counter!("api_session_expired_total").increment(1);
}
