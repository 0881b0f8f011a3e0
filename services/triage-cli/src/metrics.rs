//! Prometheus rendering of the client counters
//!
//! A one-shot command has no scrape endpoint, so with `--metrics` the
//! recorder is installed up front and its text exposition is written to
//! stderr when the command finishes.

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")
}
