//! Shared state for the relay: the upstream base URL and one reqwest pool.

use std::time::Duration;

use anyhow::Context;

/// Environment variable naming the upstream base URL (required).
pub const UPSTREAM_ENV: &str = "EPICHECK_RELAY_UPSTREAM";

/// Cloneable handle shared across all handlers.
#[derive(Clone)]
pub struct RelayState {
    /// Upstream base URL without trailing slash.
    pub upstream: String,
    pub http: reqwest::Client,
}

impl RelayState {
    pub fn new(upstream: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("building relay HTTP client")?;
        Ok(Self {
            upstream: upstream.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let upstream = std::env::var(UPSTREAM_ENV)
            .with_context(|| format!("{UPSTREAM_ENV} must name the intranet base URL"))?;
        Self::new(upstream)
    }
}
