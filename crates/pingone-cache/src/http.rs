//! Shared HTTP client construction.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::error::{PingOneError, PingOneResult};

/// User agent for every outbound request.
pub const USER_AGENT_VALUE: &str = concat!("pingone-cache/", env!("CARGO_PKG_VERSION"));

/// Default client-side timeout for provider calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn build_client(timeout: Duration) -> PingOneResult<reqwest::Client> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

    reqwest::Client::builder()
        .timeout(timeout)
        .default_headers(default_headers)
        .build()
        .map_err(|e| PingOneError::Transport {
            message: format!("failed to create HTTP client: {e}"),
            timed_out: false,
        })
}

/// Read a response body for diagnostics without failing the caller.
pub(crate) async fn body_text(response: reqwest::Response) -> String {
    let status = response.status();
    response
        .text()
        .await
        .unwrap_or_else(|_| status.to_string())
}
