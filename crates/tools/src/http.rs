//! Shared HTTP plumbing for the network-backed tools.

use std::time::Duration;
use threadloop_core::error::ToolError;

/// Build the client every tool uses. Reddit rejects requests without a
/// user agent, so one is always set.
pub(crate) fn client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("threadloop/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_default()
}

/// Send a request and decode a JSON body. Any transport error, non-2xx
/// status, or undecodable body is an `Upstream` error.
pub(crate) async fn send_json(request: reqwest::RequestBuilder) -> Result<serde_json::Value, ToolError> {
    let response = request
        .send()
        .await
        .map_err(|e| ToolError::Upstream(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ToolError::Upstream(format!("HTTP {}: {}", status.as_u16(), body)));
    }

    response
        .json()
        .await
        .map_err(|e| ToolError::Upstream(format!("invalid JSON body: {e}")))
}
