//! Shared HTTP round trip for the JSON providers

use crate::LlmError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Send `body` with the given request builder and decode the JSON envelope
pub(crate) async fn post_json<B, T>(
    request: reqwest::RequestBuilder,
    body: &B,
    deadline: Duration,
    model: &str,
) -> Result<T, LlmError>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let deadline_ms = deadline.as_millis() as u64;
    let response = request
        .timeout(deadline)
        .json(body)
        .send()
        .await
        .map_err(|e| LlmError::from_transport(e, deadline_ms))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!("Provider returned HTTP {} for model {}", status, model);
        return Err(LlmError::from_status(status.as_u16(), body, model));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| LlmError::from_transport(e, deadline_ms))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))
}

/// Build an HTTP client
pub(crate) fn client() -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .build()
        .map_err(|e| LlmError::Configuration(format!("Failed to build HTTP client: {}", e)))
}
