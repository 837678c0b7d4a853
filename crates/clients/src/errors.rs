use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("api error (code {code}): {message}")]
    Api { code: i32, message: String },
    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// Error/status payload the provider embeds both in non-2xx bodies and in
/// per-item responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RpcStatus {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: RpcStatus,
}

/// Turn a non-2xx response into `ClientError::Api`, preferring the
/// provider's structured error body over the raw text.
pub(crate) async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => Err(ClientError::Api { code: parsed.error.code, message: parsed.error.message }),
        Err(_) => Err(ClientError::Api { code: status.as_u16() as i32, message: body }),
    }
}
