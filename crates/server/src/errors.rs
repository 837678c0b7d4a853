use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_GATEWAY, message: message.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, error = %self.message, "request failed");
        }
        (self.status, Json(serde_json::json!({"error": self.message}))).into_response()
    }
}

// Cloud and service failures surface to the HTTP caller as gateway errors.
impl From<clients::errors::ClientError> for ApiError {
    fn from(e: clients::errors::ClientError) -> Self {
        ApiError::bad_gateway(e.to_string())
    }
}

impl From<service::errors::ServiceError> for ApiError {
    fn from(e: service::errors::ServiceError) -> Self {
        ApiError::bad_gateway(e.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::bad_gateway(e.to_string())
    }
}
