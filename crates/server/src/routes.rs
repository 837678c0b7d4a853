pub mod analyze;
pub mod greetings;
pub mod publish;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};
use tracing::Level;

use common::types::Health;

use crate::observability;
use crate::state::{DynAnnotator, ServerState};

// Uploaded images can exceed axum's 2 MB default body limit.
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn metrics() -> (StatusCode, String) {
    observability::encode_metrics()
}

fn trace_layer() -> TraceLayer<tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>>
{
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
        .on_failure(DefaultOnFailure::new().level(Level::ERROR))
}

/// Build the full demo application router.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/analyze", post(analyze::analyze))
        .route("/publish", get(publish::publish))
        .route("/greeter", get(greetings::greeter))
        .route("/salut/:name", get(greetings::salut))
        .route("/hello", get(greetings::hello))
        .route("/all", get(greetings::all))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
        .layer(cors)
        .layer(trace_layer())
}

/// Router for the standalone image-analysis service: upload and health
/// only, sharing the analyze handler with the full application.
pub fn build_vision_router(annotator: DynAnnotator) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze::analyze))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(annotator)
        .layer(trace_layer())
}
