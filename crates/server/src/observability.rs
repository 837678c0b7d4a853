use once_cell::sync::Lazy;
use prometheus::{register_histogram, register_int_counter, Encoder, Histogram, IntCounter, TextEncoder};

// Prometheus metrics (default registry)
pub static ANNOTATE_REQUESTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "gcp_demos_annotate_requests_total",
        "Total image annotation requests served"
    )
    .expect("register annotate_requests_total")
});

pub static PUBLISH_REQUESTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "gcp_demos_publish_requests_total",
        "Total publish requests served"
    )
    .expect("register publish_requests_total")
});

pub static MESSAGES_RECEIVED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "gcp_demos_messages_received_total",
        "Total messages delivered to the subscriber"
    )
    .expect("register messages_received_total")
});

pub static ANNOTATE_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "gcp_demos_annotate_duration_seconds",
        "Image annotation call duration in seconds",
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("register annotate_duration")
});

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}
