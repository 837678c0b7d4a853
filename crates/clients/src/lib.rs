//! REST bindings for the managed cloud services the demos call: image
//! annotation, publish/subscribe messaging, and the strongly-consistent
//! structured store. Each binding sits behind an async trait so handlers
//! and demos can run against test doubles, and each takes its endpoint
//! from configuration so emulators can stand in for the real service.

pub mod auth;
pub mod errors;
pub mod pubsub;
pub mod spanner;
pub mod vision;

pub(crate) fn normalize_endpoint(endpoint: impl Into<String>) -> String {
    endpoint.into().trim_end_matches('/').to_string()
}
