use std::sync::Arc;

use axum::extract::FromRef;
use clients::pubsub::MessagePublisher;
use clients::vision::ImageAnnotator;

pub type DynAnnotator = Arc<dyn ImageAnnotator>;
pub type DynPublisher = Arc<dyn MessagePublisher>;

/// Shared handler state. The cloud clients are trait objects so tests can
/// swap in doubles without touching the handlers.
#[derive(Clone)]
pub struct ServerState {
    pub annotator: DynAnnotator,
    pub publisher: DynPublisher,
    /// Topic the publish endpoint writes to.
    pub topic: String,
    /// Client for the loopback greeting calls.
    pub http: reqwest::Client,
    /// This service's own base URL, known once the listener is bound.
    pub self_base_url: String,
}

// Lets the analyze handler extract just the annotator, so the standalone
// vision router can reuse it with `DynAnnotator` as its whole state.
impl FromRef<ServerState> for DynAnnotator {
    fn from_ref(state: &ServerState) -> Self {
        state.annotator.clone()
    }
}
