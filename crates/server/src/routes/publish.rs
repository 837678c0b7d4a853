use axum::extract::{Query, State};

use crate::errors::ApiError;
use crate::observability;
use crate::routes::greetings::NameParam;
use crate::state::ServerState;

/// Publish a reservation message for `name` and confirm.
pub async fn publish(
    State(state): State<ServerState>,
    Query(NameParam { name }): Query<NameParam>,
) -> Result<String, ApiError> {
    service::messaging::publish_reservation(state.publisher.as_ref(), &state.topic, &name).await?;
    observability::PUBLISH_REQUESTS_TOTAL.inc();
    Ok("reserved!".to_string())
}
