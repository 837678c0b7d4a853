use models::reservation;
use sea_orm::{DatabaseConnection, EntityTrait};
use tracing::info;

use crate::errors::ServiceError;

pub async fn list_reservations(
    db: &DatabaseConnection,
) -> Result<Vec<reservation::Model>, ServiceError> {
    reservation::Entity::find()
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

/// Startup demo: select every reservation and log it.
pub async fn log_reservations(db: &DatabaseConnection) -> Result<usize, ServiceError> {
    let rows = list_reservations(db).await?;
    for r in &rows {
        info!(id = r.id, name = %r.name, "reservation");
    }
    Ok(rows.len())
}
