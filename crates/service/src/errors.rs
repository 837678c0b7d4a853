use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("database error: {0}")]
    Db(String),
    #[error("cloud client error: {0}")]
    Client(#[from] clients::errors::ClientError),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}
