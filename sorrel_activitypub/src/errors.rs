use serde_json::{Error as DeserializationError};
use thiserror::Error;

use sorrel_federation::fetch::FetchError;
use sorrel_models::database::DatabaseError;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ValidationError(pub &'static str);

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("local object")]
    LocalObject,

    #[error(transparent)]
    FetchError(#[from] FetchError),

    #[error("{0}")]
    ValidationError(String),

    #[error(transparent)]
    DatabaseError(#[from] DatabaseError),

    // 0: activity type
    #[error("activity type is not supported: {0}")]
    UnsupportedActivity(String),
}

impl From<DeserializationError> for HandlerError {
    fn from(error: DeserializationError) -> Self {
        Self::ValidationError(format!("deserialization error: {error}"))
    }
}

impl From<ValidationError> for HandlerError {
    fn from(error: ValidationError) -> Self {
        Self::ValidationError(error.to_string())
    }
}
