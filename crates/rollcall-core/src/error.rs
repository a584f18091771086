//! Error types shared across the Rollcall workspace.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RollcallError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// A uniqueness constraint in the store rejected the write.
    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type RollcallResult<T> = Result<T, RollcallError>;
