use thiserror::Error;

use crate::store::StoreError;

/// Observer system errors with structured error types
#[derive(Debug, Error)]
pub enum ObserverError {
    /// One message per violated rule
    #[error("Validation error: {}", .0.join(". "))]
    Validation(Vec<String>),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("System error: {0}")]
    System(String),
}

impl ObserverError {
    pub fn validation(message: impl Into<String>) -> Self {
        ObserverError::Validation(vec![message.into()])
    }
}
