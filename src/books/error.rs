//! Error types for book handlers.

use crate::model::ModelError;

/// Error type for book operations.
#[derive(Debug, thiserror::Error)]
pub enum BookError {
    /// The request body did not decode into a book.
    #[error("invalid request body: {0}")]
    Validation(String),
    /// No book with this id.
    #[error("book not found: {0}")]
    NotFound(String),
    /// The store failed for a reason other than a missing document.
    #[error("storage error: {0}")]
    Storage(#[source] ModelError),
}

impl From<ModelError> for BookError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::NotFound { id, .. } => BookError::NotFound(id),
            other => BookError::Storage(other),
        }
    }
}

impl BookError {
    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            BookError::Validation(_) => 400,
            BookError::NotFound(_) => 404,
            BookError::Storage(_) => 500,
        }
    }
}
