use bookman_http::error::AppError;
use thiserror::Error;

use super::models::BookId;

/// Failures of book operations
#[derive(Error, Debug)]
pub enum BookError {
    #[error("{0}")]
    Validation(String),

    #[error("Book {0} not found")]
    NotFound(BookId),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl From<BookError> for AppError {
    fn from(err: BookError) -> Self {
        match err {
            BookError::Validation(message) => AppError::validation(message),
            BookError::NotFound(_) => AppError::not_found("Book not found"),
            storage @ BookError::Storage(_) => AppError::Internal(anyhow::Error::new(storage)),
        }
    }
}
