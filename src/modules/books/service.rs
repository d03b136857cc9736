use std::sync::Arc;

use super::error::BookError;
use super::models::{Book, BookId, CreateBook, UpdateBook};
use super::repository::BookRepository;

/// Book operations: validation, one storage interaction, wire shaping.
///
/// Holds no state of its own; concurrent updates to the same book are last-write-wins.
#[derive(Clone)]
pub struct BookService {
    repository: Arc<dyn BookRepository>,
}

impl BookService {
    pub fn new(repository: Arc<dyn BookRepository>) -> Self {
        Self { repository }
    }

    pub async fn list_books(&self) -> Result<Vec<Book>, BookError> {
        let records = self.repository.list().await?;
        tracing::debug!(count = records.len(), "listed books");
        Ok(records.into_iter().map(Book::from).collect())
    }

    pub async fn get_book(&self, id: BookId) -> Result<Book, BookError> {
        self.repository
            .get(id)
            .await?
            .map(Book::from)
            .ok_or(BookError::NotFound(id))
    }

    pub async fn create_book(&self, input: CreateBook) -> Result<Book, BookError> {
        let book = input.validate()?;
        let record = self.repository.insert(&book).await?;
        tracing::info!(book_id = record.id, title = %record.title, "book created");
        Ok(record.into())
    }

    pub async fn update_book(&self, id: BookId, input: UpdateBook) -> Result<Book, BookError> {
        let changes = input.validate()?;
        let record = self
            .repository
            .update(id, &changes)
            .await?
            .ok_or(BookError::NotFound(id))?;
        tracing::info!(book_id = id, "book updated");
        Ok(record.into())
    }

    pub async fn delete_book(&self, id: BookId) -> Result<(), BookError> {
        if !self.repository.delete(id).await? {
            return Err(BookError::NotFound(id));
        }
        tracing::info!(book_id = id, "book deleted");
        Ok(())
    }
}
