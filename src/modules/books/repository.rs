use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::models::{BookChanges, BookId, BookRecord, NewBook};

const SELECT_BOOK: &str =
    "SELECT id, title, author, genre, isbn, date_added, favorite FROM books WHERE id = ?";

/// Persistent storage for book records
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// All records, newest first
    async fn list(&self) -> Result<Vec<BookRecord>, sqlx::Error>;
    async fn get(&self, id: BookId) -> Result<Option<BookRecord>, sqlx::Error>;
    /// Insert a record and return it as stored, with its generated id and `date_added`
    async fn insert(&self, book: &NewBook) -> Result<BookRecord, sqlx::Error>;
    /// Apply `changes` and return the updated record, or `None` if `id` does not exist
    async fn update(
        &self,
        id: BookId,
        changes: &BookChanges,
    ) -> Result<Option<BookRecord>, sqlx::Error>;
    /// Remove a record; returns false if `id` does not exist
    async fn delete(&self, id: BookId) -> Result<bool, sqlx::Error>;
}

/// SQLite-backed repository. Every call checks a connection out of the pool and
/// returns it when the call completes.
#[derive(Clone)]
pub struct SqliteBookRepository {
    pool: SqlitePool,
}

impl SqliteBookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepository for SqliteBookRepository {
    async fn list(&self) -> Result<Vec<BookRecord>, sqlx::Error> {
        sqlx::query_as::<_, BookRecord>(
            "SELECT id, title, author, genre, isbn, date_added, favorite FROM books \
             ORDER BY date_added DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn get(&self, id: BookId) -> Result<Option<BookRecord>, sqlx::Error> {
        sqlx::query_as::<_, BookRecord>(SELECT_BOOK)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn insert(&self, book: &NewBook) -> Result<BookRecord, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;

        let result =
            sqlx::query("INSERT INTO books (title, author, genre, isbn) VALUES (?, ?, ?, ?)")
                .bind(&book.title)
                .bind(&book.author)
                .bind(&book.genre)
                .bind(&book.isbn)
                .execute(&mut *conn)
                .await?;

        sqlx::query_as::<_, BookRecord>(SELECT_BOOK)
            .bind(result.last_insert_rowid())
            .fetch_one(&mut *conn)
            .await
    }

    async fn update(
        &self,
        id: BookId,
        changes: &BookChanges,
    ) -> Result<Option<BookRecord>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;

        if !changes.is_empty() {
            let mut builder = QueryBuilder::<Sqlite>::new("UPDATE books SET ");
            let mut columns = builder.separated(", ");
            if let Some(title) = &changes.title {
                columns.push("title = ");
                columns.push_bind_unseparated(title.clone());
            }
            if let Some(author) = &changes.author {
                columns.push("author = ");
                columns.push_bind_unseparated(author.clone());
            }
            if let Some(genre) = &changes.genre {
                columns.push("genre = ");
                columns.push_bind_unseparated(genre.clone());
            }
            if let Some(isbn) = &changes.isbn {
                columns.push("isbn = ");
                columns.push_bind_unseparated(isbn.clone());
            }
            builder.push(" WHERE id = ");
            builder.push_bind(id);

            let result = builder.build().execute(&mut *conn).await?;
            if result.rows_affected() == 0 {
                return Ok(None);
            }
        }

        sqlx::query_as::<_, BookRecord>(SELECT_BOOK)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    async fn delete(&self, id: BookId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
