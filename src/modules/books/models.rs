use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use super::error::BookError;

pub type BookId = i64;

pub const TITLE_MAX_LEN: usize = 255;
pub const AUTHOR_MAX_LEN: usize = 255;
pub const GENRE_MAX_LEN: usize = 100;
pub const ISBN_MAX_LEN: usize = 20;

const REQUIRED_FIELDS_MESSAGE: &str = "Title, author, and genre are required";

/// Row of the `books` table.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct BookRecord {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub isbn: Option<String>,
    pub date_added: OffsetDateTime,
    /// Stored but not part of the public contract
    pub favorite: bool,
}

/// Wire representation of a book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Storage-assigned identifier
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub isbn: Option<String>,
    /// When the book was added, set by storage at creation
    #[serde(with = "time::serde::rfc3339")]
    pub date_added: OffsetDateTime,
}

impl From<BookRecord> for Book {
    fn from(record: BookRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            author: record.author,
            genre: record.genre,
            isbn: record.isbn,
            date_added: record.date_added,
        }
    }
}

/// Request body for creating a book.
///
/// Fields are optional at the wire level so that a missing field is reported as a
/// validation failure rather than a decoding failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateBook {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
}

/// Request body for a partial update. Absent fields are left untouched.
///
/// Every field is `None` when absent and `Some(None)` for an explicit `null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBook {
    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub author: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub genre: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub isbn: Option<Option<String>>,
}

/// A validated book ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub isbn: Option<String>,
}

/// Validated set of column changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub isbn: Option<Option<String>>,
}

impl BookChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.genre.is_none() && self.isbn.is_none()
    }
}

impl CreateBook {
    pub fn validate(self) -> Result<NewBook, BookError> {
        let (Some(title), Some(author), Some(genre)) = (
            non_empty(self.title),
            non_empty(self.author),
            non_empty(self.genre),
        ) else {
            return Err(BookError::Validation(REQUIRED_FIELDS_MESSAGE.to_string()));
        };

        check_len("title", &title, TITLE_MAX_LEN)?;
        check_len("author", &author, AUTHOR_MAX_LEN)?;
        check_len("genre", &genre, GENRE_MAX_LEN)?;
        if let Some(isbn) = &self.isbn {
            check_len("isbn", isbn, ISBN_MAX_LEN)?;
        }

        Ok(NewBook {
            title,
            author,
            genre,
            isbn: self.isbn,
        })
    }
}

impl UpdateBook {
    pub fn validate(self) -> Result<BookChanges, BookError> {
        let title = required_change("title", self.title, TITLE_MAX_LEN)?;
        let author = required_change("author", self.author, AUTHOR_MAX_LEN)?;
        let genre = required_change("genre", self.genre, GENRE_MAX_LEN)?;
        if let Some(Some(isbn)) = &self.isbn {
            check_len("isbn", isbn, ISBN_MAX_LEN)?;
        }

        Ok(BookChanges {
            title,
            author,
            genre,
            isbn: self.isbn,
        })
    }
}

/// A supplied required field must carry a non-empty value; `null` counts as empty.
fn required_change(
    field: &str,
    value: Option<Option<String>>,
    max: usize,
) -> Result<Option<String>, BookError> {
    match value {
        None => Ok(None),
        Some(Some(value)) if !value.is_empty() => {
            check_len(field, &value, max)?;
            Ok(Some(value))
        }
        Some(_) => Err(BookError::Validation(format!("{field} must not be empty"))),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), BookError> {
    if value.chars().count() > max {
        return Err(BookError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
