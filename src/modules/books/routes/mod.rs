//! HTTP handlers for `/books`.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use bookman_http::error::AppError;
use serde::Serialize;

use super::models::{Book, BookId, CreateBook, UpdateBook};
use super::service::BookService;

/// Confirmation returned by a successful delete
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: &'static str,
}

pub fn router(service: BookService) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{id}",
            get(get_book)
                .put(update_book)
                .patch(update_book)
                .delete(delete_book),
        )
        .with_state(service)
}

/// Ids that are not integers name no book.
fn book_id(path: Result<Path<BookId>, PathRejection>) -> Result<BookId, AppError> {
    path.map(|Path(id)| id)
        .map_err(|_| AppError::not_found("Book not found"))
}

async fn list_books(State(service): State<BookService>) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(service.list_books().await?))
}

async fn get_book(
    State(service): State<BookService>,
    path: Result<Path<BookId>, PathRejection>,
) -> Result<Json<Book>, AppError> {
    let id = book_id(path)?;
    Ok(Json(service.get_book(id).await?))
}

async fn create_book(
    State(service): State<BookService>,
    payload: Result<Json<CreateBook>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let Json(input) = payload?;
    let book = service.create_book(input).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn update_book(
    State(service): State<BookService>,
    path: Result<Path<BookId>, PathRejection>,
    payload: Result<Json<UpdateBook>, JsonRejection>,
) -> Result<Json<Book>, AppError> {
    let id = book_id(path)?;
    let Json(input) = payload?;
    Ok(Json(service.update_book(id, input).await?))
}

async fn delete_book(
    State(service): State<BookService>,
    path: Result<Path<BookId>, PathRejection>,
) -> Result<Json<DeleteResponse>, AppError> {
    let id = book_id(path)?;
    service.delete_book(id).await?;
    Ok(Json(DeleteResponse {
        message: "Book deleted successfully",
    }))
}
