pub mod error;
pub mod models;
pub mod repository;
pub mod routes;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookman_kernel::{InitCtx, Migration, Module};
use sqlx::SqlitePool;

use repository::SqliteBookRepository;
use service::BookService;

const BOOKS_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS books (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        title      TEXT NOT NULL,
        author     TEXT NOT NULL,
        genre      TEXT NOT NULL,
        isbn       TEXT,
        date_added TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        favorite   INTEGER NOT NULL DEFAULT 0
    );
    CREATE INDEX IF NOT EXISTS books_date_added ON books (date_added);
"#;

/// Books module: CRUD over the `books` table
pub struct BooksModule {
    service: BookService,
}

impl BooksModule {
    pub fn new(service: BookService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: BOOKS_SCHEMA,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create the books module backed by the given pool
pub fn create_module(pool: SqlitePool) -> Arc<dyn Module> {
    let repository = Arc::new(SqliteBookRepository::new(pool));
    Arc::new(BooksModule::new(BookService::new(repository)))
}

fn error_response(description: &str) -> serde_json::Value {
    serde_json::json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn book_response(description: &str) -> serde_json::Value {
    serde_json::json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/Book" }
            }
        }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let id_parameter = serde_json::json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64" }
    });
    let update_operation = serde_json::json!({
        "summary": "Update a book; only supplied fields change",
        "tags": ["Books"],
        "parameters": [id_parameter.clone()],
        "requestBody": {
            "required": true,
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/UpdateBook" }
                }
            }
        },
        "responses": {
            "200": book_response("Updated book"),
            "400": error_response("Invalid field value"),
            "404": error_response("Book not found")
        }
    });

    serde_json::json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books, newest first",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "List of books",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            }
                        },
                        "500": error_response("Internal server error")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/CreateBook" }
                            }
                        }
                    },
                    "responses": {
                        "201": book_response("Created book"),
                        "400": error_response("Missing or invalid fields")
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter.clone()],
                    "responses": {
                        "200": book_response("The book"),
                        "404": error_response("Book not found")
                    }
                },
                "put": update_operation.clone(),
                "patch": update_operation,
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter],
                    "responses": {
                        "200": {
                            "description": "Book deleted",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": { "message": { "type": "string" } },
                                        "required": ["message"]
                                    }
                                }
                            }
                        },
                        "404": error_response("Book not found")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "genre": { "type": "string" },
                        "isbn": { "type": ["string", "null"] },
                        "date_added": { "type": "string", "format": "date-time" }
                    },
                    "required": ["id", "title", "author", "genre", "isbn", "date_added"]
                },
                "CreateBook": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string", "minLength": 1, "maxLength": models::TITLE_MAX_LEN },
                        "author": { "type": "string", "minLength": 1, "maxLength": models::AUTHOR_MAX_LEN },
                        "genre": { "type": "string", "minLength": 1, "maxLength": models::GENRE_MAX_LEN },
                        "isbn": { "type": ["string", "null"], "maxLength": models::ISBN_MAX_LEN }
                    },
                    "required": ["title", "author", "genre"]
                },
                "UpdateBook": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string", "minLength": 1, "maxLength": models::TITLE_MAX_LEN },
                        "author": { "type": "string", "minLength": 1, "maxLength": models::AUTHOR_MAX_LEN },
                        "genre": { "type": "string", "minLength": 1, "maxLength": models::GENRE_MAX_LEN },
                        "isbn": { "type": ["string", "null"], "maxLength": models::ISBN_MAX_LEN }
                    }
                }
            }
        }
    })
}
