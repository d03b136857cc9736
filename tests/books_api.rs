use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use bookman_app::modules::books::{
    models::{Book, BookChanges, BookId, BookRecord, NewBook},
    repository::BookRepository,
    service::BookService,
    BooksModule,
};
use bookman_app::Application;
use bookman_kernel::{settings::Settings, ModuleRegistry};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    _dir: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.database.url = dir.path().join("books.db").display().to_string();

        let app = Application::build(settings).await.unwrap();
        Self {
            router: app.router(),
            _dir: dir,
        }
    }

    async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        send(&self.router, method, uri, body).await
    }

    async fn create(&self, title: &str) -> Book {
        let (status, body) = self
            .request(
                Method::POST,
                "/books",
                Some(json!({"title": title, "author": "Octavia E. Butler", "genre": "Fiction"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        serde_json::from_value(body).unwrap()
    }
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn root_reports_service_info() {
    let app = TestApp::new().await;

    let (status, body) = app.request(Method::GET, "/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Book Manager API is running!", "version": "1.0.0"}));
}

#[tokio::test]
async fn create_returns_generated_id_and_date_added() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/books",
            Some(json!({
                "title": "The Great Gatsby",
                "author": "F. Scott Fitzgerald",
                "genre": "Fiction",
                "isbn": "978-0743273565"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].as_i64().is_some());
    assert!(body["date_added"].as_str().is_some());
    assert_eq!(body["isbn"], "978-0743273565");
    assert!(body.get("favorite").is_none());
}

#[tokio::test]
async fn create_without_required_fields_is_rejected_and_persists_nothing() {
    let app = TestApp::new().await;

    for payload in [
        json!({"author": "A", "genre": "G"}),
        json!({"title": "T", "genre": "G"}),
        json!({"title": "T", "author": "A"}),
        json!({"title": "T", "author": "", "genre": "G"}),
    ] {
        let (status, body) = app.request(Method::POST, "/books", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Title, author, and genre are required"}));
    }

    let (status, body) = app.request(Method::GET, "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/books")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"title\": "))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn get_after_create_returns_same_fields() {
    let app = TestApp::new().await;
    let created = app.create("Kindred").await;

    let (status, body) = app
        .request(Method::GET, &format!("/books/{}", created.id), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    let fetched: Book = serde_json::from_value(body).unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.title, "Kindred");
    assert_eq!(fetched.isbn, None);
}

#[tokio::test]
async fn list_is_newest_first() {
    let app = TestApp::new().await;
    let a = app.create("Parable of the Sower").await;
    let b = app.create("Parable of the Talents").await;

    let (status, body) = app.request(Method::GET, "/books", None).await;

    assert_eq!(status, StatusCode::OK);
    let books: Vec<Book> = serde_json::from_value(body).unwrap();
    let ids: Vec<BookId> = books.iter().map(|book| book.id).collect();
    assert_eq!(ids, vec![b.id, a.id]);
}

#[tokio::test]
async fn partial_update_changes_only_supplied_fields() {
    let app = TestApp::new().await;
    let (_, body) = app
        .request(
            Method::POST,
            "/books",
            Some(json!({"title": "Dawn", "author": "Octavia E. Butler", "genre": "Fiction", "isbn": "978-0446603775"})),
        )
        .await;
    let created: Book = serde_json::from_value(body).unwrap();

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/books/{}", created.id),
            Some(json!({"genre": "Non-Fiction"})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let updated: Book = serde_json::from_value(body).unwrap();
    assert_eq!(
        updated,
        Book {
            genre: "Non-Fiction".to_string(),
            ..created
        }
    );
}

#[tokio::test]
async fn patch_is_accepted_and_null_clears_isbn() {
    let app = TestApp::new().await;
    let (_, body) = app
        .request(
            Method::POST,
            "/books",
            Some(json!({"title": "Fledgling", "author": "Octavia E. Butler", "genre": "Horror", "isbn": "978-0446696166"})),
        )
        .await;
    let created: Book = serde_json::from_value(body).unwrap();

    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/books/{}", created.id),
            Some(json!({"isbn": null})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isbn"], Value::Null);
    assert_eq!(body["title"], "Fledgling");
}

#[tokio::test]
async fn update_rejects_blanking_a_required_field() {
    let app = TestApp::new().await;
    let created = app.create("Wild Seed").await;
    let uri = format!("/books/{}", created.id);

    let (status, body) = app.request(Method::PUT, &uri, Some(json!({"title": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "title must not be empty"}));

    for field in ["title", "author", "genre"] {
        let (status, body) = app
            .request(Method::PATCH, &uri, Some(json!({ field: null })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{field}");
        assert_eq!(body, json!({"error": format!("{field} must not be empty")}));
    }

    let (_, body) = app.request(Method::GET, &uri, None).await;
    let unchanged: Book = serde_json::from_value(body).unwrap();
    assert_eq!(unchanged, created);
}

#[tokio::test]
async fn update_with_no_fields_returns_current_record() {
    let app = TestApp::new().await;
    let created = app.create("Lilith's Brood").await;

    let (status, body) = app
        .request(Method::PUT, &format!("/books/{}", created.id), Some(json!({})))
        .await;

    assert_eq!(status, StatusCode::OK);
    let current: Book = serde_json::from_value(body).unwrap();
    assert_eq!(current, created);
}

#[tokio::test]
async fn update_enforces_length_limits() {
    let app = TestApp::new().await;
    let created = app.create("Imago").await;

    let (status, body) = app
        .request(
            Method::PATCH,
            &format!("/books/{}", created.id),
            Some(json!({"isbn": "9".repeat(21)})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "isbn must be at most 20 characters"}));
}

#[tokio::test]
async fn invalid_body_is_rejected_before_the_id_is_looked_up() {
    let app = TestApp::new().await;

    let (status, _) = app
        .request(Method::PUT, "/books/999", Some(json!({"title": ""})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let app = TestApp::new().await;
    let created = app.create("Mind of My Mind").await;
    let uri = format!("/books/{}", created.id);

    let (status, body) = app.request(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Book deleted successfully"}));

    let (status, body) = app.request(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Book not found"}));
}

#[tokio::test]
async fn missing_ids_are_not_found_for_every_verb() {
    let app = TestApp::new().await;

    for (method, body) in [
        (Method::GET, None),
        (Method::PUT, Some(json!({"genre": "Poetry"}))),
        (Method::PATCH, Some(json!({}))),
        (Method::DELETE, None),
    ] {
        let (status, response) = app.request(method.clone(), "/books/404", body).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method}");
        assert_eq!(response, json!({"error": "Book not found"}), "{method}");
    }

    let (status, _) = app.request(Method::GET, "/books/not-a-number", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleted_ids_are_never_handed_out_again() {
    let app = TestApp::new().await;
    let first = app.create("Survivor").await;
    app.request(Method::DELETE, &format!("/books/{}", first.id), None)
        .await;

    let second = app.create("Clay's Ark").await;
    assert_ne!(second.id, first.id);

    let (status, _) = app
        .request(Method::GET, &format!("/books/{}", first.id), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn openapi_document_lists_book_routes() {
    let app = TestApp::new().await;

    let (status, body) = app.request(Method::GET, "/docs/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/books"]["post"].is_object());
    assert!(body["paths"]["/books/{id}"]["delete"].is_object());
    assert!(body["components"]["schemas"]["Book"].is_object());
}

struct UnavailableRepository;

#[async_trait]
impl BookRepository for UnavailableRepository {
    async fn list(&self) -> Result<Vec<BookRecord>, sqlx::Error> {
        Err(sqlx::Error::PoolTimedOut)
    }

    async fn get(&self, _id: BookId) -> Result<Option<BookRecord>, sqlx::Error> {
        Err(sqlx::Error::PoolTimedOut)
    }

    async fn insert(&self, _book: &NewBook) -> Result<BookRecord, sqlx::Error> {
        Err(sqlx::Error::PoolTimedOut)
    }

    async fn update(
        &self,
        _id: BookId,
        _changes: &BookChanges,
    ) -> Result<Option<BookRecord>, sqlx::Error> {
        Err(sqlx::Error::PoolTimedOut)
    }

    async fn delete(&self, _id: BookId) -> Result<bool, sqlx::Error> {
        Err(sqlx::Error::PoolTimedOut)
    }
}

#[tokio::test]
async fn storage_failure_is_internal_error() {
    let mut registry = ModuleRegistry::new();
    registry
        .register(Arc::new(BooksModule::new(BookService::new(Arc::new(
            UnavailableRepository,
        )))))
        .unwrap();
    let router = bookman_http::build_router(&registry, &Settings::default());

    let (status, body) = send(&router, Method::GET, "/books", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &router,
        Method::POST,
        "/books",
        Some(json!({"title": "T", "author": "A", "genre": "G"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    for (method, uri, body) in [
        (Method::GET, "/books/1", None),
        (Method::PUT, "/books/1", Some(json!({"genre": "Poetry"}))),
        (Method::PATCH, "/books/1", Some(json!({}))),
        (Method::DELETE, "/books/1", None),
    ] {
        let (status, response) = send(&router, method.clone(), uri, body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{method}");
        assert!(response["error"].is_string(), "{method}");
    }
}
