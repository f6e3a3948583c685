//! HTTP handlers for `/api/books`.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use libris_http::{ApiJson, AppError, AppResult};
use serde_json::Value;

use super::models::{Book, BookFilter, BookPatch, MessageResponse, RecentQuery, SeedResponse};
use super::store::{BookStore, StoreError};
use super::validation::{self, BookDraft, ValidationError};
use crate::utils;

const SEED_SHAPE_ERROR: &str = "Provide an array of books";
const BOOK_NOT_FOUND: &str = "Book not found";
const EMPTY_CATEGORY: &str = "No books found in this category";

/// Shared handler state
#[derive(Clone)]
pub struct BooksState {
    pub store: BookStore,
    /// Default threshold for `/after-threshold`
    pub recent_after_year: i32,
}

pub fn router(state: BooksState) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/health", get(health_check))
        .route("/seed", post(seed_books))
        .route("/after-threshold", get(list_recent_books))
        .route("/category/{category}", get(list_books_by_category))
        .route("/{id}", get(get_book).delete(delete_book))
        .route("/{id}/copies", patch(adjust_copies))
        .route("/{id}/category", patch(change_category))
        .with_state(state)
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::validation(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(err) => err.into(),
            StoreError::NotFound => AppError::not_found(BOOK_NOT_FOUND),
            StoreError::InsufficientCopies { .. }
            | StoreError::CopiesLimit { .. }
            | StoreError::CopiesRemaining { .. } => {
                AppError::bad_request(err.to_string())
            }
            StoreError::MissingResult(_) | StoreError::Database(_) => {
                AppError::Internal(anyhow::Error::new(err))
            }
        }
    }
}

async fn health_check() -> &'static str {
    "books module is healthy"
}

/// Bulk insert; the whole batch is rejected if any record is invalid
async fn seed_books(
    State(state): State<BooksState>,
    ApiJson(body): ApiJson<Value>,
) -> AppResult<(StatusCode, Json<SeedResponse>)> {
    let entries = match body {
        Value::Array(entries) if !entries.is_empty() => entries,
        _ => return Err(AppError::bad_request(SEED_SHAPE_ERROR)),
    };

    let books = validation::validate_batch(entries, utils::current_year())?;
    let created = state.store.insert_many(books).await?;

    Ok((
        StatusCode::CREATED,
        Json(SeedResponse {
            message: format!("{} books added", created.len()),
            data: created,
        }),
    ))
}

async fn create_book(
    State(state): State<BooksState>,
    ApiJson(body): ApiJson<Value>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let book = BookDraft::from_json(body)?.validate(utils::current_year())?;
    let created = state.store.insert(book).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_books(State(state): State<BooksState>) -> AppResult<Json<Vec<Book>>> {
    Ok(Json(state.store.find_all().await?))
}

async fn get_book(
    State(state): State<BooksState>,
    Path(id): Path<String>,
) -> AppResult<Json<Book>> {
    state
        .store
        .find_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(BOOK_NOT_FOUND))
}

/// An empty category is reported as 404 rather than an empty list
async fn list_books_by_category(
    State(state): State<BooksState>,
    Path(category): Path<String>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state
        .store
        .find_by_filter(BookFilter::Category(category))
        .await?;

    if books.is_empty() {
        return Err(AppError::not_found(EMPTY_CATEGORY));
    }

    Ok(Json(books))
}

async fn list_recent_books(
    State(state): State<BooksState>,
    query: Result<Query<RecentQuery>, QueryRejection>,
) -> AppResult<Json<Vec<Book>>> {
    let Query(query) = query.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let threshold = query.year.unwrap_or(state.recent_after_year);

    let books = state
        .store
        .find_by_filter(BookFilter::PublishedAfter(threshold))
        .await?;

    Ok(Json(books))
}

/// `{ "change": n }` adds `n` (which may be negative) to the available copies
async fn adjust_copies(
    State(state): State<BooksState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Value>,
) -> AppResult<Json<Book>> {
    let change = validation::change_from_json(&body)?;

    match state.store.adjust_copies(&id, change).await {
        Ok(book) => Ok(Json(book)),
        // Copy adjustments report an unknown id as a bad request.
        Err(StoreError::NotFound) => Err(AppError::bad_request(BOOK_NOT_FOUND)),
        Err(err) => Err(err.into()),
    }
}

async fn change_category(
    State(state): State<BooksState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Value>,
) -> AppResult<Json<Book>> {
    let category = validation::category_from_json(&body)?;

    state
        .store
        .update_by_id(&id, BookPatch::category(category))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(BOOK_NOT_FOUND))
}

/// Only books with no available copies can be deleted
async fn delete_book(
    State(state): State<BooksState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.store.delete_if_depleted(&id).await?;

    Ok(Json(MessageResponse {
        message: "Book deleted".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::test_store;
    use axum::{
        body::{to_bytes, Body},
        http::{self, header, Method},
    };
    use serde_json::json;
    use tower::ServiceExt;

    async fn app() -> Router {
        router(BooksState {
            store: test_store().await,
            recent_after_year: 2015,
        })
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = http::Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    fn sample_payload() -> Value {
        json!([
            { "title": "The Hobbit", "author": "J.R.R. Tolkien", "category": "Fantasy", "publishedYear": 1937, "availableCopies": 5 },
            { "title": "1984", "author": "George Orwell", "category": "Dystopian", "publishedYear": 1949, "availableCopies": 3 },
            { "title": "To Kill a Mockingbird", "author": "Harper Lee", "category": "Fiction", "publishedYear": 1960, "availableCopies": 4 },
            { "title": "The Martian", "author": "Andy Weir", "category": "Sci-Fi", "publishedYear": 2011, "availableCopies": 6 },
            { "title": "Becoming", "author": "Michelle Obama", "category": "Biography", "publishedYear": 2018, "availableCopies": 2 },
            { "title": "Project Hail Mary", "author": "Andy Weir", "category": "Sci-Fi", "publishedYear": 2021, "availableCopies": 7 },
            { "title": "Atomic Habits", "author": "James Clear", "category": "Self-Help", "publishedYear": 2018, "availableCopies": 0 }
        ])
    }

    /// Seed the sample and return the created records
    async fn seeded(app: &Router) -> Vec<Value> {
        let (status, body) = send(app, Method::POST, "/seed", Some(sample_payload())).await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"].as_array().unwrap().clone()
    }

    fn id_of<'a>(books: &'a [Value], title: &str) -> &'a str {
        books
            .iter()
            .find(|b| b["title"] == title)
            .and_then(|b| b["id"].as_str())
            .unwrap()
    }

    #[tokio::test]
    async fn seeding_seven_books_returns_created_records() {
        let app = app().await;
        let (status, body) = send(&app, Method::POST, "/seed", Some(sample_payload())).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "7 books added");
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 7);
        assert!(data
            .iter()
            .all(|b| b["id"].as_str().is_some_and(|id| !id.is_empty())));
        assert!(data.iter().all(|b| b["createdAt"].is_string()));
    }

    #[tokio::test]
    async fn seeding_requires_a_non_empty_array() {
        let app = app().await;

        for payload in [json!([]), json!({ "title": "Dune" }), json!("books"), json!(7)] {
            let (status, body) = send(&app, Method::POST, "/seed", Some(payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({ "error": SEED_SHAPE_ERROR }));
        }
    }

    #[tokio::test]
    async fn seeding_with_an_invalid_record_writes_nothing() {
        let app = app().await;
        let mut payload = sample_payload();
        payload[3]["availableCopies"] = json!(-2);

        let (status, body) = send(&app, Method::POST, "/seed", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "book 3: availableCopies cannot be negative, got -2"
        );

        let (status, body) = send(&app, Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let app = app().await;
        let request = http::Request::builder()
            .method(Method::POST)
            .uri("/seed")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("[{"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn category_listing_matches_exactly_and_404s_when_empty() {
        let app = app().await;
        seeded(&app).await;

        let (status, body) = send(&app, Method::GET, "/category/Sci-Fi", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (status, body) = send(&app, Method::GET, "/category/Poetry", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": EMPTY_CATEGORY }));
    }

    #[tokio::test]
    async fn recent_listing_uses_configured_threshold_or_override() {
        let app = app().await;
        seeded(&app).await;

        let (status, body) = send(&app, Method::GET, "/after-threshold", None).await;
        assert_eq!(status, StatusCode::OK);
        let years: Vec<i64> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["publishedYear"].as_i64().unwrap())
            .collect();
        assert_eq!(years.len(), 3);
        assert!(years.iter().all(|&year| year > 2015));

        let (status, body) = send(&app, Method::GET, "/after-threshold?year=2019", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["title"], "Project Hail Mary");

        let (status, _) = send(&app, Method::GET, "/after-threshold?year=soon", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn adjusting_copies_applies_signed_change() {
        let app = app().await;
        let books = seeded(&app).await;
        let id = id_of(&books, "1984");

        let (status, body) = send(
            &app,
            Method::PATCH,
            &format!("/{id}/copies"),
            Some(json!({ "change": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["availableCopies"], 5);

        let (status, body) = send(
            &app,
            Method::PATCH,
            &format!("/{id}/copies"),
            Some(json!({ "change": -5 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["availableCopies"], 0);
    }

    #[tokio::test]
    async fn adjusting_below_zero_is_rejected_and_leaves_copies() {
        let app = app().await;
        let books = seeded(&app).await;
        let id = id_of(&books, "Becoming");

        let (status, body) = send(
            &app,
            Method::PATCH,
            &format!("/{id}/copies"),
            Some(json!({ "change": -3 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Cannot reduce copies below zero");

        let (_, body) = send(&app, Method::GET, &format!("/{id}"), None).await;
        assert_eq!(body["availableCopies"], 2);
    }

    #[tokio::test]
    async fn adjusting_by_an_overflowing_change_is_a_bad_request() {
        let app = app().await;
        let books = seeded(&app).await;
        let id = id_of(&books, "The Martian");

        for change in [i64::MAX, i64::MIN, crate::modules::books::validation::MAX_COPIES] {
            let (status, body) = send(
                &app,
                Method::PATCH,
                &format!("/{id}/copies"),
                Some(json!({ "change": change })),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "change {change}");
            assert!(body["error"].is_string());
        }

        let (_, body) = send(&app, Method::GET, &format!("/{id}"), None).await;
        assert_eq!(body["availableCopies"], 6);
    }

    #[tokio::test]
    async fn adjusting_copies_rejects_bad_change_and_unknown_ids() {
        let app = app().await;
        let books = seeded(&app).await;
        let id = id_of(&books, "1984");

        for payload in [json!({ "change": "2" }), json!({ "change": 1.5 }), json!({})] {
            let (status, _) =
                send(&app, Method::PATCH, &format!("/{id}/copies"), Some(payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }

        let (status, body) = send(
            &app,
            Method::PATCH,
            "/no-such-book/copies",
            Some(json!({ "change": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], BOOK_NOT_FOUND);
    }

    #[tokio::test]
    async fn changing_category_updates_only_that_field() {
        let app = app().await;
        let books = seeded(&app).await;
        let before = books.iter().find(|b| b["title"] == "The Martian").unwrap();
        let id = before["id"].as_str().unwrap();

        let (status, after) = send(
            &app,
            Method::PATCH,
            &format!("/{id}/category"),
            Some(json!({ "category": "  Classics " })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(after["category"], "Classics");
        for field in ["id", "title", "author", "publishedYear", "availableCopies", "createdAt"] {
            assert_eq!(after[field], before[field], "{field} changed");
        }

        let (_, fetched) = send(&app, Method::GET, &format!("/{id}"), None).await;
        assert_eq!(fetched, after);
    }

    #[tokio::test]
    async fn changing_category_validates_input_and_id() {
        let app = app().await;
        let books = seeded(&app).await;
        let id = id_of(&books, "The Martian");

        for payload in [json!({}), json!({ "category": "" }), json!({ "category": 42 })] {
            let (status, _) =
                send(&app, Method::PATCH, &format!("/{id}/category"), Some(payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }

        let (status, body) = send(
            &app,
            Method::PATCH,
            "/no-such-book/category",
            Some(json!({ "category": "Classics" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], BOOK_NOT_FOUND);
    }

    #[tokio::test]
    async fn deleting_a_stocked_book_is_refused() {
        let app = app().await;
        let books = seeded(&app).await;
        let id = id_of(&books, "The Hobbit");

        let (status, body) = send(&app, Method::DELETE, &format!("/{id}"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Cannot delete book with available copies");

        let (status, body) = send(&app, Method::GET, &format!("/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "The Hobbit");
    }

    #[tokio::test]
    async fn deleting_a_depleted_book_removes_it() {
        let app = app().await;
        let books = seeded(&app).await;
        let id = id_of(&books, "Atomic Habits");

        let (status, body) = send(&app, Method::DELETE, &format!("/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Book deleted" }));

        let (status, body) = send(&app, Method::GET, &format!("/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": BOOK_NOT_FOUND }));

        let (status, _) = send(&app, Method::DELETE, &format!("/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn created_book_reads_back_identically() {
        let app = app().await;
        let (status, created) = send(
            &app,
            Method::POST,
            "/",
            Some(json!({
                "title": " Dune ",
                "author": "Frank Herbert",
                "category": "Sci-Fi",
                "publishedYear": 1965,
                "availableCopies": 3
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["title"], "Dune");

        let id = created["id"].as_str().unwrap();
        let (status, fetched) = send(&app, Method::GET, &format!("/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (status, body) = send(
            &app,
            Method::POST,
            "/",
            Some(json!({
                "title": "Far Future",
                "author": "Nobody",
                "category": "Sci-Fi",
                "publishedYear": 9999,
                "availableCopies": 3
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("publishedYear must be between 1000 and"));
    }

    #[tokio::test]
    async fn health_endpoint_answers() {
        let app = app().await;
        let (status, body) = send(&app, Method::GET, "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("books module is healthy".to_string()));
    }
}
