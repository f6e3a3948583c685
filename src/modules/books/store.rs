//! SurrealDB-backed persistence for book records.
//!
//! Each document lives at `book:<uuid>` and also carries its key as `book_id`, so every
//! statement can return whole documents without projecting record ids. Multi-step
//! operations (adjust copies, conditional delete) run as single conditional statements,
//! which makes them atomic per document.

use libris_db::Database;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use super::models::{Book, BookFilter, BookPatch, NewBook};
use super::validation::{self, ValidationError};
use crate::utils;

pub const TABLE: &str = "book";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Book not found")]
    NotFound,

    #[error("Cannot reduce copies below zero")]
    InsufficientCopies { available: i64, change: i64 },

    #[error("Cannot raise copies above {}", validation::MAX_COPIES)]
    CopiesLimit { available: i64, change: i64 },

    #[error("Cannot delete book with available copies")]
    CopiesRemaining { available: i64 },

    #[error("document store returned no record for {0}")]
    MissingResult(&'static str),

    #[error("document store error: {0}")]
    Database(#[from] surrealdb::Error),
}

/// Persisted shape of a book; snake_case to match the table schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BookDocument {
    book_id: String,
    title: String,
    author: String,
    category: String,
    published_year: i32,
    available_copies: i64,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

impl BookDocument {
    fn new(book: NewBook, now: OffsetDateTime) -> Self {
        Self {
            book_id: Uuid::now_v7().to_string(),
            title: book.title,
            author: book.author,
            category: book.category,
            published_year: book.published_year,
            available_copies: book.available_copies,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<BookDocument> for Book {
    fn from(doc: BookDocument) -> Self {
        Self {
            id: doc.book_id,
            title: doc.title,
            author: doc.author,
            category: doc.category,
            published_year: doc.published_year,
            available_copies: doc.available_copies,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

/// Handle to the `book` table. Cheap to clone.
#[derive(Clone)]
pub struct BookStore {
    db: Database,
}

impl BookStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert every record or none of them.
    ///
    /// All records are validated first; the first failure is reported with its index
    /// and nothing is written.
    pub async fn insert_many(&self, books: Vec<NewBook>) -> Result<Vec<Book>, StoreError> {
        let max_year = utils::current_year();
        let now = utils::now();

        let docs = books
            .iter()
            .enumerate()
            .map(|(index, book)| {
                validation::normalize_new_book(book, max_year)
                    .map(|book| BookDocument::new(book, now))
                    .map_err(|err| err.in_batch(index))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if docs.is_empty() {
            return Ok(Vec::new());
        }

        self.db
            .query(
                "BEGIN TRANSACTION; \
                 FOR $doc IN $docs { CREATE type::thing($table, $doc.book_id) CONTENT $doc; }; \
                 COMMIT TRANSACTION;",
            )
            .bind(("table", TABLE))
            .bind(("docs", docs.clone()))
            .await?
            .check()?;

        tracing::info!(count = docs.len(), "books inserted");

        Ok(docs.into_iter().map(Book::from).collect())
    }

    /// Create a single record.
    pub async fn insert(&self, book: NewBook) -> Result<Book, StoreError> {
        let doc = BookDocument::new(
            validation::normalize_new_book(&book, utils::current_year())?,
            utils::now(),
        );

        let created: Vec<BookDocument> = self
            .db
            .query("CREATE type::thing($table, $id) CONTENT $doc RETURN AFTER")
            .bind(("table", TABLE))
            .bind(("id", doc.book_id.clone()))
            .bind(("doc", doc))
            .await?
            .take(0)?;

        let book = created
            .into_iter()
            .next()
            .map(Book::from)
            .ok_or(StoreError::MissingResult("CREATE"))?;

        tracing::info!(book_id = %book.id, "book created");
        Ok(book)
    }

    /// All records in creation order.
    pub async fn find_all(&self) -> Result<Vec<Book>, StoreError> {
        let docs: Vec<BookDocument> = self
            .db
            .query("SELECT * FROM type::table($table) ORDER BY book_id")
            .bind(("table", TABLE))
            .await?
            .take(0)?;

        Ok(docs.into_iter().map(Book::from).collect())
    }

    pub async fn find_by_filter(&self, filter: BookFilter) -> Result<Vec<Book>, StoreError> {
        let query = match filter {
            BookFilter::Category(category) => self
                .db
                .query(
                    "SELECT * FROM type::table($table) WHERE category = $category ORDER BY book_id",
                )
                .bind(("category", category)),
            BookFilter::PublishedAfter(year) => self
                .db
                .query(
                    "SELECT * FROM type::table($table) WHERE published_year > $year ORDER BY book_id",
                )
                .bind(("year", year)),
        };

        let docs: Vec<BookDocument> = query.bind(("table", TABLE)).await?.take(0)?;

        Ok(docs.into_iter().map(Book::from).collect())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Book>, StoreError> {
        let docs: Vec<BookDocument> = self
            .db
            .query("SELECT * FROM type::thing($table, $id)")
            .bind(("table", TABLE))
            .bind(("id", id.to_string()))
            .await?
            .take(0)?;

        Ok(docs.into_iter().next().map(Book::from))
    }

    /// Apply a partial update in one statement. Returns `None` for an unknown id.
    pub async fn update_by_id(
        &self,
        id: &str,
        patch: BookPatch,
    ) -> Result<Option<Book>, StoreError> {
        let patch = validation::normalize_patch(&patch)?;
        if patch.is_empty() {
            return self.find_by_id(id).await;
        }

        let mut assignments = vec!["updated_at = $updated_at"];
        if patch.category.is_some() {
            assignments.push("category = $category");
        }
        if patch.available_copies.is_some() {
            assignments.push("available_copies = $available_copies");
        }

        let statement = format!(
            "UPDATE type::thing($table, $id) SET {} RETURN AFTER",
            assignments.join(", ")
        );

        let docs: Vec<BookDocument> = self
            .db
            .query(statement)
            .bind(("table", TABLE))
            .bind(("id", id.to_string()))
            .bind(("updated_at", Timestamp3339(utils::now())))
            .bind(("category", patch.category))
            .bind(("available_copies", patch.available_copies))
            .await?
            .take(0)?;

        let updated = docs.into_iter().next().map(Book::from);
        if let Some(book) = &updated {
            tracing::info!(book_id = %book.id, "book updated");
        }
        Ok(updated)
    }

    /// Add `change` (possibly negative) to `availableCopies`.
    ///
    /// The bound check and the write are one conditional statement, so concurrent
    /// adjustments cannot drive the count below zero or lose an update.
    pub async fn adjust_copies(&self, id: &str, change: i64) -> Result<Book, StoreError> {
        let change = validation::copy_change(change)?;

        let docs: Vec<BookDocument> = self
            .db
            .query(
                "UPDATE type::thing($table, $id) \
                 SET available_copies += $change, updated_at = $updated_at \
                 WHERE available_copies + $change >= 0 AND available_copies + $change <= $max \
                 RETURN AFTER",
            )
            .bind(("table", TABLE))
            .bind(("id", id.to_string()))
            .bind(("change", change))
            .bind(("max", validation::MAX_COPIES))
            .bind(("updated_at", Timestamp3339(utils::now())))
            .await?
            .take(0)?;

        if let Some(doc) = docs.into_iter().next() {
            tracing::info!(
                book_id = %doc.book_id,
                change,
                available_copies = doc.available_copies,
                "copies adjusted"
            );
            return Ok(doc.into());
        }

        // Nothing matched: either the id is unknown or the guard rejected the change.
        match self.find_by_id(id).await? {
            None => Err(StoreError::NotFound),
            Some(book) if book.available_copies + change < 0 => {
                Err(StoreError::InsufficientCopies {
                    available: book.available_copies,
                    change,
                })
            }
            Some(book) => Err(StoreError::CopiesLimit {
                available: book.available_copies,
                change,
            }),
        }
    }

    /// Remove a record unconditionally.
    pub async fn delete_by_id(&self, id: &str) -> Result<Book, StoreError> {
        let docs: Vec<BookDocument> = self
            .db
            .query("DELETE type::thing($table, $id) RETURN BEFORE")
            .bind(("table", TABLE))
            .bind(("id", id.to_string()))
            .await?
            .take(0)?;

        let book = docs
            .into_iter()
            .next()
            .map(Book::from)
            .ok_or(StoreError::NotFound)?;

        tracing::info!(book_id = %book.id, "book deleted");
        Ok(book)
    }

    /// Remove a record only when it has no available copies left, as one statement.
    pub async fn delete_if_depleted(&self, id: &str) -> Result<Book, StoreError> {
        let docs: Vec<BookDocument> = self
            .db
            .query("DELETE type::thing($table, $id) WHERE available_copies = 0 RETURN BEFORE")
            .bind(("table", TABLE))
            .bind(("id", id.to_string()))
            .await?
            .take(0)?;

        if let Some(doc) = docs.into_iter().next() {
            tracing::info!(book_id = %doc.book_id, "book deleted");
            return Ok(doc.into());
        }

        match self.find_by_id(id).await? {
            None => Err(StoreError::NotFound),
            Some(book) => Err(StoreError::CopiesRemaining {
                available: book.available_copies,
            }),
        }
    }
}

/// Serializes a timestamp in the same RFC 3339 form the documents use.
#[derive(Debug, Clone, Copy, Serialize)]
struct Timestamp3339(#[serde(with = "time::serde::rfc3339")] OffsetDateTime);
