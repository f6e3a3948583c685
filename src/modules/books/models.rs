use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A catalog entry as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Store-assigned identifier (UUIDv7, so ids sort by creation time)
    pub id: String,
    pub title: String,
    pub author: String,
    pub category: String,
    pub published_year: i32,
    /// Loanable copies; never negative
    pub available_copies: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated fields for a book that does not exist yet.
///
/// Build one through [`BookDraft::validate`](super::validation::BookDraft::validate);
/// the store checks it again before writing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub category: String,
    pub published_year: i32,
    pub available_copies: i64,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookPatch {
    pub category: Option<String>,
    pub available_copies: Option<i64>,
}

impl BookPatch {
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.available_copies.is_none()
    }
}

/// Exact-match filters supported by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookFilter {
    Category(String),
    /// `publishedYear` strictly greater than the given year
    PublishedAfter(i32),
}

/// Response body for the seed endpoint.
#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub message: String,
    pub data: Vec<Book>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    /// Overrides the configured threshold for one request
    pub year: Option<i32>,
}
