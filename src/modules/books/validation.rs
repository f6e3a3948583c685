//! Field rules for book records.
//!
//! The API runs these on incoming JSON and the store runs them again on every write,
//! so both layers reject exactly the same inputs.

use serde_json::{Map, Value};
use thiserror::Error;

use super::models::{BookPatch, NewBook};

pub const MIN_PUBLISHED_YEAR: i32 = 1000;

/// Upper bound for stored copies and for the magnitude of a single change; keeps
/// `copies + change` well inside `i64`.
pub const MAX_COPIES: i64 = i32::MAX as i64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("expected a book object")]
    NotAnObject,

    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("{field} must be a string")]
    NotAString { field: &'static str },

    #[error("{field} must not be empty")]
    Blank { field: &'static str },

    #[error("{field} must be an integer")]
    NotAnInteger { field: &'static str },

    #[error("publishedYear must be between {min} and {max}, got {year}")]
    YearOutOfRange { year: i64, min: i32, max: i32 },

    #[error("availableCopies cannot be negative, got {copies}")]
    NegativeCopies { copies: i64 },

    #[error("availableCopies cannot exceed {max}, got {copies}")]
    TooManyCopies { copies: i64, max: i64 },

    #[error("change must be between -{max} and {max}, got {change}")]
    ChangeOutOfRange { change: i64, max: i64 },

    #[error("book {index}: {source}")]
    InBatch {
        index: usize,
        source: Box<ValidationError>,
    },
}

impl ValidationError {
    /// Attach the position of the offending record inside a batch.
    pub fn in_batch(self, index: usize) -> Self {
        Self::InBatch {
            index,
            source: Box::new(self),
        }
    }
}

/// Book fields exactly as they arrived, before any checks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookDraft {
    pub title: Option<Value>,
    pub author: Option<Value>,
    pub category: Option<Value>,
    pub published_year: Option<Value>,
    pub available_copies: Option<Value>,
}

impl BookDraft {
    /// Pick the known camelCase keys out of a JSON object; other keys are ignored.
    pub fn from_json(value: Value) -> Result<Self, ValidationError> {
        let Value::Object(mut map) = value else {
            return Err(ValidationError::NotAnObject);
        };

        let mut take = |key: &str| take_present(&mut map, key);

        Ok(Self {
            title: take("title"),
            author: take("author"),
            category: take("category"),
            published_year: take("publishedYear"),
            available_copies: take("availableCopies"),
        })
    }

    /// Check every field against `max_year` and produce trimmed, typed values.
    pub fn validate(self, max_year: i32) -> Result<NewBook, ValidationError> {
        let year = integer_field("publishedYear", self.published_year)?;
        let copies = integer_field("availableCopies", self.available_copies)?;

        Ok(NewBook {
            title: text_field("title", self.title)?,
            author: text_field("author", self.author)?,
            category: text_field("category", self.category)?,
            published_year: published_year(year, max_year)?,
            available_copies: available_copies(copies)?,
        })
    }
}

/// Validate a JSON array of books. Any failure rejects the whole batch and names the
/// zero-based index of the first offending record.
pub fn validate_batch(
    values: Vec<Value>,
    max_year: i32,
) -> Result<Vec<NewBook>, ValidationError> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            BookDraft::from_json(value)
                .and_then(|draft| draft.validate(max_year))
                .map_err(|err| err.in_batch(index))
        })
        .collect()
}

/// Re-check an already typed record and return it trimmed; the store calls this
/// before every insert.
pub fn normalize_new_book(book: &NewBook, max_year: i32) -> Result<NewBook, ValidationError> {
    Ok(NewBook {
        title: non_blank("title", &book.title)?.to_string(),
        author: non_blank("author", &book.author)?.to_string(),
        category: non_blank("category", &book.category)?.to_string(),
        published_year: published_year(i64::from(book.published_year), max_year)?,
        available_copies: available_copies(book.available_copies)?,
    })
}

/// Re-check the fields a patch touches and return it trimmed.
pub fn normalize_patch(patch: &BookPatch) -> Result<BookPatch, ValidationError> {
    Ok(BookPatch {
        category: patch
            .category
            .as_deref()
            .map(|category| non_blank("category", category).map(str::to_string))
            .transpose()?,
        available_copies: patch.available_copies.map(available_copies).transpose()?,
    })
}

/// Parse the `category` member of a change-category request body.
pub fn category_from_json(body: &Value) -> Result<String, ValidationError> {
    text_field("category", body.get("category").filter(|v| !v.is_null()).cloned())
}

/// Parse the signed `change` member of an adjust-copies request body.
pub fn change_from_json(body: &Value) -> Result<i64, ValidationError> {
    integer_field("change", body.get("change").filter(|v| !v.is_null()).cloned())
        .and_then(copy_change)
}

pub fn published_year(year: i64, max_year: i32) -> Result<i32, ValidationError> {
    if year < i64::from(MIN_PUBLISHED_YEAR) || year > i64::from(max_year) {
        return Err(ValidationError::YearOutOfRange {
            year,
            min: MIN_PUBLISHED_YEAR,
            max: max_year,
        });
    }
    // In range, so it fits.
    Ok(year as i32)
}

pub fn available_copies(copies: i64) -> Result<i64, ValidationError> {
    if copies < 0 {
        return Err(ValidationError::NegativeCopies { copies });
    }
    if copies > MAX_COPIES {
        return Err(ValidationError::TooManyCopies {
            copies,
            max: MAX_COPIES,
        });
    }
    Ok(copies)
}

pub fn copy_change(change: i64) -> Result<i64, ValidationError> {
    if !(-MAX_COPIES..=MAX_COPIES).contains(&change) {
        return Err(ValidationError::ChangeOutOfRange {
            change,
            max: MAX_COPIES,
        });
    }
    Ok(change)
}

fn take_present(map: &mut Map<String, Value>, key: &str) -> Option<Value> {
    map.remove(key).filter(|value| !value.is_null())
}

fn text_field(field: &'static str, value: Option<Value>) -> Result<String, ValidationError> {
    match value {
        None => Err(ValidationError::Missing { field }),
        Some(Value::String(text)) => non_blank(field, &text).map(str::to_string),
        Some(_) => Err(ValidationError::NotAString { field }),
    }
}

fn integer_field(field: &'static str, value: Option<Value>) -> Result<i64, ValidationError> {
    match value {
        None => Err(ValidationError::Missing { field }),
        Some(Value::Number(number)) => number
            .as_i64()
            .ok_or(ValidationError::NotAnInteger { field }),
        Some(_) => Err(ValidationError::NotAnInteger { field }),
    }
}

fn non_blank<'a>(field: &'static str, text: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Blank { field });
    }
    Ok(trimmed)
}
