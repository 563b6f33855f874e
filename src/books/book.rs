//! The book record and the partial body clients send to create or update one.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::BookError;
use crate::model::{Document, Model};

/// A stored book.
///
/// `id` is assigned by the service at creation and never changes. The other
/// fields are optional; empty strings and a zero year are never stored and
/// are left out of serialized output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
}

impl Model for Book {
    const COLLECTION: &'static str = "books";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Request body for create and update: any subset of the book fields.
///
/// A client-supplied `id` is accepted on the wire but never used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BookInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub year: Option<i64>,
}

impl BookInput {
    /// Parse a request body. Anything that is not a JSON object with
    /// correctly typed fields is a validation error.
    pub fn from_json(body: &[u8]) -> Result<Self, BookError> {
        if body.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(BookError::Validation("request body is empty".into()));
        }

        let doc: Document = serde_json::from_slice(body)
            .map_err(|e| BookError::Validation(e.to_string()))?;
        let input: BookInput = serde_json::from_value(Value::Object(doc))
            .map_err(|e| BookError::Validation(e.to_string()))?;

        Ok(input.normalized())
    }

    /// Drop empty strings and a zero year so they read as "not supplied".
    pub fn normalized(self) -> Self {
        fn non_empty(value: Option<String>) -> Option<String> {
            value.filter(|s| !s.is_empty())
        }

        Self {
            id: non_empty(self.id),
            title: non_empty(self.title),
            author: non_empty(self.author),
            year: self.year.filter(|y| *y != 0),
        }
    }

    /// True when the body carries no field that would change a record.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.year.is_none()
    }

    /// Build a new record with a service-assigned id.
    pub fn into_book(self, id: String) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            year: self.year,
        }
    }

    /// The fields to merge into an existing record. Never includes `id`.
    pub fn into_changes(self) -> Document {
        let mut changes = Document::new();
        if let Some(title) = self.title {
            changes.insert("title".into(), Value::String(title));
        }
        if let Some(author) = self.author {
            changes.insert("author".into(), Value::String(author));
        }
        if let Some(year) = self.year {
            changes.insert("year".into(), Value::from(year));
        }
        changes
    }
}

/// Body returned by a successful delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteConfirmation {
    pub message: String,
}

impl Default for DeleteConfirmation {
    fn default() -> Self {
        Self {
            message: "Book deleted successfully".to_string(),
        }
    }
}
