//! Models - typed documents held in a document store.
//!
//! A model is any serde type that names its collection and exposes a
//! primary key. Stores hold models as JSON documents, one per id, and
//! support the five operations a resource endpoint needs: find-all,
//! find-by-id, insert, merge-by-id and delete-by-id.
//!
//! ## Example
//!
//! ```ignore
//! use bookshelf::model::{InMemoryModelStore, Model, ModelsExt};
//! use bookshelf::RequestScope;
//!
//! #[derive(Serialize, Deserialize, Clone)]
//! struct Shelf {
//!     pub id: String,
//!     pub label: String,
//! }
//!
//! impl Model for Shelf {
//!     const COLLECTION: &'static str = "shelves";
//!     fn id(&self) -> &str { &self.id }
//! }
//!
//! let store = InMemoryModelStore::new();
//! let scope = RequestScope::unbounded();
//! store.models::<Shelf>().insert(&shelf, &scope).await?;
//! let loaded = store.models::<Shelf>().get("shelf-1", &scope).await?;
//! ```

mod client;
mod file;
mod in_memory;
mod model_repository;
mod store;

use serde::{de::DeserializeOwned, Serialize};

/// A stored document: a flat JSON object.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Trait for types that can be stored as models.
pub trait Model: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// The collection name for this model type (e.g., "books").
    /// Maps to a collection in MongoDB, a directory on disk, a key prefix in KV stores, etc.
    const COLLECTION: &'static str;

    /// Returns the unique identifier for this model instance.
    fn id(&self) -> &str;
}

/// Error type for model store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A document with this primary key already exists.
    #[error("duplicate key {collection}:{id}")]
    Duplicate { collection: String, id: String },
    /// Model not found.
    #[error("model not found: {collection}:{id}")]
    NotFound { collection: String, id: String },
    /// Serialization/deserialization error.
    #[error("model serialization error: {0}")]
    Serde(String),
    /// Storage-level error.
    #[error("model storage error: {0}")]
    Storage(String),
    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The caller went away before the operation finished.
    #[error("operation cancelled")]
    Cancelled,
    /// The request deadline elapsed before the operation finished.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl ModelError {
    pub(crate) fn not_found(collection: &str, id: &str) -> Self {
        ModelError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub(crate) fn duplicate(collection: &str, id: &str) -> Self {
        ModelError::Duplicate {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serde(err.to_string())
    }
}

/// Serialize a model into its stored document form.
pub(crate) fn to_document<M: Model>(model: &M) -> Result<Document, ModelError> {
    match serde_json::to_value(model)? {
        serde_json::Value::Object(doc) => Ok(doc),
        other => Err(ModelError::Serde(format!(
            "{} model must serialize to an object, got {}",
            M::COLLECTION,
            other
        ))),
    }
}

/// Decode a stored document back into a model.
pub(crate) fn from_document<M: Model>(doc: Document) -> Result<M, ModelError> {
    Ok(serde_json::from_value(serde_json::Value::Object(doc))?)
}

/// Apply a `$set`-style merge: every top-level key in `changes` overwrites
/// the stored value, keys absent from `changes` are left alone.
pub(crate) fn merge_into(target: &mut Document, changes: Document) {
    for (key, value) in changes {
        target.insert(key, value);
    }
}

pub use client::{StartupError, StoreClient};
pub use file::FileModelStore;
pub use in_memory::InMemoryModelStore;
pub use model_repository::{ModelRepository, ModelsExt};
pub use store::ModelStore;
