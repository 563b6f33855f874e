//! ModelStore - abstract document storage for models.

use async_trait::async_trait;

use super::{Document, Model, ModelError};

/// Abstract document storage for models.
///
/// Implementations must tolerate concurrent use through `&self`; each call
/// is atomic for the single document it touches and nothing more.
#[async_trait]
pub trait ModelStore: Send + Sync {
    /// Liveness check. Used once at startup and by health probes.
    async fn ping(&self) -> Result<(), ModelError>;

    /// Every model in the collection, in store-defined order.
    ///
    /// A document that fails to decode fails the whole call.
    async fn find_models<M: Model>(&self) -> Result<Vec<M>, ModelError>;

    /// Get a model by ID. Returns None if not found.
    async fn get_model<M: Model>(&self, id: &str) -> Result<Option<M>, ModelError>;

    /// Insert a new model. Fails with `Duplicate` if the id is taken.
    async fn insert_model<M: Model>(&self, model: &M) -> Result<(), ModelError>;

    /// Merge `changes` into the stored document and return the result.
    ///
    /// Keys present in `changes` overwrite, everything else is kept.
    /// Fails with `NotFound` if there is no document with this id.
    async fn merge_model<M: Model>(&self, id: &str, changes: Document) -> Result<M, ModelError>;

    /// Delete a model by ID. Returns true if it existed.
    async fn delete_model<M: Model>(&self, id: &str) -> Result<bool, ModelError>;
}
