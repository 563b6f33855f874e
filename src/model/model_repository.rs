//! ModelRepository - Typed accessor for model CRUD operations.

use std::marker::PhantomData;

use super::{Document, Model, ModelError, ModelStore};
use crate::scope::RequestScope;

/// Typed repository wrapper for accessing models of a specific type.
///
/// Every call runs under the caller's `RequestScope`, so cancellation and
/// deadlines reach the store.
pub struct ModelRepository<'a, S, M> {
    store: &'a S,
    _marker: PhantomData<M>,
}

impl<'a, S: ModelStore, M: Model> ModelRepository<'a, S, M> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    /// All models in the collection.
    pub async fn all(&self, scope: &RequestScope) -> Result<Vec<M>, ModelError> {
        scope.run(self.store.find_models::<M>()).await
    }

    /// Get a model by ID.
    pub async fn get(&self, id: &str, scope: &RequestScope) -> Result<Option<M>, ModelError> {
        scope.run(self.store.get_model::<M>(id)).await
    }

    /// Insert a new model. Fails if it already exists.
    pub async fn insert(&self, model: &M, scope: &RequestScope) -> Result<(), ModelError> {
        scope.run(self.store.insert_model(model)).await
    }

    /// Merge fields into an existing model and return the stored result.
    pub async fn merge(
        &self,
        id: &str,
        changes: Document,
        scope: &RequestScope,
    ) -> Result<M, ModelError> {
        scope.run(self.store.merge_model::<M>(id, changes)).await
    }

    /// Delete a model by ID. Returns true if it existed.
    pub async fn delete(&self, id: &str, scope: &RequestScope) -> Result<bool, ModelError> {
        scope.run(self.store.delete_model::<M>(id)).await
    }
}

/// Extension trait for typed model access on any ModelStore.
pub trait ModelsExt: ModelStore + Sized {
    /// Get a typed model repository.
    fn models<M: Model>(&self) -> ModelRepository<'_, Self, M> {
        ModelRepository::new(self)
    }
}

impl<S: ModelStore> ModelsExt for S {}
