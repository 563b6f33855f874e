//! InMemoryModelStore - HashMap-backed model store for testing and development.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::{from_document, merge_into, to_document, Document, Model, ModelError, ModelStore};

/// In-memory model store backed by a HashMap.
///
/// Storage key is `"COLLECTION:id"`. Clone-friendly via Arc.
#[derive(Clone)]
pub struct InMemoryModelStore {
    storage: Arc<RwLock<HashMap<String, Document>>>,
}

impl Default for InMemoryModelStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryModelStore {
    /// Create a new empty model store.
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn make_key(collection: &str, id: &str) -> String {
        format!("{}:{}", collection, id)
    }

    /// Number of documents across all collections.
    pub fn len(&self) -> usize {
        self.storage.read().map(|s| s.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store a raw document, bypassing model encoding. Used to seed
    /// corrupt or legacy data in tests.
    pub fn put_raw(&self, collection: &str, id: &str, doc: Document) -> Result<(), ModelError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| ModelError::Storage("lock poisoned".into()))?;
        storage.insert(Self::make_key(collection, id), doc);
        Ok(())
    }
}

#[async_trait]
impl ModelStore for InMemoryModelStore {
    async fn ping(&self) -> Result<(), ModelError> {
        self.storage
            .read()
            .map(|_| ())
            .map_err(|_| ModelError::Unavailable("lock poisoned".into()))
    }

    async fn find_models<M: Model>(&self) -> Result<Vec<M>, ModelError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| ModelError::Storage("lock poisoned".into()))?;

        let prefix = format!("{}:", M::COLLECTION);
        storage
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, doc)| from_document(doc.clone()))
            .collect()
    }

    async fn get_model<M: Model>(&self, id: &str) -> Result<Option<M>, ModelError> {
        let key = Self::make_key(M::COLLECTION, id);
        let storage = self
            .storage
            .read()
            .map_err(|_| ModelError::Storage("lock poisoned".into()))?;

        match storage.get(&key) {
            Some(doc) => Ok(Some(from_document(doc.clone())?)),
            None => Ok(None),
        }
    }

    async fn insert_model<M: Model>(&self, model: &M) -> Result<(), ModelError> {
        let key = Self::make_key(M::COLLECTION, model.id());
        let doc = to_document(model)?;

        let mut storage = self
            .storage
            .write()
            .map_err(|_| ModelError::Storage("lock poisoned".into()))?;

        if storage.contains_key(&key) {
            return Err(ModelError::duplicate(M::COLLECTION, model.id()));
        }

        storage.insert(key, doc);
        Ok(())
    }

    async fn merge_model<M: Model>(&self, id: &str, changes: Document) -> Result<M, ModelError> {
        let key = Self::make_key(M::COLLECTION, id);

        let mut storage = self
            .storage
            .write()
            .map_err(|_| ModelError::Storage("lock poisoned".into()))?;

        let stored = storage
            .get(&key)
            .ok_or_else(|| ModelError::not_found(M::COLLECTION, id))?;

        let mut merged = stored.clone();
        merge_into(&mut merged, changes);
        let model: M = from_document(merged.clone())?;
        if model.id() != id {
            return Err(ModelError::Storage(format!(
                "merge would change primary key {}:{}",
                M::COLLECTION,
                id
            )));
        }

        storage.insert(key, merged);
        Ok(model)
    }

    async fn delete_model<M: Model>(&self, id: &str) -> Result<bool, ModelError> {
        let key = Self::make_key(M::COLLECTION, id);
        let mut storage = self
            .storage
            .write()
            .map_err(|_| ModelError::Storage("lock poisoned".into()))?;

        Ok(storage.remove(&key).is_some())
    }
}
