//! StoreClient - the long-lived store handle shared by every request.

use async_trait::async_trait;

use super::{Document, FileModelStore, InMemoryModelStore, Model, ModelError, ModelStore};
use crate::config::{StoreBackend, StoreConfig};

/// The store could not be established or verified at startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to open {backend:?} store: {source}")]
    Connect {
        backend: StoreBackend,
        #[source]
        source: ModelError,
    },
    #[error("{backend:?} store failed liveness check: {source}")]
    Ping {
        backend: StoreBackend,
        #[source]
        source: ModelError,
    },
}

/// Handle to the configured document store.
///
/// Established once with [`StoreClient::connect`] before serving, then cloned
/// into the handler set. Clones share the same underlying store.
#[derive(Clone)]
pub enum StoreClient {
    Memory(InMemoryModelStore),
    File(FileModelStore),
}

impl StoreClient {
    /// Open the configured backend and verify it answers a ping.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StartupError> {
        let client = match config.backend {
            StoreBackend::Memory => StoreClient::Memory(InMemoryModelStore::new()),
            StoreBackend::File => {
                let store = FileModelStore::open(&config.data_dir)
                    .await
                    .map_err(|source| StartupError::Connect {
                        backend: config.backend,
                        source,
                    })?;
                StoreClient::File(store)
            }
        };

        client.ping().await.map_err(|source| StartupError::Ping {
            backend: config.backend,
            source,
        })?;

        log::info!("connected to {:?} document store", config.backend);
        Ok(client)
    }

    pub fn backend(&self) -> StoreBackend {
        match self {
            StoreClient::Memory(_) => StoreBackend::Memory,
            StoreClient::File(_) => StoreBackend::File,
        }
    }
}

#[async_trait]
impl ModelStore for StoreClient {
    async fn ping(&self) -> Result<(), ModelError> {
        match self {
            StoreClient::Memory(store) => store.ping().await,
            StoreClient::File(store) => store.ping().await,
        }
    }

    async fn find_models<M: Model>(&self) -> Result<Vec<M>, ModelError> {
        match self {
            StoreClient::Memory(store) => store.find_models().await,
            StoreClient::File(store) => store.find_models().await,
        }
    }

    async fn get_model<M: Model>(&self, id: &str) -> Result<Option<M>, ModelError> {
        match self {
            StoreClient::Memory(store) => store.get_model(id).await,
            StoreClient::File(store) => store.get_model(id).await,
        }
    }

    async fn insert_model<M: Model>(&self, model: &M) -> Result<(), ModelError> {
        match self {
            StoreClient::Memory(store) => store.insert_model(model).await,
            StoreClient::File(store) => store.insert_model(model).await,
        }
    }

    async fn merge_model<M: Model>(&self, id: &str, changes: Document) -> Result<M, ModelError> {
        match self {
            StoreClient::Memory(store) => store.merge_model(id, changes).await,
            StoreClient::File(store) => store.merge_model(id, changes).await,
        }
    }

    async fn delete_model<M: Model>(&self, id: &str) -> Result<bool, ModelError> {
        match self {
            StoreClient::Memory(store) => store.delete_model::<M>(id).await,
            StoreClient::File(store) => store.delete_model::<M>(id).await,
        }
    }
}
