//! bookshelf - a book resource API over a pluggable document store.
//!
//! Layers, leaves first:
//!
//! - [`model`]: the document-store abstraction (`ModelStore`), its in-memory
//!   and file backends, and the `StoreClient` handle built once at startup.
//! - [`scope`]: `RequestScope`, the cancellation token and deadline that
//!   every store call runs under.
//! - [`ids`]: id generators for new records.
//! - [`books`]: the `Book` record and `BookService`, one operation per verb.
//! - [`http`]: the axum router and server (feature `http`).

pub mod books;
pub mod config;
pub mod ids;
pub mod logging;
pub mod model;
pub mod scope;

#[cfg(feature = "http")]
pub mod http;

pub use books::{Book, BookError, BookInput, BookService, DeleteConfirmation};
pub use config::{ServerConfig, StoreBackend, StoreConfig};
pub use ids::{IdGenerator, TimestampIdGenerator, UuidIdGenerator};
pub use model::{
    FileModelStore, InMemoryModelStore, Model, ModelError, ModelStore, ModelsExt, StartupError,
    StoreClient,
};
pub use scope::RequestScope;
