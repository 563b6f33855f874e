//! BookService - the five book operations, bound to one store.
//!
//! The store and id generator are injected at construction, so the same
//! handlers run against the configured `StoreClient` in production and an
//! `InMemoryModelStore` in tests.
//!
//! ## Example
//!
//! ```ignore
//! use bookshelf::books::BookService;
//! use bookshelf::model::InMemoryModelStore;
//! use bookshelf::RequestScope;
//!
//! let service = BookService::new(InMemoryModelStore::new());
//! let scope = RequestScope::unbounded();
//!
//! let book = service.create(br#"{"title":"Dune"}"#, &scope).await?;
//! let same = service.get(&book.id, &scope).await?;
//! ```

use std::sync::Arc;

use super::book::{Book, BookInput, DeleteConfirmation};
use super::error::BookError;
use crate::ids::{IdGenerator, UuidIdGenerator};
use crate::model::{ModelError, ModelStore, ModelsExt};
use crate::scope::RequestScope;

/// How many fresh ids create will try before giving up on a duplicate key.
pub const MAX_ID_ATTEMPTS: usize = 3;

/// Book handlers over a shared store handle.
pub struct BookService<S> {
    store: S,
    ids: Arc<dyn IdGenerator>,
}

impl<S: ModelStore> BookService<S> {
    /// Create a service over `store` that assigns UUID ids.
    pub fn new(store: S) -> Self {
        Self {
            store,
            ids: Arc::new(UuidIdGenerator),
        }
    }

    /// Replace the id generator.
    ///
    /// Uses builder pattern, returns `self` for chaining.
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Store liveness, for health checks.
    pub async fn ping(&self, scope: &RequestScope) -> Result<(), BookError> {
        Ok(scope.run(self.store.ping()).await?)
    }

    /// All books, in store order. An empty store gives an empty list.
    pub async fn list(&self, scope: &RequestScope) -> Result<Vec<Book>, BookError> {
        Ok(self.store.models::<Book>().all(scope).await?)
    }

    /// One book by id.
    pub async fn get(&self, id: &str, scope: &RequestScope) -> Result<Book, BookError> {
        self.store
            .models::<Book>()
            .get(id, scope)
            .await?
            .ok_or_else(|| BookError::NotFound(id.to_string()))
    }

    /// Decode a request body and create a book from it.
    ///
    /// A malformed body fails before the store is touched.
    pub async fn create(&self, body: &[u8], scope: &RequestScope) -> Result<Book, BookError> {
        let input = BookInput::from_json(body)?;
        self.create_book(input, scope).await
    }

    /// Create a book with a freshly generated id.
    ///
    /// The store rejects duplicate keys; on a collision a new id is drawn, up
    /// to [`MAX_ID_ATTEMPTS`] times.
    pub async fn create_book(
        &self,
        input: BookInput,
        scope: &RequestScope,
    ) -> Result<Book, BookError> {
        let books = self.store.models::<Book>();

        for attempt in 1..=MAX_ID_ATTEMPTS {
            let book = input.clone().into_book(self.ids.next_id());
            match books.insert(&book, scope).await {
                Ok(()) => {
                    log::debug!("created book {}", book.id);
                    return Ok(book);
                }
                Err(ModelError::Duplicate { id, .. }) => {
                    log::warn!(
                        "generated book id {} already taken (attempt {}/{})",
                        id,
                        attempt,
                        MAX_ID_ATTEMPTS
                    );
                }
                Err(err) => return Err(BookError::Storage(err)),
            }
        }

        Err(BookError::Storage(ModelError::Storage(format!(
            "no unique book id after {} attempts",
            MAX_ID_ATTEMPTS
        ))))
    }

    /// Decode a request body and merge it into the book with this id.
    pub async fn update(
        &self,
        id: &str,
        body: &[u8],
        scope: &RequestScope,
    ) -> Result<Book, BookError> {
        let input = BookInput::from_json(body)?;
        self.update_book(id, input, scope).await
    }

    /// Merge the supplied fields into an existing book.
    ///
    /// Fields absent from `input` keep their stored values and `id` never
    /// changes. Returns the book as stored after the merge.
    pub async fn update_book(
        &self,
        id: &str,
        input: BookInput,
        scope: &RequestScope,
    ) -> Result<Book, BookError> {
        let book = self
            .store
            .models::<Book>()
            .merge(id, input.into_changes(), scope)
            .await?;
        log::debug!("updated book {}", id);
        Ok(book)
    }

    /// Remove a book.
    pub async fn delete(
        &self,
        id: &str,
        scope: &RequestScope,
    ) -> Result<DeleteConfirmation, BookError> {
        if !self.store.models::<Book>().delete(id, scope).await? {
            return Err(BookError::NotFound(id.to_string()));
        }
        log::debug!("deleted book {}", id);
        Ok(DeleteConfirmation::default())
    }
}
