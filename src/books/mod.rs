//! Books - the one resource this service exposes.
//!
//! `Book` is the stored record, `BookInput` the partial body accepted by
//! create and update, and `BookService` the handler set that validates
//! input, talks to the store and maps failures into `BookError`.
//!
//! ## Update contract
//!
//! Update is a field-level merge. Only fields present in the body (and not
//! empty or zero) change; the rest keep their stored values. The response
//! is the record as stored after the merge.

mod book;
mod error;
mod service;

pub use book::{Book, BookInput, DeleteConfirmation};
pub use error::BookError;
pub use service::{BookService, MAX_ID_ATTEMPTS};
