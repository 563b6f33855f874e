//! Identifier generation for newly created records.

use std::time::{SystemTime, UNIX_EPOCH};

/// Produces primary keys for new documents.
///
/// Generators are not required to be collision-free on their own; callers
/// insert with a uniqueness-enforcing store and ask for another id on a
/// duplicate key.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random version 4 UUIDs. The default.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Nanoseconds since the Unix epoch as a decimal string.
///
/// Kept for deployments that already hold ids in this shape. Two calls in the
/// same clock tick return the same value.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimestampIdGenerator;

impl IdGenerator for TimestampIdGenerator {
    fn next_id(&self) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        format!("{}", nanos)
    }
}

impl<F> IdGenerator for F
where
    F: Fn() -> String + Send + Sync,
{
    fn next_id(&self) -> String {
        self()
    }
}
