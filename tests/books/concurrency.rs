//! Concurrent creates must never hand out the same id twice.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bookshelf::{BookService, IdGenerator, InMemoryModelStore, TimestampIdGenerator};
use serde_json::json;

use crate::support::{body, scope};

const WRITERS: usize = 64;

async fn create_concurrently(service: Arc<BookService<InMemoryModelStore>>) -> Vec<String> {
    let mut tasks = Vec::new();
    for n in 0..WRITERS {
        let service = service.clone();
        tasks.push(tokio::spawn(async move {
            service
                .create(&body(&json!({ "title": format!("Book {n}") })), &scope())
                .await
                .unwrap()
                .id
        }));
    }

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap());
    }
    ids
}

/// Hands out every id twice, like a clock that ticks once per two calls.
struct CoarseClock(AtomicUsize);

impl IdGenerator for CoarseClock {
    fn next_id(&self) -> String {
        format!("tick-{}", self.0.fetch_add(1, Ordering::SeqCst) / 2)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn default_generator_gives_distinct_ids() {
    let service = Arc::new(BookService::new(InMemoryModelStore::new()));

    let ids = create_concurrently(service.clone()).await;

    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), WRITERS);
    assert_eq!(service.list(&scope()).await.unwrap().len(), WRITERS);
}

// Every create draws an id already handed to the previous create, so each
// one after the first hits a duplicate key before succeeding.
#[tokio::test]
async fn colliding_generator_is_rescued_by_store_uniqueness() {
    let clock = CoarseClock(AtomicUsize::new(0));
    assert_eq!(clock.next_id(), clock.next_id());

    let service = Arc::new(
        BookService::new(InMemoryModelStore::new())
            .with_id_generator(CoarseClock(AtomicUsize::new(0))),
    );

    let ids = create_concurrently(service.clone()).await;

    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), WRITERS);
    assert_eq!(service.list(&scope()).await.unwrap().len(), WRITERS);
}

#[tokio::test]
async fn timestamp_generator_still_produces_records() {
    let service =
        BookService::new(InMemoryModelStore::new()).with_id_generator(TimestampIdGenerator);

    let book = service
        .create(&body(&json!({ "title": "Legacy" })), &scope())
        .await
        .unwrap();
    assert!(book.id.chars().all(|c| c.is_ascii_digit()));
}
