//! HTTP transport integration tests.
//!
//! Starts an axum server and exercises it with reqwest.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use bookshelf::model::Document;
use bookshelf::{BookService, InMemoryModelStore, Model, ModelError, ModelStore};
use serde_json::{json, Value};

use crate::support::{dune, memory_service, start_server, start_server_with_timeout};

async fn server() -> String {
    start_server(Arc::new(memory_service())).await
}

async fn create(client: &reqwest::Client, base: &str, body: &Value) -> Value {
    let resp = client
        .post(format!("{base}/api/books"))
        .json(body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}

#[tokio::test]
async fn health_check() {
    let base = server().await;
    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn create_get_delete_scenario() {
    let base = server().await;
    let client = reqwest::Client::new();

    // Create
    let created = create(&client, &base, &dune()).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());
    assert_eq!(
        created,
        json!({ "id": id, "title": "Dune", "author": "Herbert", "year": 1965 })
    );

    // Get
    let resp = client
        .get(format!("{base}/api/books/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, created);

    // Delete
    let resp = client
        .delete(format!("{base}/api/books/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Book deleted successfully" }));

    // Gone
    let resp = client
        .get(format!("{base}/api/books/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains(&id));
}

#[tokio::test]
async fn list_starts_empty_then_grows() {
    let base = server().await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/api/books")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!([]));

    let mut ids = Vec::new();
    for title in ["Dune", "Ubik", "Solaris"] {
        let created = create(&client, &base, &json!({ "title": title })).await;
        ids.push(created["id"].as_str().unwrap().to_string());
    }

    let body: Value = client
        .get(format!("{base}/api/books"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let listed: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_str().unwrap())
        .collect();
    assert_eq!(listed.len(), 3);
    for id in &ids {
        assert!(listed.contains(&id.as_str()));
    }
}

#[tokio::test]
async fn put_merges_fields() {
    let base = server().await;
    let client = reqwest::Client::new();
    let created = create(&client, &base, &dune()).await;
    let id = created["id"].as_str().unwrap();

    let resp = client
        .put(format!("{base}/api/books/{id}"))
        .json(&json!({ "year": 1966 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "id": id, "title": "Dune", "author": "Herbert", "year": 1966 })
    );

    let fetched: Value = client
        .get(format!("{base}/api/books/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, body);
}

#[tokio::test]
async fn put_and_delete_unknown_id_return_404() {
    let base = server().await;
    let client = reqwest::Client::new();

    let resp = client
        .put(format!("{base}/api/books/nope"))
        .json(&json!({ "year": 1966 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client
        .delete(format!("{base}/api/books/nope"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn malformed_bodies_return_400_and_change_nothing() {
    let base = server().await;
    let client = reqwest::Client::new();
    let created = create(&client, &base, &dune()).await;
    let id = created["id"].as_str().unwrap();

    for bad in ["{", "[]", r#"{"year":"1965"}"#, ""] {
        let resp = client
            .post(format!("{base}/api/books"))
            .header("content-type", "application/json")
            .body(bad)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "POST {bad:?}");
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].is_string());

        let resp = client
            .put(format!("{base}/api/books/{id}"))
            .body(bad)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "PUT {bad:?}");
    }

    let listed: Value = client
        .get(format!("{base}/api/books"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed, json!([created]));
}

#[tokio::test]
async fn body_without_content_type_is_accepted() {
    let base = server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/api/books"))
        .body(r#"{"title":"Plain"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["title"], "Plain");
}

/// A store whose every call stalls, to exercise deadlines and disconnects.
#[derive(Clone, Default)]
struct StalledStore {
    inner: InMemoryModelStore,
    started: Arc<Notify>,
    finished: Arc<AtomicBool>,
    abandoned: Arc<AtomicBool>,
}

/// Sets its flag if dropped while still armed.
struct AbandonFlag(Option<Arc<AtomicBool>>);

impl Drop for AbandonFlag {
    fn drop(&mut self) {
        if let Some(flag) = self.0.take() {
            flag.store(true, Ordering::SeqCst);
        }
    }
}

impl StalledStore {
    async fn stall(&self) {
        self.started.notify_one();
        let mut abandon = AbandonFlag(Some(self.abandoned.clone()));
        tokio::time::sleep(Duration::from_secs(5)).await;
        abandon.0 = None;
        self.finished.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ModelStore for StalledStore {
    async fn ping(&self) -> Result<(), ModelError> {
        self.stall().await;
        self.inner.ping().await
    }

    async fn find_models<M: Model>(&self) -> Result<Vec<M>, ModelError> {
        self.stall().await;
        self.inner.find_models().await
    }

    async fn get_model<M: Model>(&self, id: &str) -> Result<Option<M>, ModelError> {
        self.stall().await;
        self.inner.get_model(id).await
    }

    async fn insert_model<M: Model>(&self, model: &M) -> Result<(), ModelError> {
        self.stall().await;
        self.inner.insert_model(model).await
    }

    async fn merge_model<M: Model>(&self, id: &str, changes: Document) -> Result<M, ModelError> {
        self.stall().await;
        self.inner.merge_model(id, changes).await
    }

    async fn delete_model<M: Model>(&self, id: &str) -> Result<bool, ModelError> {
        self.stall().await;
        self.inner.delete_model::<M>(id).await
    }
}

#[tokio::test]
async fn request_deadline_aborts_store_call() {
    let store = StalledStore::default();
    let finished = store.finished.clone();
    let base = start_server_with_timeout(
        Arc::new(BookService::new(store)),
        Some(Duration::from_millis(50)),
    )
    .await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/api/books")).send().await.unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "error": "storage error: deadline exceeded" }));

    let resp = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.status(), 503);

    assert!(!finished.load(Ordering::SeqCst));
}

#[tokio::test]
async fn client_disconnect_aborts_store_call() {
    let store = StalledStore::default();
    let started = store.started.clone();
    let finished = store.finished.clone();
    let abandoned = store.abandoned.clone();
    let base = start_server_with_timeout(Arc::new(BookService::new(store)), None).await;

    let request = tokio::spawn(async move { reqwest::get(format!("{base}/api/books")).await });
    tokio::time::timeout(Duration::from_secs(2), started.notified())
        .await
        .expect("store call never started");

    // Dropping the client closes the connection mid-request.
    request.abort();

    tokio::time::timeout(Duration::from_secs(2), async {
        while !abandoned.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("store call kept running after the client left");
    assert!(!finished.load(Ordering::SeqCst));
}
