//! Shared fixtures: services over fresh stores and a live HTTP server.

use bookshelf::{BookService, InMemoryModelStore, RequestScope};
use serde_json::{json, Value};

pub fn memory_service() -> BookService<InMemoryModelStore> {
    BookService::new(InMemoryModelStore::new())
}

pub fn scope() -> RequestScope {
    RequestScope::unbounded()
}

pub fn dune() -> Value {
    json!({ "title": "Dune", "author": "Herbert", "year": 1965 })
}

pub fn body(value: &Value) -> Vec<u8> {
    serde_json::to_vec(value).unwrap()
}

#[cfg(feature = "http")]
pub use server::*;

#[cfg(feature = "http")]
mod server {
    use std::sync::Arc;
    use std::time::Duration;

    use bookshelf::{BookService, ModelStore};

    /// Bind to port 0 and return the base URL of the running server.
    pub async fn start_server<S: ModelStore + 'static>(service: Arc<BookService<S>>) -> String {
        start_server_with_timeout(service, Some(Duration::from_secs(5))).await
    }

    pub async fn start_server_with_timeout<S: ModelStore + 'static>(
        service: Arc<BookService<S>>,
        request_timeout: Option<Duration>,
    ) -> String {
        let app = bookshelf::http::router(service, request_timeout);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }
}
