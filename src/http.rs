//! HTTP transport - maps the book routes onto `BookService`.
//!
//! Requires the `http` feature. Uses axum for routing.
//!
//! ## Routes
//!
//! - `GET /api/books`: list every book.
//! - `GET /api/books/:id`: one book, 404 if missing.
//! - `POST /api/books`: create from a JSON body, id assigned by the server.
//! - `PUT /api/books/:id`: merge the supplied fields into an existing book.
//! - `DELETE /api/books/:id`: remove a book, returns a confirmation message.
//! - `GET /health`: `{ "ok": true }` when the store answers a ping.
//!
//! Errors come back as `{ "error": "<message>" }` with 400, 404 or 500.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use bookshelf::{books::BookService, http, model::StoreClient};
//!
//! let store = StoreClient::connect(&config.store).await?;
//! let service = Arc::new(BookService::new(store));
//!
//! // Get the router to compose with other axum routes
//! let app = http::router(service.clone(), config.request_timeout());
//!
//! // Or serve directly
//! http::serve(service, &config).await?;
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;

use crate::books::{BookError, BookService};
use crate::config::ServerConfig;
use crate::model::ModelStore;
use crate::scope::RequestScope;

/// Shared handler state: the service plus the per-request deadline.
struct AppState<S> {
    service: Arc<BookService<S>>,
    request_timeout: Option<Duration>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

impl<S> AppState<S> {
    fn scope(&self) -> RequestScope {
        match self.request_timeout {
            Some(timeout) => RequestScope::with_timeout(timeout),
            None => RequestScope::unbounded(),
        }
    }
}

/// Build an axum `Router` serving the book routes over `service`.
///
/// `request_timeout` bounds every store call made on behalf of a request.
pub fn router<S: ModelStore + 'static>(
    service: Arc<BookService<S>>,
    request_timeout: Option<Duration>,
) -> Router {
    let state = AppState {
        service,
        request_timeout,
    };

    Router::new()
        .route("/health", get(health_handler::<S>))
        .route("/api/books", get(list_handler::<S>).post(create_handler::<S>))
        .route(
            "/api/books/:id",
            get(get_handler::<S>)
                .put(update_handler::<S>)
                .delete(delete_handler::<S>),
        )
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

/// Serve the book API at `config.socket_addr()` until Ctrl-C.
pub async fn serve<S: ModelStore + 'static>(
    service: Arc<BookService<S>>,
    config: &ServerConfig,
) -> Result<(), std::io::Error> {
    serve_with_shutdown(service, config, shutdown_signal()).await
}

/// Serve until `shutdown` resolves, then drain in-flight requests.
pub async fn serve_with_shutdown<S, F>(
    service: Arc<BookService<S>>,
    config: &ServerConfig,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    S: ModelStore + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(service, config.request_timeout());
    let listener = tokio::net::TcpListener::bind(config.socket_addr()).await?;
    log::info!("book API listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("shutdown signal received"),
        Err(err) => log::error!("failed to listen for shutdown signal: {}", err),
    }
}

/// `GET /health`
async fn health_handler<S: ModelStore + 'static>(State(state): State<AppState<S>>) -> Response {
    let scope = state.scope();
    let _cancel_on_drop = scope.drop_guard();
    match state.service.ping(&scope).await {
        Ok(()) => Json(json!({ "ok": true })).into_response(),
        Err(e) => {
            log::warn!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "ok": false, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// `GET /api/books`
async fn list_handler<S: ModelStore + 'static>(State(state): State<AppState<S>>) -> Response {
    let scope = state.scope();
    let _cancel_on_drop = scope.drop_guard();
    respond(state.service.list(&scope).await)
}

/// `GET /api/books/:id`
async fn get_handler<S: ModelStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Response {
    let scope = state.scope();
    let _cancel_on_drop = scope.drop_guard();
    respond(state.service.get(&id, &scope).await)
}

/// `POST /api/books`
async fn create_handler<S: ModelStore + 'static>(
    State(state): State<AppState<S>>,
    body: Bytes,
) -> Response {
    let scope = state.scope();
    let _cancel_on_drop = scope.drop_guard();
    respond(state.service.create(&body, &scope).await)
}

/// `PUT /api/books/:id`
async fn update_handler<S: ModelStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let scope = state.scope();
    let _cancel_on_drop = scope.drop_guard();
    respond(state.service.update(&id, &body, &scope).await)
}

/// `DELETE /api/books/:id`
async fn delete_handler<S: ModelStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Response {
    let scope = state.scope();
    let _cancel_on_drop = scope.drop_guard();
    respond(state.service.delete(&id, &scope).await)
}

fn respond<T: Serialize>(result: Result<T, BookError>) -> Response {
    match result {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(e) => error_response(e),
    }
}

fn error_response(err: BookError) -> Response {
    match &err {
        BookError::Storage(source) => log::error!("book store failure: {}", source),
        BookError::NotFound(id) => log::debug!("book {} not found", id),
        BookError::Validation(msg) => log::debug!("rejected request body: {}", msg),
    }

    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

/// Log method, path, status and latency of every request.
async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    log::info!(
        "{} {} -> {} in {:?}",
        method,
        path,
        response.status().as_u16(),
        started.elapsed()
    );
    response
}
