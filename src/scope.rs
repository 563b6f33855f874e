//! Request-scoped cancellation and deadlines for store calls.
//!
//! Every store operation runs under a `RequestScope`. The HTTP layer creates
//! one per request; when the caller disconnects the request future is dropped,
//! the scope's drop guard fires, and any store call still racing the token
//! is abandoned.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::model::ModelError;

/// Cancellation token plus optional deadline, passed into every store call.
#[derive(Debug, Clone)]
pub struct RequestScope {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for RequestScope {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl RequestScope {
    /// A scope with no deadline that is only cancelled explicitly.
    pub fn unbounded() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// A scope that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Guard that cancels this scope when dropped.
    pub fn drop_guard(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }

    /// Run a store future under this scope.
    ///
    /// The future is dropped, and so aborted, as soon as the scope is
    /// cancelled or its deadline passes.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, ModelError>
    where
        F: Future<Output = Result<T, ModelError>>,
    {
        if self.token.is_cancelled() {
            return Err(ModelError::Cancelled);
        }

        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => Err(ModelError::Cancelled),
                    _ = tokio::time::sleep_until(deadline) => Err(ModelError::DeadlineExceeded),
                    result = fut => result,
                }
            }
            None => {
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => Err(ModelError::Cancelled),
                    result = fut => result,
                }
            }
        }
    }
}
