//! Wraps an async operation so callers observe it as an [`AsyncState`].

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio::sync::RwLock;

use crate::domain::AsyncState;
use crate::error::ListingError;

type Operation<A, T> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<T, ListingError>> + Send + Sync>;

/// Async operation plus the observable state of its latest call.
///
/// [`call`](Self::call) never fails: the operation's error lands in
/// [`AsyncState::error`]. Overlapping calls are not queued; the latest
/// issued call owns the state and earlier settlements are dropped.
pub struct AsyncRequest<A, T> {
    operation: Operation<A, T>,
    state: Arc<RwLock<AsyncState<T>>>,
}

impl<A, T> fmt::Debug for AsyncRequest<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncRequest").finish_non_exhaustive()
    }
}

impl<A, T> Clone for AsyncRequest<A, T> {
    fn clone(&self) -> Self {
        Self {
            operation: Arc::clone(&self.operation),
            state: Arc::clone(&self.state),
        }
    }
}

impl<A, T> AsyncRequest<A, T>
where
    A: Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Wraps `operation`. The state starts idle with no value.
    pub fn new<F, Fut>(operation: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ListingError>> + Send + 'static,
    {
        Self {
            operation: Arc::new(move |args| Box::pin(operation(args))),
            state: Arc::new(RwLock::new(AsyncState::new())),
        }
    }

    /// Runs the operation with `args` and returns the resulting state.
    ///
    /// `loading` is set before the operation starts. If another call was
    /// issued meanwhile, this call's outcome is dropped and the returned
    /// state still reflects the newer call.
    pub async fn call(&self, args: A) -> AsyncState<T> {
        let epoch = self.state.write().await.start();
        let outcome = (self.operation)(args).await;
        let mut state = self.state.write().await;
        if let Err(err) = &outcome {
            tracing::debug!(epoch = epoch.get(), error = %err, "async request failed");
        }
        if !state.settle(epoch, outcome) {
            tracing::debug!(epoch = epoch.get(), "stale async request result dropped");
        }
        state.clone()
    }

    /// Current state.
    pub async fn state(&self) -> AsyncState<T> {
        self.state.read().await.clone()
    }

    /// Returns `true` while the latest issued call is unsettled.
    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }
}
