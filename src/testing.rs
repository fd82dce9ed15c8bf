//! Scripted data sources for service tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::Page;
use crate::error::ListingError;
use crate::source::{ItemRefresher, PageRequest, PageSource};

type PageScript<T> = dyn Fn(&PageRequest) -> (Duration, Result<Page<T>, ListingError>) + Send + Sync;
type RefreshScript<T> = dyn Fn(&T) -> Result<T, ListingError> + Send + Sync;

/// Answers each page request with a scripted delay and outcome.
pub(crate) struct ScriptedSource<T> {
    script: Box<PageScript<T>>,
    requests: std::sync::Mutex<Vec<PageRequest>>,
}

impl<T> std::fmt::Debug for ScriptedSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedSource").finish_non_exhaustive()
    }
}

impl<T> ScriptedSource<T> {
    pub(crate) fn new<F>(script: F) -> Arc<Self>
    where
        F: Fn(&PageRequest) -> (Duration, Result<Page<T>, ListingError>) + Send + Sync + 'static,
    {
        Arc::new(Self {
            script: Box::new(script),
            requests: std::sync::Mutex::new(Vec::new()),
        })
    }

    /// Requests received so far, in arrival order.
    pub(crate) fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> PageSource<T> for ScriptedSource<T> {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<T>, ListingError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let (delay, outcome) = (self.script)(request);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        outcome
    }
}

/// Refreshes items through a script and counts calls.
pub(crate) struct ScriptedRefresher<T> {
    script: Box<RefreshScript<T>>,
    calls: AtomicUsize,
}

impl<T> std::fmt::Debug for ScriptedRefresher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedRefresher")
            .field("calls", &self.calls)
            .finish_non_exhaustive()
    }
}

impl<T> ScriptedRefresher<T> {
    pub(crate) fn new<F>(script: F) -> Arc<Self>
    where
        F: Fn(&T) -> Result<T, ListingError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            script: Box::new(script),
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> ItemRefresher<T> for ScriptedRefresher<T> {
    async fn refresh(&self, item: &T) -> Result<T, ListingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.script)(item)
    }
}
