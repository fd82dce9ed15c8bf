//! Transaction history of a launch, one async request per pair.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::AsyncRequest;
use crate::domain::{AsyncState, TransactionPage};
use crate::source::TransactionSource;

/// Default transaction page size.
pub const DEFAULT_TRANSACTIONS_PAGE_SIZE: u32 = 10;

/// Idle requests are evicted once this many pairs are tracked.
const MAX_TRACKED_PAIRS: usize = 1024;

type PairRequest = AsyncRequest<(u32, u32), TransactionPage>;

/// Fetches paged transaction histories.
///
/// Each pair gets its own [`AsyncRequest`], so a slow page of one pair
/// never overwrites a newer page of the same pair and the caller always
/// gets `{ value, loading, error }` back instead of a failure.
#[derive(Clone)]
pub struct TransactionService {
    source: Arc<dyn TransactionSource>,
    page_size: u32,
    requests: Arc<RwLock<HashMap<String, PairRequest>>>,
}

impl std::fmt::Debug for TransactionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionService")
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl TransactionService {
    /// Creates a service with `page_size` rows per page (at least 1).
    #[must_use]
    pub fn new(source: Arc<dyn TransactionSource>, page_size: u32) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            requests: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Default page size.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Fetches one-based `page` of `pair`'s history.
    pub async fn fetch(
        &self,
        pair: &str,
        page: u32,
        page_size: Option<u32>,
    ) -> AsyncState<TransactionPage> {
        let request = self.request_for(&pair.to_lowercase()).await;
        let page_size = page_size.filter(|s| *s > 0).unwrap_or(self.page_size);
        request.call((page.max(1), page_size)).await
    }

    /// Latest state of `pair`'s history, if it was ever requested.
    pub async fn state(&self, pair: &str) -> Option<AsyncState<TransactionPage>> {
        let request = self.requests.read().await.get(&pair.to_lowercase()).cloned();
        match request {
            Some(request) => Some(request.state().await),
            None => None,
        }
    }

    async fn request_for(&self, pair: &str) -> PairRequest {
        if let Some(request) = self.requests.read().await.get(pair) {
            return request.clone();
        }
        let mut requests = self.requests.write().await;
        if requests.len() >= MAX_TRACKED_PAIRS {
            let mut idle = Vec::new();
            for (key, request) in requests.iter() {
                if !request.is_loading().await {
                    idle.push(key.clone());
                }
            }
            for key in idle {
                requests.remove(&key);
            }
        }
        let source = Arc::clone(&self.source);
        let owned_pair = pair.to_string();
        requests
            .entry(pair.to_string())
            .or_insert_with(|| {
                AsyncRequest::new(move |(page, page_size): (u32, u32)| {
                    let source = Arc::clone(&source);
                    let pair = owned_pair.clone();
                    async move { source.fetch_transactions(&pair, page, page_size).await }
                })
            })
            .clone()
    }
}
