//! Data source boundary: paged queries and per-item refreshes.
//!
//! The listing core only depends on the [`PageSource`] and
//! [`ItemRefresher`] traits. [`IndexerClient`] implements both against a
//! GraphQL indexer; [`MemorySource`] serves a fixed project set and is
//! used for offline runs and tests.

pub mod indexer;
pub mod memory;
mod queries;
mod wire;

use async_trait::async_trait;

pub use indexer::IndexerClient;
pub use memory::MemorySource;

use crate::domain::pagination::{FetchTicket, Page};
use crate::domain::{FilterState, LaunchStatus, SortOrder, TransactionPage};
use crate::error::ListingError;

/// Parameters of one paged query.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    /// Launch status the feed is restricted to.
    pub status: Option<LaunchStatus>,
    /// Active criteria; never contains empty entries.
    pub filter: FilterState,
    /// Free-text search.
    pub search: Option<String>,
    /// Zero-based page index.
    pub page: u32,
    /// Page size.
    pub page_size: u32,
    /// Sort order.
    pub order: SortOrder,
}

impl PageRequest {
    /// Builds the request a [`FetchTicket`] asks for.
    #[must_use]
    pub fn from_ticket(status: Option<LaunchStatus>, ticket: &FetchTicket) -> Self {
        let query = ticket.query();
        Self {
            status,
            filter: query.filter.clone(),
            search: query.search.clone(),
            page: ticket.page(),
            page_size: query.limit,
            order: query.order.clone(),
        }
    }

    /// Number of items to skip.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.page_size)
    }
}

/// Paged query capability.
#[async_trait]
pub trait PageSource<T>: Send + Sync {
    /// Fetches one page.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::Fetch`] or [`ListingError::Decode`] when the
    /// backing query fails.
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<T>, ListingError>;
}

/// Re-reads the volatile fields of a loaded item.
#[async_trait]
pub trait ItemRefresher<T>: Send + Sync {
    /// Returns the refreshed item.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::Refresh`] when the item could not be read.
    async fn refresh(&self, item: &T) -> Result<T, ListingError>;
}

/// Paged transaction history of a launch.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Fetches one-based `page` of `pair`'s transactions.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::Fetch`] or [`ListingError::Decode`] when the
    /// backing query fails.
    async fn fetch_transactions(
        &self,
        pair: &str,
        page: u32,
        page_size: u32,
    ) -> Result<TransactionPage, ListingError>;
}
