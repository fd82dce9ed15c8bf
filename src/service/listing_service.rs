//! Listing facade: drives one [`PaginationState`] against a data source.
//!
//! Every operation takes the state lock only to compute a transition,
//! releases it while the fetch is in flight, and re-takes it to settle.
//! Settlements for superseded requests are dropped by the state machine.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use futures_util::future::join_all;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::domain::{
    EventBus, Feed, FetchTicket, LaunchStatus, ListingEvent, ListingItem, ListingQuery,
    ListingSnapshot, ListingUpdate, LoadPhase, PageMode, PaginationState, SessionId,
};
use crate::source::{ItemRefresher, PageRequest, PageSource};

/// Paginated, filterable listing of one feed.
///
/// Operations never fail: fetch errors are folded into the returned
/// [`ListingSnapshot`] and published as [`ListingEvent::PageFailed`].
pub struct ListingService<T> {
    session_id: SessionId,
    status: Option<LaunchStatus>,
    source: Arc<dyn PageSource<T>>,
    state: RwLock<PaginationState<T>>,
    event_bus: EventBus,
}

impl<T> fmt::Debug for ListingService<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListingService")
            .field("session_id", &self.session_id)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl<T: ListingItem> ListingService<T> {
    /// Creates an idle listing. Nothing is fetched until the first
    /// [`reload_page`](Self::reload_page).
    #[must_use]
    pub fn new(
        session_id: SessionId,
        status: Option<LaunchStatus>,
        query: ListingQuery,
        source: Arc<dyn PageSource<T>>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            session_id,
            status,
            source,
            state: RwLock::new(PaginationState::new(query)),
            event_bus,
        }
    }

    /// Creates an idle listing bound to `feed`'s status and default order.
    /// Feeds with a fixed page size ignore `limit`.
    #[must_use]
    pub fn for_feed(
        session_id: SessionId,
        feed: Feed,
        limit: u32,
        source: Arc<dyn PageSource<T>>,
        event_bus: EventBus,
    ) -> Self {
        let limit = feed.fixed_limit().unwrap_or(limit);
        let query = ListingQuery::new(feed.default_order(), limit);
        Self::new(session_id, Some(feed.status()), query, source, event_bus)
    }

    /// Session this listing belongs to.
    #[must_use]
    pub const fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Current state.
    pub async fn snapshot(&self) -> ListingSnapshot<T> {
        self.state.read().await.snapshot()
    }

    /// Restarts from page 0 with the current query.
    pub async fn reload_page(&self) -> ListingSnapshot<T> {
        let ticket = {
            let mut state = self.state.write().await;
            let (next, ticket) = state.begin_reload();
            *state = next;
            ticket
        };
        self.execute(ticket).await
    }

    /// Loads the next page, appending or replacing. A no-op without a
    /// next page or while a fetch is in flight.
    pub async fn next_page(&self, mode: PageMode) -> ListingSnapshot<T> {
        let ticket = {
            let mut state = self.state.write().await;
            let Some((next, ticket)) = state.begin_next(mode) else {
                debug!(session_id = %self.session_id, "next page skipped");
                return state.snapshot();
            };
            *state = next;
            ticket
        };
        self.execute(ticket).await
    }

    /// Loads the previous page, replacing the items. A no-op on page 0 or
    /// while a fetch is in flight.
    pub async fn prev_page(&self) -> ListingSnapshot<T> {
        let ticket = {
            let mut state = self.state.write().await;
            let Some((next, ticket)) = state.begin_prev() else {
                debug!(session_id = %self.session_id, "previous page skipped");
                return state.snapshot();
            };
            *state = next;
            ticket
        };
        self.execute(ticket).await
    }

    /// Merges `update` into the query and reloads from page 0.
    pub async fn update_filter(&self, update: &ListingUpdate) -> ListingSnapshot<T> {
        let ticket = {
            let mut state = self.state.write().await;
            let (next, ticket) = state.begin_update(update);
            *state = next;
            ticket
        };
        info!(
            session_id = %self.session_id,
            criteria = ticket.query().filter.len(),
            search = ticket.query().search.as_deref().unwrap_or(""),
            "listing query updated"
        );
        self.execute(ticket).await
    }

    /// Refreshes every loaded item concurrently and writes the results
    /// back in place. Individual failures are logged and skipped.
    pub async fn refresh_items(&self, refresher: &dyn ItemRefresher<T>) -> ListingSnapshot<T> {
        let (generation, items) = {
            let state = self.state.read().await;
            (state.generation(), state.items().to_vec())
        };
        if items.is_empty() {
            return self.snapshot().await;
        }

        let results = join_all(items.iter().map(|item| refresher.refresh(item))).await;

        let mut refreshed = 0_usize;
        let mut failed = 0_usize;
        let mut state = self.state.write().await;
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(item) => {
                    if let Some(next) = state.apply_refresh(generation, index, item) {
                        *state = next;
                        refreshed += 1;
                    }
                }
                Err(err) => {
                    failed += 1;
                    warn!(session_id = %self.session_id, error = %err, "item refresh failed");
                }
            }
        }
        let _ = self.event_bus.publish(ListingEvent::ItemsRefreshed {
            session_id: self.session_id,
            refreshed,
            failed,
            timestamp: Utc::now(),
        });
        state.snapshot()
    }

    async fn execute(&self, ticket: FetchTicket) -> ListingSnapshot<T> {
        let epoch = ticket.epoch().get();
        let _ = self.event_bus.publish(ListingEvent::PageLoading {
            session_id: self.session_id,
            epoch,
            page: ticket.page(),
            timestamp: Utc::now(),
        });

        let request = PageRequest::from_ticket(self.status, &ticket);
        let outcome = self.source.fetch_page(&request).await;

        let mut state = self.state.write().await;
        let Some(next) = state.settle(&ticket, outcome) else {
            debug!(session_id = %self.session_id, epoch, "stale response discarded");
            let _ = self.event_bus.publish(ListingEvent::StaleResponseDiscarded {
                session_id: self.session_id,
                epoch,
                timestamp: Utc::now(),
            });
            return state.snapshot();
        };
        *state = next;

        let event = match (state.phase(), state.error()) {
            (LoadPhase::Errored, Some(message)) => {
                warn!(session_id = %self.session_id, epoch, error = message, "page fetch failed");
                ListingEvent::PageFailed {
                    session_id: self.session_id,
                    epoch,
                    message: message.to_string(),
                    timestamp: Utc::now(),
                }
            }
            _ => {
                debug!(
                    session_id = %self.session_id,
                    epoch,
                    page = state.current_page(),
                    items = state.items().len(),
                    "page loaded"
                );
                ListingEvent::PageLoaded {
                    session_id: self.session_id,
                    epoch,
                    page: state.current_page(),
                    item_count: state.items().len(),
                    has_next_page: state.has_next_page(),
                    timestamp: Utc::now(),
                }
            }
        };
        let _ = self.event_bus.publish(event);
        state.snapshot()
    }
}
