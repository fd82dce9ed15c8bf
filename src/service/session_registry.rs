//! Concurrent storage of live listing sessions.
//!
//! [`SessionRegistry`] keeps every session behind an `Arc` so handlers can
//! keep using a session after releasing the map lock. Sessions carry their
//! own state lock; the map lock is only held for lookups and membership
//! changes.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use super::{ListingService, RefreshHandle};
use crate::domain::{Feed, Project, SessionId};
use crate::error::GatewayError;

/// One mounted listing: its state plus its refresh loop.
#[derive(Debug)]
pub struct ListingSession {
    id: SessionId,
    feed: Feed,
    created_at: DateTime<Utc>,
    listing: Arc<ListingService<Project>>,
    refresh: Mutex<Option<RefreshHandle>>,
}

impl ListingSession {
    /// Bundles a listing with its optional refresh loop.
    #[must_use]
    pub fn new(
        feed: Feed,
        listing: Arc<ListingService<Project>>,
        refresh: Option<RefreshHandle>,
    ) -> Self {
        Self {
            id: listing.session_id(),
            feed,
            created_at: Utc::now(),
            listing,
            refresh: Mutex::new(refresh),
        }
    }

    /// Session identifier.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Feed the session lists.
    #[must_use]
    pub const fn feed(&self) -> Feed {
        self.feed
    }

    /// Creation time.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Listing facade.
    #[must_use]
    pub fn listing(&self) -> &Arc<ListingService<Project>> {
        &self.listing
    }

    /// Returns `true` while the refresh loop runs.
    pub async fn is_refreshing(&self) -> bool {
        self.refresh
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops the refresh loop. Idempotent.
    pub async fn dispose(&self) {
        let handle = self.refresh.lock().await.take();
        if let Some(handle) = handle {
            handle.stop().await;
        }
    }

    /// Condensed view for listings.
    pub async fn summary(&self) -> SessionSummary {
        let snapshot = self.listing.snapshot().await;
        SessionSummary {
            session_id: self.id,
            feed: self.feed,
            created_at: self.created_at,
            item_count: snapshot.items.len(),
            current_page: snapshot.current_page,
            loading: snapshot.loading,
            refreshing: self.is_refreshing().await,
        }
    }
}

/// Condensed view of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    /// Session identifier.
    pub session_id: SessionId,
    /// Feed the session lists.
    pub feed: Feed,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Loaded item count.
    pub item_count: usize,
    /// Zero-based current page.
    pub current_page: u32,
    /// Whether a fetch is in flight.
    pub loading: bool,
    /// Whether the refresh loop runs.
    pub refreshing: bool,
}

/// Central store for all live sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<ListingSession>>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a session unless the registry already holds `capacity`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionLimitReached`] when full and
    /// [`GatewayError::InvalidRequest`] if the ID is already taken.
    pub async fn insert(
        &self,
        session: ListingSession,
        capacity: usize,
    ) -> Result<Arc<ListingSession>, GatewayError> {
        let id = session.id();
        let mut map = self.sessions.write().await;
        if map.len() >= capacity {
            return Err(GatewayError::SessionLimitReached(capacity));
        }
        if map.contains_key(&id) {
            return Err(GatewayError::InvalidRequest(format!(
                "session {id} already exists"
            )));
        }
        let session = Arc::new(session);
        map.insert(id, Arc::clone(&session));
        Ok(session)
    }

    /// Looks up a session.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`] for an unknown ID.
    pub async fn get(&self, id: SessionId) -> Result<Arc<ListingSession>, GatewayError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .map(Arc::clone)
            .ok_or(GatewayError::SessionNotFound(id))
    }

    /// Removes a session and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`] for an unknown ID.
    pub async fn remove(&self, id: SessionId) -> Result<Arc<ListingSession>, GatewayError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .ok_or(GatewayError::SessionNotFound(id))
    }

    /// Removes and returns every session.
    pub async fn drain(&self) -> Vec<Arc<ListingSession>> {
        self.sessions.write().await.drain().map(|(_, s)| s).collect()
    }

    /// Summaries of all sessions, optionally restricted to one feed,
    /// oldest first.
    pub async fn list(&self, feed: Option<Feed>) -> Vec<SessionSummary> {
        let sessions: Vec<Arc<ListingSession>> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| feed.is_none_or(|f| s.feed() == f))
            .map(Arc::clone)
            .collect();
        let mut summaries = Vec::with_capacity(sessions.len());
        for session in sessions {
            summaries.push(session.summary().await);
        }
        summaries.sort_by_key(|s| (s.created_at, s.session_id));
        summaries
    }

    /// Number of sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` if no session is live.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::{EventBus, Page};
    use crate::source::PageRequest;
    use crate::testing::ScriptedSource;

    fn session(feed: Feed) -> ListingSession {
        let source = ScriptedSource::new(|_: &PageRequest| {
            (
                Duration::ZERO,
                Ok(Page {
                    items: Vec::<Project>::new(),
                    has_next_page: false,
                }),
            )
        });
        let listing = Arc::new(ListingService::for_feed(
            SessionId::new(),
            feed,
            9,
            source,
            EventBus::new(8),
        ));
        ListingSession::new(feed, listing, None)
    }

    #[tokio::test]
    async fn insert_get_remove() {
        let registry = SessionRegistry::new();
        let Ok(inserted) = registry.insert(session(Feed::Pumping), 10).await else {
            panic!("insert failed");
        };
        let id = inserted.id();
        assert_eq!(registry.len().await, 1);
        assert!(registry.get(id).await.is_ok());
        assert!(registry.remove(id).await.is_ok());
        assert!(registry.is_empty().await);
        assert!(matches!(
            registry.get(id).await,
            Err(GatewayError::SessionNotFound(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn capacity_is_enforced() {
        let registry = SessionRegistry::new();
        assert!(registry.insert(session(Feed::Pumping), 1).await.is_ok());
        assert!(matches!(
            registry.insert(session(Feed::Potting), 1).await,
            Err(GatewayError::SessionLimitReached(1))
        ));
    }

    #[tokio::test]
    async fn list_filters_by_feed() {
        let registry = SessionRegistry::new();
        for feed in [Feed::Pumping, Feed::Potting, Feed::Potting] {
            assert!(registry.insert(session(feed), 10).await.is_ok());
        }
        assert_eq!(registry.list(None).await.len(), 3);
        let potting = registry.list(Some(Feed::Potting)).await;
        assert_eq!(potting.len(), 2);
        assert!(potting.iter().all(|s| s.feed == Feed::Potting && !s.refreshing));
    }

    #[tokio::test]
    async fn drain_empties_registry() {
        let registry = SessionRegistry::new();
        assert!(registry.insert(session(Feed::Trending), 10).await.is_ok());
        assert_eq!(registry.drain().await.len(), 1);
        assert!(registry.is_empty().await);
    }
}
