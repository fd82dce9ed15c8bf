//! Domain events reflecting listing state transitions.
//!
//! Every transition of a listing session emits a [`ListingEvent`] through
//! the [`super::EventBus`]. Events are broadcast to WebSocket subscribers,
//! which re-read the session snapshot or render the event directly.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::SessionId;
use super::feed::Feed;

/// Domain event emitted after every listing state transition.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum ListingEvent {
    /// A listing session was created.
    SessionCreated {
        /// Session identifier.
        session_id: SessionId,
        /// Feed the session is bound to.
        feed: Feed,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A fetch was issued.
    PageLoading {
        /// Session identifier.
        session_id: SessionId,
        /// Epoch of the request.
        epoch: u64,
        /// Zero-based page requested.
        page: u32,
        /// Timestamp of the request.
        timestamp: DateTime<Utc>,
    },

    /// The latest fetch succeeded.
    PageLoaded {
        /// Session identifier.
        session_id: SessionId,
        /// Epoch of the request.
        epoch: u64,
        /// Zero-based page now current.
        page: u32,
        /// Total items loaded after the fetch.
        item_count: usize,
        /// Whether another page can be requested.
        has_next_page: bool,
        /// Settlement timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The latest fetch failed; loaded items were kept.
    PageFailed {
        /// Session identifier.
        session_id: SessionId,
        /// Epoch of the request.
        epoch: u64,
        /// Failure message.
        message: String,
        /// Settlement timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A response arrived for a superseded request and was dropped.
    StaleResponseDiscarded {
        /// Session identifier.
        session_id: SessionId,
        /// Epoch of the dropped response.
        epoch: u64,
        /// Timestamp of the discard.
        timestamp: DateTime<Utc>,
    },

    /// A refresh tick finished.
    ItemsRefreshed {
        /// Session identifier.
        session_id: SessionId,
        /// Items updated in place.
        refreshed: usize,
        /// Items whose refresh failed.
        failed: usize,
        /// Tick timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A listing session was disposed.
    SessionDisposed {
        /// Session identifier.
        session_id: SessionId,
        /// Disposal timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl ListingEvent {
    /// Returns the session ID associated with this event.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        match self {
            Self::SessionCreated { session_id, .. }
            | Self::PageLoading { session_id, .. }
            | Self::PageLoaded { session_id, .. }
            | Self::PageFailed { session_id, .. }
            | Self::StaleResponseDiscarded { session_id, .. }
            | Self::ItemsRefreshed { session_id, .. }
            | Self::SessionDisposed { session_id, .. } => *session_id,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::SessionCreated { .. } => "session_created",
            Self::PageLoading { .. } => "page_loading",
            Self::PageLoaded { .. } => "page_loaded",
            Self::PageFailed { .. } => "page_failed",
            Self::StaleResponseDiscarded { .. } => "stale_response_discarded",
            Self::ItemsRefreshed { .. } => "items_refreshed",
            Self::SessionDisposed { .. } => "session_disposed",
        }
    }
}
