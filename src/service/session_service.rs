//! Session service: creates, looks up and disposes listing sessions.

use std::sync::Arc;

use chrono::Utc;

use super::session_registry::{ListingSession, SessionRegistry, SessionSummary};
use super::{ListingService, RefreshDriver};
use crate::domain::{EventBus, Feed, ListingEvent, Project, SessionId};
use crate::error::GatewayError;
use crate::source::{ItemRefresher, PageSource};

/// Limits applied to new sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Page size used when a session does not ask for one.
    pub default_limit: u32,
    /// Largest page size a session may ask for.
    pub max_limit: u32,
    /// Maximum number of live sessions.
    pub max_sessions: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            default_limit: 9,
            max_limit: 100,
            max_sessions: 1000,
        }
    }
}

/// Orchestrates the session lifecycle.
///
/// Stateless coordinator: the registry holds the sessions, the data
/// source and refresher are shared by every listing, and every lifecycle
/// change is published on the [`EventBus`].
#[derive(Clone)]
pub struct SessionService {
    registry: Arc<SessionRegistry>,
    source: Arc<dyn PageSource<Project>>,
    refresher: Arc<dyn ItemRefresher<Project>>,
    driver: RefreshDriver,
    event_bus: EventBus,
    settings: SessionSettings,
}

impl std::fmt::Debug for SessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionService")
            .field("driver", &self.driver)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl SessionService {
    /// Creates a new `SessionService`.
    #[must_use]
    pub fn new(
        source: Arc<dyn PageSource<Project>>,
        refresher: Arc<dyn ItemRefresher<Project>>,
        driver: RefreshDriver,
        event_bus: EventBus,
        settings: SessionSettings,
    ) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new()),
            source,
            refresher,
            driver,
            event_bus,
            settings,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns a reference to the inner [`SessionRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Session limits.
    #[must_use]
    pub const fn settings(&self) -> SessionSettings {
        self.settings
    }

    /// Creates an idle session for `feed`. No page is fetched; feeds that
    /// refresh start their refresh loop right away.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for a zero or oversized
    /// `limit` and [`GatewayError::SessionLimitReached`] when full.
    pub async fn create_session(
        &self,
        feed: Feed,
        limit: Option<u32>,
    ) -> Result<Arc<ListingSession>, GatewayError> {
        let limit = limit.unwrap_or(self.settings.default_limit);
        if limit == 0 || limit > self.settings.max_limit {
            return Err(GatewayError::InvalidRequest(format!(
                "limit must be between 1 and {}",
                self.settings.max_limit
            )));
        }

        let session_id = SessionId::new();
        let listing = Arc::new(ListingService::for_feed(
            session_id,
            feed,
            limit,
            Arc::clone(&self.source),
            self.event_bus.clone(),
        ));
        let refresh = feed
            .refreshes()
            .then(|| self.driver.spawn(&listing, Arc::clone(&self.refresher)));
        let session = self
            .registry
            .insert(ListingSession::new(feed, listing, refresh), self.settings.max_sessions)
            .await?;

        let _ = self.event_bus.publish(ListingEvent::SessionCreated {
            session_id,
            feed,
            timestamp: Utc::now(),
        });
        tracing::info!(%session_id, %feed, limit, "listing session created");
        Ok(session)
    }

    /// Looks up a session.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`] for an unknown ID.
    pub async fn session(&self, id: SessionId) -> Result<Arc<ListingSession>, GatewayError> {
        self.registry.get(id).await
    }

    /// Summaries of live sessions, optionally restricted to one feed.
    pub async fn list_sessions(&self, feed: Option<Feed>) -> Vec<SessionSummary> {
        self.registry.list(feed).await
    }

    /// Stops a session's refresh loop and forgets it.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`] for an unknown ID.
    pub async fn dispose_session(&self, id: SessionId) -> Result<(), GatewayError> {
        let session = self.registry.remove(id).await?;
        session.dispose().await;
        let _ = self.event_bus.publish(ListingEvent::SessionDisposed {
            session_id: id,
            timestamp: Utc::now(),
        });
        tracing::info!(session_id = %id, "listing session disposed");
        Ok(())
    }

    /// Disposes every session.
    pub async fn shutdown(&self) {
        let sessions = self.registry.drain().await;
        let count = sessions.len();
        for session in sessions {
            session.dispose().await;
            let _ = self.event_bus.publish(ListingEvent::SessionDisposed {
                session_id: session.id(),
                timestamp: Utc::now(),
            });
        }
        tracing::info!(count, "all listing sessions disposed");
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::project::tests::project;
    use crate::domain::{LaunchStatus, Page, PageMode};
    use crate::source::PageRequest;
    use crate::testing::{ScriptedRefresher, ScriptedSource};

    fn service(max_sessions: usize) -> (SessionService, Arc<ScriptedRefresher<Project>>) {
        let source = ScriptedSource::new(|request: &PageRequest| {
            let status = request.status.unwrap_or(LaunchStatus::Success);
            let items = (0..request.page_size)
                .map(|i| project(&format!("0x{i:02}"), status))
                .collect();
            (
                Duration::ZERO,
                Ok(Page {
                    items,
                    has_next_page: true,
                }),
            )
        });
        let refresher = ScriptedRefresher::new(|p: &Project| Ok(p.clone()));
        let settings = SessionSettings {
            max_sessions,
            ..SessionSettings::default()
        };
        let service = SessionService::new(
            source,
            Arc::clone(&refresher) as _,
            RefreshDriver::default(),
            EventBus::new(64),
            settings,
        );
        (service, refresher)
    }

    #[tokio::test]
    async fn create_does_not_fetch() {
        let (service, _) = service(10);
        let Ok(session) = service.create_session(Feed::Pumping, None).await else {
            panic!("create failed");
        };
        let snapshot = session.listing().snapshot().await;
        assert!(snapshot.items.is_empty());
        assert_eq!(snapshot.query.limit, 9);
        assert!(!session.is_refreshing().await);
    }

    #[tokio::test]
    async fn trending_uses_fixed_limit() {
        let (service, _) = service(10);
        let Ok(session) = service.create_session(Feed::Trending, Some(20)).await else {
            panic!("create failed");
        };
        let snapshot = session.listing().reload_page().await;
        assert_eq!(snapshot.items.len(), 3);
        assert!(snapshot.items.iter().all(|p| p.status == LaunchStatus::Processing));
        service.shutdown().await;
    }

    #[tokio::test]
    async fn rejects_bad_limits_and_overflow() {
        let (service, _) = service(1);
        assert!(matches!(
            service.create_session(Feed::Pumping, Some(0)).await,
            Err(GatewayError::InvalidRequest(_))
        ));
        assert!(service.create_session(Feed::Pumping, None).await.is_ok());
        assert!(matches!(
            service.create_session(Feed::Pumping, None).await,
            Err(GatewayError::SessionLimitReached(1))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_stops_refresh() {
        let (service, refresher) = service(10);
        let Ok(session) = service.create_session(Feed::Potting, None).await else {
            panic!("create failed");
        };
        assert!(session.is_refreshing().await);
        let _ = session.listing().reload_page().await;
        let _ = session.listing().next_page(PageMode::Append).await;

        tokio::time::sleep(Duration::from_millis(2001)).await;
        assert_eq!(refresher.calls(), 18);

        assert!(service.dispose_session(session.id()).await.is_ok());
        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert_eq!(refresher.calls(), 18);
        assert!(matches!(
            service.session(session.id()).await,
            Err(GatewayError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn shutdown_disposes_everything() {
        let (service, _) = service(10);
        let mut rx = service.event_bus().subscribe();
        for feed in Feed::ALL {
            assert!(service.create_session(feed, None).await.is_ok());
        }
        service.shutdown().await;
        assert!(service.registry().is_empty().await);

        let disposed = std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|e| matches!(e, ListingEvent::SessionDisposed { .. }))
            .count();
        assert_eq!(disposed, 3);
    }
}
