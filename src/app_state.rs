//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::{DataSourceConfig, GatewayConfig};
use crate::domain::{EventBus, Project};
use crate::error::ListingError;
use crate::service::{RefreshDriver, SessionService, SessionSettings, TransactionService};
use crate::source::{IndexerClient, ItemRefresher, MemorySource, PageSource, TransactionSource};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
///
/// Built once by [`AppState::init`] and torn down by
/// [`AppState::dispose`]; there is no global state besides this value.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Listing session lifecycle.
    pub sessions: Arc<SessionService>,
    /// Transaction histories.
    pub transactions: Arc<TransactionService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
    /// Effective configuration.
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    /// Builds the data source, event bus and services from `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`ListingError`] if the HTTP client cannot be built or
    /// the fixture file cannot be loaded.
    pub async fn init(config: GatewayConfig) -> Result<Self, ListingError> {
        match &config.data_source {
            DataSourceConfig::Indexer { url, timeout } => {
                let client = Arc::new(IndexerClient::new(url.clone(), *timeout)?);
                tracing::info!(endpoint = %url, "using indexer data source");
                Ok(Self::with_sources(
                    config,
                    Arc::clone(&client) as Arc<dyn PageSource<Project>>,
                    Arc::clone(&client) as Arc<dyn ItemRefresher<Project>>,
                    client,
                ))
            }
            DataSourceConfig::Fixture { path } => {
                let memory = Arc::new(MemorySource::from_json_file(path).await?);
                tracing::info!(path = %path.display(), projects = memory.len().await, "using fixture data source");
                Ok(Self::with_sources(
                    config,
                    Arc::clone(&memory) as Arc<dyn PageSource<Project>>,
                    Arc::clone(&memory) as Arc<dyn ItemRefresher<Project>>,
                    memory,
                ))
            }
        }
    }

    /// Builds the state over explicit sources.
    #[must_use]
    pub fn with_sources(
        config: GatewayConfig,
        pages: Arc<dyn PageSource<Project>>,
        refresher: Arc<dyn ItemRefresher<Project>>,
        transactions: Arc<dyn TransactionSource>,
    ) -> Self {
        let event_bus = EventBus::new(config.event_bus_capacity);
        let settings = SessionSettings {
            default_limit: config.page_limit,
            max_limit: config.max_page_limit.max(config.page_limit),
            max_sessions: config.max_sessions,
        };
        let sessions = SessionService::new(
            pages,
            refresher,
            RefreshDriver::new(config.refresh_interval),
            event_bus.clone(),
            settings,
        );
        let transactions = TransactionService::new(transactions, config.transactions_page_size);
        Self {
            sessions: Arc::new(sessions),
            transactions: Arc::new(transactions),
            event_bus,
            config: Arc::new(config),
        }
    }

    /// Disposes every session, stopping all refresh loops.
    pub async fn dispose(&self) {
        self.sessions.shutdown().await;
    }
}
