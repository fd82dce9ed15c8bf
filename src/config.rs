//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Missing or unparsable values fall
//! back to their defaults; only `LISTEN_ADDR` is strict.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Where listings are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSourceConfig {
    /// GraphQL indexer endpoint.
    Indexer {
        /// Endpoint URL.
        url: String,
        /// Per-request timeout.
        timeout: Duration,
    },
    /// JSON fixture served from memory.
    Fixture {
        /// Fixture file path.
        path: PathBuf,
    },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Listing data source.
    pub data_source: DataSourceConfig,

    /// Page size of sessions that do not ask for one.
    pub page_limit: u32,

    /// Largest page size a session may ask for.
    pub max_page_limit: u32,

    /// Interval between in-place refreshes of raising launches.
    pub refresh_interval: Duration,

    /// Default transaction history page size.
    pub transactions_page_size: u32,

    /// Maximum number of live listing sessions.
    pub max_sessions: usize,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,

    /// Timeout applied to every HTTP request.
    pub request_timeout: Duration,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            data_source: DataSourceConfig::Indexer {
                url: DEFAULT_INDEXER_URL.to_string(),
                timeout: Duration::from_secs(10),
            },
            page_limit: 9,
            max_page_limit: 100,
            refresh_interval: Duration::from_millis(2000),
            transactions_page_size: 10,
            max_sessions: 1000,
            event_bus_capacity: 10_000,
            request_timeout: Duration::from_secs(30),
            log_format: LogFormat::Pretty,
        }
    }
}

const DEFAULT_INDEXER_URL: &str = "http://localhost:8000/subgraphs/name/pot2pump";

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    /// A set `FIXTURE_PATH` selects the in-memory source over the indexer.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, std::net::AddrParseError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr = match std::env::var("LISTEN_ADDR") {
            Ok(addr) => addr.parse()?,
            Err(_) => defaults.listen_addr,
        };

        let data_source = match std::env::var("FIXTURE_PATH") {
            Ok(path) if !path.trim().is_empty() => DataSourceConfig::Fixture {
                path: PathBuf::from(path),
            },
            _ => DataSourceConfig::Indexer {
                url: std::env::var("INDEXER_URL")
                    .unwrap_or_else(|_| DEFAULT_INDEXER_URL.to_string()),
                timeout: Duration::from_secs(parse_env("INDEXER_TIMEOUT_SECS", 10)),
            },
        };

        let log_format = match std::env::var("LOG_FORMAT").ok().as_deref() {
            Some("json" | "JSON") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            listen_addr,
            data_source,
            page_limit: parse_env("PAGE_LIMIT", defaults.page_limit).max(1),
            max_page_limit: parse_env("MAX_PAGE_LIMIT", defaults.max_page_limit).max(1),
            refresh_interval: Duration::from_millis(parse_env("REFRESH_INTERVAL_MS", 2000).max(1)),
            transactions_page_size: parse_env(
                "TRANSACTIONS_PAGE_SIZE",
                defaults.transactions_page_size,
            )
            .max(1),
            max_sessions: parse_env("MAX_SESSIONS", defaults.max_sessions),
            event_bus_capacity: parse_env("EVENT_BUS_CAPACITY", defaults.event_bus_capacity),
            request_timeout: Duration::from_secs(parse_env("REQUEST_TIMEOUT_SECS", 30)),
            log_format,
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
