//! Launch projects as shown on listing pages.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::filter::{Criterion, FilterKey, FilterState};

/// Anything a paginated listing can hold.
///
/// The pagination logic only needs a stable unique key per item; it never
/// mutates items itself.
pub trait ListingItem: Clone + Send + Sync + 'static {
    /// Address-like unique key of the item.
    fn key(&self) -> &str;
}

/// Lifecycle status of a launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchStatus {
    /// Still raising ("potting").
    Processing,
    /// Raise succeeded; the token trades ("pumping").
    Success,
    /// Raise failed; depositors can refund.
    Fail,
}

impl LaunchStatus {
    /// Numeric state used by the indexer.
    #[must_use]
    pub const fn indexer_code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Fail => 1,
            Self::Processing => 3,
        }
    }

    /// Inverse of [`Self::indexer_code`].
    #[must_use]
    pub const fn from_indexer_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Success),
            1 => Some(Self::Fail),
            3 => Some(Self::Processing),
            _ => None,
        }
    }
}

impl fmt::Display for LaunchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Processing => "processing",
            Self::Success => "success",
            Self::Fail => "fail",
        })
    }
}

/// A tracked token launch.
///
/// Numeric metrics are keyed by the same [`FilterKey`]s the filter model
/// uses, so range filters and sorting can be evaluated locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Pair contract address, lower-cased.
    pub address: String,
    /// Launch token name.
    pub name: String,
    /// Launch token symbol.
    pub symbol: String,
    /// Launch status.
    pub status: LaunchStatus,
    /// Symbol of the token being raised.
    pub raise_token_symbol: String,
    /// Address of the token being raised, lower-cased.
    pub raise_token_address: String,
    /// Decimals of the raise token.
    pub raise_token_decimals: u8,
    /// Creator address, lower-cased.
    pub creator: String,
    /// Numeric metrics (tvl, marketcap, depositedRaisedToken, ...).
    #[serde(default)]
    pub metrics: BTreeMap<FilterKey, f64>,
    /// End of the raising window.
    pub end_time: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
}

impl Project {
    /// Returns the metric stored under `key`.
    #[must_use]
    pub fn metric(&self, key: FilterKey) -> Option<f64> {
        self.metrics.get(&key).copied()
    }

    /// Sets a metric, returning `self` for chaining.
    #[must_use]
    pub fn with_metric(mut self, key: FilterKey, value: f64) -> Self {
        self.metrics.insert(key, value);
        self
    }

    /// Returns `true` if every active criterion accepts this project.
    /// A project missing a filtered metric does not match.
    #[must_use]
    pub fn matches(&self, filter: &FilterState) -> bool {
        filter.iter().all(|(key, criterion)| match criterion {
            Criterion::Range(range) => self.metric(key).is_some_and(|v| range.contains(v)),
            Criterion::Exact(expected) => match key {
                FilterKey::RaiseToken => self.raise_token_address == *expected,
                FilterKey::Creator => self.creator == *expected,
                _ => false,
            },
        })
    }

    /// Case-insensitive match against name, symbol, or exact address.
    #[must_use]
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.symbol.to_lowercase().contains(&needle)
            || self.address == needle
    }

    /// Sort key for `field`: known metric names first, then timestamps.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn sort_value(&self, field: &str) -> Option<f64> {
        if let Some(key) = FilterKey::parse(field) {
            return self.metric(key);
        }
        match field {
            "endTime" => self.end_time.map(|t| t.timestamp() as f64),
            "createdAt" => self.created_at.map(|t| t.timestamp() as f64),
            _ => None,
        }
    }
}

impl ListingItem for Project {
    fn key(&self) -> &str {
        &self.address
    }
}
