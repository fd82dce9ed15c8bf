//! Listing feeds: which projects a session shows and in which order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::filter::{FilterKey, OrderDirection, SortOrder};
use super::project::LaunchStatus;

/// Backing query a listing session is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    /// Launches that finished raising, newest end time first.
    Pumping,
    /// Launches still raising, most deposits first.
    Potting,
    /// Top three raising launches by deposits.
    Trending,
}

impl Feed {
    /// Every feed.
    pub const ALL: [Self; 3] = [Self::Pumping, Self::Potting, Self::Trending];

    /// Wire name of the feed.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pumping => "pumping",
            Self::Potting => "potting",
            Self::Trending => "trending",
        }
    }

    /// Launch status every project of this feed has.
    #[must_use]
    pub const fn status(self) -> LaunchStatus {
        match self {
            Self::Pumping => LaunchStatus::Success,
            Self::Potting | Self::Trending => LaunchStatus::Processing,
        }
    }

    /// Sort order the feed starts with.
    #[must_use]
    pub fn default_order(self) -> SortOrder {
        let field = match self {
            Self::Pumping => "endTime",
            Self::Potting | Self::Trending => FilterKey::DepositedRaisedToken.as_str(),
        };
        SortOrder {
            field: field.to_string(),
            direction: OrderDirection::Desc,
        }
    }

    /// Page size imposed by the feed, overriding the configured one.
    #[must_use]
    pub const fn fixed_limit(self) -> Option<u32> {
        match self {
            Self::Trending => Some(3),
            Self::Pumping | Self::Potting => None,
        }
    }

    /// Whether loaded projects change while displayed and need periodic
    /// refreshing.
    #[must_use]
    pub const fn refreshes(self) -> bool {
        matches!(self, Self::Potting | Self::Trending)
    }

    /// Human-readable description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Pumping => "Launches that reached their raise and are trading",
            Self::Potting => "Launches still collecting deposits",
            Self::Trending => "Top three raising launches by deposited amount",
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|feed| feed.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}
