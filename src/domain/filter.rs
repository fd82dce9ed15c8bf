//! Filter and sort criteria for listing queries.
//!
//! Raw filter input arrives as a loosely typed JSON object. It is turned
//! into a [`FilterPatch`] (what to set, what to clear) and from there into
//! a [`FilterState`], which only ever holds valid, non-empty criteria.
//! Malformed values are dropped rather than rejected.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Raw, unvalidated filter input as sent by a client.
pub type RawFilter = Map<String, Value>;

/// Whether a filter key takes a numeric range or an exact string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriterionKind {
    /// `{ min, max }` numeric range.
    Range,
    /// Exact string match.
    Exact,
}

/// Closed set of recognized filter keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FilterKey {
    /// Total value locked, USD.
    #[serde(rename = "tvl")]
    Tvl,
    /// Pool liquidity, USD.
    #[serde(rename = "liquidity")]
    Liquidity,
    /// Market capitalization, USD.
    #[serde(rename = "marketcap")]
    Marketcap,
    /// Transactions in the last 24 hours.
    #[serde(rename = "daytxns")]
    DayTxns,
    /// Buys in the last 24 hours.
    #[serde(rename = "daybuys")]
    DayBuys,
    /// Sells in the last 24 hours.
    #[serde(rename = "daysells")]
    DaySells,
    /// Volume in the last 24 hours, USD.
    #[serde(rename = "dayvolume")]
    DayVolume,
    /// Price change over 24 hours, percent.
    #[serde(rename = "daychange")]
    DayChange,
    /// Number of participants.
    #[serde(rename = "participants")]
    Participants,
    /// Raise token deposited so far.
    #[serde(rename = "depositedRaisedToken")]
    DepositedRaisedToken,
    /// Address of the raise token.
    #[serde(rename = "raiseToken")]
    RaiseToken,
    /// Address of the launch creator.
    #[serde(rename = "creator")]
    Creator,
}

impl FilterKey {
    /// Every recognized key, in wire order.
    pub const ALL: [Self; 12] = [
        Self::Tvl,
        Self::Liquidity,
        Self::Marketcap,
        Self::DayTxns,
        Self::DayBuys,
        Self::DaySells,
        Self::DayVolume,
        Self::DayChange,
        Self::Participants,
        Self::DepositedRaisedToken,
        Self::RaiseToken,
        Self::Creator,
    ];

    /// Wire name of the key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tvl => "tvl",
            Self::Liquidity => "liquidity",
            Self::Marketcap => "marketcap",
            Self::DayTxns => "daytxns",
            Self::DayBuys => "daybuys",
            Self::DaySells => "daysells",
            Self::DayVolume => "dayvolume",
            Self::DayChange => "daychange",
            Self::Participants => "participants",
            Self::DepositedRaisedToken => "depositedRaisedToken",
            Self::RaiseToken => "raiseToken",
            Self::Creator => "creator",
        }
    }

    /// Parses a wire name. Unknown names yield `None`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }

    /// Shape of criterion this key accepts.
    #[must_use]
    pub const fn kind(self) -> CriterionKind {
        match self {
            Self::RaiseToken | Self::Creator => CriterionKind::Exact,
            _ => CriterionKind::Range,
        }
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive numeric range with at least one bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Range {
    /// Lower bound, inclusive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Upper bound, inclusive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Range {
    /// Builds a range, returning `None` when it has no bound, a non-finite
    /// bound, or `min > max`.
    #[must_use]
    pub fn new(min: Option<f64>, max: Option<f64>) -> Option<Self> {
        if min.is_none() && max.is_none() {
            return None;
        }
        if min.is_some_and(|v| !v.is_finite()) || max.is_some_and(|v| !v.is_finite()) {
            return None;
        }
        if let (Some(lo), Some(hi)) = (min, max)
            && lo > hi
        {
            return None;
        }
        Some(Self { min, max })
    }

    /// Returns `true` if `value` lies within the range.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|lo| value >= lo) && self.max.is_none_or(|hi| value <= hi)
    }
}

/// A validated filter criterion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Criterion {
    /// Numeric range.
    Range(Range),
    /// Exact string match (lower-cased).
    Exact(String),
}

/// Validated set of active criteria. Never holds an empty criterion.
///
/// Deserializing reads a raw filter object and [`normalize`]s it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FilterState(BTreeMap<FilterKey, Criterion>);

impl<'de> Deserialize<'de> for FilterState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawFilter::deserialize(deserializer).map(|raw| normalize(&raw))
    }
}

impl FilterState {
    /// Creates an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a criterion if its shape fits the key. Returns `false` otherwise.
    pub fn insert(&mut self, key: FilterKey, criterion: Criterion) -> bool {
        let fits = matches!(
            (key.kind(), &criterion),
            (CriterionKind::Range, Criterion::Range(_)) | (CriterionKind::Exact, Criterion::Exact(_))
        );
        if fits {
            self.0.insert(key, criterion);
        }
        fits
    }

    /// Returns the criterion for `key`, if active.
    #[must_use]
    pub fn get(&self, key: FilterKey) -> Option<&Criterion> {
        self.0.get(&key)
    }

    /// Returns the range criterion for `key`, if active.
    #[must_use]
    pub fn range(&self, key: FilterKey) -> Option<Range> {
        match self.0.get(&key) {
            Some(Criterion::Range(range)) => Some(*range),
            _ => None,
        }
    }

    /// Iterates active criteria in key order.
    pub fn iter(&self) -> impl Iterator<Item = (FilterKey, &Criterion)> {
        self.0.iter().map(|(key, criterion)| (*key, criterion))
    }

    /// Number of active criteria.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no criterion is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Applies a patch: set keys overwrite, cleared keys are removed,
    /// untouched keys are preserved.
    #[must_use]
    pub fn merge(&self, patch: &FilterPatch) -> Self {
        let mut merged = self.0.clone();
        for key in &patch.clear {
            merged.remove(key);
        }
        for (key, criterion) in patch.set.iter() {
            merged.insert(key, criterion.clone());
        }
        Self(merged)
    }
}

/// Outcome of reading one raw filter value.
#[derive(Debug, Clone, PartialEq)]
enum Parsed {
    Set(Criterion),
    Clear,
    Malformed,
}

/// Partial filter update derived from raw input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPatch {
    set: FilterState,
    clear: BTreeSet<FilterKey>,
}

impl FilterPatch {
    /// Reads a raw filter object.
    ///
    /// Keys with a valid value are set; keys explicitly given an empty
    /// value (`null`, `""`, a range with no bound) are cleared; unknown
    /// keys and malformed values are ignored.
    #[must_use]
    pub fn from_raw(raw: &RawFilter) -> Self {
        let mut patch = Self::default();
        for (name, value) in raw {
            let Some(key) = FilterKey::parse(name) else {
                tracing::debug!(key = %name, "ignoring unknown filter key");
                continue;
            };
            match parse_value(key, value) {
                Parsed::Set(criterion) => {
                    patch.set.insert(key, criterion);
                }
                Parsed::Clear => {
                    patch.clear.insert(key);
                }
                Parsed::Malformed => {
                    tracing::debug!(%key, "ignoring malformed filter value");
                }
            }
        }
        patch
    }

    /// Criteria this patch sets.
    #[must_use]
    pub fn set(&self) -> &FilterState {
        &self.set
    }

    /// Keys this patch clears.
    #[must_use]
    pub fn cleared(&self) -> &BTreeSet<FilterKey> {
        &self.clear
    }

    /// Returns `true` if the patch neither sets nor clears anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.clear.is_empty()
    }
}

/// Drops every empty, unknown or malformed entry from `raw`.
#[must_use]
pub fn normalize(raw: &RawFilter) -> FilterState {
    FilterPatch::from_raw(raw).set
}

/// Returns `true` iff at least one recognized key carries a usable value.
#[must_use]
pub fn has_value(raw: &RawFilter) -> bool {
    !normalize(raw).is_empty()
}

fn parse_value(key: FilterKey, value: &Value) -> Parsed {
    if is_blank(value) {
        return Parsed::Clear;
    }
    match (key.kind(), value) {
        (CriterionKind::Exact, Value::String(s)) => {
            Parsed::Set(Criterion::Exact(s.trim().to_lowercase()))
        }
        (CriterionKind::Range, Value::Object(obj)) => {
            let min = obj.get("min").map(parse_bound).unwrap_or(Ok(None));
            let max = obj.get("max").map(parse_bound).unwrap_or(Ok(None));
            match (min, max) {
                (Ok(None), Ok(None)) => Parsed::Clear,
                (Ok(min), Ok(max)) => Range::new(min, max)
                    .map(|r| Parsed::Set(Criterion::Range(r)))
                    .unwrap_or(Parsed::Malformed),
                _ => Parsed::Malformed,
            }
        }
        _ => Parsed::Malformed,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Object(obj) => obj.is_empty(),
        _ => false,
    }
}

/// Reads a range bound: `Ok(None)` for an absent bound, `Err(())` for junk.
fn parse_bound(value: &Value) -> Result<Option<f64>, ()> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_f64().map(Some).ok_or(()),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s.trim().parse::<f64>().map(Some).map_err(|_| ()),
        _ => Err(()),
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    /// Ascending.
    Asc,
    /// Descending.
    #[default]
    Desc,
}

impl OrderDirection {
    /// Wire name of the direction.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Field and direction a listing is sorted by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    /// Indexer field name, e.g. `endTime`.
    pub field: String,
    /// Sort direction.
    pub direction: OrderDirection,
}

impl SortOrder {
    /// Builds a sort order. Field names must be non-empty ASCII
    /// identifiers; anything else yields `None`.
    #[must_use]
    pub fn new(field: &str, direction: OrderDirection) -> Option<Self> {
        let valid = !field.is_empty()
            && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !field.starts_with(|c: char| c.is_ascii_digit());
        valid.then(|| Self {
            field: field.to_string(),
            direction,
        })
    }
}
