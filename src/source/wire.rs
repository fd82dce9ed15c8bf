//! Indexer response shapes and their conversion to domain types.
//!
//! The indexer encodes BigInt/BigDecimal scalars as strings; numeric
//! fields accept either form.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::domain::price_change::{HourlyPrice, price_change_24h};
use crate::domain::{FilterKey, LaunchStatus, Project, TransactionKind, TransactionRecord};
use crate::error::ListingError;

/// GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub(super) struct GraphResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphError>,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: String,
}

impl<T> GraphResponse<T> {
    /// Returns the payload, or the reported errors as a fetch failure.
    pub(super) fn into_data(self) -> Result<T, ListingError> {
        if !self.errors.is_empty() {
            let messages: Vec<String> = self.errors.into_iter().map(|e| e.message).collect();
            return Err(ListingError::Fetch(messages.join("; ")));
        }
        self.data
            .ok_or_else(|| ListingError::Decode("response carries no data".to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Numeric>::deserialize(deserializer)? {
        Some(Numeric::Number(n)) => Some(n),
        Some(Numeric::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

#[allow(clippy::cast_possible_truncation)]
fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Numeric>::deserialize(deserializer)? {
        Some(Numeric::Number(n)) => Some(n as i64),
        Some(Numeric::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

fn unix(seconds: Option<i64>) -> Option<DateTime<Utc>> {
    seconds.and_then(|s| DateTime::from_timestamp(s, 0))
}

#[derive(Debug, Deserialize)]
pub(super) struct Pot2PumpList {
    #[serde(rename = "pot2Pumps")]
    pub(super) pot2_pumps: Vec<WirePot2Pump>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Pot2PumpSingle {
    #[serde(rename = "pot2Pump")]
    pub(super) pot2_pump: Option<WirePot2Pump>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WirePot2Pump {
    id: String,
    #[serde(deserialize_with = "lenient_i64", default)]
    state: Option<i64>,
    #[serde(default)]
    creator: String,
    #[serde(deserialize_with = "lenient_i64", default)]
    end_time: Option<i64>,
    #[serde(deserialize_with = "lenient_i64", default)]
    created_at: Option<i64>,
    #[serde(deserialize_with = "lenient_f64", default)]
    deposited_raised_token: Option<f64>,
    #[serde(deserialize_with = "lenient_f64", default)]
    participants_count: Option<f64>,
    raised_token: WireRaiseToken,
    launch_token: WireLaunchToken,
}

#[derive(Debug, Deserialize)]
struct WireRaiseToken {
    id: String,
    #[serde(default)]
    symbol: String,
    #[serde(deserialize_with = "lenient_i64", default)]
    decimals: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireLaunchToken {
    #[serde(default)]
    name: String,
    #[serde(default)]
    symbol: String,
    #[serde(rename = "initialUSD", deserialize_with = "lenient_f64", default)]
    initial_usd: Option<f64>,
    #[serde(rename = "totalValueLockedUSD", deserialize_with = "lenient_f64", default)]
    total_value_locked_usd: Option<f64>,
    #[serde(rename = "liquidityUSD", deserialize_with = "lenient_f64", default)]
    liquidity_usd: Option<f64>,
    #[serde(deserialize_with = "lenient_f64", default)]
    market_cap: Option<f64>,
    #[serde(deserialize_with = "lenient_f64", default)]
    day_txns: Option<f64>,
    #[serde(deserialize_with = "lenient_f64", default)]
    day_buys: Option<f64>,
    #[serde(deserialize_with = "lenient_f64", default)]
    day_sells: Option<f64>,
    #[serde(rename = "dayVolumeUSD", deserialize_with = "lenient_f64", default)]
    day_volume_usd: Option<f64>,
    #[serde(default)]
    hour_data: Vec<WireHour>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireHour {
    #[serde(deserialize_with = "lenient_i64", default)]
    period_start_unix: Option<i64>,
    #[serde(rename = "priceUSD", deserialize_with = "lenient_f64", default)]
    price_usd: Option<f64>,
}

impl WirePot2Pump {
    /// Converts to a [`Project`], deriving the 24h change from hourly data.
    pub(super) fn into_project(self, now: DateTime<Utc>) -> Result<Project, ListingError> {
        let status = self
            .state
            .and_then(|s| u8::try_from(s).ok())
            .and_then(LaunchStatus::from_indexer_code)
            .ok_or_else(|| {
                ListingError::Decode(format!("pair {} has unknown state {:?}", self.id, self.state))
            })?;
        let token = self.launch_token;

        let hours: Vec<HourlyPrice> = token
            .hour_data
            .iter()
            .filter_map(|h| {
                Some(HourlyPrice {
                    period_start_unix: h.period_start_unix?,
                    price_usd: h.price_usd?,
                })
            })
            .collect();

        let mut metrics = BTreeMap::new();
        let values = [
            (FilterKey::Tvl, token.total_value_locked_usd),
            (FilterKey::Liquidity, token.liquidity_usd),
            (FilterKey::Marketcap, token.market_cap),
            (FilterKey::DayTxns, token.day_txns),
            (FilterKey::DayBuys, token.day_buys),
            (FilterKey::DaySells, token.day_sells),
            (FilterKey::DayVolume, token.day_volume_usd),
            (FilterKey::Participants, self.participants_count),
            (FilterKey::DepositedRaisedToken, self.deposited_raised_token),
        ];
        for (key, value) in values {
            if let Some(v) = value {
                metrics.insert(key, v);
            }
        }
        if !hours.is_empty() {
            let change = price_change_24h(&hours, token.initial_usd.unwrap_or(0.0), now);
            metrics.insert(FilterKey::DayChange, change.change_percentage);
        }

        Ok(Project {
            address: self.id.to_lowercase(),
            name: token.name,
            symbol: token.symbol,
            status,
            raise_token_symbol: self.raised_token.symbol,
            raise_token_address: self.raised_token.id.to_lowercase(),
            raise_token_decimals: self
                .raised_token
                .decimals
                .and_then(|d| u8::try_from(d).ok())
                .unwrap_or(18),
            creator: self.creator.to_lowercase(),
            metrics,
            end_time: unix(self.end_time),
            created_at: unix(self.created_at),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct TransactionList {
    pub(super) transactions: Vec<WireTransaction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WireTransaction {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(deserialize_with = "lenient_i64", default)]
    timestamp: Option<i64>,
    account: Option<WireAccount>,
    #[serde(default)]
    swaps: Vec<WireSwap>,
    #[serde(default)]
    deposit_raised_tokens: Vec<WireAmount>,
    #[serde(default)]
    refunds: Vec<WireAmount>,
}

#[derive(Debug, Deserialize)]
struct WireAccount {
    id: String,
}

#[derive(Debug, Deserialize)]
struct WireSwap {
    amount0: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireAmount {
    amount: Option<String>,
}

impl WireTransaction {
    /// Converts to a [`TransactionRecord`]; unknown types yield `None`.
    pub(super) fn into_record(self) -> Option<TransactionRecord> {
        let kind = TransactionKind::from_indexer(&self.kind)?;
        let amount = match kind {
            TransactionKind::Swap => self.swaps.into_iter().next().and_then(|s| s.amount0),
            TransactionKind::Deposit => self
                .deposit_raised_tokens
                .into_iter()
                .next()
                .and_then(|d| d.amount),
            TransactionKind::Refund => self.refunds.into_iter().next().and_then(|r| r.amount),
            TransactionKind::ClaimLp => None,
        };
        Some(TransactionRecord {
            id: self.id,
            kind,
            account: self.account.map(|a| a.id.to_lowercase()).unwrap_or_default(),
            timestamp: unix(self.timestamp).unwrap_or_default(),
            amount,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        let Some(t) = DateTime::from_timestamp(1_700_003_000, 0) else {
            panic!("valid timestamp");
        };
        t
    }

    #[test]
    fn decodes_pot2pump_with_string_scalars() {
        let body = json!({
            "data": { "pot2Pumps": [{
                "id": "0xPAIR",
                "state": "3",
                "creator": "0xCreator",
                "endTime": "1700000000",
                "createdAt": 1_699_000_000,
                "depositedRaisedToken": "1250.5",
                "participantsCount": "12",
                "raisedToken": { "id": "0xHONEY", "symbol": "HONEY", "decimals": "18" },
                "launchToken": {
                    "name": "Pepe",
                    "symbol": "PEPE",
                    "initialUSD": "0.5",
                    "totalValueLockedUSD": "100",
                    "marketCap": null,
                    "hourData": []
                }
            }]}
        });
        let Ok(response) = serde_json::from_value::<GraphResponse<Pot2PumpList>>(body) else {
            panic!("decode");
        };
        let Ok(list) = response.into_data() else {
            panic!("data");
        };
        let Some(wire) = list.pot2_pumps.into_iter().next() else {
            panic!("one row");
        };
        let Ok(project) = wire.into_project(now()) else {
            panic!("convert");
        };
        assert_eq!(project.address, "0xpair");
        assert_eq!(project.status, LaunchStatus::Processing);
        assert_eq!(project.creator, "0xcreator");
        assert_eq!(project.raise_token_address, "0xhoney");
        assert_eq!(project.metric(FilterKey::DepositedRaisedToken), Some(1250.5));
        assert_eq!(project.metric(FilterKey::Participants), Some(12.0));
        assert_eq!(project.metric(FilterKey::Tvl), Some(100.0));
        assert_eq!(project.metric(FilterKey::Marketcap), None);
        assert_eq!(project.metric(FilterKey::DayChange), None);
        assert_eq!(project.end_time.map(|t| t.timestamp()), Some(1_700_000_000));
    }

    #[test]
    fn unknown_state_is_decode_error() {
        let body = json!({
            "id": "0xpair",
            "state": "2",
            "raisedToken": { "id": "0xhoney" },
            "launchToken": {}
        });
        let Ok(wire) = serde_json::from_value::<WirePot2Pump>(body) else {
            panic!("decode");
        };
        assert!(matches!(wire.into_project(now()), Err(ListingError::Decode(_))));
    }

    #[test]
    fn graphql_errors_become_fetch_errors() {
        let body = json!({ "data": null, "errors": [{ "message": "bad" }, { "message": "worse" }] });
        let Ok(response) = serde_json::from_value::<GraphResponse<Pot2PumpList>>(body) else {
            panic!("decode");
        };
        assert_eq!(
            response.into_data().err(),
            Some(ListingError::Fetch("bad; worse".to_string()))
        );
    }

    #[test]
    fn transactions_pick_amount_by_kind() {
        let body = json!({ "transactions": [
            { "id": "0x1", "type": "SWAP", "timestamp": "1700000000",
              "account": { "id": "0xACC" }, "swaps": [{ "amount0": "-2.5" }] },
            { "id": "0x2", "type": "DEPOSIT", "timestamp": "1700000001",
              "depositRaisedTokens": [{ "amount": "1000" }] },
            { "id": "0x3", "type": "CLAIM_LP", "timestamp": "1700000002" },
            { "id": "0x4", "type": "MINT", "timestamp": "1700000003" }
        ]});
        let Ok(list) = serde_json::from_value::<TransactionList>(body) else {
            panic!("decode");
        };
        let records: Vec<TransactionRecord> = list
            .transactions
            .into_iter()
            .filter_map(WireTransaction::into_record)
            .collect();
        assert_eq!(records.len(), 3);
        assert_eq!(records.first().and_then(|r| r.amount.as_deref()), Some("-2.5"));
        assert_eq!(records.first().map(|r| r.account.as_str()), Some("0xacc"));
        assert_eq!(records.get(1).and_then(|r| r.amount.as_deref()), Some("1000"));
        assert_eq!(records.get(2).map(|r| r.kind), Some(TransactionKind::ClaimLp));
    }
}
