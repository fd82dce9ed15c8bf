//! GraphQL documents and variable builders for the launch indexer.

use serde_json::{Map, Value, json};

use super::PageRequest;
use crate::domain::{Criterion, FilterKey, Range};

const POT2PUMP_FIELDS: &str = r"
fragment Pot2PumpFields on Pot2Pump {
  id
  state
  creator
  endTime
  createdAt
  depositedRaisedToken
  participantsCount
  raisedToken { id symbol decimals }
  launchToken {
    id
    name
    symbol
    initialUSD
    totalValueLockedUSD
    liquidityUSD
    marketCap
    dayTxns
    dayBuys
    daySells
    dayVolumeUSD
    hourData(first: 48, orderBy: periodStartUnix, orderDirection: desc) {
      periodStartUnix
      priceUSD
    }
  }
}
";

/// Lists launches with filtering, sorting and offset paging.
pub(super) fn list_pot2pumps() -> String {
    format!(
        "query ListPot2Pumps($first: Int!, $skip: Int!, $orderBy: Pot2Pump_orderBy, \
         $orderDirection: OrderDirection, $where: Pot2Pump_filter) {{
  pot2Pumps(first: $first, skip: $skip, orderBy: $orderBy, orderDirection: $orderDirection, where: $where) {{
    ...Pot2PumpFields
  }}
}}
{POT2PUMP_FIELDS}"
    )
}

/// Reads a single launch by pair address.
pub(super) fn pot2pump_by_id() -> String {
    format!(
        "query Pot2Pump($id: ID!) {{
  pot2Pump(id: $id) {{
    ...Pot2PumpFields
  }}
}}
{POT2PUMP_FIELDS}"
    )
}

/// Lists a launch's transactions, newest first.
pub(super) const POT2PUMP_TRANSACTIONS: &str = r"
query Pot2PumpTransactions($first: Int!, $skip: Int!, $pair: String!) {
  transactions(first: $first, skip: $skip, orderBy: timestamp, orderDirection: desc, where: { pot2Pump: $pair }) {
    id
    type
    timestamp
    account { id }
    swaps { amount0 }
    depositRaisedTokens { amount }
    refunds { amount }
  }
}
";

/// Indexer scalar type of a filterable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldType {
    Decimal,
    Integer,
    Bytes,
}

/// Where a filter key lives in the indexer schema: optional nested entity,
/// field name, scalar type.
fn indexer_field(key: FilterKey) -> (Option<&'static str>, &'static str, FieldType) {
    match key {
        FilterKey::Tvl => (Some("launchToken"), "totalValueLockedUSD", FieldType::Decimal),
        FilterKey::Liquidity => (Some("launchToken"), "liquidityUSD", FieldType::Decimal),
        FilterKey::Marketcap => (Some("launchToken"), "marketCap", FieldType::Decimal),
        FilterKey::DayTxns => (Some("launchToken"), "dayTxns", FieldType::Integer),
        FilterKey::DayBuys => (Some("launchToken"), "dayBuys", FieldType::Integer),
        FilterKey::DaySells => (Some("launchToken"), "daySells", FieldType::Integer),
        FilterKey::DayVolume => (Some("launchToken"), "dayVolumeUSD", FieldType::Decimal),
        FilterKey::DayChange => (Some("launchToken"), "priceChange24hPercentage", FieldType::Decimal),
        FilterKey::Participants => (None, "participantsCount", FieldType::Integer),
        FilterKey::DepositedRaisedToken => (None, "depositedRaisedToken", FieldType::Decimal),
        FilterKey::RaiseToken => (None, "raisedToken", FieldType::Bytes),
        FilterKey::Creator => (None, "creator", FieldType::Bytes),
    }
}

/// Maps a sort field to the indexer's `orderBy` value. Metric names use
/// the nested `entity__field` form; anything else passes through.
pub(super) fn order_by(field: &str) -> String {
    match FilterKey::parse(field) {
        Some(key) => match indexer_field(key) {
            (Some(entity), name, _) => format!("{entity}__{name}"),
            (None, name, _) => name.to_string(),
        },
        None => field.to_string(),
    }
}

/// Encodes a bound the way the indexer expects its scalar: BigDecimal as a
/// decimal string, BigInt rounded inward to an integer string.
fn bound(value: f64, field_type: FieldType, is_min: bool) -> Value {
    match field_type {
        FieldType::Integer => {
            let rounded = if is_min { value.ceil() } else { value.floor() };
            Value::String(format!("{rounded:.0}"))
        }
        FieldType::Decimal | FieldType::Bytes => Value::String(value.to_string()),
    }
}

fn range_conditions(range: &Range, name: &str, field_type: FieldType) -> Map<String, Value> {
    let mut conditions = Map::new();
    if let Some(min) = range.min {
        conditions.insert(format!("{name}_gte"), bound(min, field_type, true));
    }
    if let Some(max) = range.max {
        conditions.insert(format!("{name}_lte"), bound(max, field_type, false));
    }
    conditions
}

/// Builds the `where` argument for a listing query.
pub(super) fn where_clause(request: &PageRequest) -> Value {
    let mut top = Map::new();
    let mut nested: Map<String, Value> = Map::new();

    if let Some(status) = request.status {
        top.insert("state".to_string(), json!(status.indexer_code()));
    }

    for (key, criterion) in request.filter.iter() {
        let (entity, name, field_type) = indexer_field(key);
        let conditions = match criterion {
            Criterion::Range(range) => range_conditions(range, name, field_type),
            Criterion::Exact(value) => {
                let mut m = Map::new();
                m.insert(name.to_string(), Value::String(value.clone()));
                m
            }
        };
        match entity {
            Some(entity) => {
                let slot = nested
                    .entry(format!("{entity}_"))
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(obj) = slot {
                    obj.extend(conditions);
                }
            }
            None => top.extend(conditions),
        }
    }
    top.extend(nested);

    match &request.search {
        Some(search) => json!({
            "and": [
                Value::Object(top),
                {
                    "or": [
                        { "launchToken_": { "name_contains_nocase": search } },
                        { "launchToken_": { "symbol_contains_nocase": search } },
                        { "id": search.to_lowercase() },
                    ]
                }
            ]
        }),
        None => Value::Object(top),
    }
}

/// Variables for [`list_pot2pumps`]. Asks for one extra row so the
/// presence of a next page can be detected.
pub(super) fn list_variables(request: &PageRequest) -> Value {
    json!({
        "first": u64::from(request.page_size) + 1,
        "skip": request.offset(),
        "orderBy": order_by(&request.order.field),
        "orderDirection": request.order.direction.as_str(),
        "where": where_clause(request),
    })
}
