//! Transaction history DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{AsyncState, TransactionKind, TransactionPage, TransactionRecord};

/// Query of `GET /projects/{address}/transactions`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransactionParams {
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Rows per page (max 100). Defaults to the server setting.
    #[serde(default)]
    pub per_page: Option<u32>,
    /// Raise token decimals used to format deposit and refund amounts.
    /// Without them those amounts show `0`.
    #[serde(default)]
    pub raise_decimals: Option<u8>,
}

fn default_page() -> u32 {
    1
}

impl TransactionParams {
    /// Clamps `page` to at least 1 and `per_page` to `1..=100`.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.map(|p| p.clamp(1, 100)),
            raise_decimals: self.raise_decimals,
        }
    }
}

/// One formatted transaction row.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionRowDto {
    /// Transaction hash.
    pub id: String,
    /// `swap`, `deposit`, `refund` or `claim_lp`.
    pub kind: String,
    /// Action label: `Buy`, `Sell`, `Deposit`, `Refund` or `Claim LP`.
    pub action: String,
    /// Sender address.
    pub account: String,
    /// Block timestamp.
    pub timestamp: DateTime<Utc>,
    /// Display amount with three decimals.
    pub amount: String,
    /// Amount as reported by the indexer.
    pub raw_amount: Option<String>,
}

impl TransactionRowDto {
    /// Formats `record` with the raise token `decimals`.
    #[must_use]
    pub fn new(record: &TransactionRecord, decimals: Option<u8>) -> Self {
        let kind = match record.kind {
            TransactionKind::Swap => "swap",
            TransactionKind::Deposit => "deposit",
            TransactionKind::Refund => "refund",
            TransactionKind::ClaimLp => "claim_lp",
        };
        Self {
            id: record.id.clone(),
            kind: kind.to_string(),
            action: record.action_label().to_string(),
            account: record.account.clone(),
            timestamp: record.timestamp,
            amount: record.display_amount(decimals),
            raw_amount: record.amount.clone(),
        }
    }
}

/// Response body of the transaction history endpoint.
///
/// Fetch failures are reported in `error` with a 200 status.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionHistoryResponse {
    /// Pair address.
    pub pair: String,
    /// One-based page of `items`.
    pub page: u32,
    /// Rows, newest first.
    pub items: Vec<TransactionRowDto>,
    /// Whether another page exists.
    pub has_next_page: bool,
    /// Whether a newer request for this pair is still in flight.
    pub loading: bool,
    /// Message of the last failed fetch.
    pub error: Option<String>,
}

impl TransactionHistoryResponse {
    /// Builds the response from the pair's request state.
    #[must_use]
    pub fn new(pair: &str, state: &AsyncState<TransactionPage>, decimals: Option<u8>) -> Self {
        let (page, items, has_next_page) = state.value.as_ref().map_or((1, Vec::new(), false), |p| {
            (
                p.page,
                p.items
                    .iter()
                    .map(|r| TransactionRowDto::new(r, decimals))
                    .collect(),
                p.has_next_page,
            )
        });
        Self {
            pair: pair.to_lowercase(),
            page,
            items,
            has_next_page,
            loading: state.loading,
            error: state.error.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn record(kind: TransactionKind, amount: Option<&str>) -> TransactionRecord {
        TransactionRecord {
            id: "0xtx".to_string(),
            kind,
            account: "0xacc".to_string(),
            timestamp: Utc::now(),
            amount: amount.map(str::to_string),
        }
    }

    #[test]
    fn rows_without_decimals_keep_swap_and_claim_amounts() {
        let page = TransactionPage {
            page: 1,
            items: vec![
                record(TransactionKind::Swap, Some("-1.5")),
                record(TransactionKind::Deposit, Some("2000000000000000000")),
                record(TransactionKind::ClaimLp, None),
            ],
            has_next_page: false,
        };
        let mut state = AsyncState::new();
        let epoch = state.start();
        let _ = state.succeed(epoch, page);

        let amounts = |decimals: Option<u8>| -> Vec<String> {
            TransactionHistoryResponse::new("0xPAIR", &state, decimals)
                .items
                .into_iter()
                .map(|row| row.amount)
                .collect()
        };
        assert_eq!(amounts(None), vec!["-1.500", "0", "-"]);
        assert_eq!(amounts(Some(18)), vec!["-1.500", "2.000", "-"]);
    }

    #[test]
    fn absent_params_use_defaults() {
        let Ok(params) = serde_json::from_str::<TransactionParams>("{}") else {
            panic!("defaults apply");
        };
        let params = params.clamped();
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, None);
        assert_eq!(params.raise_decimals, None);
    }
}
