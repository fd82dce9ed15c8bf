//! Transaction history rows of a launch and how they are displayed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of on-chain action recorded for a launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Trade against the launch pool.
    Swap,
    /// Raise token deposited while potting.
    Deposit,
    /// Deposit returned after a failed raise.
    Refund,
    /// LP tokens claimed after a successful raise.
    ClaimLp,
}

impl TransactionKind {
    /// Parses the indexer's upper-case type name.
    #[must_use]
    pub fn from_indexer(name: &str) -> Option<Self> {
        match name {
            "SWAP" => Some(Self::Swap),
            "DEPOSIT" => Some(Self::Deposit),
            "REFUND" => Some(Self::Refund),
            "CLAIM_LP" => Some(Self::ClaimLp),
            _ => None,
        }
    }
}

/// One transaction of a launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Transaction hash.
    pub id: String,
    /// Action kind.
    pub kind: TransactionKind,
    /// Sender address.
    pub account: String,
    /// Block timestamp.
    pub timestamp: DateTime<Utc>,
    /// Amount as reported by the indexer: a signed decimal for swaps
    /// (positive means the launch token was sold), raw integer units of the
    /// raise token for deposits and refunds, absent for LP claims.
    pub amount: Option<String>,
}

impl TransactionRecord {
    /// Label shown in the action column.
    #[must_use]
    pub fn action_label(&self) -> &'static str {
        match self.kind {
            TransactionKind::Swap => {
                let sold = self
                    .amount
                    .as_deref()
                    .and_then(|a| a.trim().parse::<f64>().ok())
                    .is_some_and(|a| a >= 0.0);
                if sold { "Sell" } else { "Buy" }
            }
            TransactionKind::Deposit => "Deposit",
            TransactionKind::Refund => "Refund",
            TransactionKind::ClaimLp => "Claim LP",
        }
    }

    /// Amount shown in the amount column, with three decimals.
    ///
    /// Deposits and refunds are scaled by the raise-token decimals and show
    /// `"0"` when those are unknown. Swaps need no scaling. LP claims carry
    /// no amount and show `"-"`.
    #[must_use]
    pub fn display_amount(&self, raise_decimals: Option<u8>) -> String {
        let amount = self.amount.as_deref().map(str::trim);
        match self.kind {
            TransactionKind::ClaimLp => "-".to_string(),
            TransactionKind::Swap => amount
                .and_then(|a| a.parse::<f64>().ok())
                .map_or_else(|| "0".to_string(), |a| format!("{a:.3}")),
            TransactionKind::Deposit | TransactionKind::Refund => amount
                .zip(raise_decimals)
                .and_then(|(a, decimals)| format_units(a, decimals))
                .unwrap_or_else(|| "0".to_string()),
        }
    }
}

/// One page of a launch's transaction history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionPage {
    /// One-based page number.
    pub page: u32,
    /// Rows, newest first.
    pub items: Vec<TransactionRecord>,
    /// Whether another page exists.
    pub has_next_page: bool,
}

/// Scales an integer amount of base units by `10^decimals` and rounds it
/// half-up to three decimals. Returns `None` for non-integer input or
/// amounts beyond `u128`.
#[must_use]
pub fn format_units(raw: &str, decimals: u8) -> Option<String> {
    let value: u128 = raw.parse().ok()?;
    let thousandths = if decimals >= 3 {
        let divisor = 10_u128.checked_pow(u32::from(decimals - 3))?;
        let quotient = value / divisor;
        let remainder = value % divisor;
        if remainder.checked_mul(2)? >= divisor {
            quotient.checked_add(1)?
        } else {
            quotient
        }
    } else {
        value.checked_mul(10_u128.pow(u32::from(3 - decimals)))?
    };
    Some(format!("{}.{:03}", thousandths / 1000, thousandths % 1000))
}

#[cfg(test)]
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
    fn swap_sign_decides_label() {
        assert_eq!(record(TransactionKind::Swap, Some("12.5")).action_label(), "Sell");
        assert_eq!(record(TransactionKind::Swap, Some("0")).action_label(), "Sell");
        assert_eq!(record(TransactionKind::Swap, Some("-3")).action_label(), "Buy");
        assert_eq!(record(TransactionKind::ClaimLp, None).action_label(), "Claim LP");
    }

    #[test]
    fn deposit_amount_is_scaled() {
        let tx = record(TransactionKind::Deposit, Some("1234500000000000000"));
        assert_eq!(tx.display_amount(Some(18)), "1.235");
    }

    #[test]
    fn swap_amount_has_three_decimals() {
        let tx = record(TransactionKind::Swap, Some("-0.12345"));
        assert_eq!(tx.display_amount(Some(18)), "-0.123");
    }

    #[test]
    fn claim_lp_shows_dash() {
        let tx = record(TransactionKind::ClaimLp, None);
        assert_eq!(tx.display_amount(Some(18)), "-");
    }

    #[test]
    fn unknown_decimals_only_blank_scaled_amounts() {
        assert_eq!(record(TransactionKind::Refund, Some("1000")).display_amount(None), "0");
        assert_eq!(record(TransactionKind::Deposit, Some("1000")).display_amount(None), "0");
        assert_eq!(record(TransactionKind::Swap, Some("2.5")).display_amount(None), "2.500");
        assert_eq!(record(TransactionKind::ClaimLp, None).display_amount(None), "-");
    }

    #[test]
    fn zero_decimals_format_whole_units() {
        let tx = record(TransactionKind::Deposit, Some("42"));
        assert_eq!(tx.display_amount(Some(0)), "42.000");
    }

    #[test]
    fn format_units_handles_small_decimals() {
        assert_eq!(format_units("5", 0).as_deref(), Some("5.000"));
        assert_eq!(format_units("15", 1).as_deref(), Some("1.500"));
        assert_eq!(format_units("999999", 6).as_deref(), Some("1.000"));
        assert_eq!(format_units("1.5", 6), None);
    }

    #[test]
    fn indexer_names_parse() {
        assert_eq!(TransactionKind::from_indexer("CLAIM_LP"), Some(TransactionKind::ClaimLp));
        assert_eq!(TransactionKind::from_indexer("MINT"), None);
    }
}
