//! 24-hour price change of a launch token from hourly indexer data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const HOUR: i64 = 3600;

/// Average price of one indexer hour bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlyPrice {
    /// Unix timestamp of the bucket start, aligned to the hour.
    pub period_start_unix: i64,
    /// Price in USD.
    pub price_usd: f64,
}

/// Absolute and relative price change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceChange {
    /// Current average minus previous average, USD.
    pub change: f64,
    /// Change relative to the previous average, percent.
    pub change_percentage: f64,
}

impl PriceChange {
    const ZERO: Self = Self {
        change: 0.0,
        change_percentage: 0.0,
    };
}

/// Compares the average price of the last 24 hour buckets with the 24
/// buckets before them.
///
/// When the recent window has no bucket, the first bucket's price stands
/// in; when the previous window has none, `initial_usd` does. A zero
/// previous average counts as +100 %, a zero recent average as 0 %.
#[must_use]
pub fn price_change_24h(hours: &[HourlyPrice], initial_usd: f64, now: DateTime<Utc>) -> PriceChange {
    let Some(first) = hours.first() else {
        return PriceChange::ZERO;
    };
    let current_hour = now.timestamp().div_euclid(HOUR) * HOUR;

    let recent = window_average(hours, current_hour, 0..24).unwrap_or(first.price_usd);
    let previous = window_average(hours, current_hour, 24..48).unwrap_or(initial_usd);

    if previous == 0.0 {
        PriceChange {
            change: recent,
            change_percentage: 100.0,
        }
    } else if recent == 0.0 {
        PriceChange {
            change: -previous,
            change_percentage: 0.0,
        }
    } else {
        PriceChange {
            change: recent - previous,
            change_percentage: (recent - previous) / previous * 100.0,
        }
    }
}

fn window_average(
    hours: &[HourlyPrice],
    current_hour: i64,
    offsets: std::ops::Range<i64>,
) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0_u32;
    for offset in offsets {
        let start = current_hour - offset * HOUR;
        if let Some(bucket) = hours.iter().find(|h| h.period_start_unix == start) {
            sum += bucket.price_usd;
            count += 1;
        }
    }
    (count > 0).then(|| sum / f64::from(count))
}
