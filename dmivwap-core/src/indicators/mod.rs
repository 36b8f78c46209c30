//! Incremental indicator components.
//!
//! Every component consumes one bar (or one value) at a time and owns only
//! bounded state, so a full history replay is never needed to produce the
//! latest value. Batch helpers (`moving_average`, `directional_series`) run a
//! fresh component over a slice and exist for tests and offline use.

pub mod directional;
pub mod dmi;
pub mod moving_average;
pub mod vwap;

pub use directional::{directional_move, directional_series, DirectionalExtractor, DirectionalMove};
pub use dmi::{DmiAggregator, DmiValues};
pub use moving_average::{moving_average, AverageMethod, MovingAverage};
pub use vwap::{ComputeError, VwapAccumulator, VwapSnapshot};

/// Create bars from (high, low, close) triples for testing.
///
/// open = close, volume = 1000, vwap = typical price, one calendar day apart.
#[cfg(test)]
pub fn make_hlc_bars(data: &[(f64, f64, f64)]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(high, low, close))| Bar {
            time: base + chrono::Duration::days(i as i64),
            open: close,
            high,
            low,
            close,
            volume: 1000,
            vwap: (high + low + close) / 3.0,
            imp_volatility: None,
        })
        .collect()
}

/// A flat bar at `vwap` with the given volume, timestamped from
/// `"YYYY-MM-DD"` or `"YYYY-MM-DD HH:MM"`.
#[cfg(test)]
pub fn make_volume_bar(when: &str, volume: u64, vwap: f64) -> crate::domain::Bar {
    use chrono::{NaiveDate, NaiveDateTime};
    let time = NaiveDateTime::parse_from_str(when, "%Y-%m-%d %H:%M").unwrap_or_else(|_| {
        NaiveDate::parse_from_str(when, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    });
    crate::domain::Bar {
        time,
        open: vwap,
        high: vwap,
        low: vwap,
        close: vwap,
        volume,
        vwap,
        imp_volatility: None,
    }
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
