//! The per-period market data record fed to the study.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a bar is rejected before it reaches the study.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("bar at {time}: field '{field}' is not finite")]
    NonFinite { time: NaiveDateTime, field: &'static str },

    #[error("bar at {time}: high {high} is below low {low}")]
    HighBelowLow {
        time: NaiveDateTime,
        high: f64,
        low: f64,
    },

    #[error("bar at {time} is not after the previous bar at {previous}")]
    OutOfOrder {
        time: NaiveDateTime,
        previous: NaiveDateTime,
    },
}

/// OHLCV bar for a single period, plus the host-supplied VWAP primitive.
///
/// `vwap` is the volume-weighted average price of the bar itself (the value the
/// charting host reports per bar). The study accumulates it across an anchor
/// period. `imp_volatility` is only displayed, never computed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub vwap: f64,
    #[serde(default)]
    pub imp_volatility: Option<f64>,
}

impl Bar {
    /// Calendar date of the bar, used to derive anchor period keys.
    pub fn date(&self) -> NaiveDate {
        self.time.date()
    }

    /// Typical price `(high + low + close) / 3`.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Returns true if any price field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.vwap.is_finite())
    }

    /// Check the fields the study relies on.
    ///
    /// Only `high >= low` is enforced between prices; open and close outside the
    /// range are tolerated since some feeds report session-adjusted values.
    pub fn validate(&self) -> Result<(), BarError> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("vwap", self.vwap),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(BarError::NonFinite {
                    time: self.time,
                    field,
                });
            }
        }
        if self.high < self.low {
            return Err(BarError::HighBelowLow {
                time: self.time,
                high: self.high,
                low: self.low,
            });
        }
        Ok(())
    }
}
