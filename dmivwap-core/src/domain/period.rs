//! Anchor periods, chart aggregation, and VWAP period keys.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;

/// Recurring interval over which VWAP sums accumulate before resetting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorPeriod {
    #[default]
    Day,
    Week,
    Month,
}

/// Comparable key identifying the anchor period a bar belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeriodKey(pub i64);

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AnchorPeriod {
    /// Map a calendar date to the key of its anchor period.
    ///
    /// - Day: `yyyymmdd`
    /// - Week: day number (from CE) of the Sunday that opens the week
    /// - Month: `yyyymm`
    pub fn period_key(self, date: NaiveDate) -> PeriodKey {
        match self {
            AnchorPeriod::Day => PeriodKey(yyyymmdd(date)),
            AnchorPeriod::Week => {
                let sunday = date.week(Weekday::Sun).first_day();
                PeriodKey(i64::from(sunday.num_days_from_ce()))
            }
            // Integer truncation of yyyymmdd / 100.
            AnchorPeriod::Month => PeriodKey(yyyymmdd(date) / 100),
        }
    }

    /// The chart aggregation equal in span to this anchor.
    pub fn as_aggregation(self) -> BarAggregation {
        match self {
            AnchorPeriod::Day => BarAggregation::Day,
            AnchorPeriod::Week => BarAggregation::Week,
            AnchorPeriod::Month => BarAggregation::Month,
        }
    }

    /// Reject an anchor that is finer than the chart's bars.
    pub fn check_aggregation(self, aggregation: BarAggregation) -> Result<(), ConfigError> {
        if aggregation > self.as_aggregation() {
            return Err(ConfigError::AnchorFinerThanChart {
                anchor: self,
                aggregation,
            });
        }
        Ok(())
    }
}

fn yyyymmdd(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 10_000 + i64::from(date.month()) * 100 + i64::from(date.day())
}

impl fmt::Display for AnchorPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AnchorPeriod::Day => "day",
            AnchorPeriod::Week => "week",
            AnchorPeriod::Month => "month",
        };
        f.write_str(s)
    }
}

impl FromStr for AnchorPeriod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(AnchorPeriod::Day),
            "week" => Ok(AnchorPeriod::Week),
            "month" => Ok(AnchorPeriod::Month),
            _ => Err(ConfigError::UnknownAnchor(s.to_string())),
        }
    }
}

/// Native bar size of the chart the study runs on, finest first.
///
/// Serialized as a short string: `"5m"`, `"1h"`, `"day"`, `"week"`, `"month"`,
/// `"quarter"`, `"year"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BarAggregation {
    Intraday { minutes: u32 },
    #[default]
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl fmt::Display for BarAggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BarAggregation::Intraday { minutes } if minutes % 60 == 0 => {
                write!(f, "{}h", minutes / 60)
            }
            BarAggregation::Intraday { minutes } => write!(f, "{minutes}m"),
            BarAggregation::Day => f.write_str("day"),
            BarAggregation::Week => f.write_str("week"),
            BarAggregation::Month => f.write_str("month"),
            BarAggregation::Quarter => f.write_str("quarter"),
            BarAggregation::Year => f.write_str("year"),
        }
    }
}

impl FromStr for BarAggregation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let named = match lower.as_str() {
            "day" | "1d" => Some(BarAggregation::Day),
            "week" | "1w" => Some(BarAggregation::Week),
            "month" | "1mo" => Some(BarAggregation::Month),
            "quarter" => Some(BarAggregation::Quarter),
            "year" | "1y" => Some(BarAggregation::Year),
            _ => None,
        };
        if let Some(agg) = named {
            return Ok(agg);
        }

        let unknown = || ConfigError::UnknownAggregation(s.to_string());
        let (digits, scale) = if let Some(d) = lower.strip_suffix('m') {
            (d, 1)
        } else if let Some(d) = lower.strip_suffix('h') {
            (d, 60)
        } else {
            return Err(unknown());
        };
        let count: u32 = digits.parse().map_err(|_| unknown())?;
        let minutes = count.checked_mul(scale).ok_or_else(unknown)?;
        // Anything a day or longer must use the named variants.
        if minutes == 0 || minutes >= 24 * 60 {
            return Err(unknown());
        }
        Ok(BarAggregation::Intraday { minutes })
    }
}

impl TryFrom<String> for BarAggregation {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BarAggregation> for String {
    fn from(value: BarAggregation) -> Self {
        value.to_string()
    }
}
