//! Text annotations: trend direction and volume/volatility info.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::config::{check_length, ConfigError};

/// Direction of `close` versus `close` from `trend_length` bars ago.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendLabel {
    Uptrend,
    Downtrend,
    /// Fewer than `trend_length + 1` bars seen; there is no reference close yet.
    InsufficientHistory,
}

impl TrendLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendLabel::Uptrend => "Uptrend",
            TrendLabel::Downtrend => "Downtrend",
            TrendLabel::InsufficientHistory => "Insufficient history",
        }
    }
}

impl fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keeps the last `trend_length + 1` closes.
#[derive(Debug, Clone)]
pub struct TrendTracker {
    trend_length: usize,
    closes: VecDeque<f64>,
}

impl TrendTracker {
    pub fn new(trend_length: usize) -> Result<Self, ConfigError> {
        check_length("trend_length", trend_length)?;
        Ok(Self {
            trend_length,
            closes: VecDeque::new(),
        })
    }

    pub fn reset(&mut self) {
        self.closes.clear();
    }

    pub fn next(&mut self, close: f64) -> TrendLabel {
        self.closes.push_back(close);
        if self.closes.len() > self.trend_length + 1 {
            self.closes.pop_front();
        }
        if self.closes.len() <= self.trend_length {
            return TrendLabel::InsufficientHistory;
        }
        match self.closes.front() {
            Some(&then) if then < close => TrendLabel::Uptrend,
            _ => TrendLabel::Downtrend,
        }
    }
}

/// `"Volume: <volume>, Volatility: <iv>"`, with `N/A` when no implied
/// volatility is available.
pub fn info_label(volume: u64, imp_volatility: Option<f64>) -> String {
    match imp_volatility.filter(|iv| iv.is_finite()) {
        Some(iv) => format!("Volume: {volume}, Volatility: {iv:.4}"),
        None => format!("Volume: {volume}, Volatility: N/A"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_until_reference_bar_exists() {
        let mut t = TrendTracker::new(3).unwrap();
        assert_eq!(t.next(10.0), TrendLabel::InsufficientHistory);
        assert_eq!(t.next(11.0), TrendLabel::InsufficientHistory);
        assert_eq!(t.next(12.0), TrendLabel::InsufficientHistory);
        // close[3] vs close[0]
        assert_eq!(t.next(13.0), TrendLabel::Uptrend);
    }

    #[test]
    fn compares_against_exactly_n_bars_ago() {
        let mut t = TrendTracker::new(2).unwrap();
        let labels: Vec<TrendLabel> = [10.0, 20.0, 5.0, 30.0, 1.0]
            .iter()
            .map(|&c| t.next(c))
            .collect();
        assert_eq!(
            labels,
            vec![
                TrendLabel::InsufficientHistory,
                TrendLabel::InsufficientHistory,
                TrendLabel::Downtrend, // 5 vs 10
                TrendLabel::Uptrend,   // 30 vs 20
                TrendLabel::Downtrend, // 1 vs 5
            ]
        );
    }

    #[test]
    fn unchanged_close_is_downtrend() {
        let mut t = TrendTracker::new(1).unwrap();
        t.next(10.0);
        assert_eq!(t.next(10.0), TrendLabel::Downtrend);
    }

    #[test]
    fn zero_trend_length_is_rejected() {
        assert!(matches!(
            TrendTracker::new(0),
            Err(ConfigError::InvalidLength {
                field: "trend_length",
                ..
            })
        ));
    }

    #[test]
    fn oversized_trend_length_is_rejected() {
        assert!(matches!(
            TrendTracker::new(usize::MAX),
            Err(ConfigError::LengthTooLarge {
                field: "trend_length",
                ..
            })
        ));
    }

    #[test]
    fn info_label_formats() {
        assert_eq!(
            info_label(1_250_000, Some(0.31234)),
            "Volume: 1250000, Volatility: 0.3123"
        );
        assert_eq!(info_label(0, None), "Volume: 0, Volatility: N/A");
        assert_eq!(info_label(5, Some(f64::NAN)), "Volume: 5, Volatility: N/A");
    }

    #[test]
    fn trend_label_text() {
        assert_eq!(TrendLabel::Uptrend.to_string(), "Uptrend");
        assert_eq!(
            TrendLabel::InsufficientHistory.to_string(),
            "Insufficient history"
        );
    }
}
