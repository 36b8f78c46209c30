//! True Range and raw directional movement.
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! +DM: high-prev_high when it exceeds prev_low-low and is positive, else 0.
//! -DM: prev_low-low when it exceeds high-prev_high and is positive, else 0.
//! The first bar has no predecessor: TR = high-low, both DMs are 0.

use crate::domain::Bar;

/// Per-bar raw deltas fed to the DMI smoothing stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalMove {
    pub plus_dm: f64,
    pub minus_dm: f64,
    pub true_range: f64,
}

/// The three prices of the previous bar the extractor needs.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PrevPrices {
    high: f64,
    low: f64,
    close: f64,
}

/// True range of `bar` relative to the previous close, or `high - low`
/// without one.
pub fn true_range(bar: &Bar, prev_close: Option<f64>) -> f64 {
    let range = bar.high - bar.low;
    match prev_close {
        Some(pc) => range.max((bar.high - pc).abs()).max((bar.low - pc).abs()),
        None => range,
    }
}

/// Derive +DM, -DM and TR for `bar` given its predecessor.
pub fn directional_move(bar: &Bar, prev: Option<&Bar>) -> DirectionalMove {
    let prev = prev.map(|p| PrevPrices {
        high: p.high,
        low: p.low,
        close: p.close,
    });
    compute(bar, prev)
}

fn compute(bar: &Bar, prev: Option<PrevPrices>) -> DirectionalMove {
    let Some(prev) = prev else {
        return DirectionalMove {
            plus_dm: 0.0,
            minus_dm: 0.0,
            true_range: true_range(bar, None),
        };
    };

    let hi_diff = bar.high - prev.high;
    let lo_diff = prev.low - bar.low;

    let plus_dm = if hi_diff > lo_diff && hi_diff > 0.0 {
        hi_diff
    } else {
        0.0
    };
    let minus_dm = if lo_diff > hi_diff && lo_diff > 0.0 {
        lo_diff
    } else {
        0.0
    };

    DirectionalMove {
        plus_dm,
        minus_dm,
        true_range: true_range(bar, Some(prev.close)),
    }
}

/// Streaming extractor: remembers only the previous bar's high, low and close.
#[derive(Debug, Clone, Default)]
pub struct DirectionalExtractor {
    prev: Option<PrevPrices>,
}

impl DirectionalExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, bar: &Bar) -> DirectionalMove {
        let moved = compute(bar, self.prev);
        self.prev = Some(PrevPrices {
            high: bar.high,
            low: bar.low,
            close: bar.close,
        });
        moved
    }

    pub fn reset(&mut self) {
        self.prev = None;
    }
}

/// Batch form over a full bar series.
pub fn directional_series(bars: &[Bar]) -> Vec<DirectionalMove> {
    let mut extractor = DirectionalExtractor::new();
    bars.iter().map(|b| extractor.next(b)).collect()
}
