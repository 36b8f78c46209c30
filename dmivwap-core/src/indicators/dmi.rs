//! DMI aggregator: Buyers% (+DI), Sellers% (-DI) and ADX.
//!
//! Steps per bar:
//! 1. Smooth TR, +DM and -DM with the configured moving average
//! 2. Buyers% = 100 * smoothed(+DM) / ATR, Sellers% = 100 * smoothed(-DM) / ATR
//! 3. DX = 100 * |Buyers% - Sellers%| / (Buyers% + Sellers%)
//! 4. ADX = smoothed(DX)
//!
//! A zero ATR (flat market) defines Buyers% and Sellers% as 0, and a zero DI
//! sum defines DX as 0. Both are ordinary market conditions, not errors.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::indicators::directional::DirectionalMove;
use crate::indicators::moving_average::{AverageMethod, MovingAverage};

/// Everything the aggregator derived for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DmiValues {
    pub plus_dm: f64,
    pub minus_dm: f64,
    pub true_range: f64,
    pub atr: f64,
    pub buyers: f64,
    pub sellers: f64,
    pub dx: f64,
    pub adx: f64,
}

/// Four independent moving-average engines: TR, +DM, -DM and DX.
#[derive(Debug, Clone)]
pub struct DmiAggregator {
    atr: MovingAverage,
    plus: MovingAverage,
    minus: MovingAverage,
    adx: MovingAverage,
}

impl DmiAggregator {
    pub fn new(method: AverageMethod, length: usize) -> Result<Self, ConfigError> {
        Ok(Self {
            atr: MovingAverage::new(method, length)?,
            plus: MovingAverage::new(method, length)?,
            minus: MovingAverage::new(method, length)?,
            adx: MovingAverage::new(method, length)?,
        })
    }

    /// Bars before ADX covers a full window of fully smoothed DX values.
    pub fn lookback(&self) -> usize {
        self.atr.lookback() + self.adx.lookback()
    }

    pub fn reset(&mut self) {
        self.atr.reset();
        self.plus.reset();
        self.minus.reset();
        self.adx.reset();
    }

    pub fn next(&mut self, moved: DirectionalMove) -> DmiValues {
        let atr = self.atr.next(moved.true_range);
        let smooth_plus = self.plus.next(moved.plus_dm);
        let smooth_minus = self.minus.next(moved.minus_dm);

        let (buyers, sellers) = if atr <= 0.0 {
            (0.0, 0.0)
        } else {
            (100.0 * smooth_plus / atr, 100.0 * smooth_minus / atr)
        };

        let di_sum = buyers + sellers;
        let dx = if di_sum > 0.0 {
            100.0 * (buyers - sellers).abs() / di_sum
        } else {
            0.0
        };
        let adx = self.adx.next(dx);

        DmiValues {
            plus_dm: moved.plus_dm,
            minus_dm: moved.minus_dm,
            true_range: moved.true_range,
            atr,
            buyers,
            sellers,
            dx,
            adx,
        }
    }
}
