//! Period-anchored VWAP accumulator.
//!
//! Sums `volume`, `volume * vwap` and `volume * vwap^2` over the bars of one
//! anchor period (day, week or month) and resets when the period key changes.
//! VWAP = sum(volume * vwap) / sum(volume). The squared sum gives the
//! volume-weighted standard deviation of the period's per-bar VWAP values.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{AnchorPeriod, Bar, PeriodKey};

/// Numeric failures that must not be papered over with NaN.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComputeError {
    #[error("anchor period {period_key} has no volume yet, VWAP is undefined")]
    ZeroPeriodVolume { period_key: PeriodKey },
}

/// Running sums of the current anchor period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VwapSnapshot {
    pub period_key: PeriodKey,
    pub volume_sum: f64,
    pub volume_vwap_sum: f64,
    pub volume_vwap2_sum: f64,
    /// True when this bar opened a new period.
    pub rolled: bool,
}

impl VwapSnapshot {
    pub fn vwap(&self) -> Result<f64, ComputeError> {
        if self.volume_sum <= 0.0 {
            return Err(ComputeError::ZeroPeriodVolume {
                period_key: self.period_key,
            });
        }
        Ok(self.volume_vwap_sum / self.volume_sum)
    }

    /// Volume-weighted standard deviation of the per-bar VWAP primitive.
    pub fn deviation(&self) -> Result<f64, ComputeError> {
        let mean = self.vwap()?;
        let variance = self.volume_vwap2_sum / self.volume_sum - mean * mean;
        // Cancellation can push an all-equal period slightly below zero.
        Ok(variance.max(0.0).sqrt())
    }
}

#[derive(Debug, Clone)]
pub struct VwapAccumulator {
    anchor: AnchorPeriod,
    state: Option<VwapSnapshot>,
}

impl VwapAccumulator {
    pub fn new(anchor: AnchorPeriod) -> Self {
        Self {
            anchor,
            state: None,
        }
    }

    pub fn anchor(&self) -> AnchorPeriod {
        self.anchor
    }

    /// Sums after the most recent bar, `None` before the first bar.
    pub fn snapshot(&self) -> Option<VwapSnapshot> {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = None;
    }

    /// Fold one bar into the running sums and return the updated snapshot.
    pub fn next(&mut self, bar: &Bar) -> VwapSnapshot {
        let period_key = self.anchor.period_key(bar.date());
        let volume = bar.volume as f64;
        let volume_vwap = volume * bar.vwap;
        let volume_vwap2 = volume * bar.vwap * bar.vwap;

        let snapshot = match self.state {
            Some(prev) if prev.period_key == period_key => VwapSnapshot {
                period_key,
                volume_sum: prev.volume_sum + volume,
                volume_vwap_sum: prev.volume_vwap_sum + volume_vwap,
                volume_vwap2_sum: prev.volume_vwap2_sum + volume_vwap2,
                rolled: false,
            },
            prev => {
                debug!(
                    anchor = %self.anchor,
                    from = ?prev.map(|p| p.period_key.0),
                    to = period_key.0,
                    "VWAP period rolled"
                );
                VwapSnapshot {
                    period_key,
                    volume_sum: volume,
                    volume_vwap_sum: volume_vwap,
                    volume_vwap2_sum: volume_vwap2,
                    rolled: true,
                }
            }
        };

        if snapshot.volume_sum <= 0.0 {
            warn!(period_key = period_key.0, time = %bar.time, "zero volume in VWAP period");
        }
        self.state = Some(snapshot);
        snapshot
    }
}
