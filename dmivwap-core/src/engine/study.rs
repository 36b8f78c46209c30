//! The per-bar study pipeline.
//!
//! `DmiVwapStudy` owns one instance of every component and evaluates one bar
//! per call to [`DmiVwapStudy::next`]:
//!
//! 1. Validate the bar (finite prices, high >= low, strictly later timestamp)
//! 2. Extract +DM, -DM and TR against the previous bar
//! 3. Smooth into Buyers%, Sellers% and ADX
//! 4. Fold volume and the bar's VWAP primitive into the anchor-period sums
//! 5. Detect the volume-confirmed buy crossover and refresh both labels
//!
//! A rejected bar leaves every component untouched, so the host can skip it and
//! keep feeding bars.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::{ConfigError, StudyConfig};
use crate::domain::{Bar, BarError};
use crate::engine::warmup::WarmupState;
use crate::indicators::{
    ComputeError, DirectionalExtractor, DmiAggregator, DmiValues, VwapAccumulator, VwapSnapshot,
};
use crate::signals::{info_label, BuyCrossover, CrossoverEvent, TrendLabel, TrendTracker};

/// Errors from feeding a bar to the study.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StudyError {
    #[error("rejected bar {bar_index}: {source}")]
    Bar {
        bar_index: usize,
        #[source]
        source: BarError,
    },
}

/// Everything the study produces for one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyOutput {
    pub bar_index: usize,
    pub time: NaiveDateTime,
    pub volume: u64,
    pub dmi: DmiValues,
    pub vwap_state: VwapSnapshot,
    pub crossover: CrossoverEvent,
    pub trend: TrendLabel,
    pub info: String,
    /// Every smoothed series covers a full window.
    pub warm: bool,
}

impl StudyOutput {
    pub fn buyers(&self) -> f64 {
        self.dmi.buyers
    }

    pub fn sellers(&self) -> f64 {
        self.dmi.sellers
    }

    pub fn adx(&self) -> f64 {
        self.dmi.adx
    }

    /// Anchored VWAP, or `ZeroPeriodVolume` while the period has traded nothing.
    pub fn vwap(&self) -> Result<f64, ComputeError> {
        self.vwap_state.vwap()
    }

    pub fn vwap_deviation(&self) -> Result<f64, ComputeError> {
        self.vwap_state.deviation()
    }

    pub fn buy_signal(&self) -> bool {
        self.crossover.buy_signal
    }

    /// Buy signal as a plot value: 1.0 or 0.0.
    pub fn buy_signal_value(&self) -> f64 {
        if self.crossover.buy_signal {
            1.0
        } else {
            0.0
        }
    }
}

/// DMI with anchored VWAP, evaluated incrementally.
#[derive(Debug, Clone)]
pub struct DmiVwapStudy {
    config: StudyConfig,
    extractor: DirectionalExtractor,
    dmi: DmiAggregator,
    vwap: VwapAccumulator,
    crossover: BuyCrossover,
    trend: TrendTracker,
    warmup: WarmupState,
    last_time: Option<NaiveDateTime>,
}

impl DmiVwapStudy {
    /// Validate `config` and build a study with empty state.
    pub fn new(config: StudyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let dmi = DmiAggregator::new(config.average_type, config.length)?;
        let warmup = WarmupState::from_lookbacks(&[dmi.lookback(), config.trend_length]);
        Ok(Self {
            config,
            extractor: DirectionalExtractor::new(),
            dmi,
            vwap: VwapAccumulator::new(config.time_frame),
            crossover: BuyCrossover::new(),
            trend: TrendTracker::new(config.trend_length)?,
            warmup,
            last_time: None,
        })
    }

    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    pub fn bars_processed(&self) -> usize {
        self.warmup.bars_processed()
    }

    pub fn bars_until_warm(&self) -> usize {
        self.warmup.bars_until_warm()
    }

    /// Return to the initial state, e.g. before a historical replay.
    pub fn reset(&mut self) {
        self.extractor.reset();
        self.dmi.reset();
        self.vwap.reset();
        self.crossover.reset();
        self.trend.reset();
        self.warmup.reset();
        self.last_time = None;
    }

    /// Evaluate the next bar in chronological order.
    pub fn next(&mut self, bar: &Bar) -> Result<StudyOutput, StudyError> {
        let bar_index = self.warmup.bars_processed();
        self.check_bar(bar)
            .map_err(|source| StudyError::Bar { bar_index, source })?;

        let moved = self.extractor.next(bar);
        let dmi = self.dmi.next(moved);
        let vwap_state = self.vwap.next(bar);
        let crossover = self.crossover.next(dmi.buyers, dmi.sellers, bar.volume);
        let trend = self.trend.next(bar.close);
        self.warmup.process_bar();
        self.last_time = Some(bar.time);

        if crossover.buy_signal {
            debug!(
                bar_index,
                time = %bar.time,
                buyers = dmi.buyers,
                sellers = dmi.sellers,
                volume = bar.volume,
                "buyers in control on rising volume"
            );
        }

        Ok(StudyOutput {
            bar_index,
            time: bar.time,
            volume: bar.volume,
            dmi,
            vwap_state,
            crossover,
            trend,
            info: info_label(bar.volume, bar.imp_volatility),
            warm: self.warmup.is_warm(),
        })
    }

    /// Feed a whole series, stopping at the first rejected bar.
    pub fn run(&mut self, bars: &[Bar]) -> Result<Vec<StudyOutput>, StudyError> {
        bars.iter().map(|bar| self.next(bar)).collect()
    }

    fn check_bar(&self, bar: &Bar) -> Result<(), BarError> {
        bar.validate()?;
        if let Some(previous) = self.last_time {
            if bar.time <= previous {
                return Err(BarError::OutOfOrder {
                    time: bar.time,
                    previous,
                });
            }
        }
        Ok(())
    }
}
