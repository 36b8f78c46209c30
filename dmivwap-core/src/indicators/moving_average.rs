//! Moving average engine: five incremental averaging methods.
//!
//! One engine instance tracks one series. Each call to [`MovingAverage::next`]
//! consumes the newest value and returns the updated average in O(1) amortized
//! time; state is bounded by `length` values.
//!
//! Warm-up convention (fewer than `length` values seen): every method averages
//! what it has. Simple and Weighted shrink their window, Wilders emits the
//! running mean (so its first full value is the SMA seed), and Exponential seeds
//! with the first value. Hull inherits the Weighted convention from its three
//! inner weighted averages.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use crate::config::{check_length, ConfigError};

/// Averaging method applied to every smoothed series of the study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AverageMethod {
    Simple,
    Exponential,
    Weighted,
    #[default]
    Wilders,
    Hull,
}

impl AverageMethod {
    pub const ALL: [AverageMethod; 5] = [
        AverageMethod::Simple,
        AverageMethod::Exponential,
        AverageMethod::Weighted,
        AverageMethod::Wilders,
        AverageMethod::Hull,
    ];
}

impl fmt::Display for AverageMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AverageMethod::Simple => "simple",
            AverageMethod::Exponential => "exponential",
            AverageMethod::Weighted => "weighted",
            AverageMethod::Wilders => "wilders",
            AverageMethod::Hull => "hull",
        };
        f.write_str(s)
    }
}

impl FromStr for AverageMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" | "sma" => Ok(AverageMethod::Simple),
            "exponential" | "ema" => Ok(AverageMethod::Exponential),
            "weighted" | "wma" => Ok(AverageMethod::Weighted),
            "wilders" | "wilder" | "wilder's" => Ok(AverageMethod::Wilders),
            "hull" | "hma" => Ok(AverageMethod::Hull),
            _ => Err(ConfigError::UnknownAverageType(s.to_string())),
        }
    }
}

/// Rolling arithmetic mean over at most `length` values.
///
/// The running sum is rebuilt from the window once per `length` evictions, and
/// is exactly 0.0 whenever every value in the window is 0.0.
#[derive(Debug, Clone)]
struct SimpleWindow {
    length: usize,
    values: VecDeque<f64>,
    sum: f64,
    nonzero: usize,
    evictions: usize,
}

impl SimpleWindow {
    fn new(length: usize) -> Self {
        Self {
            length,
            values: VecDeque::new(),
            sum: 0.0,
            nonzero: 0,
            evictions: 0,
        }
    }

    fn push(&mut self, value: f64) -> f64 {
        self.values.push_back(value);
        self.sum += value;
        if value != 0.0 {
            self.nonzero += 1;
        }
        if self.values.len() > self.length {
            if let Some(leaving) = self.values.pop_front() {
                self.sum -= leaving;
                if leaving != 0.0 {
                    self.nonzero -= 1;
                }
            }
            self.evictions += 1;
        }

        if self.nonzero == 0 {
            self.sum = 0.0;
        } else if self.evictions >= self.length {
            self.sum = self.values.iter().sum();
            self.evictions = 0;
        }
        self.sum / self.values.len() as f64
    }
}

/// Linearly weighted mean (weights `1..=n`, newest heaviest) over at most
/// `length` values. Drift is cleared the same way as in [`SimpleWindow`].
#[derive(Debug, Clone)]
struct WeightedWindow {
    length: usize,
    values: VecDeque<f64>,
    sum: f64,
    weighted_sum: f64,
    nonzero: usize,
    evictions: usize,
}

impl WeightedWindow {
    fn new(length: usize) -> Self {
        Self {
            length,
            values: VecDeque::new(),
            sum: 0.0,
            weighted_sum: 0.0,
            nonzero: 0,
            evictions: 0,
        }
    }

    fn push(&mut self, value: f64) -> f64 {
        if self.values.len() == self.length {
            // Every retained value drops one weight step; the newest enters at `length`.
            self.weighted_sum += self.length as f64 * value - self.sum;
            if let Some(leaving) = self.values.pop_front() {
                self.sum -= leaving;
                if leaving != 0.0 {
                    self.nonzero -= 1;
                }
            }
            self.evictions += 1;
        } else {
            self.weighted_sum += (self.values.len() + 1) as f64 * value;
        }
        self.sum += value;
        self.values.push_back(value);
        if value != 0.0 {
            self.nonzero += 1;
        }

        if self.nonzero == 0 {
            self.sum = 0.0;
            self.weighted_sum = 0.0;
        } else if self.evictions >= self.length {
            self.sum = self.values.iter().sum();
            self.weighted_sum = self
                .values
                .iter()
                .enumerate()
                .map(|(i, v)| (i + 1) as f64 * v)
                .sum();
            self.evictions = 0;
        }

        let n = self.values.len() as f64;
        self.weighted_sum / (n * (n + 1.0) / 2.0)
    }
}

#[derive(Debug, Clone)]
struct HullState {
    half: WeightedWindow,
    full: WeightedWindow,
    outer: WeightedWindow,
}

#[derive(Debug, Clone)]
enum AverageState {
    Simple(SimpleWindow),
    Exponential { alpha: f64, prev: Option<f64> },
    Weighted(WeightedWindow),
    Wilders { seen: usize, prev: f64 },
    Hull(Box<HullState>),
}

impl AverageState {
    fn new(method: AverageMethod, length: usize) -> Self {
        match method {
            AverageMethod::Simple => AverageState::Simple(SimpleWindow::new(length)),
            AverageMethod::Exponential => AverageState::Exponential {
                alpha: 2.0 / (length as f64 + 1.0),
                prev: None,
            },
            AverageMethod::Weighted => AverageState::Weighted(WeightedWindow::new(length)),
            AverageMethod::Wilders => AverageState::Wilders { seen: 0, prev: 0.0 },
            AverageMethod::Hull => AverageState::Hull(Box::new(HullState {
                half: WeightedWindow::new(hull_half_length(length)),
                full: WeightedWindow::new(length),
                outer: WeightedWindow::new(hull_sqrt_length(length)),
            })),
        }
    }
}

fn hull_half_length(length: usize) -> usize {
    (length / 2).max(1)
}

fn hull_sqrt_length(length: usize) -> usize {
    ((length as f64).sqrt().round() as usize).max(1)
}

/// Incremental moving average of a single series.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    method: AverageMethod,
    length: usize,
    state: AverageState,
    current: Option<f64>,
}

impl MovingAverage {
    /// Create an engine. `length` must be in `1..=MAX_LENGTH`.
    pub fn new(method: AverageMethod, length: usize) -> Result<Self, ConfigError> {
        check_length("length", length)?;
        Ok(Self {
            method,
            length,
            state: AverageState::new(method, length),
            current: None,
        })
    }

    pub fn method(&self) -> AverageMethod {
        self.method
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Number of values consumed before the average covers a full window.
    pub fn lookback(&self) -> usize {
        match self.method {
            AverageMethod::Hull => self.length - 1 + hull_sqrt_length(self.length) - 1,
            _ => self.length - 1,
        }
    }

    /// Most recent output, `None` before the first value.
    pub fn current(&self) -> Option<f64> {
        self.current
    }

    /// Discard all history.
    pub fn reset(&mut self) {
        self.state = AverageState::new(self.method, self.length);
        self.current = None;
    }

    /// Consume the next value of the series and return the updated average.
    pub fn next(&mut self, value: f64) -> f64 {
        let avg = match &mut self.state {
            AverageState::Simple(window) => window.push(value),
            AverageState::Exponential { alpha, prev } => {
                let ema = match *prev {
                    Some(p) => p + *alpha * (value - p),
                    None => value,
                };
                *prev = Some(ema);
                ema
            }
            AverageState::Weighted(window) => window.push(value),
            AverageState::Wilders { seen, prev } => {
                // Running mean until the window fills, then alpha = 1/length.
                let divisor = if *seen < self.length {
                    *seen += 1;
                    *seen
                } else {
                    self.length
                };
                *prev += (value - *prev) / divisor as f64;
                *prev
            }
            AverageState::Hull(hull) => {
                let half = hull.half.push(value);
                let full = hull.full.push(value);
                hull.outer.push(2.0 * half - full)
            }
        };
        self.current = Some(avg);
        avg
    }
}

/// Batch form: run a fresh engine over `values`.
pub fn moving_average(
    method: AverageMethod,
    values: &[f64],
    length: usize,
) -> Result<Vec<f64>, ConfigError> {
    let mut engine = MovingAverage::new(method, length)?;
    Ok(values.iter().map(|&v| engine.next(v)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    fn run(method: AverageMethod, values: &[f64], length: usize) -> Vec<f64> {
        moving_average(method, values, length).unwrap()
    }

    #[test]
    fn zero_length_is_rejected() {
        for method in AverageMethod::ALL {
            assert!(matches!(
                MovingAverage::new(method, 0),
                Err(ConfigError::InvalidLength { value: 0, .. })
            ));
        }
    }

    #[test]
    fn oversized_length_is_rejected() {
        assert!(matches!(
            MovingAverage::new(AverageMethod::Simple, crate::config::MAX_LENGTH + 1),
            Err(ConfigError::LengthTooLarge { .. })
        ));
    }

    #[test]
    fn zero_window_after_movement_is_exactly_zero() {
        let values = [0.1, 0.2, 0.0, 0.0, 0.0];
        for method in [AverageMethod::Simple, AverageMethod::Weighted, AverageMethod::Hull] {
            let result = run(method, &values, 2);
            assert_eq!(result[3], 0.0, "{method}");
            assert_eq!(result[4], 0.0, "{method}");
        }
    }

    #[test]
    fn long_series_does_not_drift() {
        let values: Vec<f64> = (0..20_000).map(|i| (i as f64 * 0.37).sin() * 1e3 + 0.1).collect();
        let tail = &values[values.len() - 7..];
        let simple = run(AverageMethod::Simple, &values, 7);
        let weighted = run(AverageMethod::Weighted, &values, 7);

        let mean = tail.iter().sum::<f64>() / 7.0;
        let wmean = tail
            .iter()
            .enumerate()
            .map(|(i, v)| (i + 1) as f64 * v)
            .sum::<f64>()
            / 28.0;
        assert_approx(*simple.last().unwrap(), mean, 1e-9);
        assert_approx(*weighted.last().unwrap(), wmean, 1e-9);
    }

    #[test]
    fn constant_series_converges_for_all_methods() {
        let values = vec![42.5; 60];
        for method in AverageMethod::ALL {
            let result = run(method, &values, 9);
            assert_approx(*result.last().unwrap(), 42.5, 1e-9);
        }
    }

    #[test]
    fn length_one_is_identity() {
        let values = [3.0, -1.0, 7.5, 2.0];
        for method in AverageMethod::ALL {
            let result = run(method, &values, 1);
            for (got, want) in result.iter().zip(values.iter()) {
                assert_approx(*got, *want, DEFAULT_EPSILON);
            }
        }
    }

    #[test]
    fn simple_averages_available_values_during_warmup() {
        let result = run(AverageMethod::Simple, &[10.0, 11.0, 12.0, 13.0, 14.0], 3);
        assert_approx(result[0], 10.0, DEFAULT_EPSILON);
        assert_approx(result[1], 10.5, DEFAULT_EPSILON);
        assert_approx(result[2], 11.0, DEFAULT_EPSILON);
        assert_approx(result[3], 12.0, DEFAULT_EPSILON);
        assert_approx(result[4], 13.0, DEFAULT_EPSILON);
    }

    #[test]
    fn exponential_seeds_with_first_value() {
        // alpha = 2/(3+1) = 0.5
        let result = run(AverageMethod::Exponential, &[10.0, 12.0, 16.0], 3);
        assert_approx(result[0], 10.0, DEFAULT_EPSILON);
        assert_approx(result[1], 11.0, DEFAULT_EPSILON);
        assert_approx(result[2], 13.5, DEFAULT_EPSILON);
    }

    #[test]
    fn weighted_known_values() {
        let result = run(AverageMethod::Weighted, &[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        // Warm-up: (1) / 1, (1 + 2*2) / 3
        assert_approx(result[0], 1.0, DEFAULT_EPSILON);
        assert_approx(result[1], 5.0 / 3.0, DEFAULT_EPSILON);
        // (1 + 4 + 9) / 6
        assert_approx(result[2], 14.0 / 6.0, DEFAULT_EPSILON);
        // (2 + 6 + 12) / 6
        assert_approx(result[3], 20.0 / 6.0, DEFAULT_EPSILON);
        // (3 + 8 + 15) / 6
        assert_approx(result[4], 26.0 / 6.0, DEFAULT_EPSILON);
    }

    #[test]
    fn wilders_seeds_with_mean_then_smooths() {
        // Same TR fixture as the classic ATR example: seed mean(8, 9, 6) = 23/3,
        // then (1/3)*6 + (2/3)*(23/3) = 64/9.
        let result = run(AverageMethod::Wilders, &[8.0, 9.0, 6.0, 6.0], 3);
        assert_approx(result[0], 8.0, DEFAULT_EPSILON);
        assert_approx(result[1], 8.5, DEFAULT_EPSILON);
        assert_approx(result[2], 23.0 / 3.0, DEFAULT_EPSILON);
        assert_approx(result[3], 64.0 / 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn hull_warmup_values() {
        // length 4: half = 2, outer = round(sqrt 4) = 2
        let result = run(AverageMethod::Hull, &[1.0, 2.0, 3.0], 4);
        assert_approx(result[0], 1.0, DEFAULT_EPSILON);
        assert_approx(result[1], 13.0 / 9.0, DEFAULT_EPSILON);
        assert_approx(result[2], 23.0 / 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn hull_has_no_lag_on_linear_series() {
        let values: Vec<f64> = (1..=30).map(f64::from).collect();
        for length in [4, 9] {
            let engine = MovingAverage::new(AverageMethod::Hull, length).unwrap();
            let start = engine.lookback();
            let result = run(AverageMethod::Hull, &values, length);
            for i in start..values.len() {
                assert_approx(result[i], values[i], 1e-9);
            }
        }
    }

    #[test]
    fn lookback_per_method() {
        assert_eq!(MovingAverage::new(AverageMethod::Simple, 9).unwrap().lookback(), 8);
        assert_eq!(MovingAverage::new(AverageMethod::Wilders, 1).unwrap().lookback(), 0);
        // 9 - 1 + 3 - 1
        assert_eq!(MovingAverage::new(AverageMethod::Hull, 9).unwrap().lookback(), 10);
    }

    #[test]
    fn reset_restores_fresh_state() {
        let mut engine = MovingAverage::new(AverageMethod::Exponential, 5).unwrap();
        engine.next(10.0);
        engine.next(20.0);
        engine.reset();
        assert_eq!(engine.current(), None);
        assert_approx(engine.next(7.0), 7.0, DEFAULT_EPSILON);
    }

    #[test]
    fn instances_do_not_share_state() {
        let mut a = MovingAverage::new(AverageMethod::Wilders, 3).unwrap();
        let mut b = a.clone();
        a.next(100.0);
        a.next(50.0);
        assert_approx(b.next(1.0), 1.0, DEFAULT_EPSILON);
        assert_approx(a.current().unwrap(), 75.0, DEFAULT_EPSILON);
    }

    #[test]
    fn parse_aliases() {
        assert_eq!("EMA".parse::<AverageMethod>().unwrap(), AverageMethod::Exponential);
        assert_eq!("Wilders".parse::<AverageMethod>().unwrap(), AverageMethod::Wilders);
        assert_eq!("hma".parse::<AverageMethod>().unwrap(), AverageMethod::Hull);
        assert!(matches!(
            "kama".parse::<AverageMethod>(),
            Err(ConfigError::UnknownAverageType(_))
        ));
    }
}
