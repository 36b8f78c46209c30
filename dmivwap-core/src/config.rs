//! Serializable study configuration.
//!
//! Loaded once from TOML (or built in code), validated before the first bar,
//! and never changed afterwards. Every field has a default, so an empty file
//! is a valid configuration:
//!
//! ```toml
//! length = 9
//! average_type = "wilders"   # simple | exponential | weighted | wilders | hull
//! time_frame = "day"         # VWAP anchor: day | week | month
//! trend_length = 20
//! aggregation = "day"        # chart bars: 5m, 1h, day, week, month, quarter, year
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::{AnchorPeriod, BarAggregation};
use crate::indicators::AverageMethod;

/// Errors raised while building or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be a positive integer, got {value}")]
    InvalidLength { field: &'static str, value: usize },

    #[error("{field} must be at most {max}, got {value}")]
    LengthTooLarge {
        field: &'static str,
        value: usize,
        max: usize,
    },

    #[error("time frame '{anchor}' is finer than the chart aggregation '{aggregation}'")]
    AnchorFinerThanChart {
        anchor: AnchorPeriod,
        aggregation: BarAggregation,
    },

    #[error("unknown average type: {0}")]
    UnknownAverageType(String),

    #[error("unknown time frame: {0}")]
    UnknownAnchor(String),

    #[error("unknown chart aggregation: {0}")]
    UnknownAggregation(String),

    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Largest accepted `length` or `trend_length`.
pub const MAX_LENGTH: usize = 10_000;

/// Reject a window length of zero or above [`MAX_LENGTH`].
pub(crate) fn check_length(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidLength { field, value });
    }
    if value > MAX_LENGTH {
        return Err(ConfigError::LengthTooLarge {
            field,
            value,
            max: MAX_LENGTH,
        });
    }
    Ok(())
}

/// Deterministic identifier of a configuration (BLAKE3 hex).
pub type ConfigId = String;

/// Static inputs of the study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudyConfig {
    /// Averaging window for ATR, the two DI series and ADX.
    pub length: usize,

    /// Averaging method used for all smoothed series.
    pub average_type: AverageMethod,

    /// VWAP anchor period.
    pub time_frame: AnchorPeriod,

    /// Bars back for the trend label comparison.
    pub trend_length: usize,

    /// Native bar size of the chart. Must not be coarser than `time_frame`.
    pub aggregation: BarAggregation,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            length: 9,
            average_type: AverageMethod::Wilders,
            time_frame: AnchorPeriod::Day,
            trend_length: 20,
            aggregation: BarAggregation::Day,
        }
    }
}

impl StudyConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: StudyConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    /// Fail fast on anything that would make the study meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_length("length", self.length)?;
        check_length("trend_length", self.trend_length)?;
        self.time_frame.check_aggregation(self.aggregation)
    }

    /// Stable identifier: identical settings give identical ids.
    pub fn config_id(&self) -> ConfigId {
        let canonical = format!(
            "length={};average_type={};time_frame={};trend_length={};aggregation={}",
            self.length, self.average_type, self.time_frame, self.trend_length, self.aggregation,
        );
        blake3::hash(canonical.as_bytes()).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_study_inputs() {
        let c = StudyConfig::default();
        assert_eq!(c.length, 9);
        assert_eq!(c.average_type, AverageMethod::Wilders);
        assert_eq!(c.time_frame, AnchorPeriod::Day);
        assert_eq!(c.trend_length, 20);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(StudyConfig::from_toml_str("").unwrap(), StudyConfig::default());
    }

    #[test]
    fn parses_full_toml() {
        let c = StudyConfig::from_toml_str(
            r#"
            length = 14
            average_type = "hull"
            time_frame = "week"
            trend_length = 50
            aggregation = "30m"
            "#,
        )
        .unwrap();
        assert_eq!(c.length, 14);
        assert_eq!(c.average_type, AverageMethod::Hull);
        assert_eq!(c.time_frame, AnchorPeriod::Week);
        assert_eq!(c.trend_length, 50);
        assert_eq!(c.aggregation, BarAggregation::Intraday { minutes: 30 });
    }

    #[test]
    fn toml_roundtrip() {
        let c = StudyConfig {
            aggregation: BarAggregation::Intraday { minutes: 60 },
            ..StudyConfig::default()
        };
        let text = c.to_toml_string().unwrap();
        assert_eq!(StudyConfig::from_toml_str(&text).unwrap(), c);
    }

    #[test]
    fn rejects_zero_length() {
        let err = StudyConfig::from_toml_str("length = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidLength {
                field: "length",
                value: 0
            }
        ));
    }

    #[test]
    fn rejects_oversized_lengths() {
        let toml = "length = 4611686018427387904\naverage_type = \"simple\"";
        let err = StudyConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::LengthTooLarge {
                field: "length",
                max: MAX_LENGTH,
                ..
            }
        ));
        let err = StudyConfig::from_toml_str("trend_length = 9223372036854775807").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::LengthTooLarge {
                field: "trend_length",
                ..
            }
        ));
    }

    #[test]
    fn accepts_max_length() {
        let c = StudyConfig {
            length: MAX_LENGTH,
            trend_length: MAX_LENGTH,
            ..StudyConfig::default()
        };
        assert!(c.validate().is_ok());
    }

    #[test]
    fn rejects_negative_length_at_parse() {
        assert!(matches!(
            StudyConfig::from_toml_str("length = -3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn rejects_day_anchor_on_weekly_chart() {
        let err = StudyConfig::from_toml_str(
            r#"
            time_frame = "day"
            aggregation = "week"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::AnchorFinerThanChart { .. }));
        assert_eq!(
            err.to_string(),
            "time frame 'day' is finer than the chart aggregation 'week'"
        );
    }

    #[test]
    fn rejects_unknown_fields_and_values() {
        assert!(StudyConfig::from_toml_str("lenght = 9").is_err());
        assert!(StudyConfig::from_toml_str("average_type = \"kama\"").is_err());
        assert!(StudyConfig::from_toml_str("aggregation = \"3d\"").is_err());
    }

    #[test]
    fn from_file_reports_missing_path() {
        let err = StudyConfig::from_file(Path::new("/nonexistent/study.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("study.toml");
        std::fs::write(&path, "length = 5\ntime_frame = \"month\"\n").unwrap();
        let c = StudyConfig::from_file(&path).unwrap();
        assert_eq!(c.length, 5);
        assert_eq!(c.time_frame, AnchorPeriod::Month);
    }

    #[test]
    fn config_id_is_deterministic_and_param_sensitive() {
        let a = StudyConfig::default();
        let mut b = StudyConfig::default();
        assert_eq!(a.config_id(), b.config_id());
        b.length = 10;
        assert_ne!(a.config_id(), b.config_id());
        assert_eq!(a.config_id().len(), 64);
    }
}
