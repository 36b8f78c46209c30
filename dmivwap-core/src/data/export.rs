//! Study output export: per-bar CSV and a versioned JSON run document.
//!
//! The JSON document carries a `schema_version`; documents written by a newer
//! version are rejected on import.

use serde::{Deserialize, Serialize};

use super::DataError;
use crate::config::{ConfigId, StudyConfig};
use crate::engine::StudyOutput;

/// Bump when the shape of [`StudyRun`] changes.
pub const SCHEMA_VERSION: u32 = 1;

/// One complete pass of the study over a bar series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyRun {
    pub schema_version: u32,
    pub config: StudyConfig,
    pub config_id: ConfigId,
    pub bar_count: usize,
    pub buy_signals: usize,
    pub outputs: Vec<StudyOutput>,
}

impl StudyRun {
    pub fn new(config: StudyConfig, outputs: Vec<StudyOutput>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            config_id: config.config_id(),
            config,
            bar_count: outputs.len(),
            buy_signals: outputs.iter().filter(|o| o.buy_signal()).count(),
            outputs,
        }
    }
}

/// Serialize a run to pretty JSON.
pub fn export_json(run: &StudyRun) -> Result<String, DataError> {
    Ok(serde_json::to_string_pretty(run)?)
}

/// Deserialize a run, rejecting documents from a newer schema.
pub fn import_json(json: &str) -> Result<StudyRun, DataError> {
    let run: StudyRun = serde_json::from_str(json)?;
    if run.schema_version > SCHEMA_VERSION {
        return Err(DataError::UnsupportedSchema {
            found: run.schema_version,
            supported: SCHEMA_VERSION,
        });
    }
    Ok(run)
}

fn f6(v: f64) -> String {
    format!("{v:.6}")
}

/// Export the plotted series as CSV.
///
/// Columns: time, buyers, sellers, adx, vwap, vwap_deviation, buy_signal,
/// trend, info, warm. `vwap` and `vwap_deviation` are empty while the anchor
/// period has no volume.
pub fn export_csv(outputs: &[StudyOutput]) -> Result<String, DataError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "time",
        "buyers",
        "sellers",
        "adx",
        "vwap",
        "vwap_deviation",
        "buy_signal",
        "trend",
        "info",
        "warm",
    ])?;

    for o in outputs {
        wtr.write_record([
            &o.time.to_string(),
            &f6(o.buyers()),
            &f6(o.sellers()),
            &f6(o.adx()),
            &o.vwap().map(f6).unwrap_or_default(),
            &o.vwap_deviation().map(f6).unwrap_or_default(),
            &u8::from(o.buy_signal()).to_string(),
            o.trend.as_str(),
            &o.info,
            &o.warm.to_string(),
        ])?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| DataError::Flush(e.into_error()))?;
    Ok(String::from_utf8(data)?)
}
