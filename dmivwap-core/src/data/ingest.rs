//! CSV bar ingestion.
//!
//! Expected header (case-sensitive, order-free):
//! `time,open,high,low,close,volume[,vwap][,imp_volatility]`.
//! `date`, `timestamp` and `datetime` are accepted for `time`, `iv` for
//! `imp_volatility`. A missing or empty `vwap` falls back to the bar's typical
//! price. Rows are returned in file order; ordering is enforced by the study.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::Bar;

/// Errors from the data layer. `row` is the 1-based data row (header excluded).
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("row {row}: {source}")]
    Csv {
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("row {row}: unrecognized time '{value}' (expected YYYY-MM-DD or YYYY-MM-DD HH:MM[:SS])")]
    InvalidTime { row: usize, value: String },

    #[error("row {row}: volume must be a non-negative whole number, got {value}")]
    InvalidVolume { row: usize, value: f64 },

    #[error("CSV write failed: {0}")]
    Write(#[from] csv::Error),

    #[error("failed to flush CSV writer: {0}")]
    Flush(#[source] std::io::Error),

    #[error("unsupported schema version {found} (max supported: {supported})")]
    UnsupportedSchema { found: u32, supported: u32 },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "date", alias = "timestamp", alias = "datetime")]
    time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    #[serde(default)]
    vwap: Option<f64>,
    #[serde(default, alias = "iv")]
    imp_volatility: Option<f64>,
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a bar timestamp; a bare date maps to midnight.
pub fn parse_bar_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

impl CsvRow {
    fn into_bar(self, row: usize) -> Result<Bar, DataError> {
        let time = parse_bar_time(&self.time).ok_or_else(|| DataError::InvalidTime {
            row,
            value: self.time.clone(),
        })?;

        // u64::MAX rounds up to 2^64 as f64, so anything at or above it would saturate.
        if !self.volume.is_finite()
            || self.volume < 0.0
            || self.volume.fract() != 0.0
            || self.volume >= u64::MAX as f64
        {
            return Err(DataError::InvalidVolume {
                row,
                value: self.volume,
            });
        }

        let typical = (self.high + self.low + self.close) / 3.0;
        Ok(Bar {
            time,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume as u64,
            vwap: self.vwap.unwrap_or(typical),
            imp_volatility: self.imp_volatility,
        })
    }
}

/// Read bars from any CSV source.
pub fn read_bars_csv<R: Read>(reader: R) -> Result<Vec<Bar>, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut bars = Vec::new();
    let mut fallback_vwap = 0usize;
    for (i, record) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = i + 1;
        let record = record.map_err(|source| DataError::Csv { row, source })?;
        if record.vwap.is_none() {
            fallback_vwap += 1;
        }
        bars.push(record.into_bar(row)?);
    }

    if fallback_vwap > 0 {
        debug!(rows = fallback_vwap, "vwap column missing or empty, using typical price");
    }
    Ok(bars)
}

/// Read bars from a CSV file.
pub fn load_bars_csv(path: &Path) -> Result<Vec<Bar>, DataError> {
    let file = std::fs::File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bars = read_bars_csv(std::io::BufReader::new(file))?;
    info!(path = %path.display(), bars = bars.len(), "loaded bars");
    Ok(bars)
}
