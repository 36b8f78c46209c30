//! Bar ingestion and study output export.

pub mod export;
pub mod ingest;

pub use export::{export_csv, export_json, import_json, StudyRun, SCHEMA_VERSION};
pub use ingest::{load_bars_csv, parse_bar_time, read_bars_csv, DataError};
