//! DMI with period-anchored VWAP: indicator engine, signals and data I/O.
//!
//! This crate contains the whole study:
//! - Domain types (bars, anchor periods, chart aggregations)
//! - Incremental moving averages, directional movement and DMI aggregation
//! - Anchored VWAP accumulation
//! - Volume-confirmed buy crossover, trend and info labels
//! - The per-bar study pipeline with warm-up tracking
//! - CSV bar ingestion and CSV/JSON export

pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod signals;

pub use config::{ConfigError, StudyConfig};
pub use engine::{DmiVwapStudy, StudyError, StudyOutput};
