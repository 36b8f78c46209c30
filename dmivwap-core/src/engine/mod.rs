//! Study engine: the per-bar pipeline and its warmup bookkeeping.
//!
//! The host drives one bar at a time in chronological order. Each bar's output
//! depends only on bounded component state, never on a replay of the history.

pub mod study;
pub mod warmup;

pub use study::{DmiVwapStudy, StudyError, StudyOutput};
pub use warmup::WarmupState;
