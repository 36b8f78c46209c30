//! Signal and annotation layer.
//!
//! Reads the current and previous computed values and decides whether to emit
//! the buy arrow and what the two labels say. Nothing here feeds back into the
//! numeric pipeline.

pub mod crossover;
pub mod labels;

pub use crossover::{BuyCrossover, CrossoverEvent};
pub use labels::{info_label, TrendLabel, TrendTracker};
