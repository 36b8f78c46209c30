//! Domain types for the DMI/VWAP study.

pub mod bar;
pub mod period;

pub use bar::{Bar, BarError};
pub use period::{AnchorPeriod, BarAggregation, PeriodKey};
