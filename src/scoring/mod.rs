//! Per-student area scoring.
//!
//! Turns a cohort's item-level right/wrong columns into per-student accuracy
//! within each curriculum area, and provides the summary statistics used to
//! annotate the charts.

pub mod area;
pub mod assemble;
pub mod types;
pub mod utility;
