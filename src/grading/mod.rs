//! Score aggregation and letter grading.
//!
//! This module holds the parsed grouping model, the per-student aggregation
//! engine (normalize, drop lowest, average, weight, sum), and the optional
//! letter scheme applied to the resulting percentage.

pub mod aggregate;
pub mod letter;
pub mod types;
pub mod utility;
