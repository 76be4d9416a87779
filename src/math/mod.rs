//! Numeric utilities: min-max scaling and descriptive statistics.

pub mod scaler;
pub mod stats;

pub use scaler::*;
pub use stats::*;
