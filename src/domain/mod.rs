//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input rows and the season enumeration (`IncidenceRecord`, `Season`)
//! - derived series and training units (`SeriesPoint`, `Window`, `ScaledWindow`)
//! - run outputs (`EvaluationResult`, `ForecastRecord`, `EpochLog`)
//! - run configuration (`TrainConfig`, `ModelConfig`, `TrainingOptions`, ...)

pub mod types;

pub use types::*;
