//! Model training.
//!
//! Responsibilities:
//!
//! - mini-batch epochs over seeded shuffles, stepping burn's Adam on MSE
//! - per-epoch `EpochLog`s handed to an observer
//! - early stopping on held-out loss, keeping the best parameters

pub mod trainer;

pub use trainer::*;
