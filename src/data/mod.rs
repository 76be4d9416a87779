//! Dataset sources.
//!
//! - synthetic incidence generation (`sample`)

pub mod sample;

pub use sample::*;
