//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - CSV exports (`export`)
//! - output layout and model artifact JSON (`artifacts`)

pub mod artifacts;
pub mod export;
pub mod ingest;

pub use artifacts::*;
pub use export::*;
pub use ingest::*;
