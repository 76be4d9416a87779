//! Terminal plots (`ascii`) and SVG chart files (`charts`).

pub mod ascii;
pub mod charts;

pub use ascii::*;
pub use charts::*;
