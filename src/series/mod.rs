//! Time-series preparation: from raw rows to supervised training windows.
//!
//! - disease label encoding (`encoder`)
//! - seasonal aggregation per disease (`aggregate`)
//! - history windows for training and inference (`window`)
//! - chronological train/test split (`split`)

pub mod aggregate;
pub mod encoder;
pub mod split;
pub mod window;

pub use aggregate::*;
pub use encoder::*;
pub use split::*;
pub use window::*;
