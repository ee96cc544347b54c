//! Response-curve model.
//!
//! - seeded parameter generation per `(tier, channel)` (`params`)
//! - uplift evaluation, spend grid and per-period curves (`response`)

pub mod params;
pub mod response;

pub use params::*;
pub use response::*;
