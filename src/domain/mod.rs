//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the planning dimensions (`Tier`, `Channel`, `PeriodKind`)
//! - curve identity and parameters (`CurveKey`, `CurveParams`)
//! - caller-owned inputs (`Plan`, `ChannelSelection`, `RunConfig`)

pub mod types;

pub use types::*;
