//! Budget allocation.
//!
//! Responsibilities:
//!
//! - pick the curves a plan allows to spend on (`eligibility`)
//! - hand out the budget step by step (`greedy`)
//! - build the unoptimised comparison spend (`baseline`)
//! - run many budgets in parallel (`sweep`)

pub mod baseline;
pub mod eligibility;
pub mod greedy;
pub mod sweep;

pub use baseline::*;
pub use eligibility::*;
pub use greedy::*;
pub use sweep::*;
