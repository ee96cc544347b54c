//! Input/output helpers.
//!
//! - scenario JSON read/write (`scenario`)
//! - allocation CSV export (`export`)
//! - saved-scenario history (`history`)

pub mod export;
pub mod history;
pub mod scenario;

pub use export::*;
pub use history::*;
pub use scenario::*;
