//! `spend-curves` library crate.
//!
//! The binary (`spend`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the allocator is reusable from other front ends
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod curves;
pub mod domain;
pub mod error;
pub mod io;
pub mod optimise;
pub mod plot;
pub mod report;
