//! Command-line interface for behemoth.

mod commands;
pub mod progress;

pub use commands::{is_verbose, run};
