//! Command-line interface for scoopdesk.

mod commands;
pub mod icons;

pub use commands::{is_verbose, run};
