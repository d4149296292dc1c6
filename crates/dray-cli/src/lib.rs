//! Library surface of the dray CLI.
//!
//! Everything the binary does is reachable from here, which keeps the
//! commands testable without spawning a process.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, Result};
