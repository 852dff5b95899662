//! Sketchpad Application
//!
//! Command-line shell over file-backed canvas documents.

pub mod cli;
mod commands;
pub mod replay;

pub use cli::{Cli, Command};
pub use commands::run;
