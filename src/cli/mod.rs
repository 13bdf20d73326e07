//! CLI module
//!
//! Command-line interface for the connector host.
//!
//! # Commands
//!
//! - `validate-config` - Check a configuration descriptor and datasource values
//! - `schema` - Build a schema from entity declarations
//! - `filter` - Parse and evaluate a search filter
//! - `search` - Search the sample directory
//! - `dispatch` - Send a raw protocol request to the sample connector

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
