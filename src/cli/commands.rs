//! CLI commands and argument parsing

use crate::types::SearchScope;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Directory connector host CLI
#[derive(Parser, Debug)]
#[command(name = "dirconnect")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Connector configuration descriptor (JSON or YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Datasource property values file (JSON)
    #[arg(short, long, global = true)]
    pub properties: Option<PathBuf>,

    /// Inline datasource property values JSON
    #[arg(long, global = true)]
    pub properties_json: Option<String>,

    /// Host configuration file (YAML)
    #[arg(long, global = true)]
    pub host_config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a configuration descriptor and, if given, datasource values against it
    ValidateConfig,

    /// Build a schema from entity declarations
    Schema {
        /// Entity declarations file (YAML)
        #[arg(short, long)]
        entities: PathBuf,

        /// Also publish the schema as property sets
        #[arg(long)]
        property_sets: bool,
    },

    /// Parse a search filter and optionally evaluate it
    Filter {
        /// RFC 4515 filter string
        filter: String,

        /// Entry to evaluate against, as a JSON object of attributes
        #[arg(long)]
        entry_json: Option<String>,

        /// DN of the evaluated entry
        #[arg(long, default_value = "")]
        dn: String,
    },

    /// Search the sample directory
    Search {
        /// Base DN
        #[arg(short, long, default_value = crate::sample::BASE_DN)]
        base: String,

        /// Search scope (base, one, sub)
        #[arg(short, long, default_value = "sub", value_parser = parse_scope)]
        scope: SearchScope,

        /// Filter
        #[arg(default_value = "(objectClass=*)")]
        filter: String,

        /// Attributes to return (comma-separated, empty = all)
        #[arg(short, long, value_delimiter = ',')]
        attributes: Vec<String>,

        /// Maximum entries to return
        #[arg(long)]
        size_limit: Option<usize>,
    },

    /// Send a raw protocol request to the sample connector
    Dispatch {
        /// Request JSON, tagged by `operation`
        request_json: String,
    },
}

fn parse_scope(s: &str) -> Result<SearchScope, String> {
    s.parse()
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
