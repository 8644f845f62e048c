//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Reusable input arguments
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// JSON-lines file of decoded readings (`-` or omitted for stdin)
    #[arg(short, long, env = "ATMOTUBE_INPUT")]
    pub input: Option<PathBuf>,

    /// Only accept these device addresses - can be repeated, or comma-separated
    #[arg(short, long, value_delimiter = ',')]
    pub device: Vec<String>,
}

/// Reusable output format arguments
#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Output format (overrides config)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

impl OutputArgs {
    /// Resolve output format: explicit flags override config
    pub fn resolve_format(&self, json_flag: bool, config_format: Option<OutputFormat>) -> OutputFormat {
        if json_flag {
            OutputFormat::Json
        } else {
            self.format.or(config_format).unwrap_or_default()
        }
    }
}

#[derive(Parser)]
#[command(name = "atmotube")]
#[command(author, version, about = "Live device list for Atmotube air-quality beacons", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output as JSON (shorthand for --format json)
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Write output to file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Follow decoded readings and print every row change as it happens
    Watch {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Notifier channel capacity (overrides config)
        #[arg(long)]
        capacity: Option<usize>,
    },

    /// Ingest all readings, then print the deduplicated device list
    List {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Manage CLI configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Get a configuration value
    Get {
        /// Configuration key
        #[arg(value_enum)]
        key: ConfigKey,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        #[arg(value_enum)]
        key: ConfigKey,
        /// Configuration value
        value: String,
    },

    /// Unset (remove) a configuration value
    Unset {
        /// Configuration key to remove
        #[arg(value_enum)]
        key: ConfigKey,
    },

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigKey {
    Format,
    NoColor,
    ChannelCapacity,
    LogRejections,
}
