//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// pubload - Stream a DBLP XML dump into a relational database.
#[derive(Debug, Parser)]
#[command(name = "pubload")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "pubload.toml", env = "PUBLOAD_CONFIG")]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, value_enum, global = true, default_value = "text")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (counts only)
    Quiet,
}

/// Log format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load an XML document into the database
    Load(LoadArgs),

    /// Open the database, ensure the schema and print row counts
    Check(CheckArgs),
}

/// Arguments for the load command.
#[derive(Debug, Default, Parser)]
pub struct LoadArgs {
    /// Database path, used when the config file does not name one
    pub database: Option<String>,

    /// XML document to load
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// DTD to use instead of the one the document declares
    #[arg(long)]
    pub dtd: Option<PathBuf>,

    /// Write the SQL script to stdout instead of touching a database
    #[arg(long)]
    pub dry_run: bool,

    /// Stop at the first record that cannot be stored
    #[arg(long)]
    pub abort_on_error: bool,

    /// Stop once more than this many records have been skipped
    #[arg(long)]
    pub skip_limit: Option<u64>,

    /// Skip DTD validation of element names and the root element
    #[arg(long)]
    pub no_validate: bool,
}

/// Arguments for the check command.
#[derive(Debug, Default, Parser)]
pub struct CheckArgs {
    /// Database path, used when the config file does not name one
    pub database: Option<String>,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
