//! Configuration management for the CLI.
//!
//! Everything lives in one TOML file (`pubload.toml` by default). All sections
//! are optional; command-line flags override what the file says.

use crate::cli::LoadArgs;
use crate::error::{CliError, Result};
use pubload_extractor::ExtractorConfig;
use pubload_pipeline::{ErrorPolicy, PipelineConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Target database
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Source document
    #[serde(default)]
    pub input: InputConfig,

    /// Record extraction
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Commit policy
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Output settings
    #[serde(default)]
    pub settings: Settings,
}

/// Database section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file; empty means "take it from the command line"
    #[serde(default)]
    pub path: String,

    /// How long a commit waits on a locked database (milliseconds)
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

/// Input section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    /// XML document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// DTD overriding the document's declaration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtd: Option<PathBuf>,

    /// Enforce DTD element declarations and the DOCTYPE root
    #[serde(default = "default_true")]
    pub validate: bool,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Load configuration from `path`, or defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        if self.database.busy_timeout_ms == 0 {
            return Err(CliError::Config(
                "database.busy_timeout_ms must be greater than 0".to_string(),
            ));
        }
        self.extractor
            .validate()
            .map_err(|e| CliError::Config(format!("extractor: {}", e)))?;
        self.pipeline
            .validate()
            .map_err(|e| CliError::Config(format!("pipeline: {}", e)))?;
        Ok(())
    }

    /// Database path: the configured one, else the positional argument.
    pub fn resolve_database(&self, positional: Option<&str>) -> Result<String> {
        let configured = self.database.path.trim();
        if !configured.is_empty() {
            return Ok(configured.to_string());
        }

        positional
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                CliError::Config(
                    "No database given: set [database].path or pass DATABASE".to_string(),
                )
            })
    }

    /// Fold `load` flags into the configuration.
    pub fn apply_load_args(&mut self, args: &LoadArgs) {
        if let Some(input) = &args.input {
            self.input.path = Some(input.clone());
        }
        if let Some(dtd) = &args.dtd {
            self.input.dtd = Some(dtd.clone());
        }
        if args.no_validate {
            self.input.validate = false;
        }
        if args.abort_on_error {
            self.pipeline.error_policy = ErrorPolicy::Abort;
        }
        if args.skip_limit.is_some() {
            self.pipeline.skip_limit = args.skip_limit;
        }
    }
}

impl DatabaseConfig {
    /// Busy timeout as a Duration
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: None,
            dtd: None,
            validate: true,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
