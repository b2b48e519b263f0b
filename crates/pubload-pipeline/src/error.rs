//! Error types for the Pipeline

use pubload_domain::{BuildError, FailureClass};
use pubload_extractor::ExtractError;
use pubload_reader::ReadError;
use thiserror::Error;

/// Why a single record was not stored
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Element could not be turned into a record
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Record could not be encoded as statements
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Sink rejected the record, or stayed busy past the retry budget
    #[error("Storage rejected {pubkey}: {message}")]
    Storage {
        /// Record key
        pubkey: String,
        /// Classification reported by the sink
        class: FailureClass,
        /// Sink error text
        message: String,
    },
}

impl SkipReason {
    /// Stable label used to group skips in the summary
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::Extract(ExtractError::UnsupportedTag { .. }) => "unsupported_tag",
            SkipReason::Extract(ExtractError::MissingKey { .. }) => "missing_key",
            SkipReason::Build(BuildError::InvalidInteger { .. }) => "invalid_integer",
            SkipReason::Storage {
                class: FailureClass::Transient,
                ..
            } => "storage_busy",
            SkipReason::Storage { .. } => "storage_rejected",
        }
    }
}

/// Errors that stop a load
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The document could not be read further
    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    /// The sink failed in a way that affects every later record
    #[error("Storage failure on {pubkey}: {source}")]
    Storage {
        /// Record being committed
        pubkey: String,
        /// Sink error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Abort policy stopped the run at the first failed record
    #[error("Aborted at element {element}: {reason}")]
    Aborted {
        /// 1-based index of the failing element
        element: u64,
        /// What went wrong
        #[source]
        reason: SkipReason,
    },

    /// More records were skipped than the configured limit allows
    #[error("Skip limit of {limit} exceeded")]
    SkipLimitExceeded {
        /// Configured limit
        limit: u64,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
