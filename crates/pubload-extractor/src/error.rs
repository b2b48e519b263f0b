//! Error types for the Extractor

use thiserror::Error;

/// Reasons an element cannot become a record
///
/// Both are per-record failures: the element is skipped and the stream goes on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// Tag is not one of the supported record variants
    #[error("Unsupported record tag <{tag}>")]
    UnsupportedTag {
        /// Offending tag
        tag: String,
    },

    /// Key attribute absent or blank
    #[error("<{tag}> at byte {position} has no '{attribute}' attribute")]
    MissingKey {
        /// Element tag
        tag: String,
        /// Attribute that was expected
        attribute: String,
        /// Byte offset of the element
        position: u64,
    },
}
