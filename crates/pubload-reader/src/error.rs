//! Error types for the stream reader

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop the stream
///
/// Every variant is fatal for the current document: the reader never skips
/// over malformed input.
#[derive(Error, Debug)]
pub enum ReadError {
    /// Source could not be opened or read
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// Path of the source
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Malformed XML, bad attribute, or unresolvable entity
    #[error("XML error at byte {position}: {source}")]
    Xml {
        /// Byte offset reported by the parser
        position: u64,
        /// Underlying parser error
        #[source]
        source: quick_xml::Error,
    },

    /// Tag, attribute or declaration is not valid UTF-8
    #[error("Invalid UTF-8 at byte {0}")]
    Utf8(u64),

    /// Document ended while elements were still open
    #[error("Document truncated at byte {position} with {open} element(s) still open")]
    Truncated {
        /// Byte offset of the end of input
        position: u64,
        /// Number of unclosed elements
        open: usize,
    },

    /// Root element does not match the DOCTYPE declaration
    #[error("Root element <{found}> does not match DOCTYPE '{declared}'")]
    RootMismatch {
        /// Name declared by `<!DOCTYPE>`
        declared: String,
        /// Name of the actual root element
        found: String,
    },

    /// Element not declared by the DTD
    #[error("Element <{tag}> at byte {position} is not declared by the DTD")]
    UndeclaredElement {
        /// Offending tag
        tag: String,
        /// Byte offset of the element
        position: u64,
    },

    /// DTD could not be read or parsed
    #[error("DTD error: {0}")]
    Dtd(#[from] DtdError),
}

/// Errors raised while loading a DTD
#[derive(Error, Debug)]
pub enum DtdError {
    /// DTD file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path of the DTD
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Declaration is cut off or malformed
    #[error("Malformed declaration at offset {offset}: {reason}")]
    Malformed {
        /// Character offset into the DTD text
        offset: usize,
        /// What went wrong
        reason: String,
    },
}
