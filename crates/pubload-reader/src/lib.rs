//! pubload Stream Reader
//!
//! Forward-only reading of large DBLP-shaped XML documents. The reader yields
//! each direct child of the root element (a "record-level element") once its
//! end tag has been seen, together with its attributes and the text of its
//! direct children. Only one element is held at a time, so memory stays
//! bounded no matter how large the document is.
//!
//! ## Entities and validation
//!
//! DBLP spells accented characters as named entities declared in `dblp.dtd`.
//! The reader loads the DTD named by the document's `<!DOCTYPE>` (resolved
//! next to the document) or one passed in [`ReaderOptions`]. With validation
//! on, elements the DTD does not declare and a root that does not match the
//! DOCTYPE are errors.
//!
//! Malformed input of any kind stops the stream with a [`ReadError`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dtd;
pub mod element;
pub mod error;
pub mod reader;

pub use dtd::Dtd;
pub use element::{ChildElement, ClosedElement};
pub use error::{DtdError, ReadError};
pub use reader::{DocType, ReaderOptions, ReaderStats, StreamReader};
