//! pubload Domain Layer
//!
//! Core model for loading bibliographic XML into a relational store. This crate
//! has ZERO external dependencies and defines the records, the per-variant
//! allow-list, the statement builder, and the sink trait that the storage layer
//! implements.
//!
//! ## Key Concepts
//!
//! - **PublicationRecord**: one `article` or `inproceedings` element, reduced to
//!   its allow-listed fields and a deduplicated author list
//! - **TagSchema**: the immutable tag → allowed-field mapping, built once and
//!   shared read-only
//! - **InsertStatement**: a typed, parameterized insert built from a record
//! - **RecordSink**: anything that can durably commit one record's statements
//!
//! ## Architecture
//!
//! - No external crate dependencies
//! - Pure transformation logic only
//! - XML reading, extraction and storage live in other crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod record;
pub mod schema;
pub mod statement;
pub mod traits;

// Re-exports for convenience
pub use record::{dedup_authors, AuthorshipEdge, Field, PublicationRecord};
pub use schema::{FieldKind, FieldSpec, RecordKind, TagSchema, VariantSchema};
pub use statement::{
    escape_quotes, quote_literal, BuildError, InsertStatement, RecordStatements, SqlValue,
    StatementBuilder, AUTHORSHIP_TABLE,
};
pub use traits::{FailureClass, RecordSink};
