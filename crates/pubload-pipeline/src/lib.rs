//! pubload Pipeline
//!
//! Drives a full load: read one record-level element, extract it, build its
//! statements, commit them, release the element, repeat.
//!
//! # Architecture
//!
//! ```text
//! StreamReader → RecordExtractor → StatementBuilder → RecordSink
//!                                                      (SqliteStore / SqlScriptWriter)
//! ```
//!
//! # Failure handling
//!
//! | Failure                          | Continue policy        | Abort policy |
//! |----------------------------------|------------------------|--------------|
//! | Missing key, bad integer         | skip record            | stop         |
//! | Storage rejects record           | skip record            | stop         |
//! | Storage busy                     | retry, then skip       | retry, then stop |
//! | Storage unusable, malformed XML  | stop                   | stop         |
//!
//! Records committed before a stop stay committed.

#![warn(missing_docs)]

mod config;
mod error;
mod pipeline;
mod summary;

pub use config::{ErrorPolicy, PipelineConfig};
pub use error::{PipelineError, SkipReason};
pub use pipeline::{Pipeline, RecordOutcome};
pub use summary::LoadSummary;
