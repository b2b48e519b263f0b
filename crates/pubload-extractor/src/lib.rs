//! pubload Extractor
//!
//! Converts closed record-level XML elements into typed publication records.
//!
//! # Architecture
//!
//! ```text
//! StreamReader → ClosedElement → RecordExtractor → PublicationRecord → StatementBuilder
//! ```
//!
//! The extractor resolves the element's variant against the shared
//! [`TagSchema`](pubload_domain::TagSchema), reads the publication key, keeps
//! the allow-listed children and collects a deduplicated author list.
//!
//! # Example Usage
//!
//! ```
//! use pubload_extractor::RecordExtractor;
//! use pubload_reader::{ReaderOptions, StreamReader};
//!
//! let xml = r#"<dblp><article key="journals/x/Y"><author>A. Smith</author>
//!   <title>It's here</title><pages>1-2</pages><year>2001</year></article></dblp>"#;
//!
//! let extractor = RecordExtractor::dblp();
//! let mut reader = StreamReader::from_str(xml, ReaderOptions::lenient());
//! let element = reader.next_element().unwrap().unwrap();
//!
//! let record = extractor.extract(element).unwrap();
//! assert_eq!(record.pubkey, "journals/x/Y");
//! assert_eq!(record.field("title"), Some("It's here"));
//! assert_eq!(record.field("pages"), None);
//! assert_eq!(record.authors, vec!["A. Smith"]);
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;

#[cfg(test)]
mod tests;

pub use config::ExtractorConfig;
pub use error::ExtractError;
pub use extractor::RecordExtractor;
