//! Trait definitions for external interactions
//!
//! These traits define the boundary between the transformation pipeline and
//! storage. Implementations live in other crates (pubload-store).

use crate::statement::RecordStatements;

/// How the pipeline should react to a failed commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// Worth retrying as-is (lock contention, busy backend)
    Transient,

    /// The record itself was rejected; later records may still succeed
    Record,

    /// The sink is unusable; stop the run
    Fatal,
}

/// Destination for built statements
///
/// Implemented by the infrastructure layer (pubload-store)
pub trait RecordSink {
    /// Error type for commit operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Execute every statement of one record and make them durable together
    ///
    /// On error nothing from this record may remain visible.
    fn commit_record(&mut self, statements: &RecordStatements) -> Result<(), Self::Error>;

    /// Classify an error returned by [`RecordSink::commit_record`]
    fn failure_class(&self, error: &Self::Error) -> FailureClass;
}
