//! Counters collected while a load runs

use crate::error::SkipReason;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome counts for one load
///
/// Kept on the [`Pipeline`](crate::Pipeline) as the run progresses, so the
/// counts are available even when the run stops early.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    /// Record-level elements read
    pub elements: u64,

    /// Records committed
    pub committed: u64,

    /// Elements with unsupported tags, released unprocessed
    pub passed_through: u64,

    /// Skipped records per reason label
    pub skipped: BTreeMap<String, u64>,

    /// Records that stopped the run
    pub failed: u64,

    /// Transient storage failures retried
    pub retries: u64,

    /// Authorship rows written
    pub authorship_rows: u64,

    /// Bytes consumed from the document
    pub bytes_read: u64,

    /// Largest reader footprint observed, in bytes
    pub high_water_bytes: usize,

    /// Wall time of the run in milliseconds
    pub elapsed_ms: u64,
}

impl LoadSummary {
    /// Create empty counts
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an element read from the document
    pub fn record_element(&mut self) {
        self.elements += 1;
    }

    /// Record a committed record
    pub fn record_commit(&mut self, authorship_rows: usize) {
        self.committed += 1;
        self.authorship_rows += authorship_rows as u64;
    }

    /// Record an unsupported element released without processing
    pub fn record_pass_through(&mut self) {
        self.passed_through += 1;
    }

    /// Record a skipped record
    pub fn record_skip(&mut self, reason: &SkipReason) {
        *self.skipped.entry(reason.label().to_string()).or_insert(0) += 1;
    }

    /// Record a record that stopped the run
    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    /// Record a retried transient failure
    pub fn record_retry(&mut self) {
        self.retries += 1;
    }

    /// Skipped records across all reasons
    pub fn total_skipped(&self) -> u64 {
        self.skipped.values().sum()
    }

    /// Records per second over the run
    pub fn throughput(&self) -> f64 {
        if self.elapsed_ms == 0 {
            return 0.0;
        }
        self.committed as f64 * 1000.0 / self.elapsed_ms as f64
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Load Summary".to_string(),
            "============".to_string(),
            format!("Elements read: {}", self.elements),
            format!("Committed: {}", self.committed),
            format!("Authorship rows: {}", self.authorship_rows),
            format!("Passed through: {}", self.passed_through),
            format!("Skipped: {}", self.total_skipped()),
        ];

        for (reason, count) in &self.skipped {
            lines.push(format!("  {}: {}", reason, count));
        }

        lines.push(format!("Failed: {}", self.failed));
        if self.retries > 0 {
            lines.push(format!("Retries: {}", self.retries));
        }
        lines.push(format!("Elapsed: {} ms", self.elapsed_ms));

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pubload_domain::BuildError;
    use pubload_extractor::ExtractError;

    fn missing_key() -> SkipReason {
        SkipReason::Extract(ExtractError::MissingKey {
            tag: "article".to_string(),
            attribute: "key".to_string(),
            position: 0,
        })
    }

    #[test]
    fn test_summary_creation() {
        let summary = LoadSummary::new();
        assert_eq!(summary.committed, 0);
        assert_eq!(summary.total_skipped(), 0);
        assert_eq!(summary.throughput(), 0.0);
    }

    #[test]
    fn test_skips_grouped_by_reason() {
        let mut summary = LoadSummary::new();
        summary.record_skip(&missing_key());
        summary.record_skip(&missing_key());
        summary.record_skip(&SkipReason::Build(BuildError::InvalidInteger {
            pubkey: "k".to_string(),
            field: "year".to_string(),
            value: "19xx".to_string(),
        }));

        assert_eq!(summary.skipped.get("missing_key"), Some(&2));
        assert_eq!(summary.skipped.get("invalid_integer"), Some(&1));
        assert_eq!(summary.total_skipped(), 3);
    }

    #[test]
    fn test_commit_counts_authorship_rows() {
        let mut summary = LoadSummary::new();
        summary.record_commit(2);
        summary.record_commit(0);
        assert_eq!(summary.committed, 2);
        assert_eq!(summary.authorship_rows, 2);
    }

    #[test]
    fn test_summary_report() {
        let mut summary = LoadSummary::new();
        summary.record_element();
        summary.record_commit(1);
        summary.record_skip(&missing_key());

        let report = summary.summary();
        assert!(report.contains("Committed: 1"));
        assert!(report.contains("missing_key: 1"));
        assert!(!report.contains("Retries"));
    }
}
