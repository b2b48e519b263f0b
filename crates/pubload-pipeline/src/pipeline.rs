//! The streaming load loop

use crate::config::{ErrorPolicy, PipelineConfig};
use crate::error::{PipelineError, SkipReason};
use crate::summary::LoadSummary;
use pubload_domain::{FailureClass, RecordSink, RecordStatements, StatementBuilder};
use pubload_extractor::RecordExtractor;
use pubload_reader::{ClosedElement, StreamReader};
use std::io::BufRead;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// What happened to one record-level element
#[derive(Debug)]
pub enum RecordOutcome {
    /// Stored; carries the number of authorship rows written
    Committed {
        /// Authorship rows in the commit
        authorship_rows: usize,
    },

    /// Tag is not a supported variant; released unprocessed
    PassedThrough,

    /// Not stored, and the run may continue
    Skipped(SkipReason),

    /// Not stored, and the run cannot continue
    Fatal(PipelineError),
}

/// Drives reader → extractor → builder → sink, one record at a time
///
/// Each record is committed before the next element is read. A failed record
/// never affects records already committed.
///
/// # Examples
///
/// ```
/// use pubload_extractor::RecordExtractor;
/// use pubload_pipeline::{Pipeline, PipelineConfig};
/// use pubload_reader::{ReaderOptions, StreamReader};
/// use pubload_store::SqlScriptWriter;
///
/// let xml = r#"<dblp>
///   <article key="a/1"><author>A</author><title>T</title><year>2001</year></article>
///   <www key="h/1"><title>Home</title></www>
/// </dblp>"#;
///
/// let mut reader = StreamReader::from_str(xml, ReaderOptions::lenient());
/// let mut sink = SqlScriptWriter::new(Vec::new());
/// let mut pipeline = Pipeline::new(RecordExtractor::dblp(), PipelineConfig::default());
///
/// let summary = pipeline.run(&mut reader, &mut sink).unwrap();
/// assert_eq!(summary.committed, 1);
/// assert_eq!(summary.passed_through, 1);
/// ```
pub struct Pipeline {
    extractor: RecordExtractor,
    builder: StatementBuilder,
    config: PipelineConfig,
    summary: LoadSummary,
}

impl Pipeline {
    /// Create a pipeline
    pub fn new(extractor: RecordExtractor, config: PipelineConfig) -> Self {
        Self {
            extractor,
            builder: StatementBuilder::new(),
            config,
            summary: LoadSummary::new(),
        }
    }

    /// Pipeline over the DBLP allow-list with default settings
    pub fn default_config() -> Self {
        Self::new(RecordExtractor::dblp(), PipelineConfig::default())
    }

    /// Counts from the current or most recent run
    pub fn summary(&self) -> &LoadSummary {
        &self.summary
    }

    /// Configuration in use
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load every record from `reader` into `sink`
    ///
    /// Returns the final counts. On error the counts up to the failure remain
    /// available through [`summary`](Self::summary).
    pub fn run<R, S>(
        &mut self,
        reader: &mut StreamReader<R>,
        sink: &mut S,
    ) -> Result<LoadSummary, PipelineError>
    where
        R: BufRead,
        S: RecordSink,
    {
        self.config.validate().map_err(PipelineError::Config)?;

        self.summary = LoadSummary::new();
        let started = Instant::now();
        info!(
            "Starting load (policy {:?}, max retries {})",
            self.config.error_policy, self.config.max_retries
        );

        let result = self.drive(reader, sink);

        let stats = reader.stats();
        self.summary.bytes_read = stats.bytes_read;
        self.summary.high_water_bytes = stats.high_water_bytes;
        self.summary.elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                info!(
                    "Load complete: {} committed, {} skipped, {} passed through in {} ms",
                    self.summary.committed,
                    self.summary.total_skipped(),
                    self.summary.passed_through,
                    self.summary.elapsed_ms
                );
                Ok(self.summary.clone())
            }
            Err(e) => {
                error!(
                    "Load stopped after {} elements ({} committed): {}",
                    self.summary.elements, self.summary.committed, e
                );
                Err(e)
            }
        }
    }

    fn drive<R: BufRead, S: RecordSink>(
        &mut self,
        reader: &mut StreamReader<R>,
        sink: &mut S,
    ) -> Result<(), PipelineError> {
        loop {
            let outcome = match reader.next_element()? {
                Some(element) => self.process(element, sink),
                None => return Ok(()),
            };
            reader.release();

            self.apply(outcome)?;

            if self.summary.elements % self.config.progress_interval == 0 {
                info!(
                    "Progress: {} elements, {} committed, {} skipped",
                    self.summary.elements,
                    self.summary.committed,
                    self.summary.total_skipped()
                );
            }
        }
    }

    /// Extract, build and commit one element
    pub fn process<S: RecordSink>(
        &mut self,
        element: &ClosedElement,
        sink: &mut S,
    ) -> RecordOutcome {
        self.summary.record_element();

        if !self.extractor.supports(element.tag()) {
            debug!("Passing through <{}>", element.tag());
            return RecordOutcome::PassedThrough;
        }

        let record = match self.extractor.extract(element) {
            Ok(record) => record,
            Err(e) => return RecordOutcome::Skipped(e.into()),
        };
        debug!("Converting {} {}", record.kind, record.pubkey);

        let statements = match self.builder.build(&record) {
            Ok(statements) => statements,
            Err(e) => return RecordOutcome::Skipped(e.into()),
        };

        self.commit(&statements, sink)
    }

    fn commit<S: RecordSink>(
        &mut self,
        statements: &RecordStatements,
        sink: &mut S,
    ) -> RecordOutcome {
        let mut attempt = 0;
        loop {
            let err = match sink.commit_record(statements) {
                Ok(()) => {
                    return RecordOutcome::Committed {
                        authorship_rows: statements.authorship_rows(),
                    }
                }
                Err(err) => err,
            };

            match sink.failure_class(&err) {
                FailureClass::Transient if attempt < self.config.max_retries => {
                    attempt += 1;
                    self.summary.record_retry();
                    let delay = self.config.retry_backoff(attempt);
                    warn!(
                        "Busy storing {} (attempt {}/{}), retrying in {} ms: {}",
                        statements.pubkey,
                        attempt,
                        self.config.max_retries,
                        delay.as_millis(),
                        err
                    );
                    std::thread::sleep(delay);
                }
                FailureClass::Fatal => {
                    return RecordOutcome::Fatal(PipelineError::Storage {
                        pubkey: statements.pubkey.clone(),
                        source: Box::new(err),
                    })
                }
                class => {
                    return RecordOutcome::Skipped(SkipReason::Storage {
                        pubkey: statements.pubkey.clone(),
                        class,
                        message: err.to_string(),
                    })
                }
            }
        }
    }

    fn apply(&mut self, outcome: RecordOutcome) -> Result<(), PipelineError> {
        match outcome {
            RecordOutcome::Committed { authorship_rows } => {
                self.summary.record_commit(authorship_rows);
            }
            RecordOutcome::PassedThrough => self.summary.record_pass_through(),
            RecordOutcome::Skipped(reason) => {
                if self.config.error_policy == ErrorPolicy::Abort {
                    self.summary.record_failure();
                    return Err(PipelineError::Aborted {
                        element: self.summary.elements,
                        reason,
                    });
                }

                warn!("Skipping record: {}", reason);
                self.summary.record_skip(&reason);

                if let Some(limit) = self.config.skip_limit {
                    if self.summary.total_skipped() > limit {
                        return Err(PipelineError::SkipLimitExceeded { limit });
                    }
                }
            }
            RecordOutcome::Fatal(e) => {
                self.summary.record_failure();
                return Err(e);
            }
        }
        Ok(())
    }
}
