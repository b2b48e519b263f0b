//! Record extraction from closed elements

use crate::config::ExtractorConfig;
use crate::error::ExtractError;
use pubload_domain::{dedup_authors, Field, PublicationRecord, TagSchema};
use pubload_reader::ClosedElement;
use std::sync::Arc;
use tracing::debug;

/// Turns record-level elements into [`PublicationRecord`]s
///
/// Holds the shared allow-list; extraction itself is stateless, so one
/// extractor serves the whole stream.
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    schema: Arc<TagSchema>,
    config: ExtractorConfig,
}

impl RecordExtractor {
    /// Create an extractor over `schema`
    pub fn new(schema: Arc<TagSchema>, config: ExtractorConfig) -> Self {
        Self { schema, config }
    }

    /// Extractor for the DBLP allow-list with default settings
    pub fn dblp() -> Self {
        Self::new(Arc::new(TagSchema::dblp()), ExtractorConfig::default())
    }

    /// Allow-list in use
    pub fn schema(&self) -> &TagSchema {
        &self.schema
    }

    /// Configuration in use
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Whether `tag` names a supported record variant
    pub fn supports(&self, tag: &str) -> bool {
        self.schema.supports_tag(tag)
    }

    /// Reduce `element` to its key, allow-listed fields and distinct authors
    ///
    /// Children outside the allow-list are dropped. When an allow-listed field
    /// repeats, the first occurrence is kept.
    pub fn extract(&self, element: &ClosedElement) -> Result<PublicationRecord, ExtractError> {
        let variant = self
            .schema
            .variant_for_tag(element.tag())
            .ok_or_else(|| ExtractError::UnsupportedTag {
                tag: element.tag().to_string(),
            })?;

        let pubkey = element
            .attribute(&self.config.key_attribute)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ExtractError::MissingKey {
                tag: element.tag().to_string(),
                attribute: self.config.key_attribute.clone(),
                position: element.position(),
            })?;

        let mut record = PublicationRecord::new(variant.kind(), self.value(pubkey));
        let mut authors = Vec::new();

        for child in element.children() {
            if child.tag() == self.config.author_tag {
                authors.push(self.value(child.text()));
                continue;
            }

            let Some(kind) = variant.field_kind(child.tag()) else {
                continue;
            };

            if record.field(child.tag()).is_some() {
                debug!(
                    "Dropping repeated <{}> in {}",
                    child.tag(),
                    record.pubkey
                );
                continue;
            }

            record.fields.push(Field {
                name: child.tag().to_string(),
                kind,
                value: self.value(child.text()),
            });
        }

        record.authors = dedup_authors(authors);
        Ok(record)
    }

    fn value(&self, text: &str) -> String {
        if self.config.trim_values {
            text.trim().to_string()
        } else {
            text.to_string()
        }
    }
}
