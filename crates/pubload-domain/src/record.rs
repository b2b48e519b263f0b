//! Record module - one publication extracted from the corpus

use crate::schema::{FieldKind, RecordKind};
use std::collections::HashSet;

/// A retained child field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Column name (the child tag)
    pub name: String,

    /// Semantic type from the allow-list
    pub kind: FieldKind,

    /// Inner text of the child element
    pub value: String,
}

/// A publication reduced to its allow-listed fields and authors
///
/// Built once per XML element, handed to the statement builder, then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicationRecord {
    /// Variant (decides the target table)
    pub kind: RecordKind,

    /// Externally supplied unique identifier
    pub pubkey: String,

    /// Allow-listed fields in document order, at most one per name
    pub fields: Vec<Field>,

    /// Distinct author names in first-occurrence order
    pub authors: Vec<String>,
}

impl PublicationRecord {
    /// Create a record with no fields and no authors
    pub fn new(kind: RecordKind, pubkey: impl Into<String>) -> Self {
        Self {
            kind,
            pubkey: pubkey.into(),
            fields: Vec::new(),
            authors: Vec::new(),
        }
    }

    /// Value of a retained field
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// Authorship edges for this record, one per distinct author
    pub fn edges(&self) -> impl Iterator<Item = AuthorshipEdge> + '_ {
        self.authors.iter().map(move |author| AuthorshipEdge {
            pubkey: self.pubkey.clone(),
            author: author.clone(),
        })
    }
}

/// (publication, author) association
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthorshipEdge {
    /// Owning publication
    pub pubkey: String,

    /// Credited author
    pub author: String,
}

/// Remove repeated authors, keeping the first occurrence of each name
///
/// Matching is exact; `"A. Smith"` and `"A.  Smith"` stay distinct.
///
/// # Examples
///
/// ```
/// use pubload_domain::dedup_authors;
///
/// let authors = vec!["A. Smith".to_string(), "B. Lee".to_string(), "A. Smith".to_string()];
/// assert_eq!(dedup_authors(authors), vec!["A. Smith", "B. Lee"]);
/// ```
pub fn dedup_authors(authors: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(authors.len());
    authors
        .into_iter()
        .filter(|author| seen.insert(author.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_keeps_first_occurrence_order() {
        let authors = vec![
            "C".to_string(),
            "A".to_string(),
            "C".to_string(),
            "B".to_string(),
            "A".to_string(),
        ];
        assert_eq!(dedup_authors(authors), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_dedup_empty() {
        assert!(dedup_authors(Vec::new()).is_empty());
    }

    #[test]
    fn test_edges_carry_pubkey() {
        let mut record = PublicationRecord::new(RecordKind::Article, "journals/x/Y20");
        record.authors = vec!["A".to_string(), "B".to_string()];

        let edges: Vec<_> = record.edges().collect();
        assert_eq!(edges.len(), 2);
        assert!(edges.iter().all(|e| e.pubkey == "journals/x/Y20"));
        assert_eq!(edges[1].author, "B");
    }

    #[test]
    fn test_field_lookup() {
        let mut record = PublicationRecord::new(RecordKind::Article, "k");
        record.fields.push(Field {
            name: "title".to_string(),
            kind: FieldKind::Text,
            value: "On Things".to_string(),
        });
        assert_eq!(record.field("title"), Some("On Things"));
        assert_eq!(record.field("year"), None);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: dedup output has no repeats and covers every input name
        #[test]
        fn test_dedup_is_distinct_and_complete(
            authors in prop::collection::vec("[a-c]{1,2}", 0..20)
        ) {
            let deduped = dedup_authors(authors.clone());

            let distinct: HashSet<_> = deduped.iter().collect();
            prop_assert_eq!(distinct.len(), deduped.len());

            for author in &authors {
                prop_assert!(deduped.contains(author));
            }
        }

        /// Property: dedup preserves the relative order of first occurrences
        #[test]
        fn test_dedup_preserves_first_positions(authors in prop::collection::vec("[a-d]", 0..20)) {
            let deduped = dedup_authors(authors.clone());
            let first_positions: Vec<usize> = deduped
                .iter()
                .map(|a| authors.iter().position(|x| x == a).unwrap())
                .collect();

            prop_assert!(first_positions.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
