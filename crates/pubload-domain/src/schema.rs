//! Schema module - which child fields each record variant keeps

use std::fmt;

/// Semantic type of a retained field
///
/// Drives value encoding in the statement builder: integer fields are bound
/// (and rendered) as numbers, everything else as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Free text, stored as TEXT
    Text,

    /// Whole number, stored as INTEGER
    Integer,
}

/// The two supported publication shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Journal article (`<article>`)
    Article,

    /// Conference paper (`<inproceedings>`)
    InProceedings,
}

impl RecordKind {
    /// All supported variants, in a stable order
    pub const ALL: [RecordKind; 2] = [RecordKind::Article, RecordKind::InProceedings];

    /// XML tag that introduces this variant
    pub fn tag(&self) -> &'static str {
        match self {
            RecordKind::Article => "article",
            RecordKind::InProceedings => "inproceedings",
        }
    }

    /// Target table name. Table names are the lower-case tag.
    pub fn table(&self) -> &'static str {
        self.tag()
    }

    /// Name of the venue column for this variant
    pub fn venue_field(&self) -> &'static str {
        match self {
            RecordKind::Article => "journal",
            RecordKind::InProceedings => "booktitle",
        }
    }

    /// Resolve a variant from an XML tag (exact match)
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "article" => Some(RecordKind::Article),
            "inproceedings" => Some(RecordKind::InProceedings),
            _ => None,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One allow-listed field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Child tag name, also used as the column name
    pub name: String,

    /// Semantic type
    pub kind: FieldKind,
}

/// Allow-list for a single record variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSchema {
    kind: RecordKind,
    fields: Vec<FieldSpec>,
}

impl VariantSchema {
    /// Start an empty allow-list for `kind`
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            fields: Vec::new(),
        }
    }

    /// Allow a text field
    pub fn text(self, name: impl Into<String>) -> Self {
        self.field(name, FieldKind::Text)
    }

    /// Allow an integer field
    pub fn integer(self, name: impl Into<String>) -> Self {
        self.field(name, FieldKind::Integer)
    }

    fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        // Later declarations of the same name replace earlier ones.
        self.fields.retain(|f| f.name != name);
        self.fields.push(FieldSpec { name, kind });
        self
    }

    /// Variant this allow-list belongs to
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Allowed fields in declaration order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Type of `name` if it is allowed for this variant
    pub fn field_kind(&self, name: &str) -> Option<FieldKind> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.kind)
    }

    /// Whether `name` is allowed for this variant
    pub fn allows(&self, name: &str) -> bool {
        self.field_kind(name).is_some()
    }
}

/// Immutable tag → allowed-field mapping
///
/// Built once at startup and shared read-only (typically behind an `Arc`).
/// A schema may cover only some variants; tags without an entry are rejected
/// by the extractor.
///
/// # Examples
///
/// ```
/// use pubload_domain::{FieldKind, RecordKind, TagSchema};
///
/// let schema = TagSchema::dblp();
/// let article = schema.variant_for_tag("article").unwrap();
/// assert_eq!(article.field_kind("year"), Some(FieldKind::Integer));
/// assert!(schema.variant_for_tag("www").is_none());
/// assert_eq!(article.kind(), RecordKind::Article);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSchema {
    variants: Vec<VariantSchema>,
}

impl TagSchema {
    /// Build a schema from explicit variant allow-lists
    ///
    /// If the same variant appears twice, the last one wins.
    pub fn new(variants: impl IntoIterator<Item = VariantSchema>) -> Self {
        let mut merged: Vec<VariantSchema> = Vec::new();
        for variant in variants {
            merged.retain(|v| v.kind != variant.kind);
            merged.push(variant);
        }
        Self { variants: merged }
    }

    /// The DBLP allow-list:
    /// `article → {title, journal, year}`, `inproceedings → {title, booktitle, year}`
    pub fn dblp() -> Self {
        Self::new([
            VariantSchema::new(RecordKind::Article)
                .text("title")
                .text("journal")
                .integer("year"),
            VariantSchema::new(RecordKind::InProceedings)
                .text("title")
                .text("booktitle")
                .integer("year"),
        ])
    }

    /// Allow-list for a variant, if covered
    pub fn variant(&self, kind: RecordKind) -> Option<&VariantSchema> {
        self.variants.iter().find(|v| v.kind == kind)
    }

    /// Allow-list for an XML tag, if the tag is a covered variant
    pub fn variant_for_tag(&self, tag: &str) -> Option<&VariantSchema> {
        RecordKind::from_tag(tag).and_then(|kind| self.variant(kind))
    }

    /// Whether elements with this tag should be turned into records
    pub fn supports_tag(&self, tag: &str) -> bool {
        self.variant_for_tag(tag).is_some()
    }

    /// Covered variants
    pub fn variants(&self) -> &[VariantSchema] {
        &self.variants
    }
}

impl Default for TagSchema {
    fn default() -> Self {
        Self::dblp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dblp_allow_lists() {
        let schema = TagSchema::dblp();

        let article = schema.variant(RecordKind::Article).unwrap();
        let names: Vec<_> = article.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["title", "journal", "year"]);

        let inproc = schema.variant(RecordKind::InProceedings).unwrap();
        assert!(inproc.allows("booktitle"));
        assert!(!inproc.allows("journal"));
        assert_eq!(inproc.field_kind("title"), Some(FieldKind::Text));
    }

    #[test]
    fn test_tag_lookup_is_exact() {
        let schema = TagSchema::dblp();
        assert!(schema.supports_tag("article"));
        assert!(!schema.supports_tag("Article"));
        assert!(!schema.supports_tag("phdthesis"));
    }

    #[test]
    fn test_partial_schema() {
        let schema = TagSchema::new([VariantSchema::new(RecordKind::Article).text("title")]);
        assert!(schema.supports_tag("article"));
        assert!(!schema.supports_tag("inproceedings"));
    }

    #[test]
    fn test_redeclared_field_replaces_kind() {
        let variant = VariantSchema::new(RecordKind::Article)
            .text("year")
            .integer("year");
        assert_eq!(variant.fields().len(), 1);
        assert_eq!(variant.field_kind("year"), Some(FieldKind::Integer));
    }

    #[test]
    fn test_variant_names() {
        assert_eq!(RecordKind::InProceedings.table(), "inproceedings");
        assert_eq!(RecordKind::Article.venue_field(), "journal");
        assert_eq!(RecordKind::InProceedings.venue_field(), "booktitle");
        assert_eq!(RecordKind::from_tag("inproceedings"), Some(RecordKind::InProceedings));
    }
}
