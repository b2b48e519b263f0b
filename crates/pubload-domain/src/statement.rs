//! Statement module - turns a record into typed insert statements
//!
//! Statements are built with positional placeholders and a parallel list of
//! typed values, so storage backends bind parameters instead of splicing text
//! into SQL. [`InsertStatement::render_literal`] renders the same statement as
//! plain SQL text (quote-doubled text literals, bare integers) for dry runs and
//! logs.

use crate::record::PublicationRecord;
use crate::schema::FieldKind;
use std::borrow::Cow;
use std::fmt;

/// Table holding authorship edges
pub const AUTHORSHIP_TABLE: &str = "authorship";

/// Primary key column shared by every publication table
pub const PUBKEY_COLUMN: &str = "pubkey";

/// Author column of the authorship table
pub const AUTHOR_COLUMN: &str = "author";

/// A typed value bound to one placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    /// TEXT value
    Text(String),

    /// INTEGER value
    Integer(i64),
}

impl SqlValue {
    /// Render as a SQL literal
    pub fn to_literal(&self) -> String {
        match self {
            SqlValue::Text(text) => quote_literal(text),
            SqlValue::Integer(n) => n.to_string(),
        }
    }
}

/// Double every single quote so `text` can sit inside a `'...'` literal
///
/// Text without quotes is returned unchanged (and unallocated).
pub fn escape_quotes(text: &str) -> Cow<'_, str> {
    if text.contains('\'') {
        Cow::Owned(text.replace('\'', "''"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Wrap `text` in single quotes, escaping embedded quotes
///
/// # Examples
///
/// ```
/// use pubload_domain::quote_literal;
///
/// assert_eq!(quote_literal("O'Brien"), "'O''Brien'");
/// ```
pub fn quote_literal(text: &str) -> String {
    format!("'{}'", escape_quotes(text))
}

/// Errors raised while encoding a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// An integer-typed field does not hold a whole number
    InvalidInteger {
        /// Record the field belongs to
        pubkey: String,
        /// Field name
        field: String,
        /// Offending text
        value: String,
    },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::InvalidInteger {
                pubkey,
                field,
                value,
            } => write!(
                f,
                "Field '{}' of {} is not an integer: {:?}",
                field, pubkey, value
            ),
        }
    }
}

impl std::error::Error for BuildError {}

/// A single multi-row INSERT with bound values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertStatement {
    table: String,
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
}

impl InsertStatement {
    /// Target table
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Column list in insert order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Value rows, each as wide as `columns()`
    pub fn rows(&self) -> &[Vec<SqlValue>] {
        &self.rows
    }

    /// Number of value rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// All bound values, row by row, in placeholder order
    pub fn params(&self) -> impl Iterator<Item = &SqlValue> {
        self.rows.iter().flatten()
    }

    /// SQL with numbered placeholders (`?1, ?2, ...`)
    pub fn sql(&self) -> String {
        self.batch_sql(self.rows.len())
    }

    /// Placeholder SQL for the first `rows` rows, or any run of that many rows
    ///
    /// Backends with a cap on bound parameters execute the statement in
    /// slices of `rows()` using this.
    pub fn batch_sql(&self, rows: usize) -> String {
        let width = self.columns.len();
        let groups: Vec<String> = (0..rows)
            .map(|row| {
                let placeholders: Vec<String> = (1..=width)
                    .map(|col| format!("?{}", row * width + col))
                    .collect();
                format!("({})", placeholders.join(", "))
            })
            .collect();

        format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.table,
            self.columns.join(", "),
            groups.join(", ")
        )
    }

    /// SQL with values inlined as literals, terminated by `;`
    pub fn render_literal(&self) -> String {
        let groups: Vec<String> = self
            .rows
            .iter()
            .map(|row| {
                let values: Vec<String> = row.iter().map(SqlValue::to_literal).collect();
                format!("({})", values.join(", "))
            })
            .collect();

        format!(
            "INSERT INTO {} ({}) VALUES {};",
            self.table,
            self.columns.join(", "),
            groups.join(", ")
        )
    }
}

/// Everything one record writes, committed as a unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordStatements {
    /// Key of the record these statements belong to
    pub pubkey: String,

    /// Insert into the variant's publication table
    pub publication: InsertStatement,

    /// Insert into the authorship table; absent when the record has no authors
    pub authorship: Option<InsertStatement>,
}

impl RecordStatements {
    /// Statements in execution order (publication first)
    pub fn iter(&self) -> impl Iterator<Item = &InsertStatement> {
        std::iter::once(&self.publication).chain(self.authorship.iter())
    }

    /// Number of authorship rows this record writes
    pub fn authorship_rows(&self) -> usize {
        self.authorship.as_ref().map_or(0, InsertStatement::row_count)
    }
}

/// Builds [`RecordStatements`] from records
///
/// # Examples
///
/// ```
/// use pubload_domain::{Field, FieldKind, PublicationRecord, RecordKind, StatementBuilder};
///
/// let mut record = PublicationRecord::new(RecordKind::Article, "journals/cacm/Knuth74");
/// record.fields.push(Field {
///     name: "year".into(),
///     kind: FieldKind::Integer,
///     value: "1974".into(),
/// });
///
/// let statements = StatementBuilder::new().build(&record).unwrap();
/// assert_eq!(statements.publication.sql(), "INSERT INTO article (pubkey, year) VALUES (?1, ?2)");
/// assert!(statements.authorship.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StatementBuilder {
    _private: (),
}

impl StatementBuilder {
    /// Create a builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode `record` as its publication insert plus an optional authorship insert
    pub fn build(&self, record: &PublicationRecord) -> Result<RecordStatements, BuildError> {
        let mut columns = Vec::with_capacity(record.fields.len() + 1);
        let mut values = Vec::with_capacity(record.fields.len() + 1);

        columns.push(PUBKEY_COLUMN.to_string());
        values.push(SqlValue::Text(record.pubkey.clone()));

        for field in &record.fields {
            let value = match field.kind {
                FieldKind::Text => SqlValue::Text(field.value.clone()),
                FieldKind::Integer => {
                    let n = field.value.trim().parse::<i64>().map_err(|_| {
                        BuildError::InvalidInteger {
                            pubkey: record.pubkey.clone(),
                            field: field.name.clone(),
                            value: field.value.clone(),
                        }
                    })?;
                    SqlValue::Integer(n)
                }
            };
            columns.push(field.name.clone());
            values.push(value);
        }

        let publication = InsertStatement {
            table: record.kind.table().to_string(),
            columns,
            rows: vec![values],
        };

        Ok(RecordStatements {
            pubkey: record.pubkey.clone(),
            publication,
            authorship: self.build_authorship(record),
        })
    }

    fn build_authorship(&self, record: &PublicationRecord) -> Option<InsertStatement> {
        if record.authors.is_empty() {
            return None;
        }

        let rows = record
            .edges()
            .map(|edge| vec![SqlValue::Text(edge.pubkey), SqlValue::Text(edge.author)])
            .collect();

        Some(InsertStatement {
            table: AUTHORSHIP_TABLE.to_string(),
            columns: vec![PUBKEY_COLUMN.to_string(), AUTHOR_COLUMN.to_string()],
            rows,
        })
    }
}
