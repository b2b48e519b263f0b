//! pubload Storage Layer
//!
//! Implements the RecordSink trait on SQLite.
//!
//! # Architecture
//!
//! - One connection, owned by [`SqliteStore`] and released on drop
//! - Schema applied on open (`CREATE ... IF NOT EXISTS`)
//! - Each record's inserts run in one transaction with bound parameters
//! - [`SqlScriptWriter`] renders the same statements as SQL text for dry runs
//!
//! # Examples
//!
//! ```no_run
//! use pubload_store::SqliteStore;
//!
//! let store = SqliteStore::new("dblp.db").unwrap();
//! for (table, rows) in store.table_counts().unwrap() {
//!     println!("{table}: {rows}");
//! }
//! store.close().unwrap();
//! ```

#![warn(missing_docs)]

mod script;

pub use script::SqlScriptWriter;

use pubload_domain::{
    FailureClass, InsertStatement, RecordKind, RecordSink, RecordStatements, SqlValue,
    AUTHORSHIP_TABLE,
};
use rusqlite::types::ToSqlOutput;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension, ToSql};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// DDL for every table the loader writes
pub const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Default wait for a locked database before a commit fails as busy
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Most rows bound into one INSERT; SQLite caps a statement at 32766 parameters
pub const MAX_BATCH_ROWS: usize = 1000;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database could not be opened or configured
    #[error("Cannot connect to {path}: {source}")]
    Connection {
        /// Database path as given
        path: String,
        /// Underlying error
        #[source]
        source: rusqlite::Error,
    },

    /// Schema could not be applied
    #[error("Schema error: {0}")]
    Schema(#[source] rusqlite::Error),

    /// An insert failed
    #[error("Insert into {table} failed: {source}")]
    Execution {
        /// Target table
        table: String,
        /// Underlying error
        #[source]
        source: rusqlite::Error,
    },

    /// Transaction could not begin or commit
    #[error("Transaction error: {0}")]
    Transaction(#[source] rusqlite::Error),

    /// Table is not part of the loader schema
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// Query error in a read helper
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Script output could not be written
    #[error("Write error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// How a pipeline should react to this error
    pub fn class(&self) -> FailureClass {
        match self {
            StoreError::Execution { source, .. }
            | StoreError::Transaction(source)
            | StoreError::Database(source) => classify(source),
            StoreError::UnknownTable(_) => FailureClass::Record,
            StoreError::Connection { .. } | StoreError::Schema(_) | StoreError::Io(_) => {
                FailureClass::Fatal
            }
        }
    }
}

fn classify(error: &rusqlite::Error) -> FailureClass {
    match error {
        rusqlite::Error::SqliteFailure(err, _) => match err.code {
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => FailureClass::Transient,
            ErrorCode::ConstraintViolation | ErrorCode::TypeMismatch | ErrorCode::TooBig => {
                FailureClass::Record
            }
            _ => FailureClass::Fatal,
        },
        // Binding and conversion problems are specific to the record's values.
        rusqlite::Error::ToSqlConversionFailure(_)
        | rusqlite::Error::InvalidParameterCount(_, _)
        | rusqlite::Error::IntegralValueOutOfRange(_, _) => FailureClass::Record,
        _ => FailureClass::Fatal,
    }
}

/// A stored publication row, as read back for verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPublication {
    /// Primary key
    pub pubkey: String,
    /// Title, if one was extracted
    pub title: Option<String>,
    /// Journal (articles) or booktitle (inproceedings)
    pub venue: Option<String>,
    /// Publication year
    pub year: Option<i64>,
}

/// SQLite-backed record sink
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should have its own
/// SqliteStore instance.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create the database at `path` with the default busy timeout
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::with_busy_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Open or create the database, waiting up to `busy_timeout` on locks
    pub fn with_busy_timeout<P: AsRef<Path>>(
        path: P,
        busy_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let connection_error = |source| StoreError::Connection {
            path: path.display().to_string(),
            source,
        };

        let conn = Connection::open(path).map_err(connection_error)?;
        conn.busy_timeout(busy_timeout).map_err(connection_error)?;
        conn.set_prepared_statement_cache_capacity(32);

        let mut store = Self { conn };
        store.initialize_schema()?;
        debug!(
            "Opened {} (busy timeout {} ms)",
            path.display(),
            busy_timeout.as_millis()
        );
        Ok(store)
    }

    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch(SCHEMA_SQL).map_err(StoreError::Schema)
    }

    /// Number of rows in one of the loader's tables
    pub fn count_rows(&self, table: &str) -> Result<u64, StoreError> {
        let table = known_table(table)?;
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Row counts for every table in schema order
    pub fn table_counts(&self) -> Result<Vec<(String, u64)>, StoreError> {
        loader_tables()
            .map(|table| Ok((table.to_string(), self.count_rows(table)?)))
            .collect()
    }

    /// Authors linked to `pubkey`, in insertion order
    pub fn authors_of(&self, pubkey: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT author FROM authorship WHERE pubkey = ?1 ORDER BY rowid")?;
        let authors = stmt
            .query_map(params![pubkey], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(authors)
    }

    /// Read back one publication row
    pub fn publication(
        &self,
        kind: RecordKind,
        pubkey: &str,
    ) -> Result<Option<StoredPublication>, StoreError> {
        let sql = format!(
            "SELECT pubkey, title, {}, year FROM {} WHERE pubkey = ?1",
            kind.venue_field(),
            kind.table()
        );
        let row = self
            .conn
            .query_row(&sql, params![pubkey], |row| {
                Ok(StoredPublication {
                    pubkey: row.get(0)?,
                    title: row.get(1)?,
                    venue: row.get(2)?,
                    year: row.get(3)?,
                })
            })
            .optional()?;
        Ok(row)
    }

    /// Close the connection, reporting any error
    ///
    /// Dropping the store also closes it, silently.
    pub fn close(self) -> Result<(), StoreError> {
        self.conn
            .close()
            .map_err(|(_, source)| StoreError::Database(source))?;
        info!("Database connection closed");
        Ok(())
    }

    fn execute(
        tx: &rusqlite::Transaction<'_>,
        insert: &InsertStatement,
    ) -> Result<usize, StoreError> {
        let execution_error = |source| StoreError::Execution {
            table: insert.table().to_string(),
            source,
        };

        let mut written = 0;
        for batch in insert.rows().chunks(MAX_BATCH_ROWS) {
            let mut stmt = tx
                .prepare_cached(&insert.batch_sql(batch.len()))
                .map_err(execution_error)?;
            written += stmt
                .execute(params_from_iter(batch.iter().flatten().map(Bind)))
                .map_err(execution_error)?;
        }
        Ok(written)
    }
}

impl RecordSink for SqliteStore {
    type Error = StoreError;

    fn commit_record(&mut self, statements: &RecordStatements) -> Result<(), Self::Error> {
        // Dropping the transaction without commit rolls it back.
        let tx = self.conn.transaction().map_err(StoreError::Transaction)?;
        for insert in statements.iter() {
            Self::execute(&tx, insert)?;
        }
        tx.commit().map_err(StoreError::Transaction)?;
        debug!(
            "Committed {} ({} authorship rows)",
            statements.pubkey,
            statements.authorship_rows()
        );
        Ok(())
    }

    fn failure_class(&self, error: &Self::Error) -> FailureClass {
        error.class()
    }
}

/// Binds a domain value without copying it
struct Bind<'a>(&'a SqlValue);

impl ToSql for Bind<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            SqlValue::Text(text) => ToSqlOutput::from(text.as_str()),
            SqlValue::Integer(n) => ToSqlOutput::from(*n),
        })
    }
}

fn loader_tables() -> impl Iterator<Item = &'static str> {
    RecordKind::ALL
        .into_iter()
        .map(|kind| kind.table())
        .chain(std::iter::once(AUTHORSHIP_TABLE))
}

fn known_table(table: &str) -> Result<&'static str, StoreError> {
    loader_tables()
        .find(|known| *known == table)
        .ok_or_else(|| StoreError::UnknownTable(table.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::c_int;

    fn sqlite_failure(code: c_int) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), None)
    }

    #[test]
    fn test_busy_and_locked_are_transient() {
        let busy = StoreError::Execution {
            table: "article".to_string(),
            source: sqlite_failure(rusqlite::ffi::SQLITE_BUSY),
        };
        assert_eq!(busy.class(), FailureClass::Transient);

        let locked = StoreError::Transaction(sqlite_failure(rusqlite::ffi::SQLITE_LOCKED));
        assert_eq!(locked.class(), FailureClass::Transient);
    }

    #[test]
    fn test_constraint_is_record_level() {
        let err = StoreError::Execution {
            table: "article".to_string(),
            source: sqlite_failure(rusqlite::ffi::SQLITE_CONSTRAINT),
        };
        assert_eq!(err.class(), FailureClass::Record);
    }

    #[test]
    fn test_disk_errors_are_fatal() {
        let full = StoreError::Transaction(sqlite_failure(rusqlite::ffi::SQLITE_FULL));
        assert_eq!(full.class(), FailureClass::Fatal);

        let readonly = StoreError::Execution {
            table: "authorship".to_string(),
            source: sqlite_failure(rusqlite::ffi::SQLITE_READONLY),
        };
        assert_eq!(readonly.class(), FailureClass::Fatal);
    }

    #[test]
    fn test_known_tables() {
        assert_eq!(known_table("article").unwrap(), "article");
        assert_eq!(known_table("authorship").unwrap(), "authorship");
        assert!(matches!(
            known_table("article; DROP TABLE article"),
            Err(StoreError::UnknownTable(_))
        ));
    }
}
