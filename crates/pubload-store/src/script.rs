//! Dry-run sink that writes SQL text instead of executing it

use crate::{StoreError, SCHEMA_SQL};
use pubload_domain::{FailureClass, RecordSink, RecordStatements};
use std::io::Write;

/// Writes each record as a `BEGIN; ... COMMIT;` block of literal SQL
///
/// Text values are quoted with embedded quotes doubled, so the output can be
/// fed to `sqlite3` directly.
///
/// # Examples
///
/// ```
/// use pubload_domain::{PublicationRecord, RecordKind, RecordSink, StatementBuilder};
/// use pubload_store::SqlScriptWriter;
///
/// let mut record = PublicationRecord::new(RecordKind::Article, "a'1");
/// record.authors.push("O'Hara".to_string());
/// let statements = StatementBuilder::new().build(&record).unwrap();
///
/// let mut writer = SqlScriptWriter::new(Vec::new());
/// writer.commit_record(&statements).unwrap();
/// let script = String::from_utf8(writer.into_inner()).unwrap();
/// assert!(script.contains("VALUES ('a''1', 'O''Hara');"));
/// ```
pub struct SqlScriptWriter<W: Write> {
    out: W,
    records: u64,
}

impl<W: Write> SqlScriptWriter<W> {
    /// Wrap an output stream
    pub fn new(out: W) -> Self {
        Self { out, records: 0 }
    }

    /// Emit the table definitions so the script is self-contained
    pub fn write_schema(&mut self) -> Result<(), StoreError> {
        self.out.write_all(SCHEMA_SQL.as_bytes())?;
        writeln!(self.out)?;
        Ok(())
    }

    /// Records written so far
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Flush and return the underlying stream
    pub fn into_inner(mut self) -> W {
        // Flushing a Vec or stdout lock only fails if the stream is already broken.
        let _ = self.out.flush();
        self.out
    }
}

impl<W: Write> RecordSink for SqlScriptWriter<W> {
    type Error = StoreError;

    fn commit_record(&mut self, statements: &RecordStatements) -> Result<(), Self::Error> {
        writeln!(self.out, "BEGIN;")?;
        for insert in statements.iter() {
            writeln!(self.out, "{}", insert.render_literal())?;
        }
        writeln!(self.out, "COMMIT;")?;
        self.records += 1;
        Ok(())
    }

    fn failure_class(&self, error: &Self::Error) -> FailureClass {
        error.class()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pubload_domain::{Field, FieldKind, PublicationRecord, RecordKind, StatementBuilder};

    #[test]
    fn test_one_block_per_record() {
        let mut record = PublicationRecord::new(RecordKind::InProceedings, "conf/x/1");
        record.fields.push(Field {
            name: "year".to_string(),
            kind: FieldKind::Integer,
            value: "2001".to_string(),
        });
        let statements = StatementBuilder::new().build(&record).unwrap();

        let mut writer = SqlScriptWriter::new(Vec::new());
        writer.commit_record(&statements).unwrap();
        writer.commit_record(&statements).unwrap();
        assert_eq!(writer.records(), 2);

        let script = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(script.matches("BEGIN;").count(), 2);
        assert_eq!(script.matches("COMMIT;").count(), 2);
        assert!(script
            .contains("INSERT INTO inproceedings (pubkey, year) VALUES ('conf/x/1', 2001);"));
        assert!(!script.contains("authorship"));
    }

    #[test]
    fn test_schema_prefix() {
        let mut writer = SqlScriptWriter::new(Vec::new());
        writer.write_schema().unwrap();
        let script = String::from_utf8(writer.into_inner()).unwrap();
        assert!(script.contains("CREATE TABLE IF NOT EXISTS authorship"));
    }
}
