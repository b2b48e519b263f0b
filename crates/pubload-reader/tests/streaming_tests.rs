//! Integration tests for pubload-reader
//!
//! These tests drive the reader over files on disk and over large generated
//! documents to check DTD resolution and bounded memory.

use pubload_reader::{ReadError, ReaderOptions, StreamReader};
use std::fs;
use std::io::{self, BufReader, Read};

const DTD: &str = r#"<!ELEMENT dblp (article|inproceedings|www)*>
<!ELEMENT article (author|title|journal|year)*>
<!ELEMENT inproceedings (author|title|booktitle|year)*>
<!ELEMENT www (author|title|url)*>
<!ELEMENT author (#PCDATA)>
<!ELEMENT title (#PCDATA|i)*>
<!ELEMENT i (#PCDATA)>
<!ELEMENT journal (#PCDATA)>
<!ELEMENT booktitle (#PCDATA)>
<!ELEMENT year (#PCDATA)>
<!ELEMENT url (#PCDATA)>
<!ENTITY ouml "&#246;">
<!ENTITY eacute "&#233;">
"#;

/// Lazily generated `<dblp>` document with `records` articles
struct SyntheticDblp {
    records: usize,
    next: usize,
    stage: Stage,
    pending: Vec<u8>,
    pos: usize,
}

enum Stage {
    Header,
    Body,
    Done,
}

impl SyntheticDblp {
    fn new(records: usize) -> Self {
        Self {
            records,
            next: 0,
            stage: Stage::Header,
            pending: Vec::new(),
            pos: 0,
        }
    }

    fn refill(&mut self) {
        self.pending.clear();
        self.pos = 0;
        match self.stage {
            Stage::Header => {
                self.pending.extend_from_slice(b"<?xml version=\"1.0\"?>\n<dblp>\n");
                self.stage = Stage::Body;
            }
            Stage::Body if self.next < self.records => {
                let i = self.next;
                let record = format!(
                    "<article key=\"journals/x/A{i}\"><author>Author {i}</author>\
                     <author>Co &amp; Author</author><title>Title number {i}</title>\
                     <journal>J</journal><year>2000</year></article>\n"
                );
                self.pending.extend_from_slice(record.as_bytes());
                self.next += 1;
            }
            Stage::Body => {
                self.pending.extend_from_slice(b"</dblp>\n");
                self.stage = Stage::Done;
            }
            Stage::Done => {}
        }
    }
}

impl Read for SyntheticDblp {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if self.pos == self.pending.len() {
            self.refill();
            if self.pending.is_empty() {
                return Ok(0);
            }
        }
        let n = out.len().min(self.pending.len() - self.pos);
        out[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

fn drain(records: usize) -> pubload_reader::ReaderStats {
    let source = BufReader::new(SyntheticDblp::new(records));
    let mut reader = StreamReader::from_reader(source, ReaderOptions::lenient());
    let mut seen = 0;
    while let Some(element) = reader.next_element().unwrap() {
        assert_eq!(element.tag(), "article");
        assert_eq!(element.child_text("journal"), Some("J"));
        seen += 1;
        reader.release();
    }
    assert_eq!(seen, records);
    reader.stats()
}

#[test]
fn test_memory_bounded_by_largest_element() {
    let small = drain(1_000);
    let large = drain(20_000);

    assert_eq!(large.elements, 20_000);
    assert!(large.bytes_read > small.bytes_read * 10);
    assert!(
        large.high_water_bytes < 64 * 1024,
        "high water {} bytes",
        large.high_water_bytes
    );
    assert!(
        large.high_water_bytes <= small.high_water_bytes + 4096,
        "footprint grew with input: {} vs {}",
        small.high_water_bytes,
        large.high_water_bytes
    );
}

#[test]
fn test_declared_dtd_loaded_next_to_document() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("dblp.dtd"), DTD).unwrap();
    let xml_path = dir.path().join("dblp.xml");
    fs::write(
        &xml_path,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE dblp SYSTEM "dblp.dtd">
<dblp>
<article key="journals/x/J1"><author>J&ouml;rg M&eacute;ndez</author><title>On <i>fast</i> joins</title><year>1999</year></article>
<www key="homepages/j"><title>Home</title></www>
</dblp>
"#,
    )
    .unwrap();

    let mut reader = StreamReader::from_path(&xml_path, ReaderOptions::default()).unwrap();
    let element = reader.next_element().unwrap().unwrap();
    assert_eq!(element.child_text("author"), Some("Jörg Méndez"));
    assert_eq!(element.child_text("title"), Some("On fast joins"));
    reader.release();

    assert_eq!(reader.doctype().unwrap().system_id.as_deref(), Some("dblp.dtd"));
    assert_eq!(reader.dtd().unwrap().entity_count(), 2);
    assert_eq!(reader.next_element().unwrap().unwrap().tag(), "www");
    assert!(reader.next_element().unwrap().is_none());
}

#[test]
fn test_validation_rejects_undeclared_record_tag() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("dblp.dtd"), DTD).unwrap();
    let xml_path = dir.path().join("dblp.xml");
    fs::write(
        &xml_path,
        r#"<!DOCTYPE dblp SYSTEM "dblp.dtd">
<dblp><article key="a"><title>x</title></article><thesis key="t"/></dblp>"#,
    )
    .unwrap();

    let mut reader = StreamReader::from_path(&xml_path, ReaderOptions::default()).unwrap();
    assert!(reader.next_element().unwrap().is_some());
    match reader.next_element() {
        Err(ReadError::UndeclaredElement { tag, .. }) => assert_eq!(tag, "thesis"),
        other => panic!(
            "expected undeclared element error, got {:?}",
            other.map(|e| e.map(|e| e.tag().to_string()))
        ),
    }

    let mut lenient = ReaderOptions::default();
    lenient.validate = false;
    let mut reader = StreamReader::from_path(&xml_path, lenient).unwrap();
    let mut count = 0;
    while reader.next_element().unwrap().is_some() {
        count += 1;
    }
    assert_eq!(count, 2);
}

#[test]
fn test_missing_declared_dtd_is_tolerated() {
    let dir = tempfile::tempdir().unwrap();
    let xml_path = dir.path().join("dblp.xml");
    fs::write(
        &xml_path,
        r#"<!DOCTYPE dblp SYSTEM "nowhere.dtd"><dblp><article key="a"><title>R&amp;D</title></article></dblp>"#,
    )
    .unwrap();

    let mut reader = StreamReader::from_path(&xml_path, ReaderOptions::default()).unwrap();
    let element = reader.next_element().unwrap().unwrap();
    assert_eq!(element.child_text("title"), Some("R&D"));
    assert!(reader.dtd().is_none());
}

#[test]
fn test_missing_input_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = StreamReader::from_path(dir.path().join("absent.xml"), ReaderOptions::default());
    assert!(matches!(result, Err(ReadError::Io { .. })));
}

#[test]
fn test_malformed_document_stops_stream() {
    let xml = "<dblp><article key=\"a\"><title>ok</title></article><article key=\"b\"><title>bad</article></dblp>";
    let mut reader = StreamReader::from_str(xml, ReaderOptions::lenient());
    assert!(reader.next_element().unwrap().is_some());
    assert!(matches!(reader.next_element(), Err(ReadError::Xml { .. })));
}
