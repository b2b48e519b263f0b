//! Forward-only reader yielding one closed record-level element at a time

use crate::dtd::Dtd;
use crate::element::ClosedElement;
use crate::error::ReadError;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Read buffer size for file sources
const FILE_BUFFER_BYTES: usize = 64 * 1024;

/// Buffers grown past this size are dropped on release instead of kept.
const SHRINK_THRESHOLD_BYTES: usize = 1024 * 1024;

/// How the reader treats the document's declared schema
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// DTD to use for entities and validation, overriding the declared one
    pub dtd: Option<Dtd>,

    /// Load the DTD named by `<!DOCTYPE ... SYSTEM "...">` when no DTD is given
    pub load_declared_dtd: bool,

    /// Directory used to resolve a relative DTD system id
    pub base_dir: Option<PathBuf>,

    /// Reject undeclared elements and a root that does not match DOCTYPE
    pub validate: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            dtd: None,
            load_declared_dtd: true,
            base_dir: None,
            validate: true,
        }
    }
}

impl ReaderOptions {
    /// Options that skip DTD loading and validation entirely
    pub fn lenient() -> Self {
        Self {
            dtd: None,
            load_declared_dtd: false,
            base_dir: None,
            validate: false,
        }
    }

    /// Use `dtd` instead of whatever the document declares
    pub fn with_dtd(mut self, dtd: Dtd) -> Self {
        self.dtd = Some(dtd);
        self
    }
}

/// The document's `<!DOCTYPE>` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocType {
    /// Declared root element name
    pub root: String,

    /// System identifier (DTD location), if any
    pub system_id: Option<String>,
}

impl DocType {
    fn parse(raw: &str) -> (Self, Option<&str>) {
        let raw = raw.trim();
        let (external, internal) = match (raw.find('['), raw.rfind(']')) {
            (Some(open), Some(close)) if open < close => {
                (&raw[..open], Some(&raw[open + 1..close]))
            }
            _ => (raw, None),
        };

        let mut tokens = external.split_whitespace();
        let root = tokens.next().unwrap_or_default().to_string();

        let quoted: Vec<&str> = external.split(['"', '\'']).skip(1).step_by(2).collect();
        let system_id = if external.contains("PUBLIC") {
            quoted.get(1)
        } else if external.contains("SYSTEM") {
            quoted.first()
        } else {
            None
        }
        .map(|s| s.to_string());

        (Self { root, system_id }, internal)
    }
}

/// Counters describing a reader's progress and footprint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    /// Record-level elements yielded so far
    pub elements: u64,

    /// Largest number of heap bytes the reader held at once
    pub high_water_bytes: usize,

    /// Bytes consumed from the source
    pub bytes_read: u64,
}

enum Step {
    Continue,
    Emit,
    End,
}

/// Streaming reader over a DBLP-shaped document
///
/// Yields each direct child of the root element once it is closed. Only the
/// current element is held in memory; it is cleared when the next element is
/// requested or when [`release`](Self::release) is called.
///
/// # Examples
///
/// ```
/// use pubload_reader::{ReaderOptions, StreamReader};
///
/// let xml = r#"<dblp>
///   <article key="journals/a/B1"><title>T</title><author>X</author></article>
///   <www key="homepages/x"><title>Home</title></www>
/// </dblp>"#;
///
/// let mut reader = StreamReader::from_str(xml, ReaderOptions::lenient());
/// let first = reader.next_element().unwrap().unwrap();
/// assert_eq!(first.tag(), "article");
/// assert_eq!(first.attribute("key"), Some("journals/a/B1"));
/// assert_eq!(first.child_text("author"), Some("X"));
/// reader.release();
///
/// assert_eq!(reader.next_element().unwrap().unwrap().tag(), "www");
/// assert!(reader.next_element().unwrap().is_none());
/// ```
pub struct StreamReader<R> {
    xml: Reader<R>,
    buf: Vec<u8>,
    state: ParseState,
    stats: ReaderStats,
}

impl StreamReader<BufReader<File>> {
    /// Open a document on disk
    ///
    /// A relative DTD system id is resolved against the document's directory
    /// unless `options.base_dir` is already set.
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        mut options: ReaderOptions,
    ) -> Result<Self, ReadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ReadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if options.base_dir.is_none() {
            options.base_dir = path.parent().map(Path::to_path_buf);
        }

        debug!("Opened {} for streaming", path.display());
        Ok(Self::from_reader(
            BufReader::with_capacity(FILE_BUFFER_BYTES, file),
            options,
        ))
    }
}

impl<'a> StreamReader<&'a [u8]> {
    /// Read a document held in memory (tests, small inputs)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(xml: &'a str, options: ReaderOptions) -> Self {
        Self::from_reader(xml.as_bytes(), options)
    }
}

impl<R: BufRead> StreamReader<R> {
    /// Wrap any buffered source
    pub fn from_reader(source: R, options: ReaderOptions) -> Self {
        let mut xml = Reader::from_reader(source);
        xml.config_mut().trim_text(false);
        xml.config_mut().check_end_names = true;

        let mut options = options;
        let dtd = options.dtd.take();

        Self {
            xml,
            buf: Vec::with_capacity(1024),
            state: ParseState {
                slot: ClosedElement::default(),
                depth: 0,
                doctype: None,
                root: None,
                dtd,
                options,
                finished: false,
            },
            stats: ReaderStats::default(),
        }
    }

    /// Advance to the next closed record-level element
    ///
    /// Returns `Ok(None)` once the root element has closed. Any malformed
    /// input is an error; the reader must not be used after an error.
    pub fn next_element(&mut self) -> Result<Option<&ClosedElement>, ReadError> {
        self.state.slot.clear();

        if self.state.finished {
            return Ok(None);
        }

        loop {
            self.buf.clear();
            let position = self.xml.buffer_position() as u64;

            let event = match self.xml.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(source) => {
                    return Err(ReadError::Xml {
                        position: self.xml.buffer_position() as u64,
                        source,
                    })
                }
            };

            let step = match event {
                Event::DocType(ref text) => {
                    self.state.on_doctype(text, position)?;
                    Step::Continue
                }
                Event::Start(ref start) => self.state.on_start(start, false, position)?,
                Event::Empty(ref start) => self.state.on_start(start, true, position)?,
                Event::End(_) => self.state.on_end(),
                Event::Text(ref text) => {
                    self.state.on_text(text, position)?;
                    Step::Continue
                }
                Event::CData(ref data) => {
                    let text = std::str::from_utf8(data).map_err(|_| ReadError::Utf8(position))?;
                    self.state.on_raw_text(text);
                    Step::Continue
                }
                Event::Eof => self.state.on_eof(position)?,
                _ => Step::Continue,
            };

            match step {
                Step::Continue => {}
                Step::Emit => {
                    self.stats.elements += 1;
                    self.track_footprint();
                    return Ok(Some(&self.state.slot));
                }
                Step::End => {
                    self.stats.bytes_read = self.xml.buffer_position() as u64;
                    self.track_footprint();
                    return Ok(None);
                }
            }
        }
    }

    /// Signal that the caller is done with the current element
    ///
    /// Clears the element slot. Oversized buffers left behind by an unusually
    /// large element are freed rather than kept for reuse.
    pub fn release(&mut self) {
        self.state.slot.clear();
        if self.state.slot.retained_bytes() > SHRINK_THRESHOLD_BYTES {
            self.state.slot.shrink();
        }
        if self.buf.capacity() > SHRINK_THRESHOLD_BYTES {
            self.buf = Vec::with_capacity(1024);
        }
    }

    /// Declared DOCTYPE, once it has been read
    pub fn doctype(&self) -> Option<&DocType> {
        self.state.doctype.as_ref()
    }

    /// Root element name, once it has been read
    pub fn root(&self) -> Option<&str> {
        self.state.root.as_deref()
    }

    /// DTD in effect (given or loaded from the declaration)
    pub fn dtd(&self) -> Option<&Dtd> {
        self.state.dtd.as_ref()
    }

    /// Progress and memory counters
    pub fn stats(&self) -> ReaderStats {
        let mut stats = self.stats;
        stats.bytes_read = self.xml.buffer_position() as u64;
        stats
    }

    fn track_footprint(&mut self) {
        let held = self.buf.capacity() + self.state.slot.retained_bytes();
        self.stats.high_water_bytes = self.stats.high_water_bytes.max(held);
    }
}

/// Parser state kept apart from the event buffer so events can borrow the
/// buffer while the state is updated.
struct ParseState {
    slot: ClosedElement,
    depth: usize,
    doctype: Option<DocType>,
    root: Option<String>,
    dtd: Option<Dtd>,
    options: ReaderOptions,
    finished: bool,
}

impl ParseState {
    fn on_doctype(&mut self, raw: &[u8], position: u64) -> Result<(), ReadError> {
        let raw = std::str::from_utf8(raw).map_err(|_| ReadError::Utf8(position))?;
        let (doctype, internal_subset) = DocType::parse(raw);

        if let Some(subset) = internal_subset {
            let internal = Dtd::parse(subset)?;
            match self.dtd.as_mut() {
                Some(dtd) => dtd.merge(internal),
                None => self.dtd = Some(internal),
            }
        }

        let has_entities = self.dtd.as_ref().is_some_and(|d| d.entity_count() > 0);
        if self.options.load_declared_dtd && !has_entities {
            if let Some(system_id) = &doctype.system_id {
                let path = match &self.options.base_dir {
                    Some(dir) if Path::new(system_id).is_relative() => dir.join(system_id),
                    _ => PathBuf::from(system_id),
                };

                if path.is_file() {
                    let external = Dtd::from_path(&path)?;
                    debug!(
                        "Loaded DTD {} ({} entities, {} elements)",
                        path.display(),
                        external.entity_count(),
                        external.element_count()
                    );
                    match self.dtd.as_mut() {
                        Some(dtd) => dtd.merge(external),
                        None => self.dtd = Some(external),
                    }
                } else {
                    warn!(
                        "Declared DTD {} not found; only predefined entities will resolve",
                        path.display()
                    );
                }
            }
        }

        self.doctype = Some(doctype);
        Ok(())
    }

    fn on_start(
        &mut self,
        start: &BytesStart<'_>,
        empty: bool,
        position: u64,
    ) -> Result<Step, ReadError> {
        let name = start.name();
        let tag = std::str::from_utf8(name.as_ref()).map_err(|_| ReadError::Utf8(position))?;
        self.check_declared(tag, position)?;

        match self.depth {
            0 => {
                if let (true, Some(doctype)) = (self.options.validate, &self.doctype) {
                    if doctype.root != tag {
                        return Err(ReadError::RootMismatch {
                            declared: doctype.root.clone(),
                            found: tag.to_string(),
                        });
                    }
                }
                self.root = Some(tag.to_string());
                if empty {
                    self.finished = true;
                    return Ok(Step::End);
                }
                self.depth = 1;
            }
            1 => {
                self.slot.begin(tag, position);
                let dtd = self.dtd.as_ref();
                for attr in start.attributes() {
                    let attr = attr.map_err(|err| ReadError::Xml {
                        position,
                        source: err.into(),
                    })?;
                    let name = std::str::from_utf8(attr.key.as_ref())
                        .map_err(|_| ReadError::Utf8(position))?;
                    let value = attr
                        .unescape_value_with(|entity| resolve_entity(dtd, entity))
                        .map_err(|source| ReadError::Xml { position, source })?;
                    self.slot.push_attribute(name, &value);
                }
                if empty {
                    return Ok(Step::Emit);
                }
                self.depth = 2;
            }
            2 => {
                self.slot.begin_child(tag);
                if !empty {
                    self.depth = 3;
                }
            }
            // Inline markup inside a field (<i>, <sub>, ...): only its text matters.
            _ => {
                if !empty {
                    self.depth += 1;
                }
            }
        }

        Ok(Step::Continue)
    }

    fn on_end(&mut self) -> Step {
        match self.depth {
            0 => Step::Continue,
            1 => {
                self.depth = 0;
                self.finished = true;
                Step::End
            }
            2 => {
                self.depth = 1;
                Step::Emit
            }
            depth => {
                self.depth = depth - 1;
                Step::Continue
            }
        }
    }

    fn on_text(&mut self, text: &BytesText<'_>, position: u64) -> Result<(), ReadError> {
        // Only text inside a field is kept; whitespace between elements is dropped.
        if self.depth < 3 {
            return Ok(());
        }
        let dtd = self.dtd.as_ref();
        let unescaped = text
            .unescape_with(|entity| resolve_entity(dtd, entity))
            .map_err(|source| ReadError::Xml { position, source })?;
        self.slot.push_child_text(&unescaped);
        Ok(())
    }

    fn on_raw_text(&mut self, text: &str) {
        if self.depth >= 3 {
            self.slot.push_child_text(text);
        }
    }

    fn on_eof(&mut self, position: u64) -> Result<Step, ReadError> {
        if self.depth > 0 {
            return Err(ReadError::Truncated {
                position,
                open: self.depth,
            });
        }
        self.finished = true;
        Ok(Step::End)
    }

    fn check_declared(&self, tag: &str, position: u64) -> Result<(), ReadError> {
        if let (true, Some(dtd)) = (self.options.validate, &self.dtd) {
            if dtd.element_count() > 0 && !dtd.declares(tag) {
                return Err(ReadError::UndeclaredElement {
                    tag: tag.to_string(),
                    position,
                });
            }
        }
        Ok(())
    }
}

fn resolve_entity<'d>(dtd: Option<&'d Dtd>, name: &str) -> Option<&'d str> {
    resolve_predefined_entity(name).or_else(|| dtd.and_then(|d| d.entity(name)))
}
