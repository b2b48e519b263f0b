//! Minimal DTD support: entity values and declared element names
//!
//! DBLP encodes accented characters as named entities (`&uuml;`) declared in
//! its external DTD, so a reader without the DTD cannot decode the corpus.
//! Only what the loader needs is understood: general `<!ENTITY>` declarations
//! with literal values and the names from `<!ELEMENT>` declarations. Parameter
//! entities, attribute lists and content models are skipped.

use crate::error::DtdError;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Parsed declarations from a DTD
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dtd {
    entities: HashMap<String, String>,
    elements: HashSet<String>,
}

impl Dtd {
    /// Read and parse a DTD file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DtdError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DtdError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse DTD text
    ///
    /// # Examples
    ///
    /// ```
    /// use pubload_reader::Dtd;
    ///
    /// let dtd = Dtd::parse(r#"
    ///     <!ELEMENT dblp (article)*>
    ///     <!ENTITY uuml "&#252;">
    /// "#).unwrap();
    /// assert_eq!(dtd.entity("uuml"), Some("ü"));
    /// assert!(dtd.declares("dblp"));
    /// ```
    pub fn parse(text: &str) -> Result<Self, DtdError> {
        let mut dtd = Dtd::default();
        let mut pos = 0;

        while let Some(found) = text[pos..].find("<!") {
            let start = pos + found;
            let rest = &text[start..];

            if rest.starts_with("<!--") {
                pos = start + find_or_fail(&rest[4..], "-->", start, "unterminated comment")? + 7;
            } else if let Some(body) = rest.strip_prefix("<!ENTITY") {
                let (consumed, entity) = parse_entity(body, start + 8)?;
                if let Some((name, value)) = entity {
                    dtd.entities.entry(name).or_insert(value);
                }
                pos = start + 8 + consumed;
            } else if let Some(body) = rest.strip_prefix("<!ELEMENT") {
                let name = first_token(body);
                if name.is_empty() {
                    return Err(malformed(start, "element declaration without a name"));
                }
                dtd.elements.insert(name.to_string());
                pos = start
                    + find_or_fail(rest, ">", start, "unterminated element declaration")?
                    + 1;
            } else {
                pos = start + find_or_fail(rest, ">", start, "unterminated declaration")? + 1;
            }
        }

        Ok(dtd)
    }

    /// Replacement text of a general entity
    pub fn entity(&self, name: &str) -> Option<&str> {
        self.entities.get(name).map(String::as_str)
    }

    /// Whether `<!ELEMENT name ...>` was declared
    pub fn declares(&self, element: &str) -> bool {
        self.elements.contains(element)
    }

    /// Number of general entities declared
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of elements declared
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Fold in declarations from `other`; existing entities keep their values
    pub fn merge(&mut self, other: Dtd) {
        for (name, value) in other.entities {
            self.entities.entry(name).or_insert(value);
        }
        self.elements.extend(other.elements);
    }
}

/// Parse the remainder of an `<!ENTITY` declaration.
/// Returns bytes consumed (through the closing `>`) and the entity, if general.
fn parse_entity(body: &str, offset: usize) -> Result<(usize, Option<(String, String)>), DtdError> {
    let trimmed = body.trim_start();
    let lead = body.len() - trimmed.len();

    // Parameter entity: `<!ENTITY % name ...>`
    if trimmed.starts_with('%') {
        let end = find_or_fail(body, ">", offset, "unterminated parameter entity")?;
        return Ok((end + 1, None));
    }

    let name = first_token(trimmed);
    if name.is_empty() {
        return Err(malformed(offset, "entity declaration without a name"));
    }

    let after_name = &trimmed[name.len()..];
    let value_part = after_name.trim_start();
    let value_start = lead + name.len() + (after_name.len() - value_part.len());

    let quote = match value_part.chars().next() {
        Some(q @ ('"' | '\'')) => q,
        // External entity (`SYSTEM`/`PUBLIC`); nothing we can inline.
        _ => {
            let end = find_or_fail(body, ">", offset, "unterminated entity declaration")?;
            return Ok((end + 1, None));
        }
    };

    let literal = &value_part[1..];
    let close = literal
        .find(quote)
        .ok_or_else(|| malformed(offset, "unterminated entity value"))?;
    let value = decode_references(&literal[..close]);

    let after_value = value_start + 1 + close + 1;
    let end = find_or_fail(&body[after_value..], ">", offset, "unterminated entity declaration")?;

    Ok((after_value + end + 1, Some((name.to_string(), value))))
}

/// Expand character references and the predefined XML entities
fn decode_references(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };

        let reference = &tail[1..semi];
        match decode_reference(reference) {
            Some(decoded) => out.push_str(&decoded),
            None => out.push_str(&tail[..=semi]),
        }
        rest = &tail[semi + 1..];
    }

    out.push_str(rest);
    out
}

fn decode_reference(reference: &str) -> Option<String> {
    if let Some(hex) = reference.strip_prefix("#x") {
        let code = u32::from_str_radix(hex, 16).ok()?;
        return char::from_u32(code).map(String::from);
    }
    if let Some(dec) = reference.strip_prefix('#') {
        let code = dec.parse::<u32>().ok()?;
        return char::from_u32(code).map(String::from);
    }
    quick_xml::escape::resolve_predefined_entity(reference).map(String::from)
}

fn first_token(text: &str) -> &str {
    let text = text.trim_start();
    let end = text
        .find(|c: char| c.is_whitespace() || c == '>' || c == '(')
        .unwrap_or(text.len());
    &text[..end]
}

fn find_or_fail(
    haystack: &str,
    needle: &str,
    offset: usize,
    reason: &str,
) -> Result<usize, DtdError> {
    haystack.find(needle).ok_or_else(|| malformed(offset, reason))
}

fn malformed(offset: usize, reason: &str) -> DtdError {
    DtdError::Malformed {
        offset,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DBLP_EXCERPT: &str = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<!-- DBLP XML excerpt -->
<!ENTITY % field "author|editor|title|booktitle|pages|year|address|journal">
<!ELEMENT dblp (article|inproceedings)*>
<!ELEMENT article       (%field;)*>
<!ATTLIST article key CDATA #REQUIRED>
<!ELEMENT inproceedings (%field;)*>
<!ELEMENT author (#PCDATA)>
<!ENTITY Agrave  "&#192;" ><!-- capital A, grave accent -->
<!ENTITY uuml    "&#252;" ><!-- small u, dieresis or umlaut mark -->
<!ENTITY reg     "&#xAE;" >
<!ENTITY amp2    '&amp;' >
"#;

    #[test]
    fn test_parses_entities() {
        let dtd = Dtd::parse(DBLP_EXCERPT).unwrap();
        assert_eq!(dtd.entity("Agrave"), Some("À"));
        assert_eq!(dtd.entity("uuml"), Some("ü"));
        assert_eq!(dtd.entity("reg"), Some("®"));
        assert_eq!(dtd.entity("amp2"), Some("&"));
        assert_eq!(dtd.entity_count(), 4);
    }

    #[test]
    fn test_parameter_entities_skipped() {
        let dtd = Dtd::parse(DBLP_EXCERPT).unwrap();
        assert_eq!(dtd.entity("field"), None);
    }

    #[test]
    fn test_parses_elements() {
        let dtd = Dtd::parse(DBLP_EXCERPT).unwrap();
        assert!(dtd.declares("dblp"));
        assert!(dtd.declares("article"));
        assert!(dtd.declares("author"));
        assert!(!dtd.declares("phdthesis"));
        assert_eq!(dtd.element_count(), 4);
    }

    #[test]
    fn test_first_declaration_wins() {
        let dtd = Dtd::parse(r#"<!ENTITY x "1"><!ENTITY x "2">"#).unwrap();
        assert_eq!(dtd.entity("x"), Some("1"));
    }

    #[test]
    fn test_unterminated_value_is_error() {
        let result = Dtd::parse(r#"<!ENTITY broken "&#192; >"#);
        assert!(matches!(result, Err(DtdError::Malformed { .. })));
    }

    #[test]
    fn test_unterminated_comment_is_error() {
        assert!(Dtd::parse("<!-- never closed").is_err());
    }

    #[test]
    fn test_unknown_reference_kept_verbatim() {
        assert_eq!(decode_references("a &foo; b &#65;"), "a &foo; b A");
    }
}
