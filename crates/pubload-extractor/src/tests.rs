//! Tests for the Extractor against elements produced by the stream reader

#[cfg(test)]
mod tests {
    use crate::{ExtractError, ExtractorConfig, RecordExtractor};
    use pubload_domain::{FieldKind, RecordKind, StatementBuilder, TagSchema, VariantSchema};
    use pubload_reader::{ReaderOptions, StreamReader};
    use std::sync::Arc;

    fn extract_all(
        extractor: &RecordExtractor,
        xml: &str,
    ) -> Vec<Result<pubload_domain::PublicationRecord, ExtractError>> {
        let mut reader = StreamReader::from_str(xml, ReaderOptions::lenient());
        let mut out = Vec::new();
        while let Some(element) = reader.next_element().unwrap() {
            out.push(extractor.extract(element));
        }
        out
    }

    fn extract_one(
        extractor: &RecordExtractor,
        xml: &str,
    ) -> Result<pubload_domain::PublicationRecord, ExtractError> {
        let wrapped = format!("<dblp>{}</dblp>", xml);
        extract_all(extractor, &wrapped).remove(0)
    }

    #[test]
    fn test_article_fields_limited_to_allow_list() {
        let record = extract_one(
            &RecordExtractor::dblp(),
            r#"<article key="journals/cacm/K74" mdate="2020-01-01">
                 <author>D. Knuth</author>
                 <title>Structured Programming</title>
                 <pages>261-301</pages>
                 <journal>ACM Comput. Surv.</journal>
                 <ee>https://doi.org/x</ee>
                 <year>1974</year>
               </article>"#,
        )
        .unwrap();

        assert_eq!(record.kind, RecordKind::Article);
        assert_eq!(record.pubkey, "journals/cacm/K74");
        let names: Vec<_> = record.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["title", "journal", "year"]);
        assert_eq!(record.fields[2].kind, FieldKind::Integer);
        assert_eq!(record.authors, vec!["D. Knuth"]);
    }

    #[test]
    fn test_inproceedings_uses_booktitle() {
        let record = extract_one(
            &RecordExtractor::dblp(),
            r#"<inproceedings key="conf/x/1"><journal>ignored</journal><booktitle>VLDB</booktitle></inproceedings>"#,
        )
        .unwrap();
        assert_eq!(record.kind, RecordKind::InProceedings);
        assert_eq!(record.field("booktitle"), Some("VLDB"));
        assert_eq!(record.field("journal"), None);
    }

    #[test]
    fn test_unsupported_tag() {
        let result = extract_one(
            &RecordExtractor::dblp(),
            r#"<book key="b/1"><title>T</title></book>"#,
        );
        assert_eq!(
            result,
            Err(ExtractError::UnsupportedTag {
                tag: "book".to_string()
            })
        );
    }

    #[test]
    fn test_missing_or_blank_key() {
        let extractor = RecordExtractor::dblp();
        let results = extract_all(
            &extractor,
            r#"<dblp><article><title>T</title></article><article key="  "/><article key="ok"/></dblp>"#,
        );
        assert!(matches!(
            results[0],
            Err(ExtractError::MissingKey { ref attribute, .. }) if attribute == "key"
        ));
        assert!(matches!(results[1], Err(ExtractError::MissingKey { .. })));
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_repeated_field_first_wins() {
        let record = extract_one(
            &RecordExtractor::dblp(),
            r#"<article key="k"><title>First</title><title>Second</title></article>"#,
        )
        .unwrap();
        assert_eq!(record.field("title"), Some("First"));
        assert_eq!(record.fields.len(), 1);
    }

    #[test]
    fn test_authors_deduplicated_in_order() {
        let record = extract_one(
            &RecordExtractor::dblp(),
            r#"<article key="k"><author>A. Smith</author><author>B. Lee</author><author>A. Smith</author></article>"#,
        )
        .unwrap();
        assert_eq!(record.authors, vec!["A. Smith", "B. Lee"]);

        let statements = StatementBuilder::new().build(&record).unwrap();
        assert_eq!(statements.authorship_rows(), 2);
    }

    #[test]
    fn test_values_kept_verbatim_by_default() {
        let xml = "<article key=\"k\"><title>  Spaced  </title><author> X </author></article>";

        let record = extract_one(&RecordExtractor::dblp(), xml).unwrap();
        assert_eq!(record.field("title"), Some("  Spaced  "));
        assert_eq!(record.authors, vec![" X "]);

        let trimmed = RecordExtractor::new(Arc::new(TagSchema::dblp()), ExtractorConfig::trimmed());
        let record = extract_one(&trimmed, xml).unwrap();
        assert_eq!(record.field("title"), Some("Spaced"));
        assert_eq!(record.authors, vec!["X"]);
    }

    #[test]
    fn test_quotes_survive_extraction() {
        let record = extract_one(
            &RecordExtractor::dblp(),
            r#"<article key="k"><title>It's O'Brien's</title></article>"#,
        )
        .unwrap();
        assert_eq!(record.field("title"), Some("It's O'Brien's"));

        let statements = StatementBuilder::new().build(&record).unwrap();
        assert!(statements
            .publication
            .render_literal()
            .contains("'It''s O''Brien''s'"));
    }

    #[test]
    fn test_custom_key_and_author_tag() {
        let schema = TagSchema::new([VariantSchema::new(RecordKind::Article).text("title")]);
        let config = ExtractorConfig {
            key_attribute: "id".to_string(),
            author_tag: "creator".to_string(),
            trim_values: false,
        };
        let extractor = RecordExtractor::new(Arc::new(schema), config);

        let record = extract_one(
            &extractor,
            r#"<article id="a1" key="ignored"><creator>C</creator><author>not an author</author><title>T</title></article>"#,
        )
        .unwrap();
        assert_eq!(record.pubkey, "a1");
        assert_eq!(record.authors, vec!["C"]);
        assert!(!extractor.supports("inproceedings"));
    }

    #[test]
    fn test_zero_authors() {
        let record =
            extract_one(&RecordExtractor::dblp(), r#"<inproceedings key="c/1"/>"#).unwrap();
        assert!(record.authors.is_empty());
        assert!(record.fields.is_empty());
    }
}
