//! Validation tests.
//!
//! Whole snapshots validated through the public entry points, including
//! snapshots read back from JSON with damage a buggy importer could cause.

use scriptorium::model::{
    AnnotationType, Attributed, ContentBlock, Corpus, Document, ModuleType, RAW_MARKUP_ATTR,
    SpanType,
};
use scriptorium::reference::Ref;
use scriptorium::validate::{
    classify_empty_text, validate_corpus, validate_empty_text_fields,
    validate_no_unexpected_empty_text,
};

fn genesis() -> Corpus {
    let mut doc = Document::new("Gen", "Genesis", 1).with_canonical_ref(Ref::whole_book("Gen"));

    let marker = doc.push_block("");
    marker.set_attribute(RAW_MARKUP_ATTR, r#"<chapter sID="Gen.1"/>"#);

    let block = doc.push_block("In the beginning God created the heaven and the earth.");
    let start = block.add_anchor(0);
    let end = block.add_anchor(54);
    doc.add_span(SpanType::Verse, start.clone(), end.clone())
        .with_ref(Ref::new("Gen", 1, 1));
    let span = doc.add_span(SpanType::Quotation, start, end).id.clone();
    doc.add_annotation(span, AnnotationType::Gloss, "creation", "test");

    let mut corpus = Corpus::new("KJV", ModuleType::Bible, "KJV").with_language("en");
    corpus.documents.push(doc);
    corpus
}

fn messages(corpus: &Corpus) -> Vec<String> {
    validate_corpus(corpus).iter().map(ToString::to_string).collect()
}

// ============================================================================
// Whole Corpus
// ============================================================================

#[test]
fn test_well_formed_corpus_is_valid() {
    let corpus = genesis();
    assert!(validate_corpus(&corpus).is_empty(), "{:?}", messages(&corpus));
    assert!(validate_no_unexpected_empty_text(&corpus).is_empty());
}

#[test]
fn test_snapshot_round_trip_stays_valid() {
    let json = genesis().to_json().unwrap();
    let corpus = Corpus::from_json(&json).unwrap();
    assert_eq!(corpus, genesis());
    assert!(validate_corpus(&corpus).is_empty());
}

#[test]
fn test_edited_text_without_rehash_is_reported() {
    let mut corpus = genesis();
    corpus.documents[0].content_blocks[1].text = "In the beginning".into();

    let errors = validate_corpus(&corpus);
    assert!(
        errors
            .iter()
            .any(|e| e.path == "corpus.documents[0].content_blocks[1].hash"),
        "{errors:?}"
    );
}

#[test]
fn test_unknown_tags_survive_parsing_and_are_reported() {
    let mut value: serde_json::Value = serde_json::from_str(&genesis().to_json().unwrap()).unwrap();
    value["module_type"] = "HYMNAL".into();
    value["documents"][0]["spans"][0]["type"] = "STANZA".into();

    let corpus = Corpus::from_json(&value.to_string()).unwrap();
    let errors = messages(&corpus);
    assert!(errors.iter().any(|e| e.starts_with("corpus.module_type: ")));
    assert!(
        errors
            .iter()
            .any(|e| e.starts_with("corpus.documents[0].spans[0].type: "))
    );
}

#[test]
fn test_null_annotation_value_is_reported() {
    let mut value: serde_json::Value = serde_json::from_str(&genesis().to_json().unwrap()).unwrap();
    value["documents"][0]["annotations"][0]["value"] = serde_json::Value::Null;
    let corpus = Corpus::from_json(&value.to_string()).unwrap();
    assert_eq!(corpus.documents[0].annotations[0].value, None);

    value["documents"][0]["annotations"][0]
        .as_object_mut()
        .unwrap()
        .remove("value");
    let without = Corpus::from_json(&value.to_string()).unwrap();
    assert_eq!(without, corpus);

    let errors = validate_corpus(&corpus);
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].path, "corpus.documents[0].annotations[0].value");
    assert_eq!(errors[0].message, "value is required");
}

#[test]
fn test_dangling_references_are_reported() {
    let mut corpus = genesis();
    let doc = &mut corpus.documents[0];
    doc.spans[0].end_anchor = "b9.a1".into();
    doc.annotations[0].span_id = "s99".into();

    let errors = validate_corpus(&corpus);
    assert!(
        errors
            .iter()
            .any(|e| e.path == "corpus.documents[0].spans[0].end_anchor")
    );
    assert!(
        errors
            .iter()
            .any(|e| e.path.starts_with("corpus.documents[0].annotations[0]"))
    );
}

#[test]
fn test_all_findings_reported() {
    let mut corpus = genesis();
    corpus.id.clear();
    corpus.versification.clear();
    corpus.source_hash = Some("not-a-hash".into());

    let paths: Vec<String> = validate_corpus(&corpus).into_iter().map(|e| e.path).collect();
    for expected in ["corpus.id", "corpus.versification", "corpus.source_hash"] {
        assert!(paths.iter().any(|p| p == expected), "missing {expected} in {paths:?}");
    }
}

// ============================================================================
// Empty Text
// ============================================================================

#[test]
fn test_chapter_marker_is_purposeful() {
    let mut block = ContentBlock::new("b1", 0, "");
    block.set_attribute(RAW_MARKUP_ATTR, r#"<chapter sID="ch1"/>"#);

    let finding = classify_empty_text(&block).unwrap();
    assert!(finding.purposeful);
    assert_eq!(finding.reason, "chapter boundary marker");
}

#[test]
fn test_bare_empty_block_is_data_loss() {
    let block = ContentBlock::new("b1", 0, "");
    let finding = classify_empty_text(&block).unwrap();
    assert!(!finding.purposeful);
    assert_eq!(finding.reason, "possible data loss");
}

#[test]
fn test_dropped_text_is_flagged() {
    let mut corpus = genesis();
    let block = corpus.documents[0].push_block("");
    block.set_attribute(RAW_MARKUP_ATTR, "<verse osisID=\"Gen.1.2\">And the earth</verse>");

    let findings = validate_empty_text_fields(&corpus);
    assert_eq!(findings.len(), 2);
    assert!(findings[0].purposeful);
    assert!(!findings[1].purposeful);
    assert_eq!(findings[1].reason, "possible parsing error");

    let errors = validate_no_unexpected_empty_text(&corpus);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, "corpus.documents[0].content_blocks[2].text");
    assert_eq!(
        errors[0].message,
        "empty text in block \"b3\": possible parsing error"
    );
}
