//! Structural validation of the IR.
//!
//! Every validator walks its whole input and returns all findings; nothing
//! short-circuits and nothing panics on malformed data. Each finding carries
//! a dotted path to the offending node, e.g.
//! `corpus.documents[2].content_blocks[0].hash`.
//!
//! The nested validators are public so callers can check a single document,
//! block or table on its own. Paths are built from the prefix they are given.

mod empty_text;
mod mapping;

pub use empty_text::{
    EmptyTextFinding, classify_empty_text, validate_empty_text_fields,
    validate_no_unexpected_empty_text,
};
pub use mapping::{validate_mapping_table, validate_ref};

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Annotation, ContentBlock, Corpus, Document, ModuleType, Span, is_sha256_hex};

/// One structural problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Accumulates findings in traversal order.
pub(crate) struct Findings {
    errors: Vec<ValidationError>,
}

impl Findings {
    pub(crate) fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub(crate) fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError::new(path, message));
    }

    pub(crate) fn require(&mut self, value: &str, path: String, field: &str) {
        if value.trim().is_empty() {
            self.push(path, format!("{field} is required"));
        }
    }

    pub(crate) fn extend(&mut self, errors: Vec<ValidationError>) {
        self.errors.extend(errors);
    }

    pub(crate) fn finish(self) -> Vec<ValidationError> {
        self.errors
    }
}

/// Validate a whole corpus, rooted at path `corpus`.
pub fn validate_corpus(corpus: &Corpus) -> Vec<ValidationError> {
    let path = "corpus";
    let mut out = Findings::new();

    out.require(&corpus.id, format!("{path}.id"), "id");
    out.require(&corpus.version, format!("{path}.version"), "version");
    if !corpus.module_type.is_known() {
        out.push(
            format!("{path}.module_type"),
            format!("unknown module type {:?}", corpus.module_type.as_str()),
        );
    }
    if corpus.module_type == ModuleType::Bible {
        out.require(&corpus.versification, format!("{path}.versification"), "versification");
    }
    if let Some(hash) = &corpus.source_hash
        && !is_sha256_hex(hash)
    {
        out.push(
            format!("{path}.source_hash"),
            "must be 64 lower-case hex characters",
        );
    }

    let mut seen = HashSet::new();
    for (i, doc) in corpus.documents.iter().enumerate() {
        let doc_path = format!("{path}.documents[{i}]");
        if !doc.id.is_empty() && !seen.insert(doc.id.as_str()) {
            out.push(format!("{doc_path}.id"), format!("duplicate document id {:?}", doc.id));
        }
        out.extend(validate_document(doc, &doc_path));
    }

    for (i, table) in corpus.mapping_tables.iter().enumerate() {
        out.extend(validate_mapping_table(
            table,
            &format!("{path}.mapping_tables[{i}]"),
        ));
    }

    for (i, xref) in corpus.cross_references.iter().enumerate() {
        let xref_path = format!("{path}.cross_references[{i}]");
        out.require(&xref.id, format!("{xref_path}.id"), "id");
        out.extend(validate_ref(&xref.source, &format!("{xref_path}.source")));
        out.extend(validate_ref(xref.target.start(), &format!("{xref_path}.target")));
        out.extend(validate_ref(xref.target.end(), &format!("{xref_path}.target")));
    }

    out.finish()
}

/// Validate a document, its blocks, spans and annotations.
pub fn validate_document(doc: &Document, path: &str) -> Vec<ValidationError> {
    let mut out = Findings::new();

    out.require(&doc.id, format!("{path}.id"), "id");
    if doc.order == 0 {
        out.push(format!("{path}.order"), "order must be positive");
    }
    if let Some(r) = &doc.canonical_ref {
        out.extend(validate_ref(r, &format!("{path}.canonical_ref")));
    }

    let mut block_ids = HashSet::new();
    let mut previous_sequence: Option<u32> = None;
    for (i, block) in doc.content_blocks.iter().enumerate() {
        let block_path = format!("{path}.content_blocks[{i}]");
        if !block.id.is_empty() && !block_ids.insert(block.id.as_str()) {
            out.push(format!("{block_path}.id"), format!("duplicate block id {:?}", block.id));
        }
        if let Some(prev) = previous_sequence
            && block.sequence <= prev
        {
            out.push(
                format!("{block_path}.sequence"),
                format!("sequence {} does not follow {prev}", block.sequence),
            );
        }
        previous_sequence = Some(block.sequence);
        out.extend(validate_content_block(block, &block_path));
    }

    let mut span_ids = HashSet::new();
    for (i, span) in doc.spans.iter().enumerate() {
        let span_path = format!("{path}.spans[{i}]");
        if !span.id.is_empty() && !span_ids.insert(span.id.as_str()) {
            out.push(format!("{span_path}.id"), format!("duplicate span id {:?}", span.id));
        }
        out.extend(validate_span(span, &span_path));

        let start = doc.position_of(&span.start_anchor);
        let end = doc.position_of(&span.end_anchor);
        if start.is_none() && !span.start_anchor.is_empty() {
            out.push(
                format!("{span_path}.start_anchor"),
                format!("anchor {:?} not found", span.start_anchor),
            );
        }
        if end.is_none() && !span.end_anchor.is_empty() {
            out.push(
                format!("{span_path}.end_anchor"),
                format!("anchor {:?} not found", span.end_anchor),
            );
        }
        if let (Some(start), Some(end)) = (start, end)
            && end < start
        {
            out.push(span_path, "end anchor precedes start anchor");
        }
    }

    let mut annotation_ids = HashSet::new();
    for (i, annotation) in doc.annotations.iter().enumerate() {
        let ann_path = format!("{path}.annotations[{i}]");
        if !annotation.id.is_empty() && !annotation_ids.insert(annotation.id.as_str()) {
            out.push(
                format!("{ann_path}.id"),
                format!("duplicate annotation id {:?}", annotation.id),
            );
        }
        out.extend(validate_annotation(annotation, &ann_path));
        if !annotation.span_id.is_empty() && doc.span(&annotation.span_id).is_none() {
            out.push(
                format!("{ann_path}.span_id"),
                format!("span {:?} not found", annotation.span_id),
            );
        }
    }

    out.finish()
}

/// Validate a block: hash agreement, token ranges and anchor placement.
pub fn validate_content_block(block: &ContentBlock, path: &str) -> Vec<ValidationError> {
    let mut out = Findings::new();
    let len = block.char_len();

    out.require(&block.id, format!("{path}.id"), "id");
    if block.hash.is_some() && !block.verify_hash() {
        out.push(format!("{path}.hash"), "hash does not match text");
    }

    for (i, token) in block.tokens.iter().enumerate() {
        let token_path = format!("{path}.tokens[{i}]");
        if token.index != i {
            out.push(
                format!("{token_path}.index"),
                format!("index {} at position {i}", token.index),
            );
        }
        if token.char_end < token.char_start {
            out.push(
                format!("{token_path}.char_end"),
                format!("char_end {} before char_start {}", token.char_end, token.char_start),
            );
        } else if token.char_end > len {
            out.push(
                format!("{token_path}.char_end"),
                format!("char_end {} beyond text length {len}", token.char_end),
            );
        }
    }

    for (i, anchor) in block.anchors.iter().enumerate() {
        let anchor_path = format!("{path}.anchors[{i}]");
        out.require(&anchor.id, format!("{anchor_path}.id"), "id");
        if anchor.block_id != block.id {
            out.push(
                format!("{anchor_path}.block_id"),
                format!("anchor names block {:?}", anchor.block_id),
            );
        }
        if anchor.char_offset > len {
            out.push(
                format!("{anchor_path}.char_offset"),
                format!("offset {} beyond text length {len}", anchor.char_offset),
            );
        }
        if let Some(t) = anchor.token_index
            && t >= block.tokens.len()
        {
            out.push(
                format!("{anchor_path}.token_index"),
                format!("token {t} does not exist"),
            );
        }
    }

    out.finish()
}

/// Validate a span on its own; anchor resolution needs the document and is
/// done by [`validate_document`].
pub fn validate_span(span: &Span, path: &str) -> Vec<ValidationError> {
    let mut out = Findings::new();
    out.require(&span.id, format!("{path}.id"), "id");
    if !span.span_type.is_known() {
        out.push(
            format!("{path}.type"),
            format!("unknown span type {:?}", span.span_type.as_str()),
        );
    }
    out.require(&span.start_anchor, format!("{path}.start_anchor"), "start_anchor");
    out.require(&span.end_anchor, format!("{path}.end_anchor"), "end_anchor");
    if let Some(r) = &span.reference {
        out.extend(validate_ref(r, &format!("{path}.ref")));
    }
    out.finish()
}

/// Validate an annotation on its own; span existence is checked by
/// [`validate_document`].
pub fn validate_annotation(annotation: &Annotation, path: &str) -> Vec<ValidationError> {
    let mut out = Findings::new();
    out.require(&annotation.id, format!("{path}.id"), "id");
    out.require(&annotation.span_id, format!("{path}.span_id"), "span_id");
    if !annotation.annotation_type.is_known() {
        out.push(
            format!("{path}.type"),
            format!(
                "unknown annotation type {:?}",
                annotation.annotation_type.as_str()
            ),
        );
    }
    if annotation.value.is_none() {
        out.push(format!("{path}.value"), "value is required");
    }
    if !(0.0..=1.0).contains(&annotation.confidence) {
        out.push(
            format!("{path}.confidence"),
            format!("confidence {} outside [0, 1]", annotation.confidence),
        );
    }
    out.finish()
}
