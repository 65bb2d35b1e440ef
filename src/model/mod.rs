//! Stand-off document model (the IR).
//!
//! This module contains:
//! - The ownership tree: [`Corpus`] → [`Document`] → [`ContentBlock`] → [`Token`]/[`Anchor`]
//! - The stand-off layer: [`Span`]s between two anchors and [`Annotation`]s on spans
//! - Tag enums, the [`Value`] union and the [`Attributed`] capability
//! - Tokenization and SHA-256 hashing
//!
//! Spans never reference character offsets directly, only anchor ids. Because
//! spans are stored beside the blocks rather than nested in them, a verse and a
//! quotation can overlap freely without either containing the other.
//!
//! # Example
//!
//! ```
//! use scriptorium::model::{Corpus, Document, ModuleType, SpanType};
//!
//! let mut doc = Document::new("Gen", "Genesis", 1);
//! let block = doc.push_block("In the beginning God created the heaven and the earth.");
//! let start = block.add_anchor(0);
//! let end = block.add_anchor(16);
//! let span = doc.add_span(SpanType::Verse, start, end).id.clone();
//! assert_eq!(doc.span_text(doc.span(&span).unwrap()).as_deref(), Some("In the beginning"));
//!
//! let mut corpus = Corpus::new("KJV", ModuleType::Bible, "KJV");
//! corpus.documents.push(doc);
//! ```

mod hash;
mod standoff;
mod tags;
mod tokenize;
mod value;

pub use hash::{JsonSerializer, Serializer, hash_corpus, hash_document, is_sha256_hex, sha256_hex};
pub use standoff::{Position, ResolvedSpan};
pub use tags::{AnnotationType, ModuleType, SpanType, TokenClass};
pub use tokenize::tokenize;
pub use value::{Attributed, Attributes, Value};

use serde::{Deserialize, Serialize};

use crate::loss::{LossClass, LossReport};
use crate::reference::{Ref, RefRange};
use crate::versification::MappingTable;

/// Attribute under which importers keep the original markup of a block.
pub const RAW_MARKUP_ATTR: &str = "raw_markup";

/// Top-level unit of conversion: one module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub module_type: ModuleType,
    /// Versification system id (`KJV`, `LXX`, `MT`, ...).
    #[serde(default)]
    pub versification: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_hash: Option<String>,
    #[serde(default)]
    pub loss_class: LossClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss_report: Option<LossReport>,
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mapping_tables: Vec<MappingTable>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cross_references: Vec<CrossReference>,
}

impl Corpus {
    /// Create an empty corpus at version `1.0.0` with no loss.
    pub fn new(
        id: impl Into<String>,
        module_type: ModuleType,
        versification: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            version: "1.0.0".to_string(),
            module_type,
            versification: versification.into(),
            language: String::new(),
            title: String::new(),
            source_hash: None,
            loss_class: LossClass::L0,
            loss_report: None,
            documents: Vec::new(),
            mapping_tables: Vec::new(),
            cross_references: Vec::new(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Find a document by id.
    pub fn document(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// Find a document by id for modification.
    pub fn document_mut(&mut self, id: &str) -> Option<&mut Document> {
        self.documents.iter_mut().find(|d| d.id == id)
    }

    /// Parse an IR snapshot.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize as a pretty-printed IR snapshot.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// One book or entry of a corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Book order, strictly positive.
    #[serde(default)]
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_ref: Option<Ref>,
    #[serde(default)]
    pub content_blocks: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spans: Vec<Span>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl Document {
    pub fn new(id: impl Into<String>, title: impl Into<String>, order: u32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            order,
            canonical_ref: None,
            content_blocks: Vec::new(),
            spans: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn with_canonical_ref(mut self, r: Ref) -> Self {
        self.canonical_ref = Some(r);
        self
    }

    /// Append a tokenized, hashed block with the next id and sequence number.
    pub fn push_block(&mut self, text: impl Into<String>) -> &mut ContentBlock {
        let sequence = self
            .content_blocks
            .last()
            .map(|b| b.sequence + 1)
            .unwrap_or(0);
        let id = format!("b{}", self.content_blocks.len() + 1);
        let idx = self.content_blocks.len();
        self.content_blocks
            .push(ContentBlock::new(id, sequence, text));
        &mut self.content_blocks[idx]
    }

    /// Add a span between two anchors and return it.
    pub fn add_span(
        &mut self,
        span_type: SpanType,
        start_anchor: impl Into<String>,
        end_anchor: impl Into<String>,
    ) -> &mut Span {
        let id = format!("s{}", self.spans.len() + 1);
        let idx = self.spans.len();
        self.spans.push(Span {
            id,
            span_type,
            start_anchor: start_anchor.into(),
            end_anchor: end_anchor.into(),
            reference: None,
            attributes: Attributes::new(),
        });
        &mut self.spans[idx]
    }

    /// Attach an annotation to a span and return it.
    pub fn add_annotation(
        &mut self,
        span_id: impl Into<String>,
        annotation_type: AnnotationType,
        value: impl Into<Value>,
        source: impl Into<String>,
    ) -> &mut Annotation {
        let id = format!("n{}", self.annotations.len() + 1);
        let idx = self.annotations.len();
        self.annotations.push(Annotation {
            id,
            span_id: span_id.into(),
            annotation_type,
            value: Some(value.into()),
            confidence: 1.0,
            source: source.into(),
            attributes: Attributes::new(),
        });
        &mut self.annotations[idx]
    }

    pub fn block(&self, id: &str) -> Option<&ContentBlock> {
        self.content_blocks.iter().find(|b| b.id == id)
    }

    pub fn span(&self, id: &str) -> Option<&Span> {
        self.spans.iter().find(|s| s.id == id)
    }

    /// Annotations attached to the given span.
    pub fn annotations_for<'a>(&'a self, span_id: &'a str) -> impl Iterator<Item = &'a Annotation> {
        self.annotations.iter().filter(move |a| a.span_id == span_id)
    }
}

/// A contiguous unit of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(default)]
    pub id: String,
    /// Position in document order; strictly increasing across a document.
    #[serde(default)]
    pub sequence: u32,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<Token>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anchors: Vec<Anchor>,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl ContentBlock {
    /// Create a block with tokens and hash filled in.
    pub fn new(id: impl Into<String>, sequence: u32, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut block = Self {
            id: id.into(),
            sequence,
            tokens: tokenize(&text),
            text,
            hash: None,
            anchors: Vec::new(),
            attributes: Attributes::new(),
        };
        block.compute_hash();
        block
    }

    /// Length of the text in characters (the unit of all offsets).
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Re-run tokenization after the text changed.
    pub fn retokenize(&mut self) {
        self.tokens = tokenize(&self.text);
    }

    /// Place an anchor at a character offset and return its id.
    ///
    /// Anchor ids are prefixed with the block id so they stay unique across
    /// the document.
    pub fn add_anchor(&mut self, char_offset: usize) -> String {
        let id = format!("{}.a{}", self.id, self.anchors.len() + 1);
        let token_index = self
            .tokens
            .iter()
            .position(|t| t.char_start <= char_offset && char_offset < t.char_end);
        self.anchors.push(Anchor {
            id: id.clone(),
            block_id: self.id.clone(),
            char_offset,
            token_index,
            hash: None,
        });
        id
    }

    /// Original markup retained by the importer, if any.
    pub fn raw_markup(&self) -> Option<&str> {
        self.get_attribute(RAW_MARKUP_ATTR).and_then(Value::as_str)
    }
}

/// A word, punctuation or whitespace run inside a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(default)]
    pub id: String,
    pub index: usize,
    /// Half-open character range `[char_start, char_end)`.
    pub char_start: usize,
    pub char_end: usize,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub class: TokenClass,
}

/// A zero-width position marker inside a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub block_id: String,
    pub char_offset: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

/// A region between two anchors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub span_type: SpanType,
    #[serde(default)]
    pub start_anchor: String,
    #[serde(default)]
    pub end_anchor: String,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Ref>,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl Span {
    pub fn with_ref(&mut self, r: Ref) -> &mut Self {
        self.reference = Some(r);
        self
    }
}

/// Metadata attached to a span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub span_id: String,
    #[serde(rename = "type", default)]
    pub annotation_type: AnnotationType,
    /// `None` only for a snapshot read with the value absent or null.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// In `[0, 1]`.
    #[serde(default = "full_confidence")]
    pub confidence: f64,
    /// Provenance of the annotation (importer, lexicon, ...).
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

fn full_confidence() -> f64 {
    1.0
}

/// A cross-reference between two passages, carried as data only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReference {
    pub id: String,
    pub source: Ref,
    pub target: RefRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Attributed for Span {
    fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }
}

impl Attributed for Annotation {
    fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }
}

impl Attributed for ContentBlock {
    fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_block_assigns_ids_and_sequence() {
        let mut doc = Document::new("Gen", "Genesis", 1);
        doc.push_block("one");
        doc.push_block("two");
        let ids: Vec<_> = doc.content_blocks.iter().map(|b| b.id.as_str()).collect();
        let seqs: Vec<_> = doc.content_blocks.iter().map(|b| b.sequence).collect();
        assert_eq!(ids, ["b1", "b2"]);
        assert_eq!(seqs, [0, 1]);
        assert!(doc.content_blocks[1].verify_hash());
        assert_eq!(doc.content_blocks[1].tokens.len(), 1);
    }

    #[test]
    fn test_anchor_records_token() {
        let mut block = ContentBlock::new("b1", 0, "Jesus wept.");
        let id = block.add_anchor(6);
        assert_eq!(id, "b1.a1");
        assert_eq!(block.anchors[0].token_index, Some(2));
        block.add_anchor(11);
        assert_eq!(block.anchors[1].token_index, None);
    }

    #[test]
    fn test_attributes_last_write_wins() {
        let mut block = ContentBlock::new("b1", 0, "");
        assert!(block.get_attribute("missing").is_none());
        block.set_attribute(RAW_MARKUP_ATTR, "<p/>");
        block.set_attribute(RAW_MARKUP_ATTR, "<chapter sID=\"c1\"/>");
        assert_eq!(block.raw_markup(), Some("<chapter sID=\"c1\"/>"));
        assert_eq!(block.remove_attribute(RAW_MARKUP_ATTR), Some(Value::from("<chapter sID=\"c1\"/>")));
        assert!(block.raw_markup().is_none());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut doc = Document::new("Ps", "Psalms", 19).with_canonical_ref(Ref::new("Ps", 10, 1));
        let block = doc.push_block("Why standest thou afar off, O LORD?");
        let a = block.add_anchor(0);
        let b = block.add_anchor(35);
        let span_id = doc.add_span(SpanType::Verse, a, b).with_ref(Ref::new("Ps", 10, 1)).id.clone();
        doc.add_annotation(span_id, AnnotationType::Strongs, "H7350", "kjv2006");

        let mut corpus = Corpus::new("KJV", ModuleType::Bible, "KJV").with_title("King James");
        corpus.documents.push(doc);

        let json = corpus.to_json().unwrap();
        assert!(json.contains("\"canonical_ref\": \"Ps.10.1\""));
        assert!(json.contains("\"loss_class\": \"L0\""));
        let back = Corpus::from_json(&json).unwrap();
        assert_eq!(back, corpus);
    }

    #[test]
    fn test_missing_fields_default_for_validation() {
        let corpus = Corpus::from_json(r#"{"documents": [{"content_blocks": [{"text": ""}]}]}"#).unwrap();
        assert!(corpus.id.is_empty());
        assert!(!corpus.module_type.is_known());
        assert_eq!(corpus.loss_class, LossClass::L0);
        assert_eq!(corpus.documents[0].order, 0);
    }

    #[test]
    fn test_unknown_span_type_survives_parse() {
        let json = r#"{"id": "s1", "type": "WORDS_OF_JESUS", "start_anchor": "a", "end_anchor": "b"}"#;
        let span: Span = serde_json::from_str(json).unwrap();
        assert_eq!(span.span_type, SpanType::Unknown("WORDS_OF_JESUS".into()));
    }
}
