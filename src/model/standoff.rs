//! Resolving spans against the block sequence.
//!
//! A span only names its two anchors. Resolution turns those into document
//! positions (block index + character offset) so overlap and containment can
//! be computed across layers.

use super::{Anchor, ContentBlock, Document, Span};

/// A point in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// Index into `Document::content_blocks`.
    pub block: usize,
    /// Character offset within that block.
    pub offset: usize,
}

/// A span resolved to document positions, half-open `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSpan {
    pub start: Position,
    pub end: Position,
}

impl ResolvedSpan {
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos < self.end
    }

    /// Whether the two regions share at least one character.
    pub fn overlaps(&self, other: &ResolvedSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether `other` lies entirely inside this region.
    pub fn encloses(&self, other: &ResolvedSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl Document {
    /// Find an anchor by id together with the index of its block.
    pub fn anchor(&self, id: &str) -> Option<(usize, &Anchor)> {
        self.content_blocks
            .iter()
            .enumerate()
            .find_map(|(idx, block)| block.anchors.iter().find(|a| a.id == id).map(|a| (idx, a)))
    }

    /// Position of an anchor in document order.
    pub fn position_of(&self, anchor_id: &str) -> Option<Position> {
        self.anchor(anchor_id).map(|(block, anchor)| Position {
            block,
            offset: anchor.char_offset,
        })
    }

    /// Resolve a span; `None` when an anchor is missing or the end precedes
    /// the start.
    pub fn resolve_span(&self, span: &Span) -> Option<ResolvedSpan> {
        let start = self.position_of(&span.start_anchor)?;
        let end = self.position_of(&span.end_anchor)?;
        (start <= end).then_some(ResolvedSpan { start, end })
    }

    /// Text covered by a span. Text from different blocks is joined with `\n`.
    pub fn span_text(&self, span: &Span) -> Option<String> {
        let resolved = self.resolve_span(span)?;
        let mut parts = Vec::new();
        for idx in resolved.start.block..=resolved.end.block {
            let block = self.content_blocks.get(idx)?;
            let from = if idx == resolved.start.block {
                resolved.start.offset
            } else {
                0
            };
            let to = if idx == resolved.end.block {
                resolved.end.offset
            } else {
                block.char_len()
            };
            parts.push(char_slice(block, from, to)?);
        }
        Some(parts.join("\n"))
    }

    /// All spans covering the character at `offset` in block `block_id`.
    pub fn spans_at(&self, block_id: &str, offset: usize) -> Vec<&Span> {
        let Some(block) = self.content_blocks.iter().position(|b| b.id == block_id) else {
            return Vec::new();
        };
        let pos = Position { block, offset };
        self.spans
            .iter()
            .filter(|span| {
                self.resolve_span(span)
                    .is_some_and(|resolved| resolved.contains(pos))
            })
            .collect()
    }
}

fn char_slice(block: &ContentBlock, from: usize, to: usize) -> Option<&str> {
    let text = block.text.as_str();
    let byte_at = |chars: usize| {
        text.char_indices()
            .map(|(b, _)| b)
            .chain(std::iter::once(text.len()))
            .nth(chars)
    };
    let start = byte_at(from)?;
    let end = byte_at(to)?;
    text.get(start..end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SpanType;

    /// Two blocks; a verse span crossing the block boundary and a quotation
    /// that starts inside the verse and ends after it.
    fn overlapping_document() -> (Document, String, String) {
        let mut doc = Document::new("Gen", "Genesis", 1);
        let b1 = doc.push_block("And God said,");
        let verse_start = b1.add_anchor(0);
        let quote_start = b1.add_anchor(13);
        let b2 = doc.push_block("Let there be light: and there was light.");
        let verse_end = b2.add_anchor(18);
        let quote_end = b2.add_anchor(40);
        let verse = doc.add_span(SpanType::Verse, verse_start, verse_end).id.clone();
        let quote = doc
            .add_span(SpanType::Quotation, quote_start, quote_end)
            .id
            .clone();
        (doc, verse, quote)
    }

    #[test]
    fn test_overlapping_spans_resolve_independently() {
        let (doc, verse, quote) = overlapping_document();
        let v = doc.resolve_span(doc.span(&verse).unwrap()).unwrap();
        let q = doc.resolve_span(doc.span(&quote).unwrap()).unwrap();

        assert!(v.overlaps(&q));
        assert!(!v.encloses(&q));
        assert!(!q.encloses(&v));
    }

    #[test]
    fn test_span_text_crosses_blocks() {
        let (doc, verse, quote) = overlapping_document();
        assert_eq!(
            doc.span_text(doc.span(&verse).unwrap()).as_deref(),
            Some("And God said,\nLet there be light")
        );
        assert_eq!(
            doc.span_text(doc.span(&quote).unwrap()).as_deref(),
            Some("\nLet there be light: and there was light.")
        );
    }

    #[test]
    fn test_spans_at() {
        let (doc, verse, quote) = overlapping_document();
        let ids = |block: &str, offset: usize| -> Vec<String> {
            doc.spans_at(block, offset)
                .into_iter()
                .map(|s| s.id.clone())
                .collect()
        };
        assert_eq!(ids("b1", 0), vec![verse.clone()]);
        assert_eq!(ids("b2", 5), vec![verse.clone(), quote.clone()]);
        assert_eq!(ids("b2", 30), vec![quote]);
        assert!(ids("b9", 0).is_empty());
    }

    #[test]
    fn test_unresolvable_span() {
        let (mut doc, _, _) = overlapping_document();
        let span = doc.add_span(SpanType::Note, "b1.a1", "nowhere").clone();
        assert!(doc.resolve_span(&span).is_none());

        let backwards = doc.add_span(SpanType::Note, "b2.a1", "b1.a1").clone();
        assert!(doc.resolve_span(&backwards).is_none());
    }

    #[test]
    fn test_multibyte_slicing() {
        let mut doc = Document::new("Gen", "Genèse", 1);
        let block = doc.push_block("Au commencement, Dieu cr\u{e9}a les cieux");
        let a = block.add_anchor(22);
        let b = block.add_anchor(26);
        let span = doc.add_span(SpanType::Quotation, a, b).clone();
        assert_eq!(doc.span_text(&span).as_deref(), Some("cr\u{e9}a"));
    }
}
