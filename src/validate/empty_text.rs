//! Telling purposeful empty blocks from suspicious ones.
//!
//! Importers emit blocks with empty text for pure structural markers such as
//! `<chapter sID="Gen.1"/>`. The same empty text is a red flag when the
//! original markup carried words. The classifier inspects the raw markup kept
//! in the block's [`RAW_MARKUP_ATTR`](crate::model::RAW_MARKUP_ATTR) attribute.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::{Deserialize, Serialize};

use super::ValidationError;
use crate::model::{ContentBlock, Corpus};

/// Verdict on one empty block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyTextFinding {
    pub path: String,
    pub block_id: String,
    /// Whether the emptiness is expected.
    pub purposeful: bool,
    pub reason: String,
}

/// Structural markers in priority order.
const MARKERS: [(&str, &str); 4] = [
    ("chapter", "chapter boundary marker"),
    ("book", "book boundary marker"),
    ("section", "section boundary marker"),
    ("milestone", "milestone marker"),
];

/// What a scan of raw markup found.
#[derive(Debug, Default)]
struct MarkupScan {
    has_text: bool,
    malformed: bool,
    /// Parallel to [`MARKERS`]: seen as an element name or `type` attribute.
    markers: [bool; 4],
}

fn scan_markup(raw: &str) -> MarkupScan {
    let mut reader = Reader::from_str(raw);
    reader.config_mut().trim_text(true);
    let mut scan = MarkupScan::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => note_markers(&e, &mut scan.markers),
            Ok(Event::Text(e)) => scan.has_text |= has_content(&e),
            Ok(Event::CData(e)) => scan.has_text |= has_content(&e),
            Ok(Event::GeneralRef(_)) => scan.has_text = true,
            Ok(Event::Eof) => break,
            Err(_) => {
                scan.malformed = true;
                break;
            }
            _ => {}
        }
    }
    scan
}

fn has_content(bytes: &[u8]) -> bool {
    bytes.iter().any(|b| !b.is_ascii_whitespace())
}

fn note_markers(e: &BytesStart<'_>, markers: &mut [bool; 4]) {
    let name = e.local_name();
    let mut hit = |label: &[u8]| {
        for (i, (marker, _)) in MARKERS.iter().enumerate() {
            if label.eq_ignore_ascii_case(marker.as_bytes()) {
                markers[i] = true;
            }
        }
    };
    hit(name.as_ref());
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == b"type" {
            hit(attr.value.as_ref());
        }
    }
}

/// Classify an empty block. Returns `None` when the block has text.
///
/// Without retained markup the emptiness cannot be explained and is treated
/// as possible data loss. Markup that contains text, or does not parse, means
/// the importer dropped something.
pub fn classify_empty_text(block: &ContentBlock) -> Option<EmptyTextFinding> {
    if !block.text.is_empty() {
        return None;
    }

    let (purposeful, reason) = match block.raw_markup().filter(|raw| !raw.trim().is_empty()) {
        None => (false, "possible data loss"),
        Some(raw) => {
            let scan = scan_markup(raw);
            if scan.malformed || scan.has_text {
                (false, "possible parsing error")
            } else {
                let reason = MARKERS
                    .iter()
                    .zip(scan.markers)
                    .find_map(|((_, reason), seen)| seen.then_some(*reason))
                    .unwrap_or("markup-only, no actual text");
                (true, reason)
            }
        }
    };

    Some(EmptyTextFinding {
        path: String::new(),
        block_id: block.id.clone(),
        purposeful,
        reason: reason.to_string(),
    })
}

/// Classify every empty block in the corpus, purposeful or not.
pub fn validate_empty_text_fields(corpus: &Corpus) -> Vec<EmptyTextFinding> {
    let mut findings = Vec::new();
    for (d, doc) in corpus.documents.iter().enumerate() {
        for (b, block) in doc.content_blocks.iter().enumerate() {
            if let Some(mut finding) = classify_empty_text(block) {
                finding.path = format!("corpus.documents[{d}].content_blocks[{b}].text");
                findings.push(finding);
            }
        }
    }
    findings
}

/// Report only the empty blocks that are not explained by structure.
pub fn validate_no_unexpected_empty_text(corpus: &Corpus) -> Vec<ValidationError> {
    validate_empty_text_fields(corpus)
        .into_iter()
        .filter(|f| !f.purposeful)
        .map(|f| {
            let message = format!("empty text in block {:?}: {}", f.block_id, f.reason);
            ValidationError::new(f.path, message)
        })
        .collect()
}
