//! Benchmarks for versification mapping and validation.
//!
//! Run with: cargo bench

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use scriptorium::model::{Corpus, Document, ModuleType, SpanType};
use scriptorium::reference::Ref;
use scriptorium::validate::validate_corpus;
use scriptorium::versification::{MappingRegistry, MappingTable, MappingType};

const PSALMS: u32 = 150;
const VERSES: u32 = 20;

/// KJV to LXX shifting every Psalm verse back one chapter.
fn psalm_table(from: &str, to: &str) -> MappingTable {
    let mut table = MappingTable::new(format!("{from}-{to}"), from, to);
    for chapter in 2..=PSALMS {
        for verse in 1..=VERSES {
            table.add_mapping(
                Ref::new("Ps", chapter, verse),
                Some(Ref::new("Ps", chapter - 1, verse)),
                MappingType::Reordered,
            );
        }
    }
    table
}

/// One document per Psalm, one block and verse span per verse.
fn psalm_corpus() -> Corpus {
    let mut corpus = Corpus::new("KJV", ModuleType::Bible, "KJV");
    for chapter in 1..=PSALMS {
        let mut doc = Document::new(format!("Ps.{chapter}"), format!("Psalm {chapter}"), chapter)
            .with_canonical_ref(Ref::whole_chapter("Ps", chapter));
        for verse in 1..=VERSES {
            let block = doc.push_block(format!("Verse {verse} of psalm {chapter}, praise ye the LORD."));
            let len = block.char_len();
            let (start, end) = (block.add_anchor(0), block.add_anchor(len));
            doc.add_span(SpanType::Verse, start, end)
                .with_ref(Ref::new("Ps", chapter, verse));
        }
        corpus.documents.push(doc);
    }
    corpus
}

// ============================================================================
// Mapping Benchmarks
// ============================================================================

fn bench_map_ref(c: &mut Criterion) {
    let table = psalm_table("KJV", "LXX");
    let r = Ref::new("Ps", 119, 7);
    c.bench_function("map_ref", |b| {
        b.iter(|| table.map_ref(black_box(&r)));
    });
}

fn bench_apply_to_corpus(c: &mut Criterion) {
    let table = psalm_table("KJV", "LXX");
    let corpus = psalm_corpus();
    c.bench_function("apply_to_corpus", |b| {
        b.iter(|| table.apply_to_corpus(black_box(&corpus)));
    });
}

fn bench_chained_mapping(c: &mut Criterion) {
    let mut registry = MappingRegistry::new();
    registry.register_table(psalm_table("KJV", "LXX"));
    registry.register_table(psalm_table("LXX", "MT"));
    c.bench_function("chained_mapping", |b| {
        b.iter(|| registry.get_chained_mapping(black_box("KJV"), black_box("MT")));
    });
}

// ============================================================================
// Validation Benchmarks
// ============================================================================

fn bench_validate_corpus(c: &mut Criterion) {
    let corpus = psalm_corpus();
    c.bench_function("validate_corpus", |b| {
        b.iter(|| validate_corpus(black_box(&corpus)));
    });
}

criterion_group!(
    benches,
    bench_map_ref,
    bench_apply_to_corpus,
    bench_chained_mapping,
    bench_validate_corpus,
);
criterion_main!(benches);
