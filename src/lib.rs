//! # scriptorium
//!
//! A stand-off intermediate representation for scripture modules, with the
//! machinery to convert between formats without silently losing anything.
//!
//! ## Features
//!
//! - Canonical verse references (`Gen.1.1`, `John 3:16`) with parsing, ordering and containment
//! - A stand-off document model where overlapping verses, quotations and notes coexist
//! - Structural validation with path-addressed findings
//! - Versification mapping between numbering systems, including chained mappings
//! - Loss classification (L0 to L4) and budget gates
//! - Plan-driven self-checks that prove a conversion round-trips
//!
//! ## Quick Start
//!
//! ```
//! use scriptorium::model::{Corpus, Document, ModuleType, SpanType};
//! use scriptorium::reference::Ref;
//! use scriptorium::validate::validate_corpus;
//!
//! let mut doc = Document::new("John", "John", 43).with_canonical_ref(Ref::whole_book("John"));
//! let block = doc.push_block("Jesus wept.");
//! let (start, end) = (block.add_anchor(0), block.add_anchor(11));
//! doc.add_span(SpanType::Verse, start, end).with_ref(Ref::new("John", 11, 35));
//!
//! let mut corpus = Corpus::new("KJV", ModuleType::Bible, "KJV").with_version("1.0.0");
//! corpus.documents.push(doc);
//!
//! assert!(validate_corpus(&corpus).is_empty());
//! ```
//!
//! ## Moving Between Versifications
//!
//! ```
//! use scriptorium::reference::Ref;
//! use scriptorium::versification::{MappingRegistry, MappingTable, MappingType};
//!
//! let mut kjv_lxx = MappingTable::new("kjv-lxx", "KJV", "LXX");
//! kjv_lxx.add_mapping(Ref::new("Ps", 10, 1), Some(Ref::new("Ps", 9, 22)), MappingType::Reordered);
//!
//! let mut registry = MappingRegistry::new();
//! registry.register_table(kjv_lxx);
//! let mapped = registry.map_ref_between_systems(&Ref::new("Ps", 10, 1), "KJV", "LXX");
//! assert_eq!(mapped.to_string(), "Ps.9.22");
//! ```

pub mod error;
pub mod loss;
pub mod model;
pub mod reference;
pub mod selfcheck;
pub mod validate;
pub mod versification;

pub use error::{Error, Result};
pub use loss::{LossBudget, LossClass, LossReport};
pub use model::{Corpus, Document};
pub use reference::{Ref, RefRange};
