//! Versification mapping between numbering systems.
//!
//! A [`MappingTable`] translates references from one system (say `KJV`) to
//! another (`LXX`). Relationships need not be one-to-one: a verse can be
//! split across two verses, several verses merged into one, or have no
//! counterpart at all. The [`MappingRegistry`] holds the tables of a session
//! and composes two of them through a shared intermediate system when no
//! direct table exists.
//!
//! # Example
//!
//! ```
//! use scriptorium::reference::Ref;
//! use scriptorium::versification::{MappingTable, MappingType};
//!
//! let mut table = MappingTable::new("kjv-lxx", "KJV", "LXX");
//! table.add_mapping(Ref::new("Ps", 10, 1), Some(Ref::new("Ps", 9, 22)), MappingType::Reordered);
//!
//! assert_eq!(table.map_ref(&Ref::new("Ps", 10, 1)), Ref::new("Ps", 9, 22));
//! // Unmapped references pass through unchanged.
//! assert_eq!(table.map_ref(&Ref::new("Gen", 1, 1)), Ref::new("Gen", 1, 1));
//! ```

mod registry;
mod table;

pub use registry::MappingRegistry;
pub use table::MappingTable;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::reference::Ref;

/// How a source verse relates to the target system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingType {
    /// Same verse, same number.
    Exact,
    /// One verse becomes several.
    Split,
    /// Several verses become one.
    Merge,
    /// No counterpart in the target system.
    Missing,
    /// Present only in the target system.
    Added,
    /// Same content under a different number.
    Reordered,
}

impl MappingType {
    pub fn as_str(self) -> &'static str {
        match self {
            MappingType::Exact => "exact",
            MappingType::Split => "split",
            MappingType::Merge => "merge",
            MappingType::Missing => "missing",
            MappingType::Added => "added",
            MappingType::Reordered => "reordered",
        }
    }

    /// Type of a mapping obtained by following `self` and then `next`.
    pub fn compose(self, next: MappingType) -> MappingType {
        use MappingType::*;
        match (self, next) {
            (Split, _) | (_, Split) => Split,
            (Merge, _) | (_, Merge) => Merge,
            (Exact, Exact) => Exact,
            _ => Reordered,
        }
    }
}

impl fmt::Display for MappingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a mapping table.
///
/// Exact, reordered, merge and added mappings use `to`; a split lists its
/// targets in `to_refs`; a missing mapping has neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefMapping {
    pub from: Ref,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Ref>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to_refs: Vec<Ref>,
    #[serde(rename = "type")]
    pub mapping_type: MappingType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl RefMapping {
    pub fn new(from: Ref, to: Option<Ref>, mapping_type: MappingType) -> Self {
        Self {
            from,
            to,
            to_refs: Vec::new(),
            mapping_type,
            note: None,
        }
    }

    pub fn exact(from: Ref, to: Ref) -> Self {
        Self::new(from, Some(to), MappingType::Exact)
    }

    pub fn split(from: Ref, to_refs: Vec<Ref>) -> Self {
        Self {
            to_refs,
            ..Self::new(from, None, MappingType::Split)
        }
    }

    pub fn missing(from: Ref) -> Self {
        Self::new(from, None, MappingType::Missing)
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// The single reference this mapping resolves to: `to`, else the first
    /// split target.
    pub fn target(&self) -> Option<&Ref> {
        self.to.as_ref().or_else(|| self.to_refs.first())
    }

    /// Every target, in order.
    pub fn targets(&self) -> Vec<Ref> {
        split_ref(self)
    }
}

/// Targets of a split: `to_refs` when present, else `to` alone, else nothing.
pub fn split_ref(mapping: &RefMapping) -> Vec<Ref> {
    if !mapping.to_refs.is_empty() {
        mapping.to_refs.clone()
    } else {
        mapping.to.iter().cloned().collect()
    }
}

/// Representative target of a merge: the first reference given.
///
/// Callers that need a particular representative must order `refs` first.
pub fn merge_refs(refs: &[Ref]) -> Option<Ref> {
    refs.first().cloned()
}
