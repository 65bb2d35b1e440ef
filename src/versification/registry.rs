//! Session registry of mapping tables with one-hop chaining.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::{MappingTable, MappingType, RefMapping};
use crate::reference::Ref;

/// Mapping tables keyed by `(from_system, to_system)`.
#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    tables: BTreeMap<(String, String), MappingTable>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table. A later table for the same pair replaces the earlier one.
    pub fn register_table(&mut self, table: MappingTable) {
        let key = (table.from_system.clone(), table.to_system.clone());
        self.tables.insert(key, table);
    }

    /// Direct lookup only.
    pub fn get_table(&self, from: &str, to: &str) -> Option<&MappingTable> {
        self.tables.get(&(from.to_string(), to.to_string()))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Every system named by a registered table, sorted.
    pub fn systems(&self) -> BTreeSet<&str> {
        self.tables
            .keys()
            .flat_map(|(from, to)| [from.as_str(), to.as_str()])
            .collect()
    }

    /// The direct table, or one composed through a single intermediate system.
    ///
    /// When several intermediates qualify the lexicographically smallest is
    /// used. A composed table keeps only source verses whose intermediate
    /// verse is itself mapped onward; everything else falls back to identity
    /// in [`MappingTable::map_ref`].
    pub fn get_chained_mapping(&self, from: &str, to: &str) -> Option<Cow<'_, MappingTable>> {
        if let Some(direct) = self.get_table(from, to) {
            return Some(Cow::Borrowed(direct));
        }

        let (first, second) = self
            .tables
            .iter()
            .filter(|((f, mid), _)| f == from && mid != to && mid != from)
            .find_map(|((_, mid), first)| {
                self.get_table(mid, to).map(|second| (first, second))
            })?;

        let chained = compose(first, second);
        debug!(
            from,
            via = %first.to_system,
            to,
            mappings = chained.len(),
            "synthesized chained mapping"
        );
        Some(Cow::Owned(chained))
    }

    /// Translate `r` between two systems; identity when the systems are equal
    /// or no (chained) table connects them.
    pub fn map_ref_between_systems(&self, r: &Ref, from: &str, to: &str) -> Ref {
        if from == to {
            return r.clone();
        }
        match self.get_chained_mapping(from, to) {
            Some(table) => table.map_ref(r),
            None => r.clone(),
        }
    }
}

/// `first` followed by `second`, as one table.
fn compose(first: &MappingTable, second: &MappingTable) -> MappingTable {
    let mut chained = MappingTable::new(
        format!(
            "{}->{}->{}",
            first.from_system, first.to_system, second.to_system
        ),
        first.from_system.clone(),
        second.to_system.clone(),
    );

    for mapping in first.iter() {
        let mut targets = Vec::new();
        let mut mapping_type = None;
        for mid in mapping.targets() {
            let Some(next) = second.lookup(&mid) else {
                continue;
            };
            let next_targets = next.targets();
            if next_targets.is_empty() {
                continue;
            }
            let step = mapping.mapping_type.compose(next.mapping_type);
            mapping_type = Some(mapping_type.map_or(step, |t: MappingType| t.compose(step)));
            targets.extend(next_targets);
        }

        let Some(mapping_type) = mapping_type else {
            continue;
        };
        let composed = if targets.len() > 1 {
            RefMapping::split(mapping.from.clone(), targets)
        } else {
            RefMapping::new(mapping.from.clone(), targets.pop(), mapping_type)
        };
        chained.push(composed);
    }
    chained
}
