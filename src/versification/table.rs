//! A directed mapping table between two versification systems.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{MappingType, RefMapping};
use crate::error::Result;
use crate::loss::{LossClass, LossReport};
use crate::model::{Corpus, JsonSerializer, Serializer, Value, sha256_hex};
use crate::reference::Ref;

/// Mappings from `from_system` to `to_system`, indexed by source verse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawMappingTable")]
pub struct MappingTable {
    pub id: String,
    pub from_system: String,
    pub to_system: String,
    mappings: Vec<RefMapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// `Ref::verse_key` of each source ref to its position in `mappings`.
    #[serde(skip)]
    index: HashMap<String, usize>,
}

/// Wire form; the index is rebuilt on the way in.
#[derive(Deserialize)]
struct RawMappingTable {
    #[serde(default)]
    id: String,
    #[serde(default)]
    from_system: String,
    #[serde(default)]
    to_system: String,
    #[serde(default)]
    mappings: Vec<RefMapping>,
    #[serde(default)]
    hash: Option<String>,
}

impl From<RawMappingTable> for MappingTable {
    fn from(raw: RawMappingTable) -> Self {
        let mut table = MappingTable::new(raw.id, raw.from_system, raw.to_system);
        for mapping in raw.mappings {
            table.push(mapping);
        }
        table.hash = raw.hash;
        table
    }
}

impl MappingTable {
    pub fn new(
        id: impl Into<String>,
        from_system: impl Into<String>,
        to_system: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            from_system: from_system.into(),
            to_system: to_system.into(),
            mappings: Vec::new(),
            hash: None,
            index: HashMap::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn mappings(&self) -> &[RefMapping] {
        &self.mappings
    }

    pub fn iter(&self) -> impl Iterator<Item = &RefMapping> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Mapping for the verse of `r`, ignoring sub-verse and range end.
    pub fn lookup(&self, r: &Ref) -> Option<&RefMapping> {
        self.index.get(&r.verse_key()).map(|&i| &self.mappings[i])
    }

    /// Append a mapping. A later mapping for the same verse shadows earlier ones.
    pub fn add_mapping(
        &mut self,
        from: Ref,
        to: Option<Ref>,
        mapping_type: MappingType,
    ) -> &mut RefMapping {
        self.push(RefMapping::new(from, to, mapping_type))
    }

    /// Append a fully-built mapping.
    pub fn push(&mut self, mapping: RefMapping) -> &mut RefMapping {
        let idx = self.mappings.len();
        self.index.insert(mapping.from.verse_key(), idx);
        self.mappings.push(mapping);
        // stored hash no longer describes the mappings
        self.hash = None;
        &mut self.mappings[idx]
    }

    /// Translate `r`; references without a mapping (or without a target)
    /// come back unchanged.
    pub fn map_ref(&self, r: &Ref) -> Ref {
        self.lookup(r)
            .and_then(RefMapping::target)
            .cloned()
            .unwrap_or_else(|| r.clone())
    }

    /// SHA-256 over the serialized mappings.
    pub fn content_hash(&self) -> Result<String> {
        Ok(sha256_hex(&JsonSerializer.to_bytes(&self.mappings)?))
    }

    /// Compute, store and return the content hash.
    pub fn compute_hash(&mut self) -> Result<&str> {
        let digest = self.content_hash()?;
        Ok(self.hash.insert(digest).as_str())
    }

    /// The table for the opposite direction.
    ///
    /// Exact and reordered mappings are inverted, split targets each merge
    /// back onto their source, merges sharing a target become one split and
    /// added verses become missing. Missing verses have nothing to invert.
    pub fn reversed(&self) -> MappingTable {
        let mut out = MappingTable::new(
            format!("{}.reversed", self.id),
            self.to_system.clone(),
            self.from_system.clone(),
        );
        // merge target key -> position of the split being assembled in `out`
        let mut merged: HashMap<String, usize> = HashMap::new();

        for mapping in &self.mappings {
            match mapping.mapping_type {
                MappingType::Exact | MappingType::Reordered => {
                    if let Some(to) = &mapping.to {
                        let mut inverse = RefMapping::new(
                            to.clone(),
                            Some(mapping.from.clone()),
                            mapping.mapping_type,
                        );
                        inverse.note = mapping.note.clone();
                        out.push(inverse);
                    }
                }
                MappingType::Split => {
                    for target in mapping.targets() {
                        out.push(RefMapping::new(
                            target,
                            Some(mapping.from.clone()),
                            MappingType::Merge,
                        ));
                    }
                }
                MappingType::Merge => {
                    let Some(to) = &mapping.to else { continue };
                    match merged.get(&to.verse_key()) {
                        Some(&idx) => out.mappings[idx].to_refs.push(mapping.from.clone()),
                        None => {
                            merged.insert(to.verse_key(), out.len());
                            out.push(RefMapping::split(to.clone(), vec![mapping.from.clone()]));
                        }
                    }
                }
                MappingType::Added => {
                    if let Some(to) = &mapping.to {
                        out.push(RefMapping::missing(to.clone()));
                    }
                }
                MappingType::Missing => {}
            }
        }
        out
    }

    /// Re-address a corpus into `to_system`.
    ///
    /// Returns a new corpus; the input is untouched. Only references change:
    /// document canonical refs and span refs are mapped, block text, tokens,
    /// anchors and annotations are copied through as they are. A reference
    /// with a `missing` mapping keeps its original value, as in `map_ref`, and
    /// is recorded as a lost element.
    pub fn apply_to_corpus(&self, corpus: &Corpus) -> (Corpus, LossReport) {
        let mut report = LossReport::new(self.from_system.clone(), self.to_system.clone());

        if !corpus.versification.is_empty() && corpus.versification != self.from_system {
            warn!(
                corpus = %corpus.id,
                versification = %corpus.versification,
                table = %self.id,
                from = %self.from_system,
                "corpus versification differs from mapping source"
            );
            report.add_warning(format!(
                "corpus versification {} does not match table source {}",
                corpus.versification, self.from_system
            ));
        }

        let mut mapped = corpus.clone();
        mapped.versification = self.to_system.clone();

        for (d, doc) in mapped.documents.iter_mut().enumerate() {
            if let Some(r) = doc.canonical_ref.take() {
                let path = format!("documents[{d}].canonical_ref");
                doc.canonical_ref = Some(self.remap(&r, &path, "canonical_ref", &mut report));
            }
            for (s, span) in doc.spans.iter_mut().enumerate() {
                if let Some(r) = span.reference.take() {
                    let path = format!("documents[{d}].spans[{s}].ref");
                    span.reference = Some(self.remap(&r, &path, "span_ref", &mut report));
                }
            }
        }

        mapped.loss_class = mapped.loss_class.max(report.loss_class);
        (mapped, report)
    }

    fn remap(
        &self,
        r: &Ref,
        path: &str,
        element_type: &str,
        report: &mut LossReport,
    ) -> Ref {
        let Some(mapping) = self.lookup(r) else {
            return r.clone();
        };

        match mapping.mapping_type {
            MappingType::Missing => {
                warn!(reference = %r, to = %self.to_system, "no equivalent in target versification");
                report.record_lost_element(
                    path,
                    element_type,
                    format!("{r} has no equivalent in {}", self.to_system),
                    Some(Value::from(r.to_string())),
                );
                report.escalate(LossClass::L2);
                r.clone()
            }
            MappingType::Split => {
                let targets = mapping.targets();
                let listed: Vec<String> = targets.iter().map(Ref::to_string).collect();
                report.add_warning(format!(
                    "{path}: {r} is split into {} in {}; addressed by the first",
                    listed.join(", "),
                    self.to_system
                ));
                mapping.target().cloned().unwrap_or_else(|| r.clone())
            }
            MappingType::Merge => {
                let target = mapping.target().cloned().unwrap_or_else(|| r.clone());
                report.add_warning(format!(
                    "{path}: {r} is merged into {target} in {}",
                    self.to_system
                ));
                target
            }
            MappingType::Exact | MappingType::Reordered | MappingType::Added => {
                mapping.target().cloned().unwrap_or_else(|| r.clone())
            }
        }
    }
}
