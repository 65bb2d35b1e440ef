//! Reference and mapping-table validation.

use std::collections::HashSet;

use super::{Findings, ValidationError};
use crate::reference::Ref;
use crate::versification::{MappingTable, MappingType};

/// Validate a reference built by hand rather than parsed.
pub fn validate_ref(r: &Ref, path: &str) -> Vec<ValidationError> {
    let mut out = Findings::new();

    let mut chars = r.book.chars();
    match chars.next() {
        None => out.push(format!("{path}.book"), "book is required"),
        Some(first) => {
            let well_formed = (first.is_ascii_uppercase() || first.is_ascii_digit())
                && chars.all(|c| c.is_ascii_alphanumeric());
            if !well_formed {
                out.push(format!("{path}.book"), format!("malformed book code {:?}", r.book));
            }
        }
    }
    if r.chapter == 0 && (r.verse != 0 || r.verse_end.is_some()) {
        out.push(
            format!("{path}.verse"),
            "a whole-book reference cannot name a verse",
        );
    }
    if let Some(end) = r.verse_end
        && end < r.verse
    {
        out.push(
            format!("{path}.verse_end"),
            format!("range end {end} precedes verse {}", r.verse),
        );
    }
    if let Some(sub) = r.sub_verse
        && !sub.is_ascii_lowercase()
    {
        out.push(
            format!("{path}.sub_verse"),
            format!("sub-verse must be a lower-case letter, got {sub:?}"),
        );
    }
    if r.sub_verse.is_some() && r.verse == 0 {
        out.push(format!("{path}.sub_verse"), "sub-verse without a verse");
    }

    out.finish()
}

/// Validate a mapping table: identity, per-mapping shape and hash agreement.
pub fn validate_mapping_table(table: &MappingTable, path: &str) -> Vec<ValidationError> {
    let mut out = Findings::new();

    out.require(&table.id, format!("{path}.id"), "id");
    out.require(&table.from_system, format!("{path}.from_system"), "from_system");
    out.require(&table.to_system, format!("{path}.to_system"), "to_system");
    if !table.from_system.is_empty() && table.from_system == table.to_system {
        out.push(
            format!("{path}.to_system"),
            format!("maps {} onto itself", table.from_system),
        );
    }

    let mut seen = HashSet::new();
    for (i, mapping) in table.iter().enumerate() {
        let m_path = format!("{path}.mappings[{i}]");
        out.extend(validate_ref(&mapping.from, &format!("{m_path}.from")));
        if let Some(to) = &mapping.to {
            out.extend(validate_ref(to, &format!("{m_path}.to")));
        }
        for (j, to) in mapping.to_refs.iter().enumerate() {
            out.extend(validate_ref(to, &format!("{m_path}.to_refs[{j}]")));
        }

        if !seen.insert(mapping.from.verse_key()) {
            out.push(
                format!("{m_path}.from"),
                format!("duplicate mapping for {}", mapping.from),
            );
        }

        let has_to = mapping.to.is_some();
        let has_refs = !mapping.to_refs.is_empty();
        match mapping.mapping_type {
            MappingType::Exact | MappingType::Reordered | MappingType::Merge | MappingType::Added => {
                if !has_to {
                    out.push(
                        format!("{m_path}.to"),
                        format!("{} mapping needs a target", mapping.mapping_type),
                    );
                }
            }
            MappingType::Split => {
                if !has_to && !has_refs {
                    out.push(format!("{m_path}.to_refs"), "split mapping needs targets");
                }
            }
            MappingType::Missing => {
                if has_to || has_refs {
                    out.push(format!("{m_path}.to"), "missing mapping cannot have a target");
                }
            }
        }
    }

    if let Some(stored) = &table.hash {
        match table.content_hash() {
            Ok(actual) if actual == *stored => {}
            Ok(_) => out.push(format!("{path}.hash"), "hash does not match mappings"),
            Err(e) => out.push(format!("{path}.hash"), format!("cannot hash mappings: {e}")),
        }
    }

    out.finish()
}
