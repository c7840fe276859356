// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! Acronym resolution shared by the rewriting stages

use ahash::AHashSet;
use atlas_mask_ontology::AtlasOntology;

use crate::types::{EngineError, EngineResult, RegionId};

/// Resolve every acronym up front so a bad name fails before any voxel is touched
///
/// Repeated acronyms are collapsed; input order is otherwise kept.
pub(crate) fn resolve_acronyms<O, S>(
    ontology: &O,
    acronyms: &[S],
) -> EngineResult<Vec<(String, RegionId)>>
where
    O: AtlasOntology + ?Sized,
    S: AsRef<str>,
{
    let mut resolved: Vec<(String, RegionId)> = Vec::with_capacity(acronyms.len());
    for acronym in acronyms {
        let acronym = acronym.as_ref();
        let id = ontology
            .lookup_by_acronym(acronym)
            .ok_or_else(|| EngineError::RegionNotFound(acronym.to_string()))?;
        if !resolved.iter().any(|(_, existing)| *existing == id) {
            resolved.push((acronym.to_string(), id));
        }
    }
    Ok(resolved)
}

/// Reject acronym lists where one entry lies inside another's subtree
pub(crate) fn ensure_disjoint_subtrees<O>(
    ontology: &O,
    targets: &[(String, RegionId)],
) -> EngineResult<()>
where
    O: AtlasOntology + ?Sized,
{
    for (outer_acronym, outer_id) in targets {
        let subtree: AHashSet<RegionId> = ontology.all_descendants(*outer_id).into_iter().collect();
        for (inner_acronym, inner_id) in targets {
            if subtree.contains(inner_id) {
                return Err(EngineError::MalformedInput(format!(
                    "'{}' is nested inside '{}'; flatten targets must be disjoint subtrees",
                    inner_acronym, outer_acronym
                )));
            }
        }
    }
    Ok(())
}
