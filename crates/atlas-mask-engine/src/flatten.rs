// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

/*!
Hierarchy Flattener

Merges descendant regions into an ancestor id, either the whole subtree
([`flatten_full`]) or only below a fixed level ([`flatten_at_level`]).
Flattening only relabels voxels: the non-background voxel count never changes.

Acronyms passed in one call must name disjoint subtrees; nested targets are
rejected with `MalformedInput` because the result would depend on order.
*/

use ahash::AHashMap;
use tracing::{debug, info};

use atlas_mask_ontology::AtlasOntology;

use crate::resolve::{ensure_disjoint_subtrees, resolve_acronyms};
use crate::types::{EngineError, EngineResult, RegionId};
use crate::volume::LabeledVolume;

/// Nodes exactly `depth` levels below `node_id` (depth 1 = direct children)
///
/// Branches that end before reaching `depth` contribute nothing. The result is
/// in pre-order depth-first order with children visited in ontology order.
///
/// # Errors
///
/// - `InvalidDepth` if `depth < 1`
/// - `RegionNotFound` if `node_id` is not in the ontology
pub fn descendants_at_depth<O>(
    ontology: &O,
    node_id: RegionId,
    depth: u32,
) -> EngineResult<Vec<RegionId>>
where
    O: AtlasOntology + ?Sized,
{
    if depth < 1 {
        return Err(EngineError::InvalidDepth { depth });
    }
    if !ontology.contains(node_id) {
        return Err(EngineError::RegionNotFound(node_id.to_string()));
    }

    let mut found = Vec::new();
    let mut to_visit: Vec<(RegionId, u32)> = ontology
        .children(node_id)
        .iter()
        .rev()
        .map(|&child| (child, 1))
        .collect();

    while let Some((current, current_depth)) = to_visit.pop() {
        if current_depth == depth {
            found.push(current);
        } else {
            to_visit.extend(
                ontology
                    .children(current)
                    .iter()
                    .rev()
                    .map(|&child| (child, current_depth + 1)),
            );
        }
    }

    Ok(found)
}

/// Rewrite every descendant of each named region to that region's id
///
/// # Errors
///
/// - `RegionNotFound` for an unknown acronym
/// - `MalformedInput` if one acronym lies inside another's subtree
pub fn flatten_full<O, S>(
    volume: &LabeledVolume,
    ontology: &O,
    acronyms: &[S],
) -> EngineResult<LabeledVolume>
where
    O: AtlasOntology + ?Sized,
    S: AsRef<str>,
{
    let targets = resolve_acronyms(ontology, acronyms)?;
    ensure_disjoint_subtrees(ontology, &targets)?;

    let mut rewrites: AHashMap<RegionId, RegionId> = AHashMap::new();
    for (acronym, ancestor) in &targets {
        let descendants = ontology.all_descendants(*ancestor);
        debug!(
            acronym = %acronym,
            region_id = *ancestor,
            descendants = descendants.len(),
            "Flattening subtree"
        );
        absorb_into(&mut rewrites, descendants, *ancestor);
    }

    let output = apply_rewrites(volume, &rewrites);
    info!(
        targets = targets.len(),
        ids_before = volume.distinct_ids().len(),
        ids_after = output.distinct_ids().len(),
        "Flattened regions"
    );
    Ok(output)
}

/// Keep the nodes `level` below each named region as the new boundaries and
/// fold everything under each of them into it
///
/// Nodes above `level` (including the named region itself) keep their ids.
///
/// # Errors
///
/// - `InvalidDepth` if `level < 1`
/// - `RegionNotFound` for an unknown acronym
/// - `MalformedInput` if one acronym lies inside another's subtree
pub fn flatten_at_level<O, S>(
    volume: &LabeledVolume,
    ontology: &O,
    acronyms: &[S],
    level: u32,
) -> EngineResult<LabeledVolume>
where
    O: AtlasOntology + ?Sized,
    S: AsRef<str>,
{
    if level < 1 {
        return Err(EngineError::InvalidDepth { depth: level });
    }
    let targets = resolve_acronyms(ontology, acronyms)?;
    ensure_disjoint_subtrees(ontology, &targets)?;

    let mut rewrites: AHashMap<RegionId, RegionId> = AHashMap::new();
    for (acronym, region_id) in &targets {
        let kept = descendants_at_depth(ontology, *region_id, level)?;
        debug!(
            acronym = %acronym,
            region_id = *region_id,
            level,
            kept = kept.len(),
            "Flattening below level"
        );
        for kept_id in kept {
            absorb_into(&mut rewrites, ontology.all_descendants(kept_id), kept_id);
        }
    }

    let output = apply_rewrites(volume, &rewrites);
    info!(
        targets = targets.len(),
        level,
        ids_before = volume.distinct_ids().len(),
        ids_after = output.distinct_ids().len(),
        "Flattened regions at level"
    );
    Ok(output)
}

fn absorb_into(
    rewrites: &mut AHashMap<RegionId, RegionId>,
    descendants: Vec<RegionId>,
    ancestor: RegionId,
) {
    for descendant in descendants {
        rewrites.insert(descendant, ancestor);
    }
}

fn apply_rewrites(
    volume: &LabeledVolume,
    rewrites: &AHashMap<RegionId, RegionId>,
) -> LabeledVolume {
    if rewrites.is_empty() {
        return volume.clone();
    }
    volume.map_ids(|v| rewrites.get(&v).copied().unwrap_or(v))
}
