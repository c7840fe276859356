// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! Region Excluder
//!
//! [`exclude_regions`] zeroes only voxels carrying exactly the named ids; a
//! named region's descendants survive. This differs from the flattener, which
//! always works on whole subtrees. Callers that want the subtree removed use
//! [`exclude_regions_recursive`].

use ahash::AHashSet;
use tracing::debug;

use atlas_mask_ontology::AtlasOntology;

use crate::resolve::resolve_acronyms;
use crate::types::{EngineResult, RegionId, BACKGROUND};
use crate::volume::LabeledVolume;

/// Zero every voxel whose id is exactly one of the named regions
///
/// # Errors
///
/// `RegionNotFound` if any acronym is unknown; nothing is modified in that case.
pub fn exclude_regions<O, S>(
    volume: &LabeledVolume,
    ontology: &O,
    acronyms: &[S],
) -> EngineResult<LabeledVolume>
where
    O: AtlasOntology + ?Sized,
    S: AsRef<str>,
{
    let targets = resolve_acronyms(ontology, acronyms)?;
    let excluded: AHashSet<RegionId> = targets.iter().map(|(_, id)| *id).collect();

    Ok(zero_ids(volume, &excluded))
}

/// Zero every voxel of the named regions and of all their descendants
pub fn exclude_regions_recursive<O, S>(
    volume: &LabeledVolume,
    ontology: &O,
    acronyms: &[S],
) -> EngineResult<LabeledVolume>
where
    O: AtlasOntology + ?Sized,
    S: AsRef<str>,
{
    let targets = resolve_acronyms(ontology, acronyms)?;
    let mut excluded: AHashSet<RegionId> = AHashSet::new();
    for (_, id) in &targets {
        excluded.insert(*id);
        excluded.extend(ontology.all_descendants(*id));
    }

    Ok(zero_ids(volume, &excluded))
}

fn zero_ids(volume: &LabeledVolume, excluded: &AHashSet<RegionId>) -> LabeledVolume {
    let output = volume.map_ids(|v| if excluded.contains(&v) { BACKGROUND } else { v });
    debug!(
        ids = excluded.len(),
        removed_voxels = volume.count_nonzero() - output.count_nonzero(),
        "Excluded regions"
    );
    output
}
