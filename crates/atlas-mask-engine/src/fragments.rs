// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

/*!
Fragment Analyzer

Splits every region into connected components and removes the ones smaller
than a minimum size.

## Determinism

- Voxels are scanned in C order over `[z, y, x]` (x fastest).
- Components of a region are numbered from 1 in the order their first voxel
  appears in that scan.
- The ledger lists regions by ascending id, then fragments by index.

Each region is analysed independently inside its own bounding box, so the
per-region work can be spread across threads (`parallel` feature) without
changing any of the above.
*/

use ndarray::Array3;
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use atlas_mask_ontology::AtlasOntology;

use crate::ledger::{FragmentLedger, FragmentRecord};
use crate::types::{Connectivity, EngineResult, Execution, RegionId, BACKGROUND};
use crate::volume::LabeledVolume;

/// Options for [`analyze_and_prune_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentOptions {
    /// Components with fewer voxels are removed
    pub min_size: usize,
    pub connectivity: Connectivity,
    pub execution: Execution,
}

impl Default for FragmentOptions {
    fn default() -> Self {
        Self {
            min_size: 50,
            connectivity: Connectivity::Face,
            execution: Execution::Sequential,
        }
    }
}

/// Inclusive `[z, y, x]` bounds of one region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RegionBounds {
    min: [usize; 3],
    max: [usize; 3],
}

impl RegionBounds {
    fn at(index: [usize; 3]) -> Self {
        Self {
            min: index,
            max: index,
        }
    }

    fn include(&mut self, index: [usize; 3]) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(index[axis]);
            self.max[axis] = self.max[axis].max(index[axis]);
        }
    }

    fn extent(&self) -> [usize; 3] {
        [
            self.max[0] - self.min[0] + 1,
            self.max[1] - self.min[1] + 1,
            self.max[2] - self.min[2] + 1,
        ]
    }

    fn local(&self, index: [usize; 3]) -> [usize; 3] {
        [
            index[0] - self.min[0],
            index[1] - self.min[1],
            index[2] - self.min[2],
        ]
    }

    /// Neighbor of `index` along `offset`, if it stays inside the bounds
    fn step(&self, index: [usize; 3], offset: [isize; 3]) -> Option<[usize; 3]> {
        let mut next = [0usize; 3];
        for axis in 0..3 {
            let moved = index[axis].checked_add_signed(offset[axis])?;
            if moved < self.min[axis] || moved > self.max[axis] {
                return None;
            }
            next[axis] = moved;
        }
        Some(next)
    }
}

/// One connected component; voxel positions are only kept when it will be removed
#[derive(Debug, Clone)]
struct Component {
    size: usize,
    removed_voxels: Option<Vec<[usize; 3]>>,
}

/// Bounding box of every non-background id, ascending by id
fn region_bounds(volume: &LabeledVolume) -> BTreeMap<RegionId, RegionBounds> {
    let mut bounds: BTreeMap<RegionId, RegionBounds> = BTreeMap::new();
    for ((z, y, x), &value) in volume.as_array().indexed_iter() {
        if value == BACKGROUND {
            continue;
        }
        bounds
            .entry(value)
            .and_modify(|b| b.include([z, y, x]))
            .or_insert_with(|| RegionBounds::at([z, y, x]));
    }
    bounds
}

/// Connected components of one region, numbered in scan order
fn label_region(
    data: &Array3<RegionId>,
    region_id: RegionId,
    bounds: &RegionBounds,
    connectivity: Connectivity,
    min_size: usize,
) -> Vec<Component> {
    let offsets = connectivity.offsets();
    let mut visited = Array3::<bool>::from_elem(bounds.extent(), false);
    let mut components = Vec::new();
    let mut frontier: VecDeque<[usize; 3]> = VecDeque::new();

    for z in bounds.min[0]..=bounds.max[0] {
        for y in bounds.min[1]..=bounds.max[1] {
            for x in bounds.min[2]..=bounds.max[2] {
                let seed = [z, y, x];
                if data[seed] != region_id || visited[bounds.local(seed)] {
                    continue;
                }

                // Breadth-first fill. Positions are recorded only while the
                // component is still small enough to be removed.
                frontier.push_back(seed);
                visited[bounds.local(seed)] = true;
                let mut size = 0;
                let mut members = Some(Vec::new());
                while let Some(current) = frontier.pop_front() {
                    size += 1;
                    if size >= min_size {
                        members = None;
                    } else if let Some(members) = members.as_mut() {
                        members.push(current);
                    }
                    for &offset in offsets {
                        let Some(neighbor) = bounds.step(current, offset) else {
                            continue;
                        };
                        let local = bounds.local(neighbor);
                        if !visited[local] && data[neighbor] == region_id {
                            visited[local] = true;
                            frontier.push_back(neighbor);
                        }
                    }
                }

                components.push(Component {
                    size,
                    removed_voxels: members,
                });
            }
        }
    }

    components
}

fn region_name<O>(ontology: &O, region_id: RegionId) -> String
where
    O: AtlasOntology + ?Sized,
{
    ontology
        .lookup(region_id)
        .map(|node| node.name.clone())
        .unwrap_or_else(|| format!("Unknown ID {}", region_id))
}

/// Decompose every region into fragments and drop those below `min_size`
///
/// Runs sequentially; see [`analyze_and_prune_with`] for parallel execution.
pub fn analyze_and_prune<O>(
    volume: &LabeledVolume,
    min_size: usize,
    connectivity: Connectivity,
    ontology: &O,
) -> EngineResult<(LabeledVolume, FragmentLedger)>
where
    O: AtlasOntology + ?Sized,
{
    let options = FragmentOptions {
        min_size,
        connectivity,
        execution: Execution::Sequential,
    };
    analyze_and_prune_with(volume, &options, ontology)
}

/// [`analyze_and_prune`] with explicit execution options
///
/// The returned ledger holds one record per component of every region; the
/// sizes of a region's records add up to its voxel count in `volume`.
pub fn analyze_and_prune_with<O>(
    volume: &LabeledVolume,
    options: &FragmentOptions,
    ontology: &O,
) -> EngineResult<(LabeledVolume, FragmentLedger)>
where
    O: AtlasOntology + ?Sized,
{
    let bounds: Vec<(RegionId, RegionBounds)> = region_bounds(volume).into_iter().collect();
    let data = volume.as_array();
    let analyse = |(region_id, region_bounds): &(RegionId, RegionBounds)| {
        (
            *region_id,
            label_region(
                data,
                *region_id,
                region_bounds,
                options.connectivity,
                options.min_size,
            ),
        )
    };

    let per_region: Vec<(RegionId, Vec<Component>)> = match options.execution {
        Execution::Sequential => bounds.iter().map(analyse).collect(),
        #[cfg(feature = "parallel")]
        Execution::Parallel => bounds.par_iter().map(analyse).collect(),
        #[cfg(not(feature = "parallel"))]
        Execution::Parallel => {
            debug!("Built without the `parallel` feature; analysing regions sequentially");
            bounds.iter().map(analyse).collect()
        }
    };

    let mut output = volume.clone();
    let mut ledger = FragmentLedger::new();
    for (region_id, components) in per_region {
        let name = region_name(ontology, region_id);
        let removed_count = components.iter().filter(|c| c.removed_voxels.is_some()).count();
        debug!(
            region_id,
            fragments = components.len(),
            removed = removed_count,
            "Analysed region"
        );

        for (position, component) in components.into_iter().enumerate() {
            let removed = match &component.removed_voxels {
                Some(voxels) => {
                    for &voxel in voxels {
                        output.set(voxel, BACKGROUND);
                    }
                    true
                }
                None => false,
            };
            ledger.push(FragmentRecord {
                region_id,
                region_name: name.clone(),
                fragment_index: position as u32 + 1,
                size_voxels: component.size,
                removed,
            });
        }
    }

    info!(
        regions = ledger.region_count(),
        fragments = ledger.len(),
        removed_fragments = ledger.removed_count(),
        removed_voxels = ledger.removed_voxels(),
        min_size = options.min_size,
        connectivity = %options.connectivity,
        "Fragment analysis complete"
    );

    Ok((output, ledger))
}
