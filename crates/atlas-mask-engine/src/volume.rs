// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! Labeled volume container
//!
//! A [`LabeledVolume`] is a 3-D array of region ids in `[z, y, x]` order
//! where 0 is background. Stages never mutate their input: every rewrite
//! produces a new volume.

use ndarray::Array3;
use std::collections::{BTreeMap, BTreeSet};

use crate::types::{EngineError, EngineResult, RegionId, BACKGROUND};

/// 3-D array of region ids, `0` = background
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledVolume {
    data: Array3<RegionId>,
}

impl LabeledVolume {
    /// Wrap an array (any memory layout; traversal is always logical C order)
    pub fn new(data: Array3<RegionId>) -> Self {
        Self { data }
    }

    /// All-background volume of the given `(z, y, x)` shape
    pub fn zeros(shape: (usize, usize, usize)) -> Self {
        Self::new(Array3::zeros(shape))
    }

    /// Build from a flat C-order buffer
    pub fn from_shape_vec(
        shape: (usize, usize, usize),
        values: Vec<RegionId>,
    ) -> EngineResult<Self> {
        let expected = shape.0 * shape.1 * shape.2;
        let actual = values.len();
        Array3::from_shape_vec(shape, values)
            .map(Self::new)
            .map_err(|e| {
                EngineError::MalformedInput(format!(
                    "shape {:?} needs {} voxels, got {}: {}",
                    shape, expected, actual, e
                ))
            })
    }

    /// `(z, y, x)` extent
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Number of voxels
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_array(&self) -> &Array3<RegionId> {
        &self.data
    }

    pub fn into_array(self) -> Array3<RegionId> {
        self.data
    }

    /// Voxel value at `[z, y, x]`, `None` when out of bounds
    pub fn get(&self, index: [usize; 3]) -> Option<RegionId> {
        self.data.get(index).copied()
    }

    pub(crate) fn set(&mut self, index: [usize; 3], value: RegionId) {
        self.data[index] = value;
    }

    /// Number of non-background voxels
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|&&v| v != BACKGROUND).count()
    }

    /// Number of voxels carrying exactly `id`
    pub fn count_id(&self, id: RegionId) -> usize {
        self.data.iter().filter(|&&v| v == id).count()
    }

    /// Distinct non-background ids, ascending
    pub fn distinct_ids(&self) -> BTreeSet<RegionId> {
        self.data
            .iter()
            .copied()
            .filter(|&v| v != BACKGROUND)
            .collect()
    }

    /// Voxel count per non-background id, ascending by id
    pub fn voxel_counts(&self) -> BTreeMap<RegionId, usize> {
        let mut counts = BTreeMap::new();
        for &value in self.data.iter().filter(|&&v| v != BACKGROUND) {
            *counts.entry(value).or_insert(0) += 1;
        }
        counts
    }

    /// Largest id present (0 for an all-background volume)
    pub fn max_id(&self) -> RegionId {
        self.data.iter().copied().max().unwrap_or(BACKGROUND)
    }

    /// New volume with every voxel passed through `relabel`
    pub fn map_ids<F>(&self, relabel: F) -> LabeledVolume
    where
        F: Fn(RegionId) -> RegionId,
    {
        Self::new(self.data.mapv(relabel))
    }

    /// Fixed-width export for the downstream visualization format
    ///
    /// # Errors
    ///
    /// `MalformedInput` if any voxel exceeds `u16::MAX`.
    pub fn to_u16(&self) -> EngineResult<Array3<u16>> {
        let max = self.max_id();
        if max > RegionId::from(u16::MAX) {
            return Err(EngineError::MalformedInput(format!(
                "voxel value {} does not fit into 16 bits; compact the id space first",
                max
            )));
        }
        Ok(self.data.mapv(|v| v as u16))
    }

    /// Binary QC mask (`1` where labeled), see [`crate::mask::build_whole_volume_mask`]
    pub fn to_u8_mask(&self) -> Array3<u8> {
        crate::mask::build_whole_volume_mask(self)
    }

    /// Check that another volume covers the same raster
    pub fn ensure_same_shape(&self, other_shape: (usize, usize, usize)) -> EngineResult<()> {
        if self.shape() != other_shape {
            return Err(EngineError::MalformedInput(format!(
                "shape mismatch: expected {:?}, got {:?}",
                self.shape(),
                other_shape
            )));
        }
        Ok(())
    }
}

impl From<Array3<RegionId>> for LabeledVolume {
    fn from(data: Array3<RegionId>) -> Self {
        Self::new(data)
    }
}
