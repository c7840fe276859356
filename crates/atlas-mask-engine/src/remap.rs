// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! Paired forward/reverse id mapping
//!
//! Both directions live in one structure and are only ever extended together,
//! so they cannot drift apart.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{EngineError, EngineResult, RegionId};

/// Bijection between the overflow ids of a volume and their replacements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRemapping {
    forward: BTreeMap<RegionId, RegionId>,
    reverse: BTreeMap<RegionId, RegionId>,
}

impl IdRemapping {
    /// Empty mapping (nothing was remapped)
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(old_id, new_id)` pairs
    ///
    /// # Errors
    ///
    /// `MalformedInput` if an old id or a new id appears twice.
    pub fn from_pairs<I>(pairs: I) -> EngineResult<Self>
    where
        I: IntoIterator<Item = (RegionId, RegionId)>,
    {
        let mut remapping = Self::new();
        for (old_id, new_id) in pairs {
            remapping.insert(old_id, new_id)?;
        }
        Ok(remapping)
    }

    fn insert(&mut self, old_id: RegionId, new_id: RegionId) -> EngineResult<()> {
        if let Some(existing) = self.forward.get(&old_id) {
            return Err(EngineError::MalformedInput(format!(
                "id {} is already mapped to {}",
                old_id, existing
            )));
        }
        if let Some(existing) = self.reverse.get(&new_id) {
            return Err(EngineError::MalformedInput(format!(
                "target id {} is already taken by {}",
                new_id, existing
            )));
        }
        self.forward.insert(old_id, new_id);
        self.reverse.insert(new_id, old_id);
        Ok(())
    }

    /// New id assigned to an overflow id
    pub fn forward(&self, old_id: RegionId) -> Option<RegionId> {
        self.forward.get(&old_id).copied()
    }

    /// Original id behind a remapped id
    pub fn reverse(&self, new_id: RegionId) -> Option<RegionId> {
        self.reverse.get(&new_id).copied()
    }

    pub fn forward_map(&self) -> &BTreeMap<RegionId, RegionId> {
        &self.forward
    }

    pub fn reverse_map(&self) -> &BTreeMap<RegionId, RegionId> {
        &self.reverse
    }

    /// `(old_id, new_id)` pairs, ascending by old id
    pub fn iter(&self) -> impl Iterator<Item = (RegionId, RegionId)> + '_ {
        self.forward.iter().map(|(&old, &new)| (old, new))
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Check that the two directions are exact inverses
    pub fn validate(&self) -> EngineResult<()> {
        if self.forward.len() != self.reverse.len() {
            return Err(EngineError::MalformedInput(format!(
                "remapping has {} forward but {} reverse entries",
                self.forward.len(),
                self.reverse.len()
            )));
        }
        for (&old_id, &new_id) in &self.forward {
            if self.reverse.get(&new_id) != Some(&old_id) {
                return Err(EngineError::MalformedInput(format!(
                    "remapping is not invertible at {} -> {}",
                    old_id, new_id
                )));
            }
        }
        Ok(())
    }
}
