// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! ID-Space Compactor
//!
//! Moves ids above `max_value` onto unused ids in `[1, max_value]` so the
//! volume fits a fixed-width voxel format. Overflow ids are taken in ascending
//! order and paired with free ids in ascending order.

use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::remap::IdRemapping;
use crate::types::{EngineError, EngineResult, RegionId, BACKGROUND};
use crate::volume::LabeledVolume;

/// Renumber overflow ids into free slots of `[1, max_value]`
///
/// # Errors
///
/// - `MalformedInput` if `max_value` is 0
/// - `IdSpaceExhausted` if there are more overflow ids than free slots; the
///   input volume is untouched and no output is produced
pub fn compact(
    volume: &LabeledVolume,
    max_value: RegionId,
) -> EngineResult<(LabeledVolume, IdRemapping)> {
    if max_value == BACKGROUND {
        return Err(EngineError::MalformedInput(
            "max_value must be at least 1".to_string(),
        ));
    }

    let present: BTreeSet<RegionId> = volume.distinct_ids();
    let overflow: Vec<RegionId> = present
        .iter()
        .copied()
        .filter(|&id| id > max_value)
        .collect();

    if overflow.is_empty() {
        debug!(max_value, "No overflow ids; volume already fits");
        return Ok((volume.clone(), IdRemapping::new()));
    }

    let used_in_range = present.range(..=max_value).count();
    let free = max_value as usize - used_in_range;
    if overflow.len() > free {
        return Err(EngineError::IdSpaceExhausted {
            overflow: overflow.len(),
            free,
        });
    }

    let free_ids = (1..=max_value).filter(|id| !present.contains(id));
    let remapping = IdRemapping::from_pairs(overflow.iter().copied().zip(free_ids))?;
    remapping.validate()?;

    let output = volume.map_ids(|v| remapping.forward(v).unwrap_or(v));
    for (old_id, new_id) in remapping.iter() {
        debug!(old_id, new_id, "Remapped overflow id");
    }
    info!(
        remapped = remapping.len(),
        max_value,
        "Compacted id space"
    );

    Ok((output, remapping))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{row, values};
    use crate::types::DEFAULT_MAX_VALUE;

    #[test]
    fn test_overflow_ids_take_lowest_free_slots() {
        let volume = row(&[80_000, 0, 70_000, 3, 70_000]);

        let (output, remapping) = compact(&volume, DEFAULT_MAX_VALUE).unwrap();

        assert_eq!(remapping.forward(70_000), Some(1));
        assert_eq!(remapping.forward(80_000), Some(2));
        assert_eq!(remapping.reverse(1), Some(70_000));
        assert_eq!(remapping.reverse(2), Some(80_000));
        assert_eq!(values(&output), vec![2, 0, 1, 3, 1]);
    }

    #[test]
    fn test_used_ids_are_skipped() {
        let volume = row(&[1, 2, 4, 100, 200]);

        let (output, remapping) = compact(&volume, 5).unwrap();

        assert_eq!(remapping.iter().collect::<Vec<_>>(), vec![(100, 3), (200, 5)]);
        assert_eq!(values(&output), vec![1, 2, 4, 3, 5]);
    }

    #[test]
    fn test_no_overflow_is_identity() {
        let volume = row(&[1, 2, 0]);
        let (output, remapping) = compact(&volume, DEFAULT_MAX_VALUE).unwrap();

        assert!(remapping.is_empty());
        assert_eq!(output, volume);
    }

    #[test]
    fn test_exhausted_id_space() {
        let volume = row(&[1, 2, 10, 11]);

        let result = compact(&volume, 3);
        assert_eq!(
            result,
            Err(EngineError::IdSpaceExhausted { overflow: 2, free: 1 })
        );
        // Input is untouched
        assert_eq!(values(&volume), vec![1, 2, 10, 11]);
    }

    #[test]
    fn test_zero_max_value_rejected() {
        let volume = row(&[1]);
        assert!(matches!(compact(&volume, 0), Err(EngineError::MalformedInput(_))));
    }
}
