// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared fixtures for unit tests

use atlas_mask_ontology::{RegionHierarchy, RegionNode};

use crate::volume::LabeledVolume;

/// ```text
/// root(997)
/// ├── P(100)
/// │   ├── A(110)
/// │   │   └── A1(111)
/// │   │       └── A1a(112)
/// │   └── B(120)
/// ├── Q(200)
/// │   └── Q1(210)
/// └── T(300)
///     └── T1(310)
/// ```
pub(crate) fn sample_ontology() -> RegionHierarchy {
    let mut hierarchy = RegionHierarchy::new();
    let regions: [(u32, &str, &str, Option<u32>); 10] = [
        (997, "root", "root", None),
        (100, "P", "Parent region", Some(997)),
        (110, "A", "Area A", Some(100)),
        (111, "A1", "Area A layer 1", Some(110)),
        (112, "A1a", "Area A layer 1a", Some(111)),
        (120, "B", "Area B", Some(100)),
        (200, "Q", "Region Q", Some(997)),
        (210, "Q1", "Region Q part 1", Some(200)),
        (300, "T", "tracts", Some(997)),
        (310, "T1", "tract 1", Some(300)),
    ];
    for (id, acronym, name, parent) in regions {
        hierarchy
            .add_region(RegionNode::new(id, acronym, name), parent)
            .unwrap();
    }
    hierarchy
}

/// Single-row volume, handy for relabeling tests
pub(crate) fn row(values: &[u32]) -> LabeledVolume {
    LabeledVolume::from_shape_vec((1, 1, values.len()), values.to_vec()).unwrap()
}

pub(crate) fn values(volume: &LabeledVolume) -> Vec<u32> {
    volume.as_array().iter().copied().collect()
}
