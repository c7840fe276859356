// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! Ontology fixture shared by the integration tests

use atlas_mask_ontology::{RegionHierarchy, RegionNode};

/// ```text
/// root(997)
/// ├── grey(8)
/// │   ├── P(5)
/// │   │   ├── A(6)
/// │   │   │   └── A1(61)
/// │   │   └── B(7)
/// │   └── Q(20)
/// │       ├── Q1(21)
/// │       └── Q2(22)
/// └── fiber tracts(1009)
///     └── cm(967)
/// ```
pub fn atlas() -> RegionHierarchy {
    let mut hierarchy = RegionHierarchy::new();
    let regions: [(u32, &str, &str, Option<u32>); 11] = [
        (997, "root", "root", None),
        (8, "grey", "Basic cell groups and regions", Some(997)),
        (5, "P", "Parent", Some(8)),
        (6, "A", "Child A", Some(5)),
        (61, "A1", "Grandchild A1", Some(6)),
        (7, "B", "Child B", Some(5)),
        (20, "Q", "Region Q", Some(8)),
        (21, "Q1", "Region Q one", Some(20)),
        (22, "Q2", "Region Q two", Some(20)),
        (1009, "fiber tracts", "fiber tracts", Some(997)),
        (967, "cm", "cranial nerves", Some(1009)),
    ];
    for (id, acronym, name, parent) in regions {
        hierarchy
            .add_region(RegionNode::new(id, acronym, name), parent)
            .expect("fixture ontology is well formed");
    }
    hierarchy
}

/// Ids that appear in generated volumes (0 is background)
#[allow(dead_code)]
pub const KNOWN_IDS: [u32; 11] = [0, 5, 6, 61, 7, 20, 21, 22, 1009, 967, 8];
