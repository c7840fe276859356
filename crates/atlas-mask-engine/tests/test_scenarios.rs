// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! End-to-end behaviour of the individual stages on small hand-built volumes

mod common;

use atlas_mask_engine::{
    analyze_and_prune, build_catalog, compact, descendants_at_depth, exclude_regions,
    exclude_regions_recursive, flatten_at_level, flatten_full, Connectivity, EngineError,
    IdRemapping, LabeledVolume, TableRow,
};

fn ids(volume: &LabeledVolume) -> Vec<u32> {
    volume.as_array().iter().copied().collect()
}

// =============================================================================
// Flattening
// =============================================================================

#[test]
fn flatten_full_collapses_subtree_into_parent() {
    let ontology = common::atlas();
    let volume = LabeledVolume::from_shape_vec((2, 2, 2), vec![5, 6, 7, 61, 0, 6, 7, 0]).unwrap();

    let flattened = flatten_full(&volume, &ontology, &["P"]).unwrap();

    assert!(ids(&flattened).iter().all(|&v| v == 0 || v == 5));
    assert_eq!(flattened.count_nonzero(), volume.count_nonzero());
}

#[test]
fn flatten_at_level_keeps_direct_children() {
    let ontology = common::atlas();
    let volume = LabeledVolume::from_shape_vec((1, 2, 3), vec![6, 61, 7, 0, 61, 7]).unwrap();

    let flattened = flatten_at_level(&volume, &ontology, &["P"], 1).unwrap();

    assert_eq!(ids(&flattened), vec![6, 6, 7, 0, 6, 7]);
    let present = flattened.distinct_ids();
    assert!(!present.contains(&61));
    assert!(!present.contains(&5));
}

#[test]
fn descendants_at_depth_skips_short_branches() {
    let ontology = common::atlas();

    // B (7) is a leaf at depth 1 under P and must not be padded in at depth 2
    assert_eq!(descendants_at_depth(&ontology, 5, 2).unwrap(), vec![61]);
    assert_eq!(descendants_at_depth(&ontology, 8, 2).unwrap(), vec![6, 7, 21, 22]);
    assert_eq!(
        descendants_at_depth(&ontology, 5, 0),
        Err(EngineError::InvalidDepth { depth: 0 })
    );
}

#[test]
fn flatten_rejects_unknown_and_nested_acronyms() {
    let ontology = common::atlas();
    let volume = LabeledVolume::from_shape_vec((1, 1, 2), vec![6, 61]).unwrap();

    assert_eq!(
        flatten_full(&volume, &ontology, &["nope"]),
        Err(EngineError::RegionNotFound("nope".to_string()))
    );
    assert!(matches!(
        flatten_full(&volume, &ontology, &["P", "A"]),
        Err(EngineError::MalformedInput(_))
    ));
}

// =============================================================================
// Exclusion
// =============================================================================

#[test]
fn exclusion_is_exact_unless_recursive() {
    let ontology = common::atlas();
    let volume = LabeledVolume::from_shape_vec((1, 1, 4), vec![1009, 967, 6, 1009]).unwrap();

    let exact = exclude_regions(&volume, &ontology, &["fiber tracts"]).unwrap();
    assert_eq!(ids(&exact), vec![0, 967, 6, 0]);

    let recursive = exclude_regions_recursive(&volume, &ontology, &["fiber tracts"]).unwrap();
    assert_eq!(ids(&recursive), vec![0, 0, 6, 0]);
}

// =============================================================================
// Fragments
// =============================================================================

#[test]
fn two_small_blobs_are_both_removed() {
    let ontology = common::atlas();
    let volume =
        LabeledVolume::from_shape_vec((1, 1, 7), vec![9, 9, 9, 0, 9, 9, 9]).unwrap();

    let (pruned, ledger) = analyze_and_prune(&volume, 5, Connectivity::Face, &ontology).unwrap();

    assert_eq!(pruned.count_id(9), 0);
    let records: Vec<_> = ledger.fragments_for(9).collect();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.removed && r.size_voxels == 3));
    assert_eq!(records[0].fragment_index, 1);
    assert_eq!(records[1].fragment_index, 2);
    assert_eq!(records[0].region_name, "Unknown ID 9");
}

#[test]
fn fragment_table_has_fixed_columns() {
    let ontology = common::atlas();
    let volume = LabeledVolume::from_shape_vec((1, 1, 3), vec![6, 0, 6]).unwrap();
    let (_, ledger) = analyze_and_prune(&volume, 2, Connectivity::Full, &ontology).unwrap();

    let table = ledger.to_table();
    assert_eq!(
        atlas_mask_engine::FragmentRow::columns(),
        &["region_id", "region_name", "fragment_index", "fragment_size_voxels", "removed"]
    );
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[1].cells(), vec!["6", "Child A", "2", "1", "True"]);
}

// =============================================================================
// Compaction and catalog
// =============================================================================

#[test]
fn overflow_ids_take_lowest_free_slots() {
    let volume =
        LabeledVolume::from_shape_vec((1, 1, 4), vec![80_000, 70_000, 0, 70_000]).unwrap();

    let (compacted, remapping) = compact(&volume, 65_535).unwrap();

    assert_eq!(remapping.forward(70_000), Some(1));
    assert_eq!(remapping.forward(80_000), Some(2));
    assert_eq!(remapping.reverse(1), Some(70_000));
    assert_eq!(remapping.reverse(2), Some(80_000));
    assert_eq!(ids(&compacted), vec![2, 1, 0, 1]);
}

#[test]
fn exhausted_id_space_leaves_input_alone() {
    let volume = LabeledVolume::from_shape_vec((1, 1, 3), vec![1, 2, 9]).unwrap();
    let before = volume.clone();

    assert_eq!(
        compact(&volume, 2),
        Err(EngineError::IdSpaceExhausted { overflow: 1, free: 0 })
    );
    assert_eq!(volume, before);
}

#[test]
fn catalog_resolves_through_reverse_remap() {
    let ontology = common::atlas();
    // 3 is the compacted form of 967 (cm); 4 has no origin at all
    let volume = LabeledVolume::from_shape_vec((1, 1, 4), vec![6, 3, 4, 0]).unwrap();
    let remapping = IdRemapping::from_pairs([(967, 3)]).unwrap();

    let catalog = build_catalog(&volume, &ontology, &remapping);
    let rows: Vec<(u32, &str)> = catalog
        .rows()
        .iter()
        .map(|r| (r.region_id, r.region_acronym.as_str()))
        .collect();

    assert_eq!(rows, vec![(3, "cm"), (4, "Unknown"), (6, "A")]);
}
