// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Ontology Loading Tests
//!
//! Loads a small excerpt shaped like a BrainGlobe mouse atlas
//! `structures.json` and checks lookups the pipeline relies on:
//! - acronyms containing spaces ("fiber tracts")
//! - descendant enumeration across several levels
//! - error reporting for broken files

use std::io::Write;

use atlas_mask_ontology::{AtlasOntology, OntologyError, RegionHierarchy};
use tempfile::NamedTempFile;

const EXCERPT: &str = r#"[
  {"acronym": "root", "id": 997, "name": "root", "structure_id_path": [997], "rgb_triplet": [255, 255, 255]},
  {"acronym": "grey", "id": 8, "name": "Basic cell groups and regions", "structure_id_path": [997, 8], "rgb_triplet": [191, 218, 227]},
  {"acronym": "fiber tracts", "id": 1009, "name": "fiber tracts", "structure_id_path": [997, 1009], "rgb_triplet": [204, 204, 204]},
  {"acronym": "cm", "id": 967, "name": "cranial nerves", "structure_id_path": [997, 1009, 967], "rgb_triplet": [204, 204, 204]},
  {"acronym": "In", "id": 901, "name": "olfactory nerve", "structure_id_path": [997, 1009, 967, 901], "rgb_triplet": [204, 204, 204]},
  {"acronym": "CB", "id": 512, "name": "Cerebellum", "structure_id_path": [997, 8, 512], "rgb_triplet": [240, 240, 128]},
  {"acronym": "CBX", "id": 528, "name": "Cerebellar cortex", "structure_id_path": [997, 8, 512, 528], "rgb_triplet": [240, 240, 128]},
  {"acronym": "CBN", "id": 519, "name": "Cerebellar nuclei", "structure_id_path": [997, 8, 512, 519], "rgb_triplet": [240, 179, 128]}
]"#;

fn write_excerpt(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write structures excerpt");
    file
}

#[test]
fn test_load_excerpt_from_disk() {
    let file = write_excerpt(EXCERPT);
    let hierarchy =
        RegionHierarchy::from_structures_json(file.path()).expect("Failed to load excerpt");

    assert_eq!(hierarchy.region_count(), 8);
    assert_eq!(hierarchy.get_root_id(), Some(997));

    let tracts = hierarchy.lookup_by_acronym("fiber tracts");
    assert_eq!(tracts, Some(1009));
    assert_eq!(hierarchy.lookup(901).map(|n| n.name.as_str()), Some("olfactory nerve"));
}

#[test]
fn test_descendants_span_levels() {
    let hierarchy = RegionHierarchy::from_structures_reader(EXCERPT.as_bytes()).unwrap();

    assert_eq!(hierarchy.all_descendants(1009), vec![967, 901]);
    assert_eq!(hierarchy.all_descendants(512), vec![528, 519]);
    assert_eq!(hierarchy.all_descendants(8), vec![512, 528, 519]);
}

#[test]
fn test_unknown_parent_is_reported() {
    let broken = r#"[
      {"acronym": "root", "id": 997, "name": "root", "structure_id_path": [997]},
      {"acronym": "CB", "id": 512, "name": "Cerebellum", "structure_id_path": [997, 8, 512]}
    ]"#;

    let result = RegionHierarchy::from_structures_reader(broken.as_bytes());
    assert!(matches!(
        result,
        Err(OntologyError::MissingParent { child: 512, parent: 8 })
    ));
}

#[test]
fn test_invalid_json_is_reported() {
    let result = RegionHierarchy::from_structures_reader("{ not json".as_bytes());
    assert!(matches!(result, Err(OntologyError::Json(_))));
}
