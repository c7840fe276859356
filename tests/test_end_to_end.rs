// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! Full runs through the umbrella crate: ontology file in, artifacts out

use std::fs;
use std::path::PathBuf;

use atlas_mask::engine::PipelineStage;
use atlas_mask::prelude::*;
use tempfile::TempDir;

const STRUCTURES_JSON: &str = r#"[
  {"id": 997, "acronym": "root", "name": "root", "structure_id_path": [997]},
  {"id": 8, "acronym": "grey", "name": "Basic cell groups and regions", "structure_id_path": [997, 8]},
  {"id": 315, "acronym": "Isocortex", "name": "Isocortex", "structure_id_path": [997, 8, 315]},
  {"id": 68, "acronym": "FRP1", "name": "Frontal pole, layer 1", "structure_id_path": [997, 8, 315, 184, 68]},
  {"id": 184, "acronym": "FRP", "name": "Frontal pole, cerebral cortex", "structure_id_path": [997, 8, 315, 184]},
  {"id": 500, "acronym": "MO", "name": "Somatomotor areas", "structure_id_path": [997, 8, 315, 500]},
  {"id": 985, "acronym": "MOp", "name": "Primary motor area", "structure_id_path": [997, 8, 315, 500, 985]},
  {"id": 512, "acronym": "CB", "name": "Cerebellum", "structure_id_path": [997, 8, 512]},
  {"id": 528, "acronym": "CBX", "name": "Cerebellar cortex", "structure_id_path": [997, 8, 512, 528]},
  {"id": 1009, "acronym": "fiber tracts", "name": "fiber tracts", "structure_id_path": [997, 1009]}
]"#;

fn load_ontology(dir: &TempDir) -> RegionHierarchy {
    let path = dir.path().join("structures.json");
    fs::write(&path, STRUCTURES_JSON).unwrap();
    RegionHierarchy::from_structures_json(&path).unwrap()
}

/// One coronal slice:
///
/// ```text
/// FRP1 FRP1 .    MOp  MOp  MOp
/// FRP1 .    .    .    .    ft
/// .    .    CBX  CBX  .    ft
/// FRP1 .    CBX  .    .    .
/// ```
fn slice() -> LabeledVolume {
    LabeledVolume::from_shape_vec(
        (1, 4, 6),
        vec![
            68, 68, 0, 985, 985, 985, //
            68, 0, 0, 0, 0, 1009, //
            0, 0, 528, 528, 0, 1009, //
            68, 0, 528, 0, 0, 0,
        ],
    )
    .unwrap()
}

fn options() -> PipelineOptions {
    PipelineOptions {
        flatten: vec!["CB".to_string()],
        flatten_at_level: vec!["Isocortex".to_string()],
        level: 1,
        exclude: vec!["fiber tracts".to_string()],
        min_size: 2,
        ..PipelineOptions::default()
    }
}

fn output_paths(dir: &TempDir) -> OutputPaths {
    let out: PathBuf = dir.path().join("out");
    OutputPaths {
        volume: out.join("adjusted_mask.nrrd"),
        whole_mask: out.join("whole_brain_mask.nrrd"),
        catalog: out.join("used_region_ids.csv"),
        fragment_report: out.join("region_fragments_with_sizes.csv"),
        summary: None,
    }
}

#[test]
fn test_simplified_volume_uses_coarse_regions() {
    let dir = TempDir::new().unwrap();
    let ontology = load_ontology(&dir);
    let output = run_pipeline(&slice(), &ontology, &options()).unwrap();

    assert_eq!(
        output.volume.as_array().iter().copied().collect::<Vec<_>>(),
        vec![
            184, 184, 0, 500, 500, 500, //
            184, 0, 0, 0, 0, 0, //
            0, 0, 512, 512, 0, 0, //
            0, 0, 512, 0, 0, 0,
        ]
    );
    assert_eq!(output.whole_mask.iter().filter(|&&v| v == 1).count(), 12);
    assert!(output.remapping.is_empty());
}

#[test]
fn test_stage_voxel_counts_are_tracked() {
    let dir = TempDir::new().unwrap();
    let ontology = load_ontology(&dir);
    let output = run_pipeline(&slice(), &ontology, &options()).unwrap();
    let summary = &output.summary;

    assert_eq!(summary.input_voxels, 12);
    assert_eq!(summary.voxels_after(PipelineStage::FlattenAtLevel), Some(12));
    assert_eq!(summary.voxels_after(PipelineStage::Exclude), Some(10));
    assert_eq!(summary.voxels_after(PipelineStage::Fragments), Some(9));
    assert_eq!(summary.removed_fragments, 1);
    assert_eq!(summary.removed_voxels, 1);
    assert_eq!(summary.output_regions, 3);
}

#[test]
fn test_artifacts_are_written_together() {
    let dir = TempDir::new().unwrap();
    let ontology = load_ontology(&dir);
    let output = run_pipeline(&slice(), &ontology, &options()).unwrap();
    let paths = output_paths(&dir);

    let published = save_outputs(&output, &paths, &SpatialMetadata::default()).unwrap();
    assert_eq!(published.len(), 4);

    let (volume, _) = load_nrrd(&paths.volume).unwrap();
    assert_eq!(volume, output.volume);

    let catalog = fs::read_to_string(&paths.catalog).unwrap();
    assert_eq!(
        catalog,
        "region_id,region_name,region_acronym\n\
         184,\"Frontal pole, cerebral cortex\",FRP\n\
         500,Somatomotor areas,MO\n\
         512,Cerebellum,CB\n"
    );

    let report = fs::read_to_string(&paths.fragment_report).unwrap();
    assert_eq!(
        report.lines().skip(1).collect::<Vec<_>>(),
        vec![
            "184,\"Frontal pole, cerebral cortex\",1,3,False",
            "184,\"Frontal pole, cerebral cortex\",2,1,True",
            "500,Somatomotor areas,1,3,False",
            "512,Cerebellum,1,3,False",
        ]
    );

    let leftovers: Vec<_> = fs::read_dir(dir.path().join("out"))
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".partial"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_unknown_acronym_names_the_failing_stage() {
    let dir = TempDir::new().unwrap();
    let ontology = load_ontology(&dir);
    let options = PipelineOptions {
        exclude: vec!["VS".to_string()],
        ..options()
    };

    let err = run_pipeline(&slice(), &ontology, &options).unwrap_err();
    assert_eq!(err.stage, PipelineStage::Exclude);
    assert!(err.to_string().contains("VS"));
}
