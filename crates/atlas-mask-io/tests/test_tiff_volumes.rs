// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! TIFF stacks in and out of a pipeline run

use atlas_mask_engine::{run_pipeline, LabeledVolume, PipelineOptions};
use atlas_mask_io::{
    load_tiff, load_volume, partial_path, save_outputs, save_tiff, OutputPaths, SpatialMetadata,
    VolumeIoError, VoxelData,
};
use atlas_mask_ontology::{RegionHierarchy, RegionNode};
use ndarray::Array3;
use tempfile::TempDir;

fn ontology() -> RegionHierarchy {
    let mut hierarchy = RegionHierarchy::new();
    hierarchy
        .add_region(RegionNode::new(997, "root", "root"), None)
        .unwrap();
    hierarchy
        .add_region(RegionNode::new(512, "CB", "Cerebellum"), Some(997))
        .unwrap();
    hierarchy
        .add_region(RegionNode::new(528, "CBX", "Cerebellar cortex"), Some(512))
        .unwrap();
    hierarchy
}

fn tiff_paths(dir: &TempDir) -> OutputPaths {
    OutputPaths {
        volume: dir.path().join("adjusted_mask.tiff"),
        whole_mask: dir.path().join("whole_brain_mask.tiff"),
        catalog: dir.path().join("used_region_ids.csv"),
        fragment_report: dir.path().join("region_fragments_with_sizes.csv"),
        summary: None,
    }
}

#[test]
fn registered_stack_runs_end_to_end() {
    let dir = TempDir::new().unwrap();
    let input_path = dir.path().join("registered_atlas_original_orientation.tiff");
    // Two slices: CBX and CB voxels plus background
    let input = Array3::from_shape_vec(
        (2, 2, 2),
        vec![
            528, 528, 0, 512, //
            0, 528, 0, 0,
        ],
    )
    .unwrap();
    save_tiff(&input_path, VoxelData::U16(&input)).unwrap();

    let (volume, spatial) = load_volume(&input_path).unwrap();
    assert_eq!(volume.shape(), (2, 2, 2));
    assert_eq!(spatial, SpatialMetadata::default());

    let options = PipelineOptions {
        flatten: vec!["CB".to_string()],
        min_size: 1,
        ..PipelineOptions::default()
    };
    let output = run_pipeline(&volume, &ontology(), &options).unwrap();
    let paths = tiff_paths(&dir);
    save_outputs(&output, &paths, &spatial).unwrap();

    let simplified = load_tiff(&paths.volume).unwrap();
    assert_eq!(
        simplified.as_array().iter().copied().collect::<Vec<_>>(),
        vec![512, 512, 0, 512, 0, 512, 0, 0]
    );
    let mask = load_tiff(&paths.whole_mask).unwrap();
    assert_eq!(mask.count_nonzero(), 4);
    assert_eq!(mask.max_id(), 1);
}

#[test]
fn uint8_and_uint32_stacks_are_read() {
    let dir = TempDir::new().unwrap();

    let narrow = Array3::from_shape_vec((1, 1, 3), vec![0u8, 7, 255]).unwrap();
    let narrow_path = dir.path().join("narrow.tif");
    save_tiff(&narrow_path, VoxelData::U8(&narrow)).unwrap();
    let (loaded, _) = load_volume(&narrow_path).unwrap();
    assert_eq!(loaded.as_array().iter().copied().collect::<Vec<_>>(), vec![0, 7, 255]);

    let wide = LabeledVolume::from_shape_vec((3, 1, 1), vec![0, 70_000, 5]).unwrap();
    let wide_path = dir.path().join("wide.TIFF");
    save_tiff(&wide_path, VoxelData::U32(wide.as_array())).unwrap();
    let (loaded, _) = load_volume(&wide_path).unwrap();
    assert_eq!(loaded, wide);
}

#[test]
fn mixed_formats_and_unknown_extensions() {
    let dir = TempDir::new().unwrap();
    let volume = LabeledVolume::from_shape_vec((1, 1, 2), vec![528, 0]).unwrap();
    let options = PipelineOptions {
        min_size: 1,
        ..PipelineOptions::default()
    };
    let output = run_pipeline(&volume, &ontology(), &options).unwrap();

    let mut paths = tiff_paths(&dir);
    paths.whole_mask = dir.path().join("whole_brain_mask.nrrd");
    save_outputs(&output, &paths, &SpatialMetadata::default()).unwrap();
    assert_eq!(load_volume(&paths.whole_mask).unwrap().0.count_nonzero(), 1);
    assert_eq!(load_volume(&paths.volume).unwrap().0.get([0, 0, 0]), Some(528));

    let mut unknown = tiff_paths(&dir);
    unknown.volume = dir.path().join("adjusted_mask.png");
    assert!(matches!(
        save_outputs(&output, &unknown, &SpatialMetadata::default()),
        Err(VolumeIoError::UnsupportedFormat(_))
    ));
    assert!(!unknown.volume.exists());
    assert!(!partial_path(&unknown.catalog).exists());
}
