// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Atlas Mask
//!
//! Simplifies labeled 3-D brain atlas volumes for downstream modeling. Regions
//! are flattened into coarser ancestors, excluded regions are zeroed, small
//! disconnected fragments are pruned and out-of-range ids are compacted. Every
//! id left in the output volume is described by a region catalog.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! atlas-mask = "0.1"
//! ```
//!
//! ```rust,no_run
//! use atlas_mask::prelude::*;
//! use std::path::Path;
//!
//! let ontology = RegionHierarchy::from_structures_json(Path::new("structures.json"))?;
//! let (volume, _spatial) = load_volume("registered_atlas_original_orientation.tiff")?;
//!
//! let options = PipelineOptions {
//!     flatten: vec!["CB".into(), "HB".into()],
//!     exclude: vec!["fiber tracts".into()],
//!     ..PipelineOptions::default()
//! };
//! let output = run_pipeline(&volume, &ontology, &options)?;
//! println!("{} regions kept", output.catalog.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Feature Flags
//!
//! - **`io`** (default): NRRD and TIFF volume codecs, CSV tables and staged output writes
//! - **`parallel`**: per-region fragment analysis on the rayon thread pool
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Ontology: atlas-mask-ontology                          │
//! │  (region tree, acronym lookup, descendants)             │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Engine: atlas-mask-engine                              │
//! │  (flatten, exclude, fragments, compaction, catalog)     │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  I/O: atlas-mask-io                                     │
//! │  (NRRD/TIFF volumes, CSV tables, staged commits)        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The `atlas-mask` binary (crate `atlas-mask-cli`) wires these together with
//! the TOML configuration loader and logging setup.

pub use atlas_mask_engine as engine;
pub use atlas_mask_ontology as ontology;

#[cfg(feature = "io")]
pub use atlas_mask_io as io;

pub use ndarray;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::engine::{
        build_catalog, compact, descendants_at_depth, exclude_regions, flatten_at_level,
        flatten_full, run_pipeline, Connectivity, EngineError, Execution, FragmentLedger,
        IdRemapping, LabeledVolume, PipelineError, PipelineOptions, PipelineOutput,
        RegionCatalog,
    };
    pub use crate::ontology::{AtlasOntology, RegionHierarchy, RegionId, RegionNode};

    #[cfg(feature = "io")]
    pub use crate::io::{
        load_nrrd, load_volume, save_nrrd, save_outputs, save_tiff, OutputPaths, SpatialMetadata,
    };
}
