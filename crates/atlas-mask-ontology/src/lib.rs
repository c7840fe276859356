// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

/*!
# Atlas Mask Ontology

Read-only view over a hierarchical anatomical region tree.

Every stage of the mask pipeline that needs id, acronym or hierarchy
information goes through the [`AtlasOntology`] trait. The ontology is loaded
once before a run and never mutated while the pipeline holds it.

- [`RegionHierarchy`]: in-memory tree with id and acronym indices
- [`RegionHierarchy::from_structures_json`]: loader for BrainGlobe `structures.json`

Licensed under the Apache License, Version 2.0
*/

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod adapter;
pub mod hierarchy;
pub mod structures;
pub mod types;

pub use adapter::AtlasOntology;
pub use hierarchy::RegionHierarchy;
pub use structures::StructureRecord;
pub use types::{OntologyError, OntologyResult, RegionId, RegionNode};
