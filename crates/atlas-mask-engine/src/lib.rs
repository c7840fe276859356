// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

/*!
# Atlas Mask Engine

Simplifies a labeled 3-D atlas volume and keeps its region ids consistent with
the atlas ontology.

## Stages

| Module | Operation |
|---|---|
| [`mask`] | binary QC mask of the whole volume |
| [`exclusion`] | zero out named regions |
| [`flatten`] | merge descendants into an ancestor, fully or below a level |
| [`fragments`] | connected components per region, prune small ones |
| [`compaction`] | move ids above a bound into free ids |
| [`catalog`] | final id → name/acronym table |
| [`ledger`] | per-fragment report |
| [`pipeline`] | all of the above in order |

Every stage borrows its input volume and returns a new one.

## Example

```rust,ignore
use atlas_mask_engine::{run_pipeline, PipelineOptions};

let options = PipelineOptions {
    flatten: vec!["CB".into(), "HB".into()],
    exclude: vec!["fiber tracts".into()],
    ..PipelineOptions::default()
};
let output = run_pipeline(&volume, &ontology, &options)?;
println!("{}", output.catalog);
```
*/

pub mod catalog;
pub mod compaction;
pub mod exclusion;
pub mod flatten;
pub mod fragments;
pub mod ledger;
pub mod mask;
pub mod pipeline;
pub mod remap;
pub mod table;
pub mod types;
pub mod validation;
pub mod volume;

mod resolve;

#[cfg(test)]
mod test_support;

pub use catalog::{build_catalog, build_catalog_with, CatalogLookupOrder, CatalogRow, RegionCatalog};
pub use compaction::compact;
pub use exclusion::{exclude_regions, exclude_regions_recursive};
pub use flatten::{descendants_at_depth, flatten_at_level, flatten_full};
pub use fragments::{analyze_and_prune, analyze_and_prune_with, FragmentOptions};
pub use ledger::{to_table, FragmentLedger, FragmentRecord, FragmentRow, FragmentTable};
pub use mask::build_whole_volume_mask;
pub use pipeline::{
    run_pipeline, ExclusionOrder, PipelineError, PipelineOptions, PipelineOutput, PipelineStage,
    PipelineSummary, StageVoxels,
};
pub use remap::IdRemapping;
pub use table::{bool_cell, TableRow};
pub use types::{
    Connectivity, EngineError, EngineResult, Execution, RegionId, BACKGROUND, DEFAULT_MAX_VALUE,
};
pub use validation::{validate_region_ids, UnknownIdPolicy, UnknownIdReport};
pub use volume::LabeledVolume;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
