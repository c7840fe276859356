// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

/*!
Pipeline Runner

Chains the stages in a fixed order:

```text
validate ─► whole-volume mask ─► flatten (full) ─► flatten (at level)
         ─► exclude ─► fragments ─► compact ─► catalog
```

Exclusion can be moved in front of the flatteners with
[`ExclusionOrder::BeforeFlatten`]. Every stage takes the previous volume by
reference and returns a new one, so a failing stage leaves nothing half
written; the caller gets either a full [`PipelineOutput`] or a
[`PipelineError`] naming the stage that failed.
*/

use ndarray::Array3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, info_span};

use atlas_mask_ontology::AtlasOntology;

use crate::catalog::{build_catalog_with, CatalogLookupOrder, RegionCatalog};
use crate::compaction::compact;
use crate::exclusion::{exclude_regions, exclude_regions_recursive};
use crate::flatten::{flatten_at_level, flatten_full};
use crate::fragments::{analyze_and_prune_with, FragmentOptions};
use crate::ledger::FragmentLedger;
use crate::mask::build_whole_volume_mask;
use crate::remap::IdRemapping;
use crate::types::{
    Connectivity, EngineError, EngineResult, Execution, RegionId, DEFAULT_MAX_VALUE,
};
use crate::validation::{validate_region_ids, UnknownIdPolicy};
use crate::volume::LabeledVolume;

/// Where exclusion runs relative to the two flatten stages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionOrder {
    /// Excluded acronyms see flattened ids, so a flattened parent can be
    /// dropped together with everything folded into it
    #[default]
    AfterFlatten,
    BeforeFlatten,
}

impl FromStr for ExclusionOrder {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "after_flatten" => Ok(ExclusionOrder::AfterFlatten),
            "before_flatten" => Ok(ExclusionOrder::BeforeFlatten),
            other => Err(EngineError::MalformedInput(format!(
                "unknown exclusion order '{}'",
                other
            ))),
        }
    }
}

/// Everything a run needs besides the volume and the ontology
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Acronyms whose whole subtree collapses into them
    pub flatten: Vec<String>,
    /// Acronyms flattened below `level`
    pub flatten_at_level: Vec<String>,
    pub level: u32,
    pub exclude: Vec<String>,
    /// Also remove descendants of excluded regions
    pub recursive_exclusion: bool,
    pub exclusion_order: ExclusionOrder,
    pub min_size: usize,
    pub connectivity: Connectivity,
    pub execution: Execution,
    pub max_value: RegionId,
    pub lookup_order: CatalogLookupOrder,
    pub unknown_ids: UnknownIdPolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            flatten: Vec::new(),
            flatten_at_level: Vec::new(),
            level: 1,
            exclude: Vec::new(),
            recursive_exclusion: false,
            exclusion_order: ExclusionOrder::AfterFlatten,
            min_size: 50,
            connectivity: Connectivity::Face,
            execution: Execution::Sequential,
            max_value: DEFAULT_MAX_VALUE,
            lookup_order: CatalogLookupOrder::OntologyFirst,
            unknown_ids: UnknownIdPolicy::Tolerate,
        }
    }
}

impl PipelineOptions {
    fn fragment_options(&self) -> FragmentOptions {
        FragmentOptions {
            min_size: self.min_size,
            connectivity: self.connectivity,
            execution: self.execution,
        }
    }
}

/// Pipeline stages, in the order they can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Validate,
    Mask,
    FlattenFull,
    FlattenAtLevel,
    Exclude,
    Fragments,
    Compact,
    Catalog,
}

impl PipelineStage {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStage::Validate => "validate",
            PipelineStage::Mask => "mask",
            PipelineStage::FlattenFull => "flatten_full",
            PipelineStage::FlattenAtLevel => "flatten_at_level",
            PipelineStage::Exclude => "exclude",
            PipelineStage::Fragments => "fragments",
            PipelineStage::Compact => "compact",
            PipelineStage::Catalog => "catalog",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stage failure; nothing from the run is returned
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: PipelineStage,
    #[source]
    pub source: EngineError,
}

impl PipelineError {
    pub fn new(stage: PipelineStage, source: EngineError) -> Self {
        Self { stage, source }
    }
}

/// Tag an engine result with the stage it came from
trait StageContext<T> {
    fn at(self, stage: PipelineStage) -> Result<T, PipelineError>;
}

impl<T> StageContext<T> for EngineResult<T> {
    fn at(self, stage: PipelineStage) -> Result<T, PipelineError> {
        self.map_err(|source| PipelineError::new(stage, source))
    }
}

/// Labeled voxel count after one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageVoxels {
    pub stage: PipelineStage,
    pub nonzero_voxels: usize,
    pub regions: usize,
}

/// Run statistics, suitable for logging or a JSON report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub shape: [usize; 3],
    pub input_voxels: usize,
    pub input_regions: usize,
    /// Ids tolerated although the ontology does not know them
    pub unknown_ids: Vec<RegionId>,
    pub stages: Vec<StageVoxels>,
    pub fragments: usize,
    pub removed_fragments: usize,
    pub removed_voxels: usize,
    pub remapped_ids: usize,
    pub output_regions: usize,
    pub unknown_catalog_rows: usize,
}

impl PipelineSummary {
    fn record(&mut self, stage: PipelineStage, volume: &LabeledVolume) {
        self.stages.push(StageVoxels {
            stage,
            nonzero_voxels: volume.count_nonzero(),
            regions: volume.distinct_ids().len(),
        });
    }

    /// Voxel count recorded after `stage`, if it ran
    pub fn voxels_after(&self, stage: PipelineStage) -> Option<usize> {
        self.stages
            .iter()
            .find(|entry| entry.stage == stage)
            .map(|entry| entry.nonzero_voxels)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Terminal artifacts of a successful run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub volume: LabeledVolume,
    /// Binary mask of the input volume, for QC only
    pub whole_mask: Array3<u8>,
    pub catalog: RegionCatalog,
    pub ledger: FragmentLedger,
    pub remapping: IdRemapping,
    pub summary: PipelineSummary,
}

/// Run every stage on `volume`
///
/// # Errors
///
/// The first failing stage aborts the run; see [`PipelineError::stage`].
pub fn run_pipeline<O>(
    volume: &LabeledVolume,
    ontology: &O,
    options: &PipelineOptions,
) -> Result<PipelineOutput, PipelineError>
where
    O: AtlasOntology + ?Sized,
{
    let span = info_span!("pipeline", shape = ?volume.shape());
    let _guard = span.enter();

    let (z, y, x) = volume.shape();
    let mut summary = PipelineSummary {
        shape: [z, y, x],
        input_voxels: volume.count_nonzero(),
        input_regions: volume.distinct_ids().len(),
        ..PipelineSummary::default()
    };
    info!(
        voxels = summary.input_voxels,
        regions = summary.input_regions,
        "Starting pipeline"
    );

    let report =
        validate_region_ids(volume, ontology, options.unknown_ids).at(PipelineStage::Validate)?;
    summary.unknown_ids = report.ids();

    let whole_mask = build_whole_volume_mask(volume);
    summary.record(PipelineStage::Mask, volume);

    let mut current = volume.clone();
    if options.exclusion_order == ExclusionOrder::BeforeFlatten {
        current = run_exclusion(&current, ontology, options, &mut summary)?;
    }

    current = flatten_full(&current, ontology, &options.flatten).at(PipelineStage::FlattenFull)?;
    summary.record(PipelineStage::FlattenFull, &current);

    current = flatten_at_level(&current, ontology, &options.flatten_at_level, options.level)
        .at(PipelineStage::FlattenAtLevel)?;
    summary.record(PipelineStage::FlattenAtLevel, &current);

    if options.exclusion_order == ExclusionOrder::AfterFlatten {
        current = run_exclusion(&current, ontology, options, &mut summary)?;
    }

    let (pruned, ledger) = analyze_and_prune_with(&current, &options.fragment_options(), ontology)
        .at(PipelineStage::Fragments)?;
    summary.record(PipelineStage::Fragments, &pruned);
    summary.fragments = ledger.len();
    summary.removed_fragments = ledger.removed_count();
    summary.removed_voxels = ledger.removed_voxels();

    let (compacted, remapping) = compact(&pruned, options.max_value).at(PipelineStage::Compact)?;
    summary.record(PipelineStage::Compact, &compacted);
    summary.remapped_ids = remapping.len();

    let catalog = build_catalog_with(&compacted, ontology, &remapping, options.lookup_order);
    catalog
        .verify_complete(&compacted)
        .at(PipelineStage::Catalog)?;
    summary.output_regions = catalog.len();
    summary.unknown_catalog_rows = catalog.unknown_count();

    info!(
        input_voxels = summary.input_voxels,
        output_voxels = compacted.count_nonzero(),
        input_regions = summary.input_regions,
        output_regions = summary.output_regions,
        removed_fragments = summary.removed_fragments,
        remapped_ids = summary.remapped_ids,
        "Pipeline complete"
    );

    Ok(PipelineOutput {
        volume: compacted,
        whole_mask,
        catalog,
        ledger,
        remapping,
        summary,
    })
}

fn run_exclusion<O>(
    volume: &LabeledVolume,
    ontology: &O,
    options: &PipelineOptions,
    summary: &mut PipelineSummary,
) -> Result<LabeledVolume, PipelineError>
where
    O: AtlasOntology + ?Sized,
{
    let excluded = if options.recursive_exclusion {
        exclude_regions_recursive(volume, ontology, &options.exclude)
    } else {
        exclude_regions(volume, ontology, &options.exclude)
    }
    .at(PipelineStage::Exclude)?;
    summary.record(PipelineStage::Exclude, &excluded);
    Ok(excluded)
}
