// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! Glue between the configuration file and the pipeline
//!
//! Exposed as a library so the binary's translation steps can be tested.

use std::path::PathBuf;

use atlas_mask_config::AtlasMaskConfig;
use atlas_mask_engine::{EngineResult, Execution, PipelineOptions};
use atlas_mask_io::OutputPaths;
use atlas_mask_observability::LoggingConfig;

/// Split `--debug-*` flags from the arguments clap should see
pub fn split_debug_args<I>(args: I) -> (Vec<String>, Vec<String>)
where
    I: IntoIterator<Item = String>,
{
    args.into_iter().partition(|arg| arg.starts_with("--debug-"))
}

/// Pipeline options from a validated configuration
///
/// # Errors
///
/// `MalformedInput` for enumerated settings that do not parse.
pub fn pipeline_options(config: &AtlasMaskConfig) -> EngineResult<PipelineOptions> {
    Ok(PipelineOptions {
        flatten: config.regions.flatten.clone(),
        flatten_at_level: config.regions.flatten_at_level.clone(),
        level: config.regions.level,
        exclude: config.regions.exclude.clone(),
        recursive_exclusion: config.regions.recursive_exclusion,
        exclusion_order: config.regions.exclusion_order.parse()?,
        min_size: config.fragments.min_size,
        connectivity: config.fragments.connectivity.parse()?,
        execution: if config.fragments.parallel {
            Execution::Parallel
        } else {
            Execution::Sequential
        },
        max_value: config.compaction.max_value,
        lookup_order: config.catalog.lookup_order.parse()?,
        unknown_ids: config.validation.unknown_ids.parse()?,
    })
}

/// Artifact locations, resolved against `paths.data_dir`
pub fn output_paths(config: &AtlasMaskConfig) -> OutputPaths {
    let paths = &config.paths;
    OutputPaths {
        volume: paths.resolve(&paths.output_volume),
        whole_mask: paths.resolve(&paths.whole_volume_mask),
        catalog: paths.resolve(&paths.region_catalog),
        fragment_report: paths.resolve(&paths.fragment_report),
        summary: paths.summary.as_ref().map(|p| paths.resolve(p)),
    }
}

pub fn input_paths(config: &AtlasMaskConfig) -> (PathBuf, PathBuf) {
    let paths = &config.paths;
    (
        paths.resolve(&paths.input_volume),
        paths.resolve(&paths.ontology),
    )
}

pub fn logging_config(config: &AtlasMaskConfig) -> LoggingConfig {
    LoggingConfig {
        level: config.logging.level.clone(),
        file_logging: config.logging.file_logging,
        log_dir: config.logging.log_dir.clone(),
        retention_days: config.logging.retention_days,
        retention_runs: config.logging.retention_runs,
        ..LoggingConfig::default()
    }
}
