// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn};

use atlas_mask_cli::{input_paths, logging_config, output_paths, pipeline_options, split_debug_args};
use atlas_mask_config::{load_config, validate_config, AtlasMaskConfig, ConfigError};
use atlas_mask_engine::run_pipeline;
use atlas_mask_io::{load_volume, save_outputs};
use atlas_mask_observability::{debug_flags_help, init_logging, CrateDebugFlags, DEBUG_ENV};
use atlas_mask_ontology::RegionHierarchy;

/// Atlas mask simplification - flatten, clean and renumber a registered atlas annotation
#[derive(Parser, Debug)]
#[command(name = "atlas-mask", version, long_about = None, after_help = debug_flags_help())]
struct Args {
    /// Path to atlas_mask.toml (searched for when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base directory for relative input and output paths
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Input annotation volume (.tiff, .tif or .nrrd)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Atlas structures.json
    #[arg(long)]
    ontology: Option<PathBuf>,

    /// Fragments smaller than this many voxels are removed
    #[arg(long)]
    min_size: Option<usize>,

    /// Neighborhood for fragment analysis: face or full
    #[arg(long)]
    connectivity: Option<String>,

    /// Analyse regions on all cores (needs the `parallel` build feature)
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Largest id allowed in the output volume
    #[arg(long)]
    max_value: Option<u32>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Run the pipeline and print the summary without writing any file
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

impl Args {
    /// Overrides in the key format understood by `apply_cli_overrides`
    fn overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        let mut put = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                overrides.insert(key.to_string(), value);
            }
        };
        put("data_dir", self.data_dir.as_ref().map(|p| p.display().to_string()));
        put("input_volume", self.input.as_ref().map(|p| p.display().to_string()));
        put("ontology", self.ontology.as_ref().map(|p| p.display().to_string()));
        put("min_size", self.min_size.map(|v| v.to_string()));
        put("connectivity", self.connectivity.clone());
        put("parallel", self.parallel.then(|| "true".to_string()));
        put("max_value", self.max_value.map(|v| v.to_string()));
        put("log_level", self.log_level.clone());
        overrides
    }
}

/// Load the config file; without an explicit path a missing file falls back to defaults
fn load_settings(args: &Args) -> Result<(AtlasMaskConfig, bool)> {
    let overrides = args.overrides();
    match load_config(args.config.as_deref(), Some(&overrides)) {
        Ok(config) => Ok((config, true)),
        Err(ConfigError::FileNotFound(_)) if args.config.is_none() => {
            let mut config = AtlasMaskConfig::default();
            atlas_mask_config::apply_environment_overrides(&mut config);
            atlas_mask_config::apply_cli_overrides(&mut config, &overrides);
            Ok((config, false))
        }
        Err(e) => Err(e).context("Failed to load configuration"),
    }
}

fn main() -> Result<()> {
    let (debug_args, clap_args) = split_debug_args(std::env::args());
    let args = Args::parse_from(clap_args);

    let mut debug_flags = CrateDebugFlags::from_args(debug_args);
    if let Ok(value) = std::env::var(DEBUG_ENV) {
        debug_flags.merge_env_value(&value);
    }

    let (config, from_file) = load_settings(&args)?;
    validate_config(&config)?;

    let _logging = init_logging(&debug_flags, &logging_config(&config))?;
    if !from_file {
        warn!("No atlas_mask.toml found; using built-in defaults");
    }

    let options = pipeline_options(&config)?;
    let (volume_path, ontology_path) = input_paths(&config);

    let ontology = RegionHierarchy::from_structures_json(&ontology_path)
        .with_context(|| format!("Failed to load ontology from {}", ontology_path.display()))?;
    let (volume, spatial) = load_volume(&volume_path)
        .with_context(|| format!("Failed to load volume from {}", volume_path.display()))?;

    let output = run_pipeline(&volume, &ontology, &options)?;
    let summary = output.summary.to_json()?;

    if args.dry_run {
        info!("Dry run: no files written");
        println!("{}", summary);
        return Ok(());
    }

    let paths = output_paths(&config);
    let published = save_outputs(&output, &paths, &spatial)?;
    for path in &published {
        info!(path = %path.display(), "Wrote artifact");
    }
    info!(
        regions = output.catalog.len(),
        removed_fragments = output.summary.removed_fragments,
        remapped_ids = output.summary.remapped_ids,
        "Done"
    );
    Ok(())
}
