// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to one section of `atlas_mask.toml`. Every field has a
//! default, so a partial file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AtlasMaskConfig {
    pub paths: PathsConfig,
    pub regions: RegionsConfig,
    pub fragments: FragmentsConfig,
    pub compaction: CompactionConfig,
    pub catalog: CatalogConfig,
    pub validation: ValidationConfig,
    pub logging: LoggingConfig,
}

/// Input and output locations
///
/// Relative paths are taken relative to `data_dir`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub input_volume: PathBuf,
    /// BrainGlobe-style `structures.json`
    pub ontology: PathBuf,
    pub output_volume: PathBuf,
    pub whole_volume_mask: PathBuf,
    pub region_catalog: PathBuf,
    pub fragment_report: PathBuf,
    /// JSON run summary; not written when unset
    pub summary: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(""),
            input_volume: PathBuf::from("registered_atlas_original_orientation.tiff"),
            ontology: PathBuf::from("structures.json"),
            output_volume: PathBuf::from("adjusted_mask.tiff"),
            whole_volume_mask: PathBuf::from("whole_brain_mask.tiff"),
            region_catalog: PathBuf::from("used_region_ids.csv"),
            fragment_report: PathBuf::from("region_fragments_with_sizes.csv"),
            summary: None,
        }
    }
}

impl PathsConfig {
    /// Join a relative path onto `data_dir`; absolute paths are returned as is
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    /// Output artifacts with their config keys, resolved against `data_dir`
    pub fn outputs(&self) -> Vec<(&'static str, PathBuf)> {
        let mut outputs = vec![
            ("paths.output_volume", self.resolve(&self.output_volume)),
            ("paths.whole_volume_mask", self.resolve(&self.whole_volume_mask)),
            ("paths.region_catalog", self.resolve(&self.region_catalog)),
            ("paths.fragment_report", self.resolve(&self.fragment_report)),
        ];
        if let Some(summary) = &self.summary {
            outputs.push(("paths.summary", self.resolve(summary)));
        }
        outputs
    }
}

/// Which regions are merged or removed
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RegionsConfig {
    /// Acronyms whose whole subtree collapses into them
    pub flatten: Vec<String>,
    /// Acronyms whose descendants are flattened below `level`
    pub flatten_at_level: Vec<String>,
    pub level: u32,
    pub exclude: Vec<String>,
    pub recursive_exclusion: bool,
    /// "after_flatten" or "before_flatten"
    pub exclusion_order: String,
}

impl Default for RegionsConfig {
    fn default() -> Self {
        Self {
            flatten: Vec::new(),
            flatten_at_level: Vec::new(),
            level: 1,
            exclude: Vec::new(),
            recursive_exclusion: false,
            exclusion_order: "after_flatten".to_string(),
        }
    }
}

/// Fragment pruning
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FragmentsConfig {
    pub min_size: usize,
    /// "face" (6-neighborhood) or "full" (26-neighborhood)
    pub connectivity: String,
    /// Analyse regions on the rayon pool (needs the `parallel` build feature)
    pub parallel: bool,
}

impl Default for FragmentsConfig {
    fn default() -> Self {
        Self {
            min_size: 50,
            connectivity: "face".to_string(),
            parallel: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CompactionConfig {
    /// Largest id allowed in the output volume
    pub max_value: u32,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self { max_value: 65_535 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// "ontology_first" or "remap_first"
    pub lookup_order: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            lookup_order: "ontology_first".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// "tolerate" or "reject" voxel ids missing from the ontology
    pub unknown_ids: String,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            unknown_ids: "tolerate".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_dir: PathBuf,
    pub file_logging: bool,
    /// Delete run folders older than this many days (0 keeps all)
    pub retention_days: u64,
    /// Keep at most this many run folders (0 keeps all)
    pub retention_runs: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("./logs"),
            file_logging: false,
            retention_days: 14,
            retention_runs: 20,
        }
    }
}
