// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Values are layered in three tiers, later tiers winning:
//! 1. TOML file
//! 2. Environment variables
//! 3. CLI arguments

use crate::{AtlasMaskConfig, ConfigError, ConfigResult};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// File name searched for when no explicit path is given
pub const CONFIG_FILE_NAME: &str = "atlas_mask.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "ATLAS_MASK_CONFIG_PATH";

/// Find the configuration file
///
/// Search order:
/// 1. `ATLAS_MASK_CONFIG_PATH` environment variable
/// 2. Current working directory: `./atlas_mask.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by {} not found: {}",
            CONFIG_PATH_ENV,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        for ancestor in cwd.ancestors().skip(1).take(5) {
            search_paths.push(ancestor.join(CONFIG_FILE_NAME));
        }
    }

    if let Some(path) = search_paths.iter().find(|p| p.exists()) {
        return Ok(path.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet {} to specify a custom location.",
        CONFIG_FILE_NAME, search_list, CONFIG_PATH_ENV
    )))
}

/// Load configuration from a TOML file and apply overrides
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, the file is searched for.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if the config file is not found or contains invalid TOML.
/// Values are not validated here; call [`crate::validate_config`].
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<AtlasMaskConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: AtlasMaskConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `ATLAS_MASK_DATA_DIR` -> `paths.data_dir`
/// - `ATLAS_MASK_MIN_FRAGMENT_SIZE` -> `fragments.min_size`
/// - `ATLAS_MASK_CONNECTIVITY` -> `fragments.connectivity`
/// - `ATLAS_MASK_MAX_VALUE` -> `compaction.max_value`
/// - `ATLAS_MASK_UNKNOWN_IDS` -> `validation.unknown_ids`
/// - `ATLAS_MASK_LOG_LEVEL` -> `logging.level`
///
/// Numeric values that do not parse are ignored.
pub fn apply_environment_overrides(config: &mut AtlasMaskConfig) {
    if let Ok(value) = env::var("ATLAS_MASK_DATA_DIR") {
        config.paths.data_dir = PathBuf::from(value);
    }
    if let Ok(value) = env::var("ATLAS_MASK_MIN_FRAGMENT_SIZE") {
        if let Ok(min_size) = value.parse::<usize>() {
            config.fragments.min_size = min_size;
        }
    }
    if let Ok(value) = env::var("ATLAS_MASK_CONNECTIVITY") {
        config.fragments.connectivity = value;
    }
    if let Ok(value) = env::var("ATLAS_MASK_MAX_VALUE") {
        if let Ok(max_value) = value.parse::<u32>() {
            config.compaction.max_value = max_value;
        }
    }
    if let Ok(value) = env::var("ATLAS_MASK_UNKNOWN_IDS") {
        config.validation.unknown_ids = value;
    }
    if let Ok(value) = env::var("ATLAS_MASK_LOG_LEVEL") {
        config.logging.level = value;
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"min_size": "25", "connectivity": "full"}`)
pub fn apply_cli_overrides(config: &mut AtlasMaskConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("data_dir") {
        config.paths.data_dir = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("input_volume") {
        config.paths.input_volume = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("ontology") {
        config.paths.ontology = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("min_size") {
        if let Ok(min_size) = value.parse::<usize>() {
            config.fragments.min_size = min_size;
        }
    }
    if let Some(value) = cli_args.get("connectivity") {
        config.fragments.connectivity = value.clone();
    }
    if let Some(value) = cli_args.get("parallel") {
        config.fragments.parallel = value.to_lowercase() == "true" || value == "1";
    }
    if let Some(value) = cli_args.get("max_value") {
        if let Ok(max_value) = value.parse::<u32>() {
            config.compaction.max_value = max_value;
        }
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
}
