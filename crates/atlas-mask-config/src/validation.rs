// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Checks value ranges, enumerated settings and conflicts between sections.
//! All problems are collected and reported together.

use std::collections::HashMap;

use crate::{AtlasMaskConfig, ConfigError, ConfigResult};

const CONNECTIVITIES: [&str; 4] = ["face", "full", "6", "26"];
const EXCLUSION_ORDERS: [&str; 2] = ["after_flatten", "before_flatten"];
const LOOKUP_ORDERS: [&str; 2] = ["ontology_first", "remap_first"];
const UNKNOWN_ID_POLICIES: [&str; 2] = ["tolerate", "reject"];
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    InvalidValue { field: String, reason: String },
    RegionConflict { acronym: String },
    OutputConflict { field1: String, field2: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
            Self::RegionConflict { acronym } => {
                write!(
                    f,
                    "Region '{}' is listed in both regions.flatten and regions.flatten_at_level",
                    acronym
                )
            }
            Self::OutputConflict { field1, field2 } => {
                write!(f, "Output conflict: {} and {} use the same path", field1, field2)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &AtlasMaskConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_value_ranges(config, &mut errors);
    validate_choices(config, &mut errors);
    validate_region_lists(config, &mut errors);
    validate_output_paths(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigValidationError {
    ConfigValidationError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn validate_value_ranges(config: &AtlasMaskConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.regions.level < 1 {
        errors.push(invalid("regions.level", "must be at least 1"));
    }
    if config.fragments.min_size == 0 {
        errors.push(invalid("fragments.min_size", "must be at least 1"));
    }
    if config.compaction.max_value == 0 {
        errors.push(invalid("compaction.max_value", "must be at least 1"));
    }
    // The output volume is written as uint16
    if config.compaction.max_value > u32::from(u16::MAX) {
        errors.push(invalid(
            "compaction.max_value",
            format!(
                "{} does not fit the 16-bit output volume (max 65535)",
                config.compaction.max_value
            ),
        ));
    }
}

fn check_choice(
    field: &str,
    value: &str,
    allowed: &[&str],
    errors: &mut Vec<ConfigValidationError>,
) {
    let normalized = value.trim().to_lowercase();
    if !allowed.contains(&normalized.as_str()) {
        errors.push(invalid(
            field,
            format!("'{}' is not one of {}", value, allowed.join(", ")),
        ));
    }
}

fn validate_choices(config: &AtlasMaskConfig, errors: &mut Vec<ConfigValidationError>) {
    check_choice(
        "fragments.connectivity",
        &config.fragments.connectivity,
        &CONNECTIVITIES,
        errors,
    );
    check_choice(
        "regions.exclusion_order",
        &config.regions.exclusion_order,
        &EXCLUSION_ORDERS,
        errors,
    );
    check_choice(
        "catalog.lookup_order",
        &config.catalog.lookup_order,
        &LOOKUP_ORDERS,
        errors,
    );
    check_choice(
        "validation.unknown_ids",
        &config.validation.unknown_ids,
        &UNKNOWN_ID_POLICIES,
        errors,
    );
    check_choice("logging.level", &config.logging.level, &LOG_LEVELS, errors);
}

/// An acronym flattened fully and at a level would be rewritten twice
fn validate_region_lists(config: &AtlasMaskConfig, errors: &mut Vec<ConfigValidationError>) {
    for acronym in &config.regions.flatten {
        if config.regions.flatten_at_level.contains(acronym) {
            errors.push(ConfigValidationError::RegionConflict {
                acronym: acronym.clone(),
            });
        }
    }
}

fn validate_output_paths(config: &AtlasMaskConfig, errors: &mut Vec<ConfigValidationError>) {
    let input = config.paths.resolve(&config.paths.input_volume);
    let mut seen: HashMap<std::path::PathBuf, &'static str> = HashMap::new();
    seen.insert(input, "paths.input_volume");

    for (field, path) in config.paths.outputs() {
        if let Some(existing) = seen.get(&path) {
            errors.push(ConfigValidationError::OutputConflict {
                field1: existing.to_string(),
                field2: field.to_string(),
            });
        } else {
            seen.insert(path, field);
        }
    }
}
