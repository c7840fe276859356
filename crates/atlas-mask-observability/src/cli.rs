// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI argument parsing for per-crate debug flags
//!
//! Supports flags like `--debug-atlas-mask-engine` to raise one crate to
//! debug level while the rest stay at the configured level.

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

/// Environment variable listing crates to debug (comma-separated, or `all`)
pub const DEBUG_ENV: &str = "ATLAS_MASK_DEBUG";

/// Parse debug flags from command-line arguments
///
/// # Example
/// ```rust
/// use atlas_mask_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-atlas-mask-engine".to_string()]);
/// assert!(flags.is_enabled("atlas-mask-engine"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrateDebugFlags {
    enabled_crates: BTreeSet<String>,
}

impl CrateDebugFlags {
    /// Looks for arguments matching `--debug-{crate-name}`; `--debug-all`
    /// enables every known crate
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = Self::default();
        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
            } else if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enable(crate_name);
            }
        }
        flags
    }

    pub fn enable(&mut self, crate_name: &str) {
        let crate_name = crate_name.trim();
        if !crate_name.is_empty() {
            self.enabled_crates.insert(crate_name.to_string());
        }
    }

    pub fn enable_all(&mut self) {
        for crate_name in KNOWN_CRATES {
            self.enable(crate_name);
        }
    }

    /// Add crates named in an `ATLAS_MASK_DEBUG`-style value
    pub fn merge_env_value(&mut self, value: &str) {
        if value.trim() == "all" {
            self.enable_all();
        } else {
            for crate_name in value.split(',') {
                self.enable(crate_name);
            }
        }
    }

    /// Check if debug is enabled for a specific crate
    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    pub fn enabled_crates(&self) -> impl Iterator<Item = &str> {
        self.enabled_crates.iter().map(String::as_str)
    }

    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// `DEBUG` for enabled crates, `INFO` otherwise
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// `EnvFilter` directive string, e.g. `info,atlas_mask_engine=debug`
    ///
    /// Tracing targets are module paths, so crate names are written with
    /// underscores.
    pub fn to_filter_string(&self, default_level: &str) -> String {
        let mut filters = vec![default_level.trim().to_lowercase()];
        filters.extend(
            self.enabled_crates
                .iter()
                .map(|crate_name| format!("{}=debug", crate_name.replace('-', "_"))),
        );
        filters.join(",")
    }
}

/// Debug flags from the process arguments and `ATLAS_MASK_DEBUG`
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());
    if let Ok(value) = env::var(DEBUG_ENV) {
        flags.merge_env_value(&value);
    }
    flags
}

/// Generate help text for debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variable:
  {}={{crate-name}}[,{{crate-name}}]  Enable debug for crates (comma-separated)
  {}=all                               Enable debug for all crates
"#,
        KNOWN_CRATES.join(", "),
        DEBUG_ENV,
        DEBUG_ENV
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_crate_flag() {
        let flags = CrateDebugFlags::from_args(vec![
            "atlas-mask".to_string(),
            "--debug-atlas-mask-engine".to_string(),
            "--min-size".to_string(),
        ]);
        assert!(flags.is_enabled("atlas-mask-engine"));
        assert!(!flags.is_enabled("atlas-mask-io"));
    }

    #[test]
    fn test_debug_all() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-all".to_string()]);
        for crate_name in KNOWN_CRATES {
            assert!(flags.is_enabled(crate_name), "{} should be enabled", crate_name);
        }
    }

    #[test]
    fn test_env_value() {
        let mut flags = CrateDebugFlags::default();
        flags.merge_env_value("atlas-mask-io, atlas-mask-ontology,");
        assert_eq!(
            flags.enabled_crates().collect::<Vec<_>>(),
            vec!["atlas-mask-io", "atlas-mask-ontology"]
        );
    }

    #[test]
    fn test_filter_string_uses_target_names() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-atlas-mask-engine".to_string()]);
        assert_eq!(flags.to_filter_string("WARN"), "warn,atlas_mask_engine=debug");
        assert_eq!(CrateDebugFlags::default().to_filter_string("info"), "info");
    }

    #[test]
    fn test_log_level() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-atlas-mask-io".to_string()]);
        assert_eq!(flags.log_level("atlas-mask-io"), tracing::Level::DEBUG);
        assert_eq!(flags.log_level("atlas-mask-engine"), tracing::Level::INFO);
    }
}
