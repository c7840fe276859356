// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! # atlas-mask-observability
//!
//! Logging setup shared by the atlas mask binaries, with per-crate debug
//! flag support.
//!
//! ## Features
//! - `file-logging`: JSON log files in a timestamped folder per run

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Crate names accepted by `--debug-<crate>`
pub const KNOWN_CRATES: &[&str] = &[
    "atlas-mask",
    "atlas-mask-ontology",
    "atlas-mask-engine",
    "atlas-mask-io",
    "atlas-mask-config",
    "atlas-mask-cli",
];
