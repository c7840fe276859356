// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Atlas Mask I/O
//!
//! Reading input volumes and persisting pipeline artifacts.
//!
//! - [`nrrd`]: raw-encoded 3-D NRRD volumes (`uint8`, `uint16`, `uint32`, `int32` in;
//!   `uint8`, `uint16`, `uint32` out)
//! - [`tiff_stack`]: multi-page TIFF volumes, one page per `z` slice
//! - [`csv`]: catalog and fragment report tables
//! - [`staging`]: write-to-partial-then-rename so a run publishes all artifacts or none
//!
//! Volume paths pick their format by extension (`.nrrd`, `.tif`, `.tiff`).
//!
//! ## Usage
//! ```ignore
//! use atlas_mask_io::{load_volume, save_outputs, OutputPaths};
//!
//! let (volume, spatial) = load_volume("registered_atlas_original_orientation.tiff")?;
//! let output = atlas_mask_engine::run_pipeline(&volume, &ontology, &options)?;
//! save_outputs(&output, &paths, &spatial)?;
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod csv;
mod error;
mod format;
pub mod nrrd;
mod outputs;
pub mod staging;
pub mod tiff_stack;

pub use csv::{escape_field, write_table};
pub use error::{VolumeIoError, VolumeIoResult};
pub use format::{encode_volume, load_volume, VolumeFormat};
pub use nrrd::{
    decode_nrrd, encode_nrrd, load_nrrd, save_nrrd, Endian, NrrdHeader, SpatialMetadata,
    VoxelData, VoxelType,
};
pub use outputs::{save_outputs, OutputPaths};
pub use staging::{partial_path, StagedWriter};
pub use tiff_stack::{decode_tiff, encode_tiff, load_tiff, save_tiff};
