// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

use atlas_mask_engine::EngineError;
use thiserror::Error;

/// Volume and report I/O errors
#[derive(Error, Debug)]
pub enum VolumeIoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid magic line: expected NRRD000x, got {0:?}")]
    InvalidMagic(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Missing required header field '{0}'")]
    MissingField(&'static str),

    #[error("Unsupported voxel type '{0}'")]
    UnsupportedType(String),

    #[error("Unsupported encoding '{0}' (only raw is supported)")]
    UnsupportedEncoding(String),

    #[error("Unsupported dimension {0} (expected 3)")]
    UnsupportedDimension(usize),

    #[error("Data size mismatch: expected {expected} bytes, found {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Voxel value {value} cannot be used as a region id")]
    ValueOutOfRange { value: i64 },

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Invalid TIFF stack: {0}")]
    InvalidTiff(String),

    #[error("Unsupported volume file '{0}' (expected .nrrd, .tif or .tiff)")]
    UnsupportedFormat(String),

    #[error("Output path used twice: {0}")]
    DuplicateOutput(String),

    #[error("Summary serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type VolumeIoResult<T> = std::result::Result<T, VolumeIoError>;
