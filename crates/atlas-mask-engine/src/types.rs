// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

/*!
Core types shared by the engine stages.
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use atlas_mask_ontology::OntologyError;

pub use atlas_mask_ontology::RegionId;

/// Background voxel value
pub const BACKGROUND: RegionId = 0;

/// Largest id representable in the default unsigned 16-bit output format
pub const DEFAULT_MAX_VALUE: RegionId = 65_535;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by engine stages
///
/// Every error is raised before the stage commits any output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid depth {depth}: hierarchy depth and level must be at least 1")]
    InvalidDepth { depth: u32 },

    #[error("Region not found in ontology: '{0}'")]
    RegionNotFound(String),

    #[error("ID space exhausted: {overflow} overflow ids but only {free} free ids")]
    IdSpaceExhausted { overflow: usize, free: usize },

    #[error("Malformed input: {0}")]
    MalformedInput(String),
}

impl From<OntologyError> for EngineError {
    fn from(err: OntologyError) -> Self {
        match err {
            OntologyError::AcronymNotFound(acronym) => EngineError::RegionNotFound(acronym),
            OntologyError::RegionNotFound(id) => EngineError::RegionNotFound(id.to_string()),
            other => EngineError::MalformedInput(other.to_string()),
        }
    }
}

/// Neighborhood used for connected-component analysis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// 6-neighborhood: voxels sharing a face
    #[default]
    Face,
    /// 26-neighborhood: voxels sharing a face, an edge or a corner
    Full,
}

const FACE_OFFSETS: [[isize; 3]; 6] = [
    [-1, 0, 0],
    [1, 0, 0],
    [0, -1, 0],
    [0, 1, 0],
    [0, 0, -1],
    [0, 0, 1],
];

const FULL_OFFSETS: [[isize; 3]; 26] = [
    [-1, -1, -1],
    [-1, -1, 0],
    [-1, -1, 1],
    [-1, 0, -1],
    [-1, 0, 0],
    [-1, 0, 1],
    [-1, 1, -1],
    [-1, 1, 0],
    [-1, 1, 1],
    [0, -1, -1],
    [0, -1, 0],
    [0, -1, 1],
    [0, 0, -1],
    [0, 0, 1],
    [0, 1, -1],
    [0, 1, 0],
    [0, 1, 1],
    [1, -1, -1],
    [1, -1, 0],
    [1, -1, 1],
    [1, 0, -1],
    [1, 0, 0],
    [1, 0, 1],
    [1, 1, -1],
    [1, 1, 0],
    [1, 1, 1],
];

impl Connectivity {
    /// Neighbor offsets in `[z, y, x]` order
    pub fn offsets(self) -> &'static [[isize; 3]] {
        match self {
            Connectivity::Face => &FACE_OFFSETS,
            Connectivity::Full => &FULL_OFFSETS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Connectivity::Face => "face",
            Connectivity::Full => "full",
        }
    }
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Connectivity {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "face" | "6" => Ok(Connectivity::Face),
            "full" | "26" => Ok(Connectivity::Full),
            other => Err(EngineError::MalformedInput(format!(
                "unknown connectivity '{}' (expected 'face' or 'full')",
                other
            ))),
        }
    }
}

/// How a stage runs its independent per-region work
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Execution {
    #[default]
    Sequential,
    /// Uses rayon when built with the `parallel` feature, sequential otherwise
    Parallel,
}
