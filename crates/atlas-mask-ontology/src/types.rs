// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

/*!
Core types for ontology operations.
*/

use serde::{Deserialize, Serialize};

/// Atlas region identifier as stored in a labeled volume (0 is background)
pub type RegionId = u32;

/// Result type for ontology operations
pub type OntologyResult<T> = Result<T, OntologyError>;

/// A single region of the atlas ontology
///
/// Parent and child links are owned by the hierarchy, not by the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionNode {
    pub id: RegionId,
    pub acronym: String,
    pub name: String,
}

impl RegionNode {
    pub fn new(id: RegionId, acronym: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            acronym: acronym.into(),
            name: name.into(),
        }
    }
}

/// Errors that can occur while building or querying an ontology
#[derive(Debug, thiserror::Error)]
pub enum OntologyError {
    #[error("Region {0} already exists")]
    DuplicateRegion(RegionId),

    #[error("Acronym '{0}' is already assigned to another region")]
    DuplicateAcronym(String),

    #[error("Parent region {parent} of region {child} does not exist")]
    MissingParent { child: RegionId, parent: RegionId },

    #[error("Hierarchy already has root {existing}; region {candidate} has no parent")]
    MultipleRoots {
        existing: RegionId,
        candidate: RegionId,
    },

    #[error("Region 0 is reserved for background")]
    ReservedId,

    #[error("Region not found: {0}")]
    RegionNotFound(RegionId),

    #[error("Acronym not found: '{0}'")]
    AcronymNotFound(String),

    #[error("Malformed structure record: {0}")]
    MalformedRecord(String),

    #[error("Failed to read ontology: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid structures JSON: {0}")]
    Json(#[from] serde_json::Error),
}
