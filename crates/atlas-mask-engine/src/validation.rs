// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! Referential check of a volume against the ontology before processing

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

use atlas_mask_ontology::AtlasOntology;

use crate::types::{EngineError, EngineResult, RegionId};
use crate::volume::LabeledVolume;

/// What to do with voxel ids the ontology does not know
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownIdPolicy {
    /// Keep them; they end up as `Unknown` catalog rows
    #[default]
    Tolerate,
    /// Fail with `MalformedInput`
    Reject,
}

impl FromStr for UnknownIdPolicy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tolerate" => Ok(UnknownIdPolicy::Tolerate),
            "reject" => Ok(UnknownIdPolicy::Reject),
            other => Err(EngineError::MalformedInput(format!(
                "unknown id policy '{}' (expected 'tolerate' or 'reject')",
                other
            ))),
        }
    }
}

/// Ids present in a volume but absent from the ontology
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownIdReport {
    /// `(id, voxel count)`, ascending by id
    pub unknown: Vec<(RegionId, usize)>,
}

impl UnknownIdReport {
    pub fn is_empty(&self) -> bool {
        self.unknown.is_empty()
    }

    pub fn ids(&self) -> Vec<RegionId> {
        self.unknown.iter().map(|(id, _)| *id).collect()
    }
}

/// Check every non-background id against the ontology
pub fn validate_region_ids<O>(
    volume: &LabeledVolume,
    ontology: &O,
    policy: UnknownIdPolicy,
) -> EngineResult<UnknownIdReport>
where
    O: AtlasOntology + ?Sized,
{
    let unknown: Vec<(RegionId, usize)> = volume
        .voxel_counts()
        .into_iter()
        .filter(|(id, _)| !ontology.contains(*id))
        .collect();
    let report = UnknownIdReport { unknown };

    if report.is_empty() {
        return Ok(report);
    }

    match policy {
        UnknownIdPolicy::Reject => Err(EngineError::MalformedInput(format!(
            "volume contains ids missing from the ontology: {:?}",
            report.ids()
        ))),
        UnknownIdPolicy::Tolerate => {
            warn!(ids = ?report.ids(), "Volume contains ids missing from the ontology");
            Ok(report)
        }
    }
}
