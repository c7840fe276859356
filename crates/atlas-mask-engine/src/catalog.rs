// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! Label Catalog Builder
//!
//! One row per distinct non-background id of the final volume, ascending.
//! Ids that are not in the ontology are traced back through the compaction
//! remapping; ids that still cannot be resolved get an `Unknown` row.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use atlas_mask_ontology::{AtlasOntology, RegionNode};

use crate::remap::IdRemapping;
use crate::table::TableRow;
use crate::types::{EngineError, EngineResult, RegionId};
use crate::volume::LabeledVolume;

/// Name and acronym written for ids nothing can resolve
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Which source is consulted first for an id
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogLookupOrder {
    /// Direct ontology lookup, then the reverse remapping
    #[default]
    OntologyFirst,
    /// Reverse remapping first, so a remapped id never picks up the name of an
    /// unrelated ontology region that happens to share its new number
    RemapFirst,
}

impl FromStr for CatalogLookupOrder {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ontology_first" => Ok(CatalogLookupOrder::OntologyFirst),
            "remap_first" => Ok(CatalogLookupOrder::RemapFirst),
            other => Err(EngineError::MalformedInput(format!(
                "unknown catalog lookup order '{}'",
                other
            ))),
        }
    }
}

/// One catalog row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRow {
    pub region_id: RegionId,
    pub region_name: String,
    pub region_acronym: String,
}

impl CatalogRow {
    fn from_node(region_id: RegionId, node: &RegionNode) -> Self {
        Self {
            region_id,
            region_name: node.name.clone(),
            region_acronym: node.acronym.clone(),
        }
    }

    fn unknown(region_id: RegionId) -> Self {
        Self {
            region_id,
            region_name: UNKNOWN_LABEL.to_string(),
            region_acronym: UNKNOWN_LABEL.to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.region_name == UNKNOWN_LABEL && self.region_acronym == UNKNOWN_LABEL
    }
}

impl TableRow for CatalogRow {
    fn columns() -> &'static [&'static str] {
        &RegionCatalog::COLUMNS
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.region_id.to_string(),
            self.region_name.clone(),
            self.region_acronym.clone(),
        ]
    }
}

/// Final id → name/acronym table, ascending by id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionCatalog {
    rows: Vec<CatalogRow>,
}

impl RegionCatalog {
    pub const COLUMNS: [&'static str; 3] = ["region_id", "region_name", "region_acronym"];

    pub fn rows(&self) -> &[CatalogRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, region_id: RegionId) -> Option<&CatalogRow> {
        self.rows
            .binary_search_by_key(&region_id, |row| row.region_id)
            .ok()
            .map(|index| &self.rows[index])
    }

    pub fn unknown_count(&self) -> usize {
        self.rows.iter().filter(|row| row.is_unknown()).count()
    }

    /// Check that every id of `volume` has exactly one row and nothing else does
    pub fn verify_complete(&self, volume: &LabeledVolume) -> EngineResult<()> {
        let catalog_ids: Vec<RegionId> = self.rows.iter().map(|row| row.region_id).collect();
        let volume_ids: Vec<RegionId> = volume.distinct_ids().into_iter().collect();
        if catalog_ids != volume_ids {
            return Err(EngineError::MalformedInput(format!(
                "catalog lists {} ids but the volume holds {} distinct ids",
                catalog_ids.len(),
                volume_ids.len()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for RegionCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            writeln!(f, "{:>8}  {:<16}  {}", row.region_id, row.region_acronym, row.region_name)?;
        }
        Ok(())
    }
}

/// Build the catalog with the default lookup order (ontology first)
pub fn build_catalog<O>(
    volume: &LabeledVolume,
    ontology: &O,
    remapping: &IdRemapping,
) -> RegionCatalog
where
    O: AtlasOntology + ?Sized,
{
    build_catalog_with(volume, ontology, remapping, CatalogLookupOrder::OntologyFirst)
}

/// Build the catalog with an explicit lookup order
pub fn build_catalog_with<O>(
    volume: &LabeledVolume,
    ontology: &O,
    remapping: &IdRemapping,
    order: CatalogLookupOrder,
) -> RegionCatalog
where
    O: AtlasOntology + ?Sized,
{
    let rows: Vec<CatalogRow> = volume
        .distinct_ids()
        .into_iter()
        .map(|region_id| {
            let direct = ontology.lookup(region_id);
            let original = remapping.reverse(region_id).and_then(|old| ontology.lookup(old));

            if let (Some(direct_node), Some(original_node)) = (direct, original) {
                warn!(
                    region_id,
                    ontology_acronym = %direct_node.acronym,
                    remapped_acronym = %original_node.acronym,
                    "Remapped id collides with an ontology id"
                );
            }

            let node = match order {
                CatalogLookupOrder::OntologyFirst => direct.or(original),
                CatalogLookupOrder::RemapFirst => original.or(direct),
            };
            match node {
                Some(node) => CatalogRow::from_node(region_id, node),
                None => CatalogRow::unknown(region_id),
            }
        })
        .collect();

    let catalog = RegionCatalog { rows };
    info!(
        rows = catalog.len(),
        unknown = catalog.unknown_count(),
        "Built region catalog"
    );
    catalog
}
