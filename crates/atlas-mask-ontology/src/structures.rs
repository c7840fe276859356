// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! Loader for BrainGlobe-style `structures.json` ontology files
//!
//! Each record carries its full root-to-self id path; the parent is the
//! penultimate element. Records may appear in any order in the file.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

use crate::hierarchy::RegionHierarchy;
use crate::types::{OntologyError, OntologyResult, RegionId, RegionNode};

/// One entry of `structures.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureRecord {
    pub id: RegionId,
    pub acronym: String,
    pub name: String,
    /// Ids from the root down to (and including) this region
    pub structure_id_path: Vec<RegionId>,
    #[serde(default)]
    pub rgb_triplet: Vec<u8>,
}

impl StructureRecord {
    fn parent_id(&self) -> OntologyResult<Option<RegionId>> {
        match self.structure_id_path.as_slice() {
            [] => Err(OntologyError::MalformedRecord(format!(
                "region {} ('{}') has an empty structure_id_path",
                self.id, self.acronym
            ))),
            [.., last] if *last != self.id => Err(OntologyError::MalformedRecord(format!(
                "structure_id_path of region {} ends with {}",
                self.id, last
            ))),
            [_] => Ok(None),
            [.., parent, _] => Ok(Some(*parent)),
        }
    }
}

impl RegionHierarchy {
    /// Build a hierarchy from already parsed structure records
    pub fn from_structure_records(mut records: Vec<StructureRecord>) -> OntologyResult<Self> {
        // Parents always have shorter paths than their children; a stable sort
        // keeps sibling order as it appears in the file.
        records.sort_by_key(|record| record.structure_id_path.len());

        let mut hierarchy = RegionHierarchy::new();
        for record in records {
            let parent = record.parent_id()?;
            hierarchy.add_region(RegionNode::new(record.id, record.acronym, record.name), parent)?;
        }

        debug!(
            regions = hierarchy.region_count(),
            root = ?hierarchy.get_root_id(),
            "Built region hierarchy from structure records"
        );
        Ok(hierarchy)
    }

    /// Parse `structures.json` content from a reader
    pub fn from_structures_reader<R: Read>(reader: R) -> OntologyResult<Self> {
        let records: Vec<StructureRecord> = serde_json::from_reader(reader)?;
        Self::from_structure_records(records)
    }

    /// Load `structures.json` from disk
    pub fn from_structures_json(path: &Path) -> OntologyResult<Self> {
        let file = File::open(path)?;
        let hierarchy = Self::from_structures_reader(BufReader::new(file))?;
        info!(
            path = %path.display(),
            regions = hierarchy.region_count(),
            "Loaded atlas ontology"
        );
        Ok(hierarchy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AtlasOntology;

    #[test]
    fn test_parent_from_path() {
        let record = StructureRecord {
            id: 8,
            acronym: "grey".to_string(),
            name: "Basic cell groups and regions".to_string(),
            structure_id_path: vec![997, 8],
            rgb_triplet: vec![],
        };
        assert_eq!(record.parent_id().unwrap(), Some(997));
    }

    #[test]
    fn test_path_must_end_with_id() {
        let record = StructureRecord {
            id: 8,
            acronym: "grey".to_string(),
            name: "grey".to_string(),
            structure_id_path: vec![997, 9],
            rgb_triplet: vec![],
        };
        assert!(matches!(
            record.parent_id(),
            Err(OntologyError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_out_of_order_records() {
        let json = r#"[
            {"id": 4, "acronym": "A1", "name": "Area A1", "structure_id_path": [1, 2, 4]},
            {"id": 2, "acronym": "A", "name": "Area A", "structure_id_path": [1, 2]},
            {"id": 1, "acronym": "root", "name": "root", "structure_id_path": [1], "rgb_triplet": [255, 255, 255]},
            {"id": 3, "acronym": "B", "name": "Area B", "structure_id_path": [1, 3]}
        ]"#;

        let hierarchy = RegionHierarchy::from_structures_reader(json.as_bytes()).unwrap();
        assert_eq!(hierarchy.region_count(), 4);
        assert_eq!(hierarchy.get_root_id(), Some(1));
        assert_eq!(hierarchy.children(1), &[2, 3]);
        assert_eq!(hierarchy.all_descendants(1), vec![2, 4, 3]);
    }
}
