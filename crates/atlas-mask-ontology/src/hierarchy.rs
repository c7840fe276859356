// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

/*!
RegionHierarchy - Tree structure for the atlas ontology.

Holds parent-child relationships between atlas regions plus id and acronym
indices. Built once (from `structures.json` or programmatically) and then
shared read-only with the pipeline.
*/

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::adapter::AtlasOntology;
use crate::types::{OntologyError, OntologyResult, RegionId, RegionNode};

/// Hierarchical tree structure for atlas regions
///
/// # Design Notes
///
/// - Root region has no entry in `parent_map`
/// - Children keep insertion order, which is the ontology order
/// - Parents must exist before children are added, so cycles cannot form
/// - Only one root is accepted
///
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegionHierarchy {
    /// Map of region_id -> RegionNode
    regions: HashMap<RegionId, RegionNode>,

    /// Map of acronym -> region_id
    #[serde(default)]
    acronym_index: HashMap<String, RegionId>,

    /// Map of region_id -> parent_region_id
    #[serde(default)]
    parent_map: HashMap<RegionId, RegionId>,

    /// Map of region_id -> ordered child ids
    #[serde(default)]
    children_map: HashMap<RegionId, Vec<RegionId>>,

    root_id: Option<RegionId>,
}

impl RegionHierarchy {
    /// Create a new empty hierarchy
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hierarchy with a root region
    pub fn with_root(root: RegionNode) -> OntologyResult<Self> {
        let mut hierarchy = Self::new();
        hierarchy.add_region(root, None)?;
        Ok(hierarchy)
    }

    /// Add a region to the hierarchy
    ///
    /// # Arguments
    ///
    /// * `region` - The region to add
    /// * `parent_id` - Parent region id (`None` for the root)
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Region id is 0 or already exists
    /// - Acronym is already taken
    /// - Parent id doesn't exist
    /// - A root already exists and `parent_id` is `None`
    ///
    pub fn add_region(
        &mut self,
        region: RegionNode,
        parent_id: Option<RegionId>,
    ) -> OntologyResult<()> {
        let region_id = region.id;

        if region_id == 0 {
            return Err(OntologyError::ReservedId);
        }
        if self.regions.contains_key(&region_id) {
            return Err(OntologyError::DuplicateRegion(region_id));
        }
        if self.acronym_index.contains_key(&region.acronym) {
            return Err(OntologyError::DuplicateAcronym(region.acronym));
        }

        match parent_id {
            Some(parent) => {
                if !self.regions.contains_key(&parent) {
                    return Err(OntologyError::MissingParent {
                        child: region_id,
                        parent,
                    });
                }
                self.parent_map.insert(region_id, parent);
                self.children_map.entry(parent).or_default().push(region_id);
            }
            None => {
                if let Some(existing) = self.root_id {
                    return Err(OntologyError::MultipleRoots {
                        existing,
                        candidate: region_id,
                    });
                }
                self.root_id = Some(region_id);
            }
        }

        self.acronym_index.insert(region.acronym.clone(), region_id);
        self.regions.insert(region_id, region);

        Ok(())
    }

    /// Check if one region is a (strict) descendant of another
    pub fn is_descendant(&self, potential_descendant: RegionId, ancestor: RegionId) -> bool {
        let mut current = potential_descendant;

        while let Some(&parent) = self.parent_map.get(&current) {
            if parent == ancestor {
                return true;
            }
            current = parent;
        }

        false
    }

    /// Ancestors of a region, nearest first, ending at the root
    pub fn ancestors(&self, region_id: RegionId) -> Vec<RegionId> {
        let mut ancestors = Vec::new();
        let mut current = region_id;

        while let Some(&parent) = self.parent_map.get(&current) {
            ancestors.push(parent);
            current = parent;
        }

        ancestors
    }

    /// Get a region by id
    pub fn get_region(&self, region_id: RegionId) -> Option<&RegionNode> {
        self.regions.get(&region_id)
    }

    /// Get the parent of a region
    pub fn get_parent(&self, region_id: RegionId) -> Option<RegionId> {
        self.parent_map.get(&region_id).copied()
    }

    /// Get the root region id
    pub fn get_root_id(&self) -> Option<RegionId> {
        self.root_id
    }

    /// Get the total number of regions
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Iterate over all regions (unordered)
    pub fn iter(&self) -> impl Iterator<Item = &RegionNode> {
        self.regions.values()
    }
}

impl AtlasOntology for RegionHierarchy {
    fn lookup(&self, id: RegionId) -> Option<&RegionNode> {
        self.regions.get(&id)
    }

    fn lookup_by_acronym(&self, acronym: &str) -> Option<RegionId> {
        self.acronym_index.get(acronym).copied()
    }

    fn children(&self, id: RegionId) -> &[RegionId] {
        self.children_map
            .get(&id)
            .map(|children| children.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hierarchy_creation() {
        let hierarchy = RegionHierarchy::with_root(RegionNode::new(997, "root", "root")).unwrap();

        assert_eq!(hierarchy.region_count(), 1);
        assert_eq!(hierarchy.get_root_id(), Some(997));
    }

    #[test]
    fn test_add_regions() {
        let mut hierarchy =
            RegionHierarchy::with_root(RegionNode::new(997, "root", "root")).unwrap();

        hierarchy
            .add_region(RegionNode::new(8, "grey", "Basic cell groups and regions"), Some(997))
            .unwrap();

        assert_eq!(hierarchy.region_count(), 2);
        assert_eq!(hierarchy.get_parent(8), Some(997));
        assert_eq!(hierarchy.lookup_by_acronym("grey"), Some(8));
        assert_eq!(hierarchy.children(997), &[8]);
    }

    #[test]
    fn test_rejects_missing_parent() {
        let mut hierarchy =
            RegionHierarchy::with_root(RegionNode::new(997, "root", "root")).unwrap();

        let result = hierarchy.add_region(RegionNode::new(8, "grey", "grey"), Some(42));
        assert!(matches!(
            result,
            Err(OntologyError::MissingParent { child: 8, parent: 42 })
        ));
        assert_eq!(hierarchy.region_count(), 1);
    }

    #[test]
    fn test_rejects_duplicates_and_second_root() {
        let mut hierarchy =
            RegionHierarchy::with_root(RegionNode::new(997, "root", "root")).unwrap();
        hierarchy
            .add_region(RegionNode::new(8, "grey", "grey"), Some(997))
            .unwrap();

        assert!(matches!(
            hierarchy.add_region(RegionNode::new(8, "other", "other"), Some(997)),
            Err(OntologyError::DuplicateRegion(8))
        ));
        assert!(matches!(
            hierarchy.add_region(RegionNode::new(9, "grey", "grey again"), Some(997)),
            Err(OntologyError::DuplicateAcronym(_))
        ));
        assert!(matches!(
            hierarchy.add_region(RegionNode::new(10, "root2", "root2"), None),
            Err(OntologyError::MultipleRoots { existing: 997, candidate: 10 })
        ));
        assert!(matches!(
            hierarchy.add_region(RegionNode::new(0, "bg", "background"), Some(997)),
            Err(OntologyError::ReservedId)
        ));
    }

    #[test]
    fn test_ancestors_and_is_descendant() {
        // Create tree: root -> grey -> CH -> CTX
        let mut hierarchy =
            RegionHierarchy::with_root(RegionNode::new(997, "root", "root")).unwrap();
        hierarchy.add_region(RegionNode::new(8, "grey", "grey"), Some(997)).unwrap();
        hierarchy.add_region(RegionNode::new(567, "CH", "Cerebrum"), Some(8)).unwrap();
        hierarchy
            .add_region(RegionNode::new(688, "CTX", "Cerebral cortex"), Some(567))
            .unwrap();

        assert_eq!(hierarchy.ancestors(688), vec![567, 8, 997]);
        assert!(hierarchy.ancestors(997).is_empty());
        assert!(hierarchy.is_descendant(688, 997));
        assert!(hierarchy.is_descendant(688, 8));
        assert!(!hierarchy.is_descendant(8, 688));
        assert!(!hierarchy.is_descendant(8, 8));
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let mut hierarchy = RegionHierarchy::with_root(RegionNode::new(1, "root", "root")).unwrap();
        for (id, acronym) in [(30, "C"), (10, "A"), (20, "B")] {
            hierarchy
                .add_region(RegionNode::new(id, acronym, acronym), Some(1))
                .unwrap();
        }

        assert_eq!(hierarchy.children(1), &[30, 10, 20]);
    }
}
