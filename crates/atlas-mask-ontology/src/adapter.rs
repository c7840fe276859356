// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

/*!
Read-only adapter trait consulted by every pipeline stage.
*/

use std::collections::HashSet;

use crate::types::{OntologyError, OntologyResult, RegionId, RegionNode};

/// Read-only view over an already loaded atlas region tree
///
/// Implementors only provide the four primitive lookups; traversal helpers are
/// derived from [`AtlasOntology::children`] with an explicit stack so that
/// pathologically deep trees cannot exhaust the call stack.
pub trait AtlasOntology: Send + Sync {
    /// Look up a region by id
    fn lookup(&self, id: RegionId) -> Option<&RegionNode>;

    /// Resolve an acronym (exact, case-sensitive) to a region id
    fn lookup_by_acronym(&self, acronym: &str) -> Option<RegionId>;

    /// Direct children of a region in ontology order (empty for leaves and unknown ids)
    fn children(&self, id: RegionId) -> &[RegionId];

    /// Whether the ontology knows `id`
    fn contains(&self, id: RegionId) -> bool {
        self.lookup(id).is_some()
    }

    /// Resolve an acronym or fail with [`OntologyError::AcronymNotFound`]
    fn resolve_acronym(&self, acronym: &str) -> OntologyResult<RegionId> {
        self.lookup_by_acronym(acronym)
            .ok_or_else(|| OntologyError::AcronymNotFound(acronym.to_string()))
    }

    /// Transitive closure over `children`, excluding `id` itself
    ///
    /// Order is pre-order depth-first with children visited in ontology order.
    fn all_descendants(&self, id: RegionId) -> Vec<RegionId> {
        let mut descendants = Vec::new();
        let mut seen: HashSet<RegionId> = HashSet::new();
        seen.insert(id);

        let mut to_visit: Vec<RegionId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = to_visit.pop() {
            if !seen.insert(current) {
                continue;
            }
            descendants.push(current);
            to_visit.extend(self.children(current).iter().rev().copied());
        }

        descendants
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RegionHierarchy;

    fn sample() -> RegionHierarchy {
        // root(1) -> a(2) -> a1(4), a2(5); root -> b(3)
        let mut hierarchy = RegionHierarchy::new();
        hierarchy.add_region(RegionNode::new(1, "root", "root"), None).unwrap();
        hierarchy.add_region(RegionNode::new(2, "A", "Area A"), Some(1)).unwrap();
        hierarchy.add_region(RegionNode::new(3, "B", "Area B"), Some(1)).unwrap();
        hierarchy.add_region(RegionNode::new(4, "A1", "Area A1"), Some(2)).unwrap();
        hierarchy.add_region(RegionNode::new(5, "A2", "Area A2"), Some(2)).unwrap();
        hierarchy
    }

    #[test]
    fn test_all_descendants_preorder() {
        let hierarchy = sample();
        assert_eq!(hierarchy.all_descendants(1), vec![2, 4, 5, 3]);
        assert_eq!(hierarchy.all_descendants(2), vec![4, 5]);
    }

    #[test]
    fn test_leaf_and_unknown_have_no_descendants() {
        let hierarchy = sample();
        assert!(hierarchy.all_descendants(4).is_empty());
        assert!(hierarchy.all_descendants(999).is_empty());
    }

    #[test]
    fn test_resolve_acronym() {
        let hierarchy = sample();
        assert_eq!(hierarchy.resolve_acronym("A1").unwrap(), 4);
        assert!(matches!(
            hierarchy.resolve_acronym("a1"),
            Err(OntologyError::AcronymNotFound(_))
        ));
    }
}
