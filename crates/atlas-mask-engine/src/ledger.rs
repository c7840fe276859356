// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fragment ledger and its tabular form

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::table::{bool_cell, TableRow};
use crate::types::RegionId;

/// One connected component of one region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentRecord {
    pub region_id: RegionId,
    pub region_name: String,
    /// 1-based, per region, in scan order
    pub fragment_index: u32,
    pub size_voxels: usize,
    pub removed: bool,
}

/// Append-only, ordered sequence of fragment records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentLedger {
    records: Vec<FragmentRecord>,
}

impl FragmentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, record: FragmentRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[FragmentRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &FragmentRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All fragments of one region, by fragment index
    pub fn fragments_for(&self, region_id: RegionId) -> impl Iterator<Item = &FragmentRecord> {
        self.records.iter().filter(move |r| r.region_id == region_id)
    }

    /// Sum of fragment sizes for one region
    pub fn total_size_for(&self, region_id: RegionId) -> usize {
        self.fragments_for(region_id).map(|r| r.size_voxels).sum()
    }

    /// Records flagged as removed
    pub fn removed(&self) -> impl Iterator<Item = &FragmentRecord> {
        self.records.iter().filter(|r| r.removed)
    }

    pub fn removed_count(&self) -> usize {
        self.removed().count()
    }

    pub fn removed_voxels(&self) -> usize {
        self.removed().map(|r| r.size_voxels).sum()
    }

    /// Number of distinct regions with at least one record
    pub fn region_count(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.region_id)
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn to_table(&self) -> FragmentTable {
        to_table(&self.records)
    }
}

/// Row of the fragment report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentRow {
    pub region_id: RegionId,
    pub region_name: String,
    pub fragment_index: u32,
    pub fragment_size_voxels: usize,
    pub removed: bool,
}

impl TableRow for FragmentRow {
    fn columns() -> &'static [&'static str] {
        &FragmentTable::COLUMNS
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.region_id.to_string(),
            self.region_name.clone(),
            self.fragment_index.to_string(),
            self.fragment_size_voxels.to_string(),
            bool_cell(self.removed),
        ]
    }
}

/// Fragment report: one row per record, fixed columns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentTable {
    pub rows: Vec<FragmentRow>,
}

impl FragmentTable {
    pub const COLUMNS: [&'static str; 5] = [
        "region_id",
        "region_name",
        "fragment_index",
        "fragment_size_voxels",
        "removed",
    ];
}

/// Structural transform of fragment records into the report table
pub fn to_table(records: &[FragmentRecord]) -> FragmentTable {
    FragmentTable {
        rows: records
            .iter()
            .map(|r| FragmentRow {
                region_id: r.region_id,
                region_name: r.region_name.clone(),
                fragment_index: r.fragment_index,
                fragment_size_voxels: r.size_voxels,
                removed: r.removed,
            })
            .collect(),
    }
}
