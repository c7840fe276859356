// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! Persisting a finished pipeline run

use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

use atlas_mask_engine::PipelineOutput;

use crate::csv::write_table;
use crate::error::{VolumeIoError, VolumeIoResult};
use crate::format::{encode_volume, VolumeFormat};
use crate::nrrd::{SpatialMetadata, VoxelData};
use crate::staging::StagedWriter;

/// Where each artifact of a run goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// Simplified volume, written as `uint16` (NRRD or TIFF by extension)
    pub volume: PathBuf,
    /// Binary QC mask of the input, written as `uint8` (NRRD or TIFF by extension)
    pub whole_mask: PathBuf,
    pub catalog: PathBuf,
    pub fragment_report: PathBuf,
    /// Optional JSON run summary
    pub summary: Option<PathBuf>,
}

impl OutputPaths {
    fn all(&self) -> Vec<&PathBuf> {
        let mut paths = vec![
            &self.volume,
            &self.whole_mask,
            &self.catalog,
            &self.fragment_report,
        ];
        paths.extend(self.summary.as_ref());
        paths
    }

    /// Reject two artifacts sharing a path or a volume path without a known format
    pub fn validate(&self) -> VolumeIoResult<()> {
        VolumeFormat::from_path(&self.volume)?;
        VolumeFormat::from_path(&self.whole_mask)?;
        let mut seen = HashSet::new();
        for path in self.all() {
            if !seen.insert(path) {
                return Err(VolumeIoError::DuplicateOutput(path.display().to_string()));
            }
        }
        Ok(())
    }
}

/// Write every artifact of `output`, or none of them
///
/// The final volume must fit into 16 bits (run compaction with the default
/// `max_value`); otherwise nothing is written.
pub fn save_outputs(
    output: &PipelineOutput,
    paths: &OutputPaths,
    spatial: &SpatialMetadata,
) -> VolumeIoResult<Vec<PathBuf>> {
    paths.validate()?;
    let volume_format = VolumeFormat::from_path(&paths.volume)?;
    let mask_format = VolumeFormat::from_path(&paths.whole_mask)?;
    let volume_u16 = output.volume.to_u16()?;

    let mut writer = StagedWriter::new();
    writer.stage(&paths.volume, |w| {
        encode_volume(w, volume_format, VoxelData::U16(&volume_u16), spatial)
    })?;
    writer.stage(&paths.whole_mask, |w| {
        encode_volume(w, mask_format, VoxelData::U8(&output.whole_mask), spatial)
    })?;
    writer.stage(&paths.catalog, |w| write_table(w, output.catalog.rows()))?;
    writer.stage(&paths.fragment_report, |w| {
        write_table(w, &output.ledger.to_table().rows)
    })?;
    if let Some(summary_path) = &paths.summary {
        writer.stage(summary_path, |w| {
            serde_json::to_writer_pretty(&mut *w, &output.summary)?;
            writeln!(w)?;
            Ok(())
        })?;
    }

    let published = writer.commit()?;
    info!(
        volume = %paths.volume.display(),
        catalog_rows = output.catalog.len(),
        fragments = output.ledger.len(),
        "Saved pipeline outputs"
    );
    Ok(published)
}
