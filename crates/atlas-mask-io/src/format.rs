// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! Volume file format chosen by extension

use std::fmt;
use std::io::{Seek, Write};
use std::path::Path;

use atlas_mask_engine::LabeledVolume;

use crate::error::{VolumeIoError, VolumeIoResult};
use crate::nrrd::{encode_nrrd, load_nrrd, SpatialMetadata, VoxelData};
use crate::tiff_stack::{encode_tiff, load_tiff};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeFormat {
    Nrrd,
    Tiff,
}

impl VolumeFormat {
    /// `.nrrd`, `.tif` or `.tiff`, case-insensitive
    pub fn from_path(path: &Path) -> VolumeIoResult<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("nrrd") => Ok(VolumeFormat::Nrrd),
            Some("tif" | "tiff") => Ok(VolumeFormat::Tiff),
            _ => Err(VolumeIoError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl fmt::Display for VolumeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeFormat::Nrrd => f.write_str("nrrd"),
            VolumeFormat::Tiff => f.write_str("tiff"),
        }
    }
}

/// Load a volume as NRRD or TIFF
///
/// TIFF stacks carry no space fields, so their metadata is empty.
pub fn load_volume<P: AsRef<Path>>(path: P) -> VolumeIoResult<(LabeledVolume, SpatialMetadata)> {
    let path = path.as_ref();
    match VolumeFormat::from_path(path)? {
        VolumeFormat::Nrrd => {
            let (volume, header) = load_nrrd(path)?;
            Ok((volume, header.spatial))
        }
        VolumeFormat::Tiff => Ok((load_tiff(path)?, SpatialMetadata::default())),
    }
}

/// Encode `data` in `format`; `spatial` only applies to NRRD
pub fn encode_volume<W: Write + Seek>(
    writer: W,
    format: VolumeFormat,
    data: VoxelData<'_>,
    spatial: &SpatialMetadata,
) -> VolumeIoResult<()> {
    match format {
        VolumeFormat::Nrrd => encode_nrrd(writer, data, spatial),
        VolumeFormat::Tiff => encode_tiff(writer, data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            VolumeFormat::from_path(Path::new("a/adjusted_mask.tiff")).unwrap(),
            VolumeFormat::Tiff
        );
        assert_eq!(VolumeFormat::from_path(Path::new("x.TIF")).unwrap(), VolumeFormat::Tiff);
        assert_eq!(VolumeFormat::from_path(Path::new("x.nrrd")).unwrap(), VolumeFormat::Nrrd);
        assert!(matches!(
            VolumeFormat::from_path(Path::new("x.nii.gz")),
            Err(VolumeIoError::UnsupportedFormat(_))
        ));
        assert!(VolumeFormat::from_path(Path::new("volume")).is_err());
    }
}
