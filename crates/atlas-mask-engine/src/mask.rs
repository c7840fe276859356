// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! Whole-volume binary mask for visual QC

use ndarray::Array3;

use crate::types::BACKGROUND;
use crate::volume::LabeledVolume;

/// `1` wherever the input carries any region, `0` elsewhere
pub fn build_whole_volume_mask(volume: &LabeledVolume) -> Array3<u8> {
    volume.as_array().mapv(|v| u8::from(v != BACKGROUND))
}
