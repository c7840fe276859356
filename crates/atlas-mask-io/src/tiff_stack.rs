// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

//! Multi-page TIFF volumes
//!
//! Each page is one `z` slice of `height x width` grayscale voxels, the layout
//! registration tools write for 3-D label stacks. Pages must share their
//! dimensions. `uint8`, `uint16` and `uint32` pages are read; writing uses the
//! width of the [`VoxelData`] given.

use ndarray::{Array3, Axis};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::ColorType;
use tracing::info;

use atlas_mask_engine::{LabeledVolume, RegionId};

use crate::error::{VolumeIoError, VolumeIoResult};
use crate::nrrd::VoxelData;

/// Decode a page stack into a `(pages, height, width)` volume
pub fn decode_tiff<R: Read + Seek>(reader: R) -> VolumeIoResult<LabeledVolume> {
    // Atlas stacks easily exceed the default decoding buffer limit
    let mut decoder = Decoder::new(reader)?.with_limits(Limits::unlimited());
    let mut values: Vec<RegionId> = Vec::new();
    let mut page_dims: Option<(u32, u32)> = None;
    let mut pages = 0usize;

    loop {
        let dims = decoder.dimensions()?;
        match page_dims {
            None => page_dims = Some(dims),
            Some(first) if first != dims => {
                return Err(VolumeIoError::InvalidTiff(format!(
                    "page {} is {}x{} but page 0 is {}x{}",
                    pages, dims.0, dims.1, first.0, first.1
                )))
            }
            Some(_) => {}
        }
        match decoder.colortype()? {
            ColorType::Gray(8 | 16 | 32) => {}
            other => {
                return Err(VolumeIoError::InvalidTiff(format!(
                    "page {} has unsupported color type {:?}",
                    pages, other
                )))
            }
        }

        let expected = page_len(dims)?;
        let before = values.len();
        match decoder.read_image()? {
            DecodingResult::U8(page) => values.extend(page.into_iter().map(RegionId::from)),
            DecodingResult::U16(page) => values.extend(page.into_iter().map(RegionId::from)),
            DecodingResult::U32(page) => values.extend(page),
            _ => {
                return Err(VolumeIoError::InvalidTiff(format!(
                    "page {} holds a sample format other than unsigned integers",
                    pages
                )))
            }
        }
        if values.len() - before != expected {
            return Err(VolumeIoError::SizeMismatch {
                expected,
                actual: values.len() - before,
            });
        }
        pages += 1;

        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }

    let (width, height) = page_dims.unwrap_or_default();
    let volume = LabeledVolume::from_shape_vec((pages, height as usize, width as usize), values)?;
    Ok(volume)
}

fn page_len((width, height): (u32, u32)) -> VolumeIoResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| VolumeIoError::InvalidTiff(format!("page {}x{} overflows", width, height)))
}

/// Load a labeled volume from a multi-page TIFF file
pub fn load_tiff<P: AsRef<Path>>(path: P) -> VolumeIoResult<LabeledVolume> {
    let path = path.as_ref();
    let volume = decode_tiff(BufReader::new(File::open(path)?))?;
    info!(path = %path.display(), shape = ?volume.shape(), "Loaded volume");
    Ok(volume)
}

/// Encode a volume as one page per `z` slice
pub fn encode_tiff<W: Write + Seek>(writer: W, data: VoxelData<'_>) -> VolumeIoResult<()> {
    let mut encoder = TiffEncoder::new(writer)?;
    match data {
        VoxelData::U8(array) => write_pages::<_, colortype::Gray8, u8>(&mut encoder, array),
        VoxelData::U16(array) => write_pages::<_, colortype::Gray16, u16>(&mut encoder, array),
        VoxelData::U32(array) => write_pages::<_, colortype::Gray32, u32>(&mut encoder, array),
    }
}

fn write_pages<W, C, T>(encoder: &mut TiffEncoder<W>, array: &Array3<T>) -> VolumeIoResult<()>
where
    W: Write + Seek,
    C: colortype::ColorType<Inner = T>,
    T: Copy,
    [T]: tiff::encoder::TiffValue,
{
    let (_, height, width) = array.dim();
    let too_large =
        || VolumeIoError::InvalidTiff(format!("slice {}x{} exceeds TIFF limits", width, height));
    let width = u32::try_from(width).map_err(|_| too_large())?;
    let height = u32::try_from(height).map_err(|_| too_large())?;

    for slice in array.axis_iter(Axis(0)) {
        // Logical C order regardless of the array's memory layout
        let page: Vec<T> = slice.iter().copied().collect();
        encoder.write_image::<C>(width, height, &page)?;
    }
    Ok(())
}

/// Write a TIFF file directly (not staged)
pub fn save_tiff<P: AsRef<Path>>(path: P, data: VoxelData<'_>) -> VolumeIoResult<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    encode_tiff(&mut writer, data)?;
    writer.flush()?;
    Ok(())
}
