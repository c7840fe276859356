// Copyright 2025 Atlas Mask Contributors
// SPDX-License-Identifier: Apache-2.0

/*!
NRRD volume reader and writer

Only attached-header, `raw`-encoded 3-D volumes are handled:

```text
NRRD0004
type: uint16
dimension: 3
sizes: 456 320 528
encoding: raw
endian: little
space directions: (25,0,0) (0,25,0) (0,0,25)

<raw voxel bytes>
```

`sizes` lists the fastest axis first, so a header with `sizes: X Y Z` maps to
an array of shape `[Z, Y, X]` in C order. Space fields are carried through
unchanged so outputs stay registered to the input.
*/

use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};
use ndarray::Array3;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

use atlas_mask_engine::{LabeledVolume, RegionId};

use crate::error::{VolumeIoError, VolumeIoResult};

const MAGIC_PREFIX: &str = "NRRD000";
const WRITTEN_MAGIC: &str = "NRRD0004";

/// Voxel types accepted on input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoxelType {
    Uint8,
    Uint16,
    Uint32,
    Int32,
}

impl VoxelType {
    pub fn byte_width(self) -> usize {
        match self {
            VoxelType::Uint8 => 1,
            VoxelType::Uint16 => 2,
            VoxelType::Uint32 | VoxelType::Int32 => 4,
        }
    }

    pub fn nrrd_name(self) -> &'static str {
        match self {
            VoxelType::Uint8 => "uint8",
            VoxelType::Uint16 => "uint16",
            VoxelType::Uint32 => "uint32",
            VoxelType::Int32 => "int32",
        }
    }
}

impl FromStr for VoxelType {
    type Err = VolumeIoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "uchar" | "unsigned char" | "uint8" | "uint8_t" => Ok(VoxelType::Uint8),
            "ushort" | "unsigned short" | "unsigned short int" | "uint16" | "uint16_t" => {
                Ok(VoxelType::Uint16)
            }
            "uint" | "unsigned int" | "uint32" | "uint32_t" => Ok(VoxelType::Uint32),
            "int" | "signed int" | "int32" | "int32_t" => Ok(VoxelType::Int32),
            other => Err(VolumeIoError::UnsupportedType(other.to_string())),
        }
    }
}

impl fmt::Display for VoxelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.nrrd_name())
    }
}

/// Byte order of the raw data block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

/// Physical placement of the raster, copied verbatim between files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpatialMetadata {
    pub space: Option<String>,
    pub space_directions: Option<String>,
    pub space_origin: Option<String>,
}

/// Parsed header of an input volume
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NrrdHeader {
    pub voxel_type: VoxelType,
    /// Fastest axis first, as written in the file
    pub sizes: [usize; 3],
    pub endian: Endian,
    pub spatial: SpatialMetadata,
}

impl NrrdHeader {
    /// Array shape `(z, y, x)` in C order
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.sizes[2], self.sizes[1], self.sizes[0])
    }

    /// Number of voxels, or `InvalidHeader` if `sizes` overflows
    pub fn voxel_count(&self) -> VolumeIoResult<usize> {
        self.sizes
            .iter()
            .try_fold(1usize, |count, &size| count.checked_mul(size))
            .ok_or_else(|| self.sizes_overflow())
    }

    /// Length of the raw data block in bytes
    pub fn data_len(&self) -> VolumeIoResult<usize> {
        self.voxel_count()?
            .checked_mul(self.voxel_type.byte_width())
            .ok_or_else(|| self.sizes_overflow())
    }

    fn sizes_overflow(&self) -> VolumeIoError {
        VolumeIoError::InvalidHeader(format!(
            "sizes overflow: {} x {} x {} voxels of {}",
            self.sizes[0], self.sizes[1], self.sizes[2], self.voxel_type
        ))
    }

    fn parse(text: &str) -> VolumeIoResult<Self> {
        let mut lines = text.lines().map(|line| line.trim_end_matches('\r'));
        let magic = lines.next().unwrap_or_default();
        if !magic.starts_with(MAGIC_PREFIX) {
            return Err(VolumeIoError::InvalidMagic(magic.to_string()));
        }

        let mut voxel_type = None;
        let mut dimension = None;
        let mut sizes = None;
        let mut encoding = None;
        let mut endian = None;
        let mut spatial = SpatialMetadata::default();

        for line in lines {
            if line.is_empty() || line.starts_with('#') || line.contains(":=") {
                continue;
            }
            let (field, value) = line.split_once(": ").ok_or_else(|| {
                VolumeIoError::InvalidHeader(format!("unparseable line '{}'", line))
            })?;
            let value = value.trim();
            match field.trim() {
                "type" => voxel_type = Some(value.parse::<VoxelType>()?),
                "dimension" => dimension = Some(parse_usize("dimension", value)?),
                "sizes" => sizes = Some(parse_sizes(value)?),
                "encoding" => encoding = Some(value.to_string()),
                "endian" => {
                    endian = Some(match value {
                        "little" => Endian::Little,
                        "big" => Endian::Big,
                        other => {
                            return Err(VolumeIoError::InvalidHeader(format!(
                                "unknown endian '{}'",
                                other
                            )))
                        }
                    })
                }
                "data file" | "datafile" => {
                    return Err(VolumeIoError::InvalidHeader(
                        "detached data files are not supported".to_string(),
                    ))
                }
                "space" => spatial.space = Some(value.to_string()),
                "space directions" => spatial.space_directions = Some(value.to_string()),
                "space origin" => spatial.space_origin = Some(value.to_string()),
                other => debug!(field = other, "Ignoring NRRD header field"),
            }
        }

        let voxel_type = voxel_type.ok_or(VolumeIoError::MissingField("type"))?;
        let dimension = dimension.ok_or(VolumeIoError::MissingField("dimension"))?;
        if dimension != 3 {
            return Err(VolumeIoError::UnsupportedDimension(dimension));
        }
        let sizes = sizes.ok_or(VolumeIoError::MissingField("sizes"))?;
        let encoding = encoding.ok_or(VolumeIoError::MissingField("encoding"))?;
        if encoding != "raw" {
            return Err(VolumeIoError::UnsupportedEncoding(encoding));
        }
        let endian = match endian {
            Some(endian) => endian,
            None => {
                if voxel_type.byte_width() > 1 {
                    warn!("NRRD header has no endian field; assuming little endian");
                }
                Endian::Little
            }
        };

        Ok(Self {
            voxel_type,
            sizes,
            endian,
            spatial,
        })
    }
}

fn parse_usize(field: &str, value: &str) -> VolumeIoResult<usize> {
    value
        .parse::<usize>()
        .map_err(|_| VolumeIoError::InvalidHeader(format!("{} '{}' is not a count", field, value)))
}

fn parse_sizes(value: &str) -> VolumeIoResult<[usize; 3]> {
    let parsed = value
        .split_whitespace()
        .map(|part| parse_usize("sizes", part))
        .collect::<VolumeIoResult<Vec<usize>>>()?;
    match parsed.as_slice() {
        [x, y, z] => Ok([*x, *y, *z]),
        other => Err(VolumeIoError::UnsupportedDimension(other.len())),
    }
}

/// Split the buffer at the blank line ending the header
fn split_header(bytes: &[u8]) -> VolumeIoResult<(&str, usize)> {
    let mut line_start = 0;
    for (position, &byte) in bytes.iter().enumerate() {
        if byte != b'\n' {
            continue;
        }
        let line = &bytes[line_start..position];
        if line.is_empty() || line == b"\r" {
            let header = std::str::from_utf8(&bytes[..line_start]).map_err(|_| {
                VolumeIoError::InvalidHeader("header is not valid UTF-8".to_string())
            })?;
            return Ok((header, position + 1));
        }
        line_start = position + 1;
    }
    Err(VolumeIoError::InvalidHeader(
        "no blank line terminating the header".to_string(),
    ))
}

fn decode_body(header: &NrrdHeader, body: &[u8]) -> VolumeIoResult<Vec<RegionId>> {
    let expected = header.data_len()?;
    if body.len() < expected {
        return Err(VolumeIoError::SizeMismatch {
            expected,
            actual: body.len(),
        });
    }
    if body.len() > expected {
        debug!(
            trailing = body.len() - expected,
            "Ignoring trailing bytes after voxel data"
        );
    }
    let body = &body[..expected];
    let big = header.endian == Endian::Big;

    let values: Vec<RegionId> = match header.voxel_type {
        VoxelType::Uint8 => body.iter().map(|&b| RegionId::from(b)).collect(),
        VoxelType::Uint16 => body
            .chunks_exact(2)
            .map(|chunk| {
                RegionId::from(if big {
                    BigEndian::read_u16(chunk)
                } else {
                    LittleEndian::read_u16(chunk)
                })
            })
            .collect(),
        VoxelType::Uint32 => body
            .chunks_exact(4)
            .map(|chunk| {
                if big {
                    BigEndian::read_u32(chunk)
                } else {
                    LittleEndian::read_u32(chunk)
                }
            })
            .collect(),
        VoxelType::Int32 => body
            .chunks_exact(4)
            .map(|chunk| {
                let value = if big {
                    BigEndian::read_i32(chunk)
                } else {
                    LittleEndian::read_i32(chunk)
                };
                RegionId::try_from(value).map_err(|_| VolumeIoError::ValueOutOfRange {
                    value: i64::from(value),
                })
            })
            .collect::<VolumeIoResult<Vec<RegionId>>>()?,
    };
    Ok(values)
}

/// Decode a volume from any reader
pub fn decode_nrrd<R: Read>(mut reader: R) -> VolumeIoResult<(LabeledVolume, NrrdHeader)> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    let (header_text, body_start) = split_header(&bytes)?;
    let header = NrrdHeader::parse(header_text)?;
    let values = decode_body(&header, &bytes[body_start..])?;
    let volume = LabeledVolume::from_shape_vec(header.shape(), values)?;
    Ok((volume, header))
}

/// Load a labeled volume from an NRRD file
pub fn load_nrrd<P: AsRef<Path>>(path: P) -> VolumeIoResult<(LabeledVolume, NrrdHeader)> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let (volume, header) = decode_nrrd(BufReader::new(file))?;
    info!(
        path = %path.display(),
        voxel_type = %header.voxel_type,
        shape = ?volume.shape(),
        "Loaded volume"
    );
    Ok((volume, header))
}

/// Voxel arrays that can be written
#[derive(Debug, Clone, Copy)]
pub enum VoxelData<'a> {
    U8(&'a Array3<u8>),
    U16(&'a Array3<u16>),
    U32(&'a Array3<u32>),
}

impl VoxelData<'_> {
    pub fn voxel_type(&self) -> VoxelType {
        match self {
            VoxelData::U8(_) => VoxelType::Uint8,
            VoxelData::U16(_) => VoxelType::Uint16,
            VoxelData::U32(_) => VoxelType::Uint32,
        }
    }

    fn dim(&self) -> (usize, usize, usize) {
        match self {
            VoxelData::U8(array) => array.dim(),
            VoxelData::U16(array) => array.dim(),
            VoxelData::U32(array) => array.dim(),
        }
    }
}

/// Encode a volume as little-endian raw NRRD
pub fn encode_nrrd<W: Write>(
    writer: W,
    data: VoxelData<'_>,
    spatial: &SpatialMetadata,
) -> VolumeIoResult<()> {
    let mut writer = BufWriter::new(writer);
    let (z, y, x) = data.dim();
    let voxel_type = data.voxel_type();

    writeln!(writer, "{}", WRITTEN_MAGIC)?;
    writeln!(writer, "# written by atlas-mask {}", crate::VERSION)?;
    writeln!(writer, "type: {}", voxel_type)?;
    writeln!(writer, "dimension: 3")?;
    if let Some(space) = &spatial.space {
        writeln!(writer, "space: {}", space)?;
    }
    writeln!(writer, "sizes: {} {} {}", x, y, z)?;
    if let Some(directions) = &spatial.space_directions {
        writeln!(writer, "space directions: {}", directions)?;
    }
    writeln!(writer, "encoding: raw")?;
    if voxel_type.byte_width() > 1 {
        writeln!(writer, "endian: little")?;
    }
    if let Some(origin) = &spatial.space_origin {
        writeln!(writer, "space origin: {}", origin)?;
    }
    writeln!(writer)?;

    // Logical iteration order is C order regardless of memory layout
    match data {
        VoxelData::U8(array) => {
            for &value in array.iter() {
                writer.write_u8(value)?;
            }
        }
        VoxelData::U16(array) => {
            for &value in array.iter() {
                writer.write_u16::<LittleEndian>(value)?;
            }
        }
        VoxelData::U32(array) => {
            for &value in array.iter() {
                writer.write_u32::<LittleEndian>(value)?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

/// Write an NRRD file directly (not staged)
pub fn save_nrrd<P: AsRef<Path>>(
    path: P,
    data: VoxelData<'_>,
    spatial: &SpatialMetadata,
) -> VolumeIoResult<()> {
    let file = File::create(path.as_ref())?;
    encode_nrrd(file, data, spatial)
}
