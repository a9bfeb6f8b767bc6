//! Binary persistence for [`VolumeAsset`].
//!
//! Layout (little-endian): a fixed 76-byte [`AssetHeader`] followed by the
//! normalized distance field, one `f16` or `f32` per voxel, z-major.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use glam::{UVec3, Vec3};
use half::f16;
use sdfr_core::{Aabb, FieldFormat, Result, SdfrError, MAX_GRID_DIMENSION};

use crate::volume_asset::VolumeAsset;

/// `b"SDFR"` read as a little-endian word.
const MAGIC: u32 = u32::from_le_bytes(*b"SDFR");

/// Current layout version.
pub const ASSET_VERSION: u32 = 1;

/// Fixed-size file header. Every field is a 4-byte word.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct AssetHeader {
    magic: u32,
    version: u32,
    dimensions: [i32; 3],
    format: u32,
    bounds_center: [f32; 3],
    bounds_size: [f32; 3],
    voxel_size: [f32; 3],
    non_uniform_scale: [f32; 3],
    max_distance: f32,
}

/// Size of [`AssetHeader`] in bytes.
pub const HEADER_SIZE: usize = std::mem::size_of::<AssetHeader>();

impl AssetHeader {
    fn new(asset: &VolumeAsset, format: FieldFormat) -> Self {
        let dims = asset.dimensions();
        Self {
            magic: MAGIC,
            version: ASSET_VERSION,
            dimensions: [dims.x as i32, dims.y as i32, dims.z as i32],
            format: match format {
                FieldFormat::Half => 0,
                FieldFormat::Float => 1,
            },
            bounds_center: asset.bounds().center.to_array(),
            bounds_size: asset.bounds().size.to_array(),
            voxel_size: asset.voxel_size().to_array(),
            non_uniform_scale: asset.non_uniform_scale().to_array(),
            max_distance: asset.max_distance(),
        }
    }

    fn to_le_bytes(self) -> [u8; HEADER_SIZE] {
        let mut words: [u32; HEADER_SIZE / 4] = bytemuck::cast(self);
        for w in &mut words {
            *w = w.to_le();
        }
        bytemuck::cast(words)
    }

    fn from_le_bytes(bytes: [u8; HEADER_SIZE]) -> Self {
        let mut words: [u32; HEADER_SIZE / 4] = bytemuck::cast(bytes);
        for w in &mut words {
            *w = u32::from_le(*w);
        }
        bytemuck::cast(words)
    }

    fn field_format(&self) -> Result<FieldFormat> {
        match self.format {
            0 => Ok(FieldFormat::Half),
            1 => Ok(FieldFormat::Float),
            other => Err(SdfrError::AssetFormat(format!("unknown field format {other}"))),
        }
    }

    fn dimensions(&self) -> Result<UVec3> {
        if self
            .dimensions
            .iter()
            .any(|d| *d <= 0 || *d as u32 > MAX_GRID_DIMENSION)
        {
            return Err(SdfrError::AssetFormat(format!(
                "dimensions must lie in [1, {MAX_GRID_DIMENSION}], got {:?}",
                self.dimensions
            )));
        }
        Ok(UVec3::new(
            self.dimensions[0] as u32,
            self.dimensions[1] as u32,
            self.dimensions[2] as u32,
        ))
    }
}

/// Writes `asset` with its distances stored as `format`.
pub fn write_asset<W: Write>(writer: &mut W, asset: &VolumeAsset, format: FieldFormat) -> Result<()> {
    writer.write_all(&AssetHeader::new(asset, format).to_le_bytes())?;

    let mut payload = Vec::with_capacity(asset.cell_count() * format.bytes_per_value());
    match format {
        FieldFormat::Half => {
            for v in asset.distance_field() {
                payload.extend_from_slice(&f16::from_f32(*v).to_le_bytes());
            }
        }
        FieldFormat::Float => {
            for v in asset.distance_field() {
                payload.extend_from_slice(&v.to_le_bytes());
            }
        }
    }
    writer.write_all(&payload)?;
    writer.flush()?;
    Ok(())
}

/// Reads an asset and the format its distances were stored in.
pub fn read_asset<R: Read>(reader: &mut R) -> Result<(VolumeAsset, FieldFormat)> {
    let mut header_bytes = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header_bytes).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            SdfrError::AssetFormat("truncated header".to_string())
        } else {
            SdfrError::AssetIo(e)
        }
    })?;
    let header = AssetHeader::from_le_bytes(header_bytes);

    if header.magic != MAGIC {
        return Err(SdfrError::AssetFormat("not an sdfr asset".to_string()));
    }
    if header.version != ASSET_VERSION {
        return Err(SdfrError::AssetFormat(format!(
            "unsupported version {}",
            header.version
        )));
    }
    let format = header.field_format()?;
    let dims = header.dimensions()?;
    let expected = [dims.y as usize, dims.z as usize, format.bytes_per_value()]
        .into_iter()
        .try_fold(dims.x as usize, usize::checked_mul)
        .ok_or_else(|| SdfrError::AssetFormat(format!("payload size overflows for {dims}")))?;

    let mut payload = Vec::new();
    reader.read_to_end(&mut payload)?;
    if payload.len() != expected {
        return Err(SdfrError::AssetFormat(format!(
            "payload holds {} bytes, expected {expected}",
            payload.len()
        )));
    }

    let field: Vec<f32> = match format {
        FieldFormat::Half => payload
            .chunks_exact(2)
            .map(|c| f16::from_le_bytes([c[0], c[1]]).to_f32())
            .collect(),
        FieldFormat::Float => payload
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    };

    let asset = VolumeAsset::new(
        dims,
        Aabb::new(
            Vec3::from_array(header.bounds_center),
            Vec3::from_array(header.bounds_size),
        ),
        Vec3::from_array(header.voxel_size),
        Vec3::from_array(header.non_uniform_scale),
        header.max_distance,
        field,
    )
    .map_err(|e| SdfrError::AssetFormat(e.to_string()))?;

    Ok((asset, format))
}

/// Writes `asset` to a file, replacing any existing file.
pub fn save_asset(path: impl AsRef<Path>, asset: &VolumeAsset, format: FieldFormat) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write_asset(&mut writer, asset, format)?;
    log::info!("saved volume asset to {}", path.display());
    Ok(())
}

/// Reads an asset from a file.
pub fn load_asset(path: impl AsRef<Path>) -> Result<(VolumeAsset, FieldFormat)> {
    let mut reader = BufReader::new(File::open(path)?);
    read_asset(&mut reader)
}
