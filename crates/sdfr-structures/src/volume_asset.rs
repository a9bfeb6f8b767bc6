//! The baked signed distance field record.

use std::sync::Arc;

use glam::{UVec3, Vec3};
use sdfr_core::{Aabb, Result, SdfrError};

use crate::material::{MaterialPropertyBlock, VolumeTexture, SDF_VOLUME_EXTENTS, SDF_VOLUME_TEX};
use crate::packager::{decode, validate_max_distance};

/// A baked, normalized signed distance field.
///
/// Distances are stored divided by [`VolumeAsset::max_distance`], flattened
/// z-major, one value per voxel. An asset is immutable; re-baking produces a
/// new one.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeAsset {
    dimensions: UVec3,
    bounds: Aabb,
    voxel_size: Vec3,
    non_uniform_scale: Vec3,
    max_distance: f32,
    distance_field: Arc<[f32]>,
}

impl VolumeAsset {
    /// Creates an asset from already normalized distances.
    ///
    /// Fails if the field length differs from the cell count or
    /// `max_distance` is not a positive finite number.
    pub fn new(
        dimensions: UVec3,
        bounds: Aabb,
        voxel_size: Vec3,
        non_uniform_scale: Vec3,
        max_distance: f32,
        distance_field: Vec<f32>,
    ) -> Result<Self> {
        let expected = dimensions.x as usize * dimensions.y as usize * dimensions.z as usize;
        if distance_field.len() != expected {
            return Err(SdfrError::SizeMismatch {
                expected,
                actual: distance_field.len(),
            });
        }
        validate_max_distance(max_distance)?;

        Ok(Self {
            dimensions,
            bounds,
            voxel_size,
            non_uniform_scale,
            max_distance,
            distance_field: distance_field.into(),
        })
    }

    /// Number of voxels on each axis.
    #[must_use]
    pub fn dimensions(&self) -> UVec3 {
        self.dimensions
    }

    /// Local bounds at bake time, including border padding.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Voxel edge lengths at bake time.
    #[must_use]
    pub fn voxel_size(&self) -> Vec3 {
        self.voxel_size
    }

    /// Bounds size divided by its smallest axis.
    #[must_use]
    pub fn non_uniform_scale(&self) -> Vec3 {
        self.non_uniform_scale
    }

    /// Divisor the stored distances were normalized by.
    #[must_use]
    pub fn max_distance(&self) -> f32 {
        self.max_distance
    }

    /// Normalized distances, z-major.
    #[must_use]
    pub fn distance_field(&self) -> &[f32] {
        &self.distance_field
    }

    /// Total number of voxels.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.distance_field.len()
    }

    /// Half of the bounds size.
    #[must_use]
    pub fn extents(&self) -> Vec3 {
        self.bounds.extents()
    }

    /// Normalized distance at a grid coordinate, or `None` outside the grid.
    #[must_use]
    pub fn normalized_at(&self, coord: UVec3) -> Option<f32> {
        if !coord.cmplt(self.dimensions).all() {
            return None;
        }
        let dim_x = self.dimensions.x as usize;
        let dim_y = self.dimensions.y as usize;
        let index = coord.x as usize + coord.y as usize * dim_x + coord.z as usize * dim_x * dim_y;
        self.distance_field.get(index).copied()
    }

    /// Raw distance at a grid coordinate, or `None` outside the grid.
    #[must_use]
    pub fn distance_at(&self, coord: UVec3) -> Option<f32> {
        self.normalized_at(coord).map(|d| d * self.max_distance)
    }

    /// All raw distances, undoing the normalization.
    #[must_use]
    pub fn decoded_distances(&self) -> Vec<f32> {
        decode(&self.distance_field, self.max_distance)
    }

    /// The distance field as a shareable 3D texture.
    #[must_use]
    pub fn texture(&self) -> VolumeTexture {
        VolumeTexture {
            dimensions: self.dimensions,
            texels: Arc::clone(&self.distance_field),
        }
    }

    /// Writes the distance-field texture and volume extents into `props`.
    pub fn set_material_properties(&self, props: &mut MaterialPropertyBlock) -> Result<()> {
        props.set_texture(SDF_VOLUME_TEX, self.texture())?;
        props.set_vector(SDF_VOLUME_EXTENTS, self.extents().extend(0.0))?;
        Ok(())
    }
}
