//! Voxel grid geometry: dimensions, bounds, voxel size and index mapping.
//!
//! A [`GridGeometry`] is a box of `dimensions.x * dimensions.y * dimensions.z`
//! voxels. Its bounds live in the local frame of an optional anchor
//! [`Transform`]; only the anchor translation is applied to the world-space
//! bounds, rotation and scale never change the box size.
//!
//! Voxels are flattened z-major: `index = x + y * dim.x + z * dim.x * dim.y`.
//! Sampling kernels and the distance packager rely on this layout.

use glam::{Mat4, UVec3, Vec3};

use crate::bounds::Aabb;
use crate::error::{Result, SdfrError};
use crate::transform::Transform;

/// Largest allowed resolution on any grid axis.
pub const MAX_GRID_DIMENSION: u32 = 256;

/// Smallest resolution on every axis for which border padding is defined.
pub const MIN_BORDER_DIMENSION: u32 = 3;

/// The geometry of a regular voxel grid anchored to a transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    transform: Option<Transform>,
    dimensions: UVec3,
    cell_count: usize,
    max_dimension: u32,
    bounds_local: Aabb,
    bounds_world: Aabb,
    voxel_size: Vec3,
    half_voxel: Vec3,
}

impl GridGeometry {
    /// Creates a grid with the given resolution and local bounds.
    ///
    /// Fails with a configuration error if any dimension lies outside
    /// `[1, MAX_GRID_DIMENSION]` or the bounds are not a finite, positive volume.
    pub fn initialize(transform: Option<Transform>, dimensions: UVec3, bounds: Aabb) -> Result<Self> {
        validate_dimensions(dimensions)?;

        let mut grid = Self {
            transform,
            dimensions,
            cell_count: dimensions.x as usize * dimensions.y as usize * dimensions.z as usize,
            max_dimension: dimensions.max_element(),
            bounds_local: bounds,
            bounds_world: bounds,
            voxel_size: Vec3::ZERO,
            half_voxel: Vec3::ZERO,
        };
        grid.update_bounds(bounds, false)?;

        log::debug!(
            "grid initialized: {} cells ({}x{}x{})",
            grid.cell_count,
            dimensions.x,
            dimensions.y,
            dimensions.z
        );
        Ok(grid)
    }

    /// Replaces the local bounds and recomputes everything derived from them.
    ///
    /// With `add_border` the bounds grow by one voxel layer on each side,
    /// where the voxel size is measured as if the two outer layers did not
    /// exist (`size / (dimensions - 2)`). Surfaces fitted to `new_bounds`
    /// then never touch the outermost voxels. Border padding requires every
    /// dimension to be at least [`MIN_BORDER_DIMENSION`].
    ///
    /// Returns the final local bounds. On error the grid is left unchanged.
    pub fn update_bounds(&mut self, new_bounds: Aabb, add_border: bool) -> Result<Aabb> {
        validate_bounds(&new_bounds)?;
        if add_border {
            validate_border(self.dimensions)?;
        }

        self.apply_bounds(new_bounds);

        if !add_border {
            return Ok(self.bounds_local);
        }

        let extra_border_voxel_size =
            self.bounds_local.size / (self.dimensions.as_vec3() - Vec3::splat(2.0));
        let grown = Aabb::new(
            self.bounds_local.center,
            self.bounds_local.size + extra_border_voxel_size * 2.0,
        );
        log::debug!(
            "border padding grew bounds from {} to {}",
            self.bounds_local.size,
            grown.size
        );

        self.update_bounds(grown, false)
    }

    fn apply_bounds(&mut self, bounds: Aabb) {
        self.bounds_local = bounds;
        self.bounds_world = bounds.translated(self.anchor_position());
        self.voxel_size = bounds.size / self.dimensions.as_vec3();
        self.half_voxel = self.voxel_size * 0.5;
    }

    /// Rebinds the anchor transform; world bounds follow the new position.
    pub fn set_transform(&mut self, transform: Option<Transform>) {
        self.transform = transform;
        self.bounds_world = self.bounds_local.translated(self.anchor_position());
    }

    /// The anchor transform, if one is bound.
    #[must_use]
    pub fn transform(&self) -> Option<&Transform> {
        self.transform.as_ref()
    }

    /// World position of the anchor (origin when no transform is bound).
    #[must_use]
    pub fn anchor_position(&self) -> Vec3 {
        self.transform.map_or(Vec3::ZERO, |t| t.translation)
    }

    /// Number of voxels on each axis.
    #[must_use]
    pub fn dimensions(&self) -> UVec3 {
        self.dimensions
    }

    /// Total number of voxels.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    /// Largest dimension component.
    #[must_use]
    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Bounds in the anchor's local frame.
    #[must_use]
    pub fn bounds_local(&self) -> Aabb {
        self.bounds_local
    }

    /// Bounds offset by the anchor position.
    #[must_use]
    pub fn bounds_world(&self) -> Aabb {
        self.bounds_world
    }

    /// Edge length of one voxel on each axis.
    #[must_use]
    pub fn voxel_size(&self) -> Vec3 {
        self.voxel_size
    }

    /// Half of [`Self::voxel_size`].
    #[must_use]
    pub fn half_voxel(&self) -> Vec3 {
        self.half_voxel
    }

    /// Converts a flat voxel index into a grid coordinate.
    ///
    /// `index` must be below [`Self::cell_count`]; larger values produce
    /// coordinates outside the grid.
    #[must_use]
    pub fn index_to_coordinate(&self, index: usize) -> UVec3 {
        let dim_x = self.dimensions.x as usize;
        let slice = dim_x * self.dimensions.y as usize;

        let z = index / slice;
        let rem = index - z * slice;
        let y = rem / dim_x;
        let x = rem % dim_x;
        UVec3::new(x as u32, y as u32, z as u32)
    }

    /// Flattens a grid coordinate into a voxel index.
    #[must_use]
    pub fn coordinate_to_index(&self, coord: UVec3) -> usize {
        let dim_x = self.dimensions.x as usize;
        let dim_y = self.dimensions.y as usize;
        coord.x as usize + coord.y as usize * dim_x + coord.z as usize * dim_x * dim_y
    }

    /// World-space position of the voxel at `index`.
    ///
    /// The coordinate is normalized to `[-0.5, 0.5)` of the bounds, scaled by
    /// the bounds size and mapped through [`Self::local_to_world_no_scale`].
    /// The anchor scale is left out: bounds fitted to world-space geometry
    /// already carry it.
    ///
    /// Without an anchor the bounds sit in world space as given, so the
    /// position is offset by the bounds center, matching [`Self::bounds_world`].
    #[must_use]
    pub fn coordinate_to_world_position(&self, index: usize) -> Vec3 {
        let coord = self.index_to_coordinate(index).as_vec3();
        let position_bounds = coord / self.dimensions.as_vec3() - Vec3::splat(0.5);
        let position_local = position_bounds * self.bounds_local.size;
        match self.transform {
            Some(_) => self.local_to_world_no_scale().transform_point3(position_local),
            None => position_local + self.bounds_local.center,
        }
    }

    /// Anchor position plus bounds center, anchor rotation, unit scale.
    #[must_use]
    pub fn local_to_world_no_scale(&self) -> Mat4 {
        match self.transform {
            Some(t) => Mat4::from_rotation_translation(
                t.rotation,
                t.translation + self.bounds_local.center,
            ),
            None => Mat4::IDENTITY,
        }
    }

    /// Anchor position plus bounds center, anchor rotation, anchor scale.
    #[must_use]
    pub fn local_to_world(&self) -> Mat4 {
        match self.transform {
            Some(t) => Mat4::from_scale_rotation_translation(
                t.scale,
                t.rotation,
                t.translation + self.bounds_local.center,
            ),
            None => Mat4::IDENTITY,
        }
    }

    /// Inverse of [`Self::local_to_world`].
    #[must_use]
    pub fn world_to_local(&self) -> Mat4 {
        self.local_to_world().inverse()
    }

    /// World-space wireframe of the grid bounds: 8 corners and 12 edges.
    ///
    /// The box is drawn in the anchor frame without scale, matching how the
    /// voxel positions are produced.
    #[must_use]
    pub fn bounds_wireframe(&self) -> (Vec<Vec3>, Vec<[u32; 2]>) {
        let frame = self
            .transform
            .map_or(Mat4::IDENTITY, |t| t.to_matrix_no_scale());

        let nodes = self
            .bounds_local
            .corners()
            .iter()
            .map(|c| frame.transform_point3(*c))
            .collect();

        let edges = vec![
            // Bottom face
            [0, 1],
            [1, 2],
            [2, 3],
            [3, 0],
            // Top face
            [4, 5],
            [5, 6],
            [6, 7],
            [7, 4],
            // Vertical edges
            [0, 4],
            [1, 5],
            [2, 6],
            [3, 7],
        ];

        (nodes, edges)
    }
}

/// Checks that every axis lies in `[1, MAX_GRID_DIMENSION]`.
pub fn validate_dimensions(dimensions: UVec3) -> Result<()> {
    if dimensions.cmpeq(UVec3::ZERO).any() || dimensions.cmpgt(UVec3::splat(MAX_GRID_DIMENSION)).any()
    {
        return Err(SdfrError::Configuration(format!(
            "grid dimensions {dimensions} must lie in [1, {MAX_GRID_DIMENSION}] on every axis"
        )));
    }
    Ok(())
}

/// Checks that border padding is defined for `dimensions`.
pub fn validate_border(dimensions: UVec3) -> Result<()> {
    if dimensions.cmplt(UVec3::splat(MIN_BORDER_DIMENSION)).any() {
        return Err(SdfrError::Configuration(format!(
            "border padding requires every dimension to be at least {MIN_BORDER_DIMENSION}, got {dimensions}"
        )));
    }
    Ok(())
}

/// Checks that bounds describe a finite box with positive size.
pub fn validate_bounds(bounds: &Aabb) -> Result<()> {
    if !bounds.is_valid_volume() {
        return Err(SdfrError::Configuration(format!(
            "bounds must have a finite center and a positive finite size, got center {} size {}",
            bounds.center, bounds.size
        )));
    }
    Ok(())
}
