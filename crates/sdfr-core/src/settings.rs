//! Bake configuration.

use std::path::Path;

use glam::{UVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::bounds::Aabb;
use crate::error::{Result, SdfrError};
use crate::grid::{validate_bounds, validate_dimensions, MAX_GRID_DIMENSION};

/// Storage precision of the persisted distance field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FieldFormat {
    /// 16-bit floats (half precision, default).
    #[default]
    Half,
    /// 32-bit floats.
    Float,
}

impl FieldFormat {
    /// Bytes used per voxel.
    #[must_use]
    pub fn bytes_per_value(self) -> usize {
        match self {
            FieldFormat::Half => 2,
            FieldFormat::Float => 4,
        }
    }
}

/// Settings for one signed distance field bake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BakeSettings {
    /// Number of voxels on each axis.
    pub dimensions: UVec3,

    /// Grid bounds in the anchor's local frame. Replaced by the fitted
    /// bounds when surfaces are collected from the anchor's children.
    pub bounds: Aabb,

    /// Fit bounds to transformed mesh vertices instead of surface bounds.
    pub fit_to_vertices: bool,

    /// Rays cast per voxel by the sampling kernel.
    pub ray_samples: u32,

    /// Seed forwarded to the sampling kernel's jitter.
    pub jitter_seed: i32,

    /// Jitter amount forwarded to the sampling kernel.
    pub jitter_scale: f32,

    /// Precision of the persisted distance field.
    pub field_format: FieldFormat,
}

impl Default for BakeSettings {
    fn default() -> Self {
        Self {
            dimensions: UVec3::splat(32),
            bounds: Aabb::default(),
            fit_to_vertices: true,
            ray_samples: 256,
            jitter_seed: 555,
            jitter_scale: 0.75,
            field_format: FieldFormat::Half,
        }
    }
}

impl BakeSettings {
    /// Creates settings with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the grid resolution.
    #[must_use]
    pub fn with_dimensions(mut self, dimensions: UVec3) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Sets the grid bounds.
    #[must_use]
    pub fn with_bounds(mut self, bounds: Aabb) -> Self {
        self.bounds = bounds;
        self
    }

    /// Enables or disables fitting bounds to mesh vertices.
    #[must_use]
    pub fn with_fit_to_vertices(mut self, fit: bool) -> Self {
        self.fit_to_vertices = fit;
        self
    }

    /// Sets the rays cast per voxel.
    #[must_use]
    pub fn with_ray_samples(mut self, samples: u32) -> Self {
        self.ray_samples = samples;
        self
    }

    /// Sets the jitter seed and scale.
    #[must_use]
    pub fn with_jitter(mut self, seed: i32, scale: f32) -> Self {
        self.jitter_seed = seed;
        self.jitter_scale = scale;
        self
    }

    /// Sets the persisted field precision.
    #[must_use]
    pub fn with_field_format(mut self, format: FieldFormat) -> Self {
        self.field_format = format;
        self
    }

    /// Rejects settings a grid cannot be built from.
    pub fn validate(&self) -> Result<()> {
        validate_dimensions(self.dimensions)?;
        validate_bounds(&self.bounds)?;
        if self.ray_samples == 0 {
            return Err(SdfrError::Configuration(
                "ray samples per voxel must be at least 1".to_string(),
            ));
        }
        if !self.jitter_scale.is_finite() {
            return Err(SdfrError::Configuration(format!(
                "jitter scale must be finite, got {}",
                self.jitter_scale
            )));
        }
        Ok(())
    }

    /// Returns a copy with dimensions clamped to `[1, MAX_GRID_DIMENSION]`
    /// and every bounds extent raised to at least `f32::EPSILON`.
    ///
    /// This is an editing aid; the result still goes through [`Self::validate`].
    #[must_use]
    pub fn clamped(&self) -> Self {
        let mut out = self.clone();
        out.dimensions = self
            .dimensions
            .clamp(UVec3::ONE, UVec3::splat(MAX_GRID_DIMENSION));
        let extents = self.bounds.extents().max(Vec3::splat(f32::EPSILON));
        out.bounds = Aabb::new(self.bounds.center, extents * 2.0);
        out
    }

    /// Parses settings from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes settings to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Writes settings to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}
