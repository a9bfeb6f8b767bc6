//! Renderer-facing material parameters.

use std::collections::HashMap;
use std::sync::Arc;

use glam::{UVec3, Vec4};
use sdfr_core::state::property_id;
use sdfr_core::{PropertyId, Result};

/// Material property holding the distance-field texture.
pub const SDF_VOLUME_TEX: &str = "_SDFVolumeTex";

/// Material property holding the volume extents (half of the bounds size).
pub const SDF_VOLUME_EXTENTS: &str = "_SDFVolumeExtents";

/// A 3D single-channel texture backed by a baked distance field.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeTexture {
    /// Texture resolution, equal to the grid dimensions.
    pub dimensions: UVec3,
    /// Normalized distances, z-major.
    pub texels: Arc<[f32]>,
}

/// A value bound to a material property.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialValue {
    /// A four-component vector.
    Vector(Vec4),
    /// A 3D texture.
    Texture(VolumeTexture),
}

/// Per-draw material overrides, keyed by interned property id.
///
/// Values set before a context shutdown do not resolve after the next
/// initialization; the first write in the new session drops them.
#[derive(Debug, Clone, Default)]
pub struct MaterialPropertyBlock {
    values: HashMap<PropertyId, MaterialValue>,
}

impl MaterialPropertyBlock {
    /// Creates an empty block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a vector property by name.
    pub fn set_vector(&mut self, name: &str, value: Vec4) -> Result<()> {
        self.insert(name, MaterialValue::Vector(value))
    }

    /// Sets a texture property by name.
    pub fn set_texture(&mut self, name: &str, texture: VolumeTexture) -> Result<()> {
        self.insert(name, MaterialValue::Texture(texture))
    }

    fn insert(&mut self, name: &str, value: MaterialValue) -> Result<()> {
        let id = property_id(name)?;
        self.values.retain(|k, _| k.generation() == id.generation());
        self.values.insert(id, value);
        Ok(())
    }

    /// Gets a value by id.
    #[must_use]
    pub fn get(&self, id: PropertyId) -> Option<&MaterialValue> {
        self.values.get(&id)
    }

    /// Gets a value by name.
    pub fn get_by_name(&self, name: &str) -> Result<Option<&MaterialValue>> {
        Ok(self.values.get(&property_id(name)?))
    }

    /// Number of properties set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Removes every property.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}
