//! Rigid-plus-scale transforms for the object a grid is anchored to.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Placement of a grid anchor.
///
/// Kept as components: voxel positions use translation and rotation only,
/// while [`Transform::to_matrix`] applies the scale as well.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// World position of the anchor.
    pub translation: Vec3,
    /// Anchor orientation.
    pub rotation: Quat,
    /// Anchor scale. Never applied to grid bounds.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// The anchor at the world origin, unrotated and unscaled.
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Returns [`Transform::IDENTITY`].
    #[must_use]
    pub fn identity() -> Self {
        Self::IDENTITY
    }

    /// An anchor placed at `translation`.
    #[must_use]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Creates a transform from all three components.
    #[must_use]
    pub fn from_scale_rotation_translation(scale: Vec3, rotation: Quat, translation: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Sets the anchor scale.
    #[must_use]
    pub fn with_scale(self, scale: Vec3) -> Self {
        Self { scale, ..self }
    }

    /// Sets the anchor orientation.
    #[must_use]
    pub fn with_rotation(self, rotation: Quat) -> Self {
        Self { rotation, ..self }
    }

    /// Full local-to-world matrix of the anchor.
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Local-to-world matrix without the anchor scale.
    #[must_use]
    pub fn to_matrix_no_scale(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.translation)
    }
}
