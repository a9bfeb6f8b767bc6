//! Axis-aligned bounding boxes stored as center and size.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// An axis-aligned box described by its center and full size.
///
/// Grid bounds are edited as center/size pairs (the size is what gets
/// divided into voxels), so that is the stored form; min/max are derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Center of the box.
    pub center: Vec3,
    /// Full edge lengths of the box.
    pub size: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            size: Vec3::ONE,
        }
    }
}

impl Aabb {
    /// Creates a box from its center and full size.
    #[must_use]
    pub fn new(center: Vec3, size: Vec3) -> Self {
        Self { center, size }
    }

    /// Creates a box from two opposite corners.
    #[must_use]
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        let (lo, hi) = (min.min(max), min.max(max));
        Self {
            center: (lo + hi) * 0.5,
            size: hi - lo,
        }
    }

    /// Creates a zero-size box located at `point`.
    #[must_use]
    pub fn from_point(point: Vec3) -> Self {
        Self {
            center: point,
            size: Vec3::ZERO,
        }
    }

    /// Creates the smallest box containing every point, or `None` if there are none.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut aabb = Self::from_point(first);
        for p in iter {
            aabb.encapsulate_point(p);
        }
        Some(aabb)
    }

    /// Half of the size.
    #[must_use]
    pub fn extents(&self) -> Vec3 {
        self.size * 0.5
    }

    /// Minimum corner.
    #[must_use]
    pub fn min(&self) -> Vec3 {
        self.center - self.extents()
    }

    /// Maximum corner.
    #[must_use]
    pub fn max(&self) -> Vec3 {
        self.center + self.extents()
    }

    /// Length of the box diagonal.
    #[must_use]
    pub fn diagonal(&self) -> f32 {
        self.size.length()
    }

    /// Grows the box so it contains `point`.
    pub fn encapsulate_point(&mut self, point: Vec3) {
        *self = Self::from_min_max(self.min().min(point), self.max().max(point));
    }

    /// Grows the box so it contains `other`.
    pub fn encapsulate(&mut self, other: &Aabb) {
        *self = Self::from_min_max(self.min().min(other.min()), self.max().max(other.max()));
    }

    /// Returns true if the boxes overlap or touch.
    #[must_use]
    pub fn intersects(&self, other: &Aabb) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        a_min.cmple(b_max).all() && a_max.cmpge(b_min).all()
    }

    /// Returns true if `point` lies inside or on the box.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        self.min().cmple(point).all() && self.max().cmpge(point).all()
    }

    /// Returns a copy moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            center: self.center + offset,
            size: self.size,
        }
    }

    /// Returns true if center and size are finite and every size axis is positive.
    #[must_use]
    pub fn is_valid_volume(&self) -> bool {
        self.center.is_finite() && self.size.is_finite() && self.size.cmpgt(Vec3::ZERO).all()
    }

    /// The eight corners, ordered bottom face (z = min) then top face.
    #[must_use]
    pub fn corners(&self) -> [Vec3; 8] {
        let min = self.min();
        let max = self.max();
        [
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(max.x, max.y, max.z),
            Vec3::new(min.x, max.y, max.z),
        ]
    }

    /// Returns the axis-aligned box enclosing this box after `matrix` is applied.
    #[must_use]
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let corners = self.corners().map(|c| matrix.transform_point3(c));
        let mut out = Self::from_point(corners[0]);
        for c in &corners[1..] {
            out.encapsulate_point(*c);
        }
        out
    }
}
