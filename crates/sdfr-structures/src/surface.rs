//! Renderable surfaces that drive a bake.
//!
//! A [`Surface`] is a mesh placed in the world: an optional vertex buffer in
//! mesh-local space, its local-to-world matrix and precomputed world bounds.
//! A [`SurfaceSource`] exposes the surfaces attached beneath the baking
//! anchor and every surface in the world.

use std::sync::Arc;

use glam::{Mat4, Vec3};
use sdfr_core::Aabb;

/// Kind of renderer a surface comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SurfaceKind {
    /// A static mesh.
    #[default]
    Mesh,
    /// A skinned mesh, baked in its current pose.
    SkinnedMesh,
    /// Any other renderer (sprites, particles, lines). Never baked.
    Other,
}

/// A renderable surface.
#[derive(Debug, Clone)]
pub struct Surface {
    name: String,
    kind: SurfaceKind,
    enabled: bool,
    active: bool,
    local_to_world: Mat4,
    vertices: Option<Arc<[Vec3]>>,
    world_bounds: Aabb,
}

/// Shared handle to a surface.
pub type SurfaceRef = Arc<Surface>;

/// Ordered surfaces selected for one bake.
pub type SurfaceSet = Vec<SurfaceRef>;

impl Surface {
    /// Creates a mesh surface from mesh-local vertices.
    ///
    /// World bounds enclose the local vertex bounds after `local_to_world`;
    /// a mesh without vertices gets a zero-size box at its origin.
    pub fn mesh(name: impl Into<String>, vertices: Vec<Vec3>, local_to_world: Mat4) -> Self {
        let world_bounds = Aabb::from_points(vertices.iter().copied()).map_or_else(
            || Aabb::from_point(local_to_world.transform_point3(Vec3::ZERO)),
            |local| local.transformed(&local_to_world),
        );
        Self {
            name: name.into(),
            kind: SurfaceKind::Mesh,
            enabled: true,
            active: true,
            local_to_world,
            vertices: Some(vertices.into()),
            world_bounds,
        }
    }

    /// Creates a surface known only by its world bounds (no vertex buffer).
    pub fn from_world_bounds(
        name: impl Into<String>,
        kind: SurfaceKind,
        world_bounds: Aabb,
        local_to_world: Mat4,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            enabled: true,
            active: true,
            local_to_world,
            vertices: None,
            world_bounds,
        }
    }

    /// Sets the renderer kind.
    #[must_use]
    pub fn with_kind(mut self, kind: SurfaceKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets whether the renderer is enabled.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets whether the owning object is active.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Returns the name of this surface.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the renderer kind.
    #[must_use]
    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    /// Returns whether the renderer is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns whether the owning object is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Mesh-local to world matrix.
    #[must_use]
    pub fn local_to_world(&self) -> Mat4 {
        self.local_to_world
    }

    /// Mesh-local vertices, if a vertex buffer is attached.
    #[must_use]
    pub fn vertices(&self) -> Option<&[Vec3]> {
        self.vertices.as_deref()
    }

    /// Precomputed world-space bounds.
    #[must_use]
    pub fn world_bounds(&self) -> Aabb {
        self.world_bounds
    }

    /// Vertices mapped to world space. Empty without a vertex buffer.
    pub fn world_vertices(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.vertices
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|v| self.local_to_world.transform_point3(*v))
    }

    /// True for enabled, active mesh surfaces.
    #[must_use]
    pub fn is_bakeable(&self) -> bool {
        matches!(self.kind, SurfaceKind::Mesh | SurfaceKind::SkinnedMesh)
            && self.enabled
            && self.active
    }
}

/// Supplies the surfaces a collector chooses from.
pub trait SurfaceSource {
    /// Surfaces attached beneath the baking anchor, in hierarchy order.
    fn children(&self) -> Vec<SurfaceRef>;

    /// Every surface in the world, including the anchor's children.
    fn world(&self) -> Vec<SurfaceRef>;
}

/// A flat in-memory [`SurfaceSource`].
#[derive(Debug, Clone, Default)]
pub struct SurfaceScene {
    children: Vec<SurfaceRef>,
    others: Vec<SurfaceRef>,
}

impl SurfaceScene {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a surface beneath the baking anchor.
    pub fn add_child(&mut self, surface: Surface) -> SurfaceRef {
        let surface = Arc::new(surface);
        self.children.push(Arc::clone(&surface));
        surface
    }

    /// Adds a surface elsewhere in the world.
    pub fn add(&mut self, surface: Surface) -> SurfaceRef {
        let surface = Arc::new(surface);
        self.others.push(Arc::clone(&surface));
        surface
    }

    /// Total number of surfaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len() + self.others.len()
    }

    /// Returns true if the scene holds no surfaces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.others.is_empty()
    }

    /// Removes every surface.
    pub fn clear(&mut self) {
        self.children.clear();
        self.others.clear();
    }
}

impl SurfaceSource for SurfaceScene {
    fn children(&self) -> Vec<SurfaceRef> {
        self.children.clone()
    }

    fn world(&self) -> Vec<SurfaceRef> {
        self.children.iter().chain(&self.others).cloned().collect()
    }
}
