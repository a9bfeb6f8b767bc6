//! Selection of the surfaces a bake samples.
//!
//! Two strategies are tried in order. Surfaces attached beneath the anchor
//! win and re-fit the grid bounds around themselves (with border padding).
//! Only when the anchor has no bakeable children are world surfaces
//! overlapping the current grid bounds used; that path never touches the grid.

use sdfr_core::{Aabb, GridGeometry, Result, SdfrError};

use crate::surface::{SurfaceSet, SurfaceSource};

/// Which strategy produced a surface set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStrategy {
    /// Surfaces attached beneath the anchor; bounds were re-fitted.
    Children,
    /// World surfaces intersecting the grid's world bounds.
    Intersection,
}

/// Result of a successful collection.
#[derive(Debug, Clone)]
pub struct Collection {
    /// Selected surfaces, never empty.
    pub surfaces: SurfaceSet,
    /// Strategy that selected them.
    pub strategy: CollectionStrategy,
    /// Final local grid bounds after re-fitting, for the children strategy.
    pub fitted_bounds: Option<Aabb>,
}

/// Collects bakeable surfaces for a grid.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceCollector {
    fit_to_vertices: bool,
}

impl Default for SurfaceCollector {
    fn default() -> Self {
        Self {
            fit_to_vertices: true,
        }
    }
}

impl SurfaceCollector {
    /// Creates a collector.
    ///
    /// With `fit_to_vertices` the children strategy fits bounds to every
    /// transformed vertex instead of each surface's world bounds.
    #[must_use]
    pub fn new(fit_to_vertices: bool) -> Self {
        Self { fit_to_vertices }
    }

    /// Returns whether bounds are fitted to vertices.
    #[must_use]
    pub fn fit_to_vertices(&self) -> bool {
        self.fit_to_vertices
    }

    /// Runs the children strategy, then the intersection fallback.
    ///
    /// Fails with [`SdfrError::NoSurfaces`] when both find nothing, and with a
    /// configuration error when the fitted bounds cannot be border-padded.
    pub fn collect(&self, source: &dyn SurfaceSource, grid: &mut GridGeometry) -> Result<Collection> {
        if let Some(collection) = self.collect_children(source, grid)? {
            return Ok(collection);
        }
        if let Some(collection) = Self::collect_intersecting(source, grid) {
            return Ok(collection);
        }
        log::warn!("no surfaces found beneath the anchor or inside the grid bounds");
        Err(SdfrError::NoSurfaces)
    }

    /// Collects bakeable children and re-fits the grid bounds around them.
    ///
    /// The fitted box starts as a point at the anchor position, so the anchor
    /// always lies inside it. Returns `Ok(None)` without touching the grid
    /// when no child is bakeable.
    pub fn collect_children(
        &self,
        source: &dyn SurfaceSource,
        grid: &mut GridGeometry,
    ) -> Result<Option<Collection>> {
        let anchor = grid.anchor_position();
        let mut fitted = Aabb::from_point(anchor);
        let mut surfaces = SurfaceSet::new();

        for surface in source.children() {
            if !surface.is_bakeable() {
                log::debug!("skipping surface '{}': not bakeable", surface.name());
                continue;
            }

            if self.fit_to_vertices && surface.vertices().is_some() {
                for v in surface.world_vertices() {
                    fitted.encapsulate_point(v);
                }
            } else {
                if self.fit_to_vertices {
                    log::warn!(
                        "surface '{}' has no vertex buffer, fitting to its world bounds",
                        surface.name()
                    );
                }
                fitted.encapsulate(&surface.world_bounds());
            }

            surfaces.push(surface);
        }

        if surfaces.is_empty() {
            return Ok(None);
        }

        let local = fitted.translated(-anchor);
        let bounds = grid.update_bounds(local, true)?;
        log::info!(
            "collected {} child surface(s), bounds fitted to size {}",
            surfaces.len(),
            bounds.size
        );

        Ok(Some(Collection {
            surfaces,
            strategy: CollectionStrategy::Children,
            fitted_bounds: Some(bounds),
        }))
    }

    /// Collects bakeable world surfaces overlapping the grid's world bounds.
    pub fn collect_intersecting(source: &dyn SurfaceSource, grid: &GridGeometry) -> Option<Collection> {
        let volume = grid.bounds_world();
        let surfaces: SurfaceSet = source
            .world()
            .into_iter()
            .filter(|s| s.is_bakeable() && volume.intersects(&s.world_bounds()))
            .collect();

        if surfaces.is_empty() {
            return None;
        }

        log::info!("collected {} surface(s) intersecting the grid", surfaces.len());
        Some(Collection {
            surfaces,
            strategy: CollectionStrategy::Intersection,
            fitted_bounds: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{Surface, SurfaceKind, SurfaceScene};
    use glam::{Mat4, UVec3, Vec3};
    use sdfr_core::Transform;

    fn grid_at(position: Vec3, dim: u32) -> GridGeometry {
        GridGeometry::initialize(
            Some(Transform::from_translation(position)),
            UVec3::splat(dim),
            Aabb::new(Vec3::ZERO, Vec3::splat(2.0)),
        )
        .unwrap()
    }

    fn box_mesh(name: &str, min: Vec3, max: Vec3) -> Surface {
        Surface::mesh(name, vec![min, max], Mat4::IDENTITY)
    }

    #[test]
    fn test_children_fit_to_vertices() {
        let mut scene = SurfaceScene::new();
        scene.add_child(box_mesh("a", Vec3::new(9.0, -1.0, -1.0), Vec3::new(11.0, 1.0, 1.0)));
        let mut grid = grid_at(Vec3::new(10.0, 0.0, 0.0), 10);

        let c = SurfaceCollector::new(true).collect(&scene, &mut grid).unwrap();
        assert_eq!(c.strategy, CollectionStrategy::Children);
        assert_eq!(c.surfaces.len(), 1);

        // fitted (2,2,2) at local origin, border-padded by 2 * size / 8
        let bounds = c.fitted_bounds.unwrap();
        assert!(bounds.center.length() < 1e-6);
        assert!((bounds.size - Vec3::splat(2.5)).length() < 1e-5);
        assert_eq!(grid.bounds_local(), bounds);
    }

    #[test]
    fn test_children_seeded_at_anchor() {
        let mut scene = SurfaceScene::new();
        scene.add_child(box_mesh("a", Vec3::new(1.0, 1.0, 1.0), Vec3::new(2.0, 2.0, 2.0)));
        let mut grid = grid_at(Vec3::ZERO, 6);

        let c = SurfaceCollector::new(true).collect(&scene, &mut grid).unwrap();
        // box spans the anchor (origin) to (2,2,2) before padding
        let bounds = c.fitted_bounds.unwrap();
        assert!((bounds.center - Vec3::ONE).length() < 1e-6);
        assert!((bounds.size - Vec3::splat(3.0)).length() < 1e-5);
    }

    #[test]
    fn test_children_world_bounds_when_not_fitting() {
        let mut scene = SurfaceScene::new();
        let wide = Aabb::new(Vec3::ZERO, Vec3::splat(4.0));
        scene.add_child(Surface::from_world_bounds("b", SurfaceKind::Mesh, wide, Mat4::IDENTITY));
        let mut grid = grid_at(Vec3::ZERO, 6);

        let c = SurfaceCollector::new(false).collect(&scene, &mut grid).unwrap();
        assert!((c.fitted_bounds.unwrap().size - Vec3::splat(6.0)).length() < 1e-5);
    }

    #[test]
    fn test_children_skip_ineligible() {
        let mut scene = SurfaceScene::new();
        scene.add_child(box_mesh("off", Vec3::ZERO, Vec3::ONE).with_enabled(false));
        scene.add_child(box_mesh("inactive", Vec3::ZERO, Vec3::ONE).with_active(false));
        scene.add_child(box_mesh("sprite", Vec3::ZERO, Vec3::ONE).with_kind(SurfaceKind::Other));
        let mut grid = grid_at(Vec3::ZERO, 6);
        let before = grid;

        let found = SurfaceCollector::new(true)
            .collect_children(&scene, &mut grid)
            .unwrap();
        assert!(found.is_none());
        assert_eq!(grid, before);
    }

    #[test]
    fn test_fallback_keeps_bounds() {
        let mut scene = SurfaceScene::new();
        scene.add(box_mesh("inside", Vec3::new(4.5, -0.5, -0.5), Vec3::new(5.5, 0.5, 0.5)));
        scene.add(box_mesh("far", Vec3::splat(50.0), Vec3::splat(51.0)));
        let mut grid = grid_at(Vec3::new(5.0, 0.0, 0.0), 8);
        let before = grid;

        let c = SurfaceCollector::new(true).collect(&scene, &mut grid).unwrap();
        assert_eq!(c.strategy, CollectionStrategy::Intersection);
        assert_eq!(c.surfaces.len(), 1);
        assert_eq!(c.surfaces[0].name(), "inside");
        assert!(c.fitted_bounds.is_none());
        assert_eq!(grid, before);
    }

    #[test]
    fn test_no_surfaces() {
        let mut scene = SurfaceScene::new();
        scene.add(box_mesh("far", Vec3::splat(50.0), Vec3::splat(51.0)));
        let mut grid = grid_at(Vec3::ZERO, 8);

        let err = SurfaceCollector::new(true).collect(&scene, &mut grid).unwrap_err();
        assert!(matches!(err, SdfrError::NoSurfaces));
    }

    #[test]
    fn test_children_border_needs_three_voxels() {
        let mut scene = SurfaceScene::new();
        scene.add_child(box_mesh("a", Vec3::splat(-1.0), Vec3::ONE));
        let mut grid = grid_at(Vec3::ZERO, 2);

        let err = SurfaceCollector::new(true).collect(&scene, &mut grid).unwrap_err();
        assert!(err.is_configuration());
    }
}
