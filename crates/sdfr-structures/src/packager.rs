//! Distance normalization and packaging of sampled fields into assets.

use glam::Vec3;
use sdfr_core::{GridGeometry, Result, SdfrError};

use crate::volume_asset::VolumeAsset;

/// Raw per-voxel signed distances as returned by a sampling kernel.
///
/// Distances are negative inside closed surfaces and laid out z-major.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDistanceField {
    /// One distance per voxel.
    pub distances: Vec<f32>,
    /// Normalization divisor chosen by the kernel.
    pub max_distance: f32,
}

impl RawDistanceField {
    /// Creates a raw field.
    #[must_use]
    pub fn new(distances: Vec<f32>, max_distance: f32) -> Self {
        Self {
            distances,
            max_distance,
        }
    }
}

/// Rejects divisors that cannot normalize a field.
pub fn validate_max_distance(max_distance: f32) -> Result<()> {
    if !(max_distance.is_finite() && max_distance > 0.0) {
        return Err(SdfrError::SamplerFailure(format!(
            "max distance must be positive and finite, got {max_distance}"
        )));
    }
    Ok(())
}

/// Divides every distance by `max_distance`.
///
/// Values are not clamped; a divisor below the true extremum leaves
/// normalized values outside `[-1, 1]`.
pub fn normalize(raw: &[f32], max_distance: f32) -> Result<Vec<f32>> {
    validate_max_distance(max_distance)?;

    let normalized: Vec<f32> = raw.iter().map(|d| d / max_distance).collect();

    let outside = normalized.iter().filter(|v| v.abs() > 1.0).count();
    if outside > 0 {
        log::warn!(
            "{outside} of {} normalized distances fall outside [-1, 1] (max distance {max_distance})",
            normalized.len()
        );
    }
    Ok(normalized)
}

/// Multiplies every normalized distance by `max_distance`.
#[must_use]
pub fn decode(normalized: &[f32], max_distance: f32) -> Vec<f32> {
    normalized.iter().map(|d| d * max_distance).collect()
}

/// Bounds size divided by its smallest axis; the smallest axis becomes 1.
#[must_use]
pub fn non_uniform_scale(size: Vec3) -> Vec3 {
    size / size.min_element()
}

/// Normalizes a sampled field and packages it with the grid's geometry.
///
/// Rejects fields whose length differs from the grid cell count and
/// non-positive divisors; nothing partial is ever produced.
pub fn package(grid: &GridGeometry, field: RawDistanceField) -> Result<VolumeAsset> {
    if field.distances.len() != grid.cell_count() {
        return Err(SdfrError::SizeMismatch {
            expected: grid.cell_count(),
            actual: field.distances.len(),
        });
    }

    let normalized = normalize(&field.distances, field.max_distance)?;
    let bounds = grid.bounds_local();

    let asset = VolumeAsset::new(
        grid.dimensions(),
        bounds,
        grid.voxel_size(),
        non_uniform_scale(bounds.size),
        field.max_distance,
        normalized,
    )?;
    log::info!(
        "packaged {} voxels, max distance {}",
        asset.cell_count(),
        asset.max_distance()
    );
    Ok(asset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::UVec3;
    use proptest::prelude::*;
    use sdfr_core::Aabb;

    #[test]
    fn test_normalize_divides_without_clamping() {
        let out = normalize(&[-2.0, 0.0, 1.0, 6.0], 4.0).unwrap();
        assert_eq!(out, vec![-0.5, 0.0, 0.25, 1.5]);
    }

    #[test]
    fn test_normalize_rejects_bad_divisor() {
        for bad in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let err = normalize(&[1.0], bad).unwrap_err();
            assert!(matches!(err, SdfrError::SamplerFailure(_)));
        }
    }

    #[test]
    fn test_non_uniform_scale_literal_formula() {
        let size = Vec3::new(2.0, 4.0, 8.0);
        let min_axis = size.x.min(size.y).min(size.z);
        let expected = Vec3::new(size.x / min_axis, size.y / min_axis, size.z / min_axis);
        assert_eq!(non_uniform_scale(size), expected);
        assert_eq!(non_uniform_scale(size), Vec3::new(1.0, 2.0, 4.0));
        assert_eq!(non_uniform_scale(Vec3::new(6.0, 3.0, 3.0)), Vec3::new(2.0, 1.0, 1.0));
    }

    #[test]
    fn test_package() {
        let grid = GridGeometry::initialize(
            None,
            UVec3::new(2, 1, 1),
            Aabb::new(Vec3::ONE, Vec3::new(4.0, 2.0, 8.0)),
        )
        .unwrap();
        let asset = package(&grid, RawDistanceField::new(vec![-1.0, 3.0], 2.0)).unwrap();

        assert_eq!(asset.dimensions(), UVec3::new(2, 1, 1));
        assert_eq!(asset.bounds(), grid.bounds_local());
        assert_eq!(asset.voxel_size(), Vec3::new(2.0, 2.0, 8.0));
        assert_eq!(asset.non_uniform_scale(), Vec3::new(2.0, 1.0, 4.0));
        assert_eq!(asset.distance_field(), &[-0.5, 1.5]);
        assert_eq!(asset.max_distance(), 2.0);
    }

    #[test]
    fn test_package_rejects_size_mismatch() {
        let grid = GridGeometry::initialize(None, UVec3::splat(2), Aabb::default()).unwrap();
        let err = package(&grid, RawDistanceField::new(vec![0.0; 3], 1.0)).unwrap_err();
        assert!(matches!(err, SdfrError::SizeMismatch { expected: 8, actual: 3 }));
    }

    proptest! {
        #[test]
        fn prop_normalize_decode_roundtrip(
            raw in prop::collection::vec(-1000.0f32..1000.0, 0..64),
            max_distance in 0.001f32..1000.0,
        ) {
            let normalized = normalize(&raw, max_distance).unwrap();
            let back = decode(&normalized, max_distance);
            prop_assert_eq!(back.len(), raw.len());
            for (a, b) in raw.iter().zip(&back) {
                prop_assert!((a - b).abs() <= a.abs() * 1e-6 + 1e-6);
            }
        }
    }
}
