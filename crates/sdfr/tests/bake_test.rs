//! End-to-end bake tests driven by mock sampling kernels.
//!
//! None of these touch the process-wide context; material parameter tests
//! live in `basics_test.rs`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use sdfr::*;

fn settings(dim: u32) -> BakeSettings {
    BakeSettings::new()
        .with_dimensions(UVec3::splat(dim))
        .with_bounds(Aabb::new(Vec3::ZERO, Vec3::splat(2.0)))
}

fn cube_child_scene() -> SurfaceScene {
    let mut scene = SurfaceScene::new();
    scene.add_child(Surface::mesh(
        "cube",
        vec![Vec3::splat(-1.0), Vec3::ONE],
        Mat4::IDENTITY,
    ));
    scene
}

/// Answers every request with the distance to a sphere of `radius` around
/// the grid's world-space center.
fn sphere_kernel(radius: f32) -> impl FnMut(SampleRequest, Completion) {
    move |request: SampleRequest, completion: Completion| {
        let center = request.grid.bounds_world().center;
        let distances: Vec<f32> = request
            .voxel_positions()
            .map(|p| (p - center).length() - radius)
            .collect();
        let max = distances.iter().fold(0.0_f32, |m, d| m.max(d.abs()));
        completion.succeed(distances, max);
    }
}

#[test]
fn test_no_surfaces_never_invokes_kernel() {
    let calls = AtomicUsize::new(0);
    let mut kernel = |_request: SampleRequest, _completion: Completion| {
        calls.fetch_add(1, Ordering::SeqCst);
    };

    let mut orch = BakeOrchestrator::new(Some(Transform::identity()), settings(4)).unwrap();
    let err = orch.bake(&SurfaceScene::new(), &mut kernel).unwrap_err();
    assert!(matches!(err, SdfrError::NoSurfaces));
    assert_eq!(orch.state(), BakeState::Failed);

    // Disabled children and far away world surfaces do not count either
    let mut scene = SurfaceScene::new();
    scene.add_child(Surface::mesh("hidden", vec![Vec3::ZERO, Vec3::ONE], Mat4::IDENTITY).with_enabled(false));
    scene.add(Surface::from_world_bounds(
        "far",
        SurfaceKind::Mesh,
        Aabb::new(Vec3::splat(100.0), Vec3::ONE),
        Mat4::from_translation(Vec3::splat(100.0)),
    ));
    let err = orch.bake(&scene, &mut kernel).unwrap_err();
    assert!(matches!(err, SdfrError::NoSurfaces));

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(orch.asset().is_none());
}

#[test]
fn test_intersection_fallback_keeps_bounds() {
    let mut scene = SurfaceScene::new();
    scene.add(Surface::from_world_bounds(
        "inside",
        SurfaceKind::SkinnedMesh,
        Aabb::new(Vec3::splat(0.5), Vec3::ONE),
        Mat4::IDENTITY,
    ));
    scene.add(Surface::mesh("outside", vec![Vec3::splat(50.0), Vec3::splat(51.0)], Mat4::IDENTITY));

    let seen = Mutex::new(Vec::new());
    let mut kernel = |request: SampleRequest, completion: Completion| {
        seen.lock()
            .unwrap()
            .extend(request.surfaces.iter().map(|s| s.name().to_string()));
        completion.succeed(vec![0.5; request.cell_count()], 1.0);
    };

    let mut orch = BakeOrchestrator::new(None, settings(4)).unwrap();
    let asset = orch.bake(&scene, &mut kernel).unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["inside".to_string()]);
    assert_eq!(asset.bounds(), Aabb::new(Vec3::ZERO, Vec3::splat(2.0)));
    assert_eq!(orch.settings().bounds, Aabb::new(Vec3::ZERO, Vec3::splat(2.0)));
    assert_eq!(orch.baked_surfaces().len(), 1);
}

#[test]
fn test_children_fit_with_border() {
    let mut orch = BakeOrchestrator::new(Some(Transform::identity()), settings(4)).unwrap();
    let asset = orch.bake(&cube_child_scene(), &mut sphere_kernel(1.0)).unwrap();

    // (2,2,2) child bounds grow by 2 * size / (4 - 2) on each axis
    assert!((asset.bounds().size - Vec3::splat(4.0)).length() < 1e-5);
    assert!((asset.voxel_size() - Vec3::ONE).length() < 1e-5);
    assert_eq!(asset.non_uniform_scale(), Vec3::ONE);
    assert_eq!(asset.cell_count(), 64);
    assert_eq!(orch.state(), BakeState::Complete);
}

#[test]
fn test_child_without_vertices_fits_world_bounds() {
    let mut scene = SurfaceScene::new();
    scene.add_child(Surface::from_world_bounds(
        "skinned",
        SurfaceKind::SkinnedMesh,
        Aabb::new(Vec3::new(1.0, 0.0, 0.0), Vec3::splat(2.0)),
        Mat4::IDENTITY,
    ));

    let mut orch = BakeOrchestrator::new(Some(Transform::identity()), settings(4)).unwrap();
    let asset = orch.bake(&scene, &mut sphere_kernel(0.5)).unwrap();

    assert!((asset.bounds().center - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
    assert!((asset.bounds().size - Vec3::splat(4.0)).length() < 1e-5);
}

#[test]
fn test_fitted_bounds_include_anchor() {
    let mut scene = SurfaceScene::new();
    scene.add_child(Surface::mesh(
        "offset",
        vec![Vec3::new(2.0, -1.0, -1.0), Vec3::new(4.0, 1.0, 1.0)],
        Mat4::IDENTITY,
    ));

    let mut orch = BakeOrchestrator::new(
        Some(Transform::identity()),
        settings(6).with_fit_to_vertices(true),
    )
    .unwrap();
    let collection = orch.collect_surfaces(&scene).unwrap();
    assert_eq!(collection.strategy, CollectionStrategy::Children);

    // Vertex box spans x in [2, 4] but the anchor at the origin is encapsulated
    let bounds = collection.fitted_bounds.unwrap();
    assert!(bounds.min().x < 0.0);
    assert!(bounds.contains(Vec3::ZERO));
    assert_eq!(orch.state(), BakeState::Idle);
}

#[test]
fn test_distances_are_normalized() {
    let mut kernel = |request: SampleRequest, completion: Completion| {
        let distances = (0..request.cell_count()).map(|i| i as f32 - 4.0).collect();
        completion.succeed(distances, 8.0);
    };

    let mut orch = BakeOrchestrator::new(Some(Transform::identity()), settings(2)).unwrap();
    // Two voxels per axis cannot be border padded, so bake into world surfaces
    let mut scene = SurfaceScene::new();
    scene.add(Surface::mesh("cube", vec![Vec3::splat(-1.0), Vec3::ONE], Mat4::IDENTITY));
    let asset = orch.bake(&scene, &mut kernel).unwrap();

    assert_eq!(asset.max_distance(), 8.0);
    assert_eq!(
        asset.distance_field(),
        &[-0.5, -0.375, -0.25, -0.125, 0.0, 0.125, 0.25, 0.375]
    );
    assert_eq!(asset.normalized_at(UVec3::new(1, 1, 1)), Some(0.375));
    assert_eq!(asset.distance_at(UVec3::new(0, 0, 0)), Some(-4.0));
    assert_eq!(asset.decoded_distances()[3], -1.0);
}

#[test]
fn test_unpaddable_child_grid_is_configuration_error() {
    let calls = AtomicUsize::new(0);
    let mut kernel = |_request: SampleRequest, _completion: Completion| {
        calls.fetch_add(1, Ordering::SeqCst);
    };

    let mut orch = BakeOrchestrator::new(Some(Transform::identity()), settings(2)).unwrap();
    let err = orch.bake(&cube_child_scene(), &mut kernel).unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(orch.grid().bounds_local(), Aabb::new(Vec3::ZERO, Vec3::splat(2.0)));
}

#[test]
fn test_sampler_failures() {
    let mut orch = BakeOrchestrator::new(Some(Transform::identity()), settings(4)).unwrap();
    let scene = cube_child_scene();

    // Wrong length
    let mut short = |_request: SampleRequest, completion: Completion| {
        completion.succeed(vec![0.0; 10], 1.0);
    };
    let err = orch.bake(&scene, &mut short).unwrap_err();
    assert!(matches!(
        err,
        SdfrError::SizeMismatch {
            expected: 64,
            actual: 10
        }
    ));
    assert_eq!(orch.state(), BakeState::Failed);

    // Non-positive and non-finite divisors
    for max in [0.0, -1.0, f32::NAN, f32::INFINITY] {
        let mut kernel = move |request: SampleRequest, completion: Completion| {
            completion.succeed(vec![0.0; request.cell_count()], max);
        };
        let err = orch.bake(&scene, &mut kernel).unwrap_err();
        assert!(matches!(err, SdfrError::SamplerFailure(_)), "max {max}");
    }

    // Dropped completion
    let mut silent = |_request: SampleRequest, completion: Completion| drop(completion);
    let err = orch.bake(&scene, &mut silent).unwrap_err();
    assert!(matches!(err, SdfrError::SamplerFailure(_)));

    // Kernel-reported failure
    let mut failing = |_request: SampleRequest, completion: Completion| {
        completion.complete(Err(SdfrError::SamplerFailure("device lost".to_string())));
    };
    let err = orch.bake(&scene, &mut failing).unwrap_err();
    assert!(err.to_string().contains("device lost"));

    assert!(orch.asset().is_none());
    assert_eq!(orch.state(), BakeState::Failed);
}

#[test]
fn test_failed_bake_keeps_previous_asset() {
    let mut orch = BakeOrchestrator::new(Some(Transform::identity()), settings(4)).unwrap();
    let scene = cube_child_scene();
    let first = orch.bake(&scene, &mut sphere_kernel(1.0)).unwrap();

    orch.set_sink(Some(Box::new(|_asset: &VolumeAsset, _format: FieldFormat| -> Result<()> {
        Err(SdfrError::AssetIo(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only destination",
        )))
    })));
    let err = orch.bake(&scene, &mut sphere_kernel(0.5)).unwrap_err();

    assert!(matches!(err, SdfrError::AssetIo(_)));
    assert_eq!(orch.state(), BakeState::Failed);
    let kept = orch.asset().unwrap();
    assert!(Arc::ptr_eq(kept, &first));
}

#[test]
fn test_closure_sink_receives_format() {
    let stored = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&stored);

    let mut orch = BakeOrchestrator::new(
        Some(Transform::identity()),
        settings(4).with_field_format(FieldFormat::Float),
    )
    .unwrap()
    .with_sink(move |asset: &VolumeAsset, format: FieldFormat| -> Result<()> {
        log.lock().unwrap().push((asset.cell_count(), format));
        Ok(())
    });

    orch.bake(&cube_child_scene(), &mut sphere_kernel(1.0)).unwrap();
    assert_eq!(*stored.lock().unwrap(), vec![(64, FieldFormat::Float)]);
}

#[test]
fn test_file_sink_round_trip() {
    let path = std::env::temp_dir().join(format!("sdfr_bake_test_{}.sdfr", std::process::id()));

    let mut orch = BakeOrchestrator::new(Some(Transform::identity()), settings(4))
        .unwrap()
        .with_sink(FileAssetSink::new(&path));
    let baked = orch.bake(&cube_child_scene(), &mut sphere_kernel(1.0)).unwrap();

    let (loaded, format) = load_asset(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(format, FieldFormat::Half);
    assert_eq!(loaded.dimensions(), baked.dimensions());
    assert_eq!(loaded.bounds(), baked.bounds());
    assert_eq!(loaded.max_distance(), baked.max_distance());
    for (a, b) in loaded.distance_field().iter().zip(baked.distance_field()) {
        assert!((a - b).abs() < 1e-3, "{a} vs {b}");
    }
}

#[test]
fn test_threaded_kernel() {
    let mut handles = Vec::new();
    let mut kernel = |request: SampleRequest, completion: Completion| {
        handles.push(thread::spawn(move || {
            let distances = request.voxel_positions().map(|p| p.length() - 1.0).collect();
            completion.succeed(distances, 4.0);
        }));
    };

    let mut orch = BakeOrchestrator::new(Some(Transform::identity()), settings(4)).unwrap();
    let pending = orch.start(&cube_child_scene(), &mut kernel).unwrap();
    assert_eq!(orch.state(), BakeState::Sampling);
    assert!(matches!(
        orch.start(&cube_child_scene(), &mut sphere_kernel(1.0)),
        Err(SdfrError::BakeInProgress)
    ));

    let asset = orch.finish(pending).unwrap();
    assert_eq!(asset.cell_count(), 64);
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_request_carries_settings() {
    let mut captured = None;
    let mut kernel = |request: SampleRequest, completion: Completion| {
        captured = Some((request.samples_per_voxel, request.jitter_seed, request.jitter_scale));
        completion.succeed(vec![0.0; request.cell_count()], 1.0);
    };

    let mut orch = BakeOrchestrator::new(
        Some(Transform::from_translation(Vec3::new(5.0, 0.0, 0.0))),
        settings(4).with_ray_samples(64).with_jitter(7, 0.25),
    )
    .unwrap();
    let mut scene = SurfaceScene::new();
    scene.add_child(Surface::mesh(
        "cube",
        vec![Vec3::splat(-1.0), Vec3::ONE],
        Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)),
    ));
    orch.bake(&scene, &mut kernel).unwrap();

    assert_eq!(captured, Some((64, 7, 0.25)));
    // Bounds are relative to the anchor
    assert!(orch.grid().bounds_local().center.length() < 1e-5);
    assert!((orch.grid().bounds_world().center - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-5);
}

#[test]
fn test_baker_interface() {
    let mut baker = create_baker(VolumeKind::SignedDistance, Some(Transform::identity()), settings(4)).unwrap();
    assert_eq!(baker.kind(), VolumeKind::SignedDistance);
    assert_eq!(baker.kind().name(), "SDF");

    let mut props = MaterialPropertyBlock::new();
    assert!(!baker.preview(&mut props).unwrap());
    assert!(props.is_empty());

    let collection = baker.collect(&cube_child_scene()).unwrap();
    assert_eq!(collection.surfaces.len(), 1);

    let asset = baker.bake(&cube_child_scene(), &mut sphere_kernel(1.0)).unwrap();
    assert_eq!(asset.cell_count(), 64);
}
