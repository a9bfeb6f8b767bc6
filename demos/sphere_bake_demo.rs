#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
//! Demo baking a signed distance field around a sphere mesh.
//!
//! The sampling kernel is analytic: it answers from a worker thread with the
//! exact distance to the sphere. The baked asset is written to the temp
//! directory, read back and summarized.
//!
//! Run with `RUST_LOG=info` to see the bake log.

use std::f32::consts::PI;
use std::thread;

use sdfr::*;

const RADIUS: f32 = 0.8;

/// Generate a UV sphere's vertices.
fn sphere_vertices(radius: f32, rings: u32, segments: u32) -> Vec<Vec3> {
    let mut vertices = Vec::new();
    for ring in 0..=rings {
        let theta = ring as f32 / rings as f32 * PI;
        for segment in 0..segments {
            let phi = segment as f32 / segments as f32 * 2.0 * PI;
            vertices.push(
                Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin()) * radius,
            );
        }
    }
    vertices
}

fn main() {
    init_logging();
    init().expect("Failed to initialize sdfr");

    let mut scene = SurfaceScene::new();
    scene.add_child(Surface::mesh(
        "sphere",
        sphere_vertices(RADIUS, 16, 32),
        Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)),
    ));

    let settings = BakeSettings::new()
        .with_dimensions(UVec3::new(24, 32, 24))
        .with_field_format(FieldFormat::Half);
    let path = std::env::temp_dir().join("sphere_bake_demo.sdfr");

    let mut baker = BakeOrchestrator::new(
        Some(Transform::from_translation(Vec3::new(0.0, 1.0, 0.0))),
        settings,
    )
    .expect("Failed to create baker")
    .with_sink(FileAssetSink::new(&path));

    let mut workers = Vec::new();
    let mut kernel = |request: SampleRequest, completion: Completion| {
        workers.push(thread::spawn(move || {
            let center = request.grid.anchor_position();
            let distances: Vec<f32> = request
                .voxel_positions()
                .map(|p| (p - center).length() - RADIUS)
                .collect();
            let max = request.bounds_local().diagonal() * 0.5;
            completion.succeed(distances, max);
        }));
    };

    let asset = baker.bake(&scene, &mut kernel).expect("Bake failed");
    for worker in workers {
        worker.join().expect("Sampling worker panicked");
    }

    let dims = asset.dimensions();
    let center = dims / 2;
    println!("Baked {}x{}x{} voxels", dims.x, dims.y, dims.z);
    println!("  bounds size:       {}", asset.bounds().size);
    println!("  voxel size:        {}", asset.voxel_size());
    println!("  non-uniform scale: {}", asset.non_uniform_scale());
    println!("  max distance:      {}", asset.max_distance());
    if let Some(d) = asset.distance_at(center) {
        println!("  distance at center voxel: {d:.3}");
    }

    let (loaded, format) = load_asset(&path).expect("Failed to read baked asset");
    println!(
        "Wrote {} ({:?}, {} voxels)",
        path.display(),
        format,
        loaded.cell_count()
    );

    let mut props = MaterialPropertyBlock::new();
    if VolumeBaker::preview(&baker, &mut props).expect("Failed to set preview parameters") {
        println!("Preview parameters ready for {PREVIEW_SHADER_NAME}: {} values", props.len());
    }

    shutdown();
}
