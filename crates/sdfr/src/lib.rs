//! sdfr-rs: signed distance field volume baking for mesh surfaces.
//!
//! sdfr bakes a signed distance field over a regular voxel grid enclosing a
//! set of surfaces and packages it as a normalized, transform-aware
//! [`VolumeAsset`]. The per-voxel distance sampling itself is delegated to an
//! external [`SamplingKernel`].
//!
//! # Quick Start
//!
//! ```no_run
//! use sdfr::*;
//!
//! fn main() -> Result<()> {
//!     init()?;
//!
//!     let mut scene = SurfaceScene::new();
//!     scene.add_child(Surface::mesh(
//!         "cube",
//!         vec![Vec3::splat(-1.0), Vec3::ONE],
//!         Mat4::IDENTITY,
//!     ));
//!
//!     let mut baker = BakeOrchestrator::new(Some(Transform::identity()), BakeSettings::default())?;
//!     let mut kernel = |request: SampleRequest, completion: Completion| {
//!         let distances = request.voxel_positions().map(|p| p.length() - 1.0).collect();
//!         completion.succeed(distances, request.bounds_local().diagonal());
//!     };
//!     let asset = baker.bake(&scene, &mut kernel)?;
//!     println!("baked {} voxels", asset.cell_count());
//!
//!     shutdown();
//!     Ok(())
//! }
//! ```
//!
//! # Pipeline
//!
//! 1. [`SurfaceCollector`] picks surfaces beneath the anchor (re-fitting the
//!    grid with one voxel of border padding) or, failing that, world surfaces
//!    overlapping the grid.
//! 2. The kernel returns raw distances in z-major voxel order plus the
//!    divisor used for normalization.
//! 3. The distances are normalized and packaged with the grid's bounds,
//!    voxel size and non-uniform scale.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]

pub mod kind;
pub mod orchestrator;
pub mod sampler;
pub mod sink;

pub use kind::{create_baker, VolumeBaker, VolumeKind};
pub use orchestrator::{BakeOrchestrator, BakeState, PendingBake};
pub use sampler::{Completion, SampleRequest, SamplingKernel};
pub use sink::{AssetSink, FileAssetSink};

// Re-export core types
pub use sdfr_core::{
    error::{Result, SdfrError},
    state::PREVIEW_SHADER_NAME,
    with_context, Aabb, BakeSettings, FieldFormat, GridGeometry, Mat4, PropertyId, Quat,
    Transform, UVec3, Vec3, Vec4, MAX_GRID_DIMENSION,
};

// Re-export structures
pub use sdfr_structures::{
    material::{SDF_VOLUME_EXTENTS, SDF_VOLUME_TEX},
    load_asset, save_asset, Collection, CollectionStrategy, MaterialPropertyBlock, MaterialValue,
    RawDistanceField, Surface, SurfaceCollector, SurfaceKind, SurfaceRef, SurfaceScene,
    SurfaceSet, SurfaceSource, VolumeAsset, VolumeTexture,
};

/// Initializes sdfr's process-wide state.
///
/// Must be called before material parameters are produced.
pub fn init() -> Result<()> {
    sdfr_core::state::init_context()?;
    log::info!("sdfr initialized");
    Ok(())
}

/// Returns whether sdfr has been initialized.
#[must_use]
pub fn is_initialized() -> bool {
    sdfr_core::state::is_initialized()
}

/// Tears down sdfr's process-wide state.
pub fn shutdown() {
    sdfr_core::state::shutdown_context();
    log::info!("sdfr shut down");
}

/// Installs `env_logger` as the log backend, if none is installed yet.
pub fn init_logging() {
    let _ = env_logger::try_init();
}
