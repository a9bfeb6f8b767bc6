//! Data records and pipelines for sdfr-rs.
//!
//! This crate provides the pieces a bake is assembled from:
//! - Surfaces and surface sources
//! - The surface collector (children-first, intersection fallback)
//! - Distance normalization and packaging
//! - Baked volume assets, their material parameters and binary persistence

// Grid dimensions are bounded by MAX_GRID_DIMENSION, index casts cannot truncate
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]

pub mod asset_io;
pub mod collector;
pub mod material;
pub mod packager;
pub mod surface;
pub mod volume_asset;

pub use asset_io::{load_asset, read_asset, save_asset, write_asset};
pub use collector::{Collection, CollectionStrategy, SurfaceCollector};
pub use material::{MaterialPropertyBlock, MaterialValue, VolumeTexture};
pub use packager::{decode, non_uniform_scale, normalize, package, RawDistanceField};
pub use surface::{Surface, SurfaceKind, SurfaceRef, SurfaceScene, SurfaceSet, SurfaceSource};
pub use volume_asset::VolumeAsset;
