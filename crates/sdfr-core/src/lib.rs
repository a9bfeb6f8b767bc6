//! Core abstractions for sdfr-rs.
//!
//! This crate provides the geometry and shared types every other crate builds on:
//! - [`GridGeometry`] for voxel grid dimensions, bounds and index mapping
//! - [`Aabb`] and [`Transform`] for bounds and anchor transforms
//! - [`BakeSettings`] for bake configuration
//! - Error types and process-wide state

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Grid dimensions are bounded by MAX_GRID_DIMENSION, index casts cannot truncate
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

pub mod bounds;
pub mod error;
pub mod grid;
pub mod settings;
pub mod state;
pub mod transform;

pub use bounds::Aabb;
pub use error::{Result, SdfrError};
pub use grid::{GridGeometry, MAX_GRID_DIMENSION, MIN_BORDER_DIMENSION};
pub use settings::{BakeSettings, FieldFormat};
pub use state::{with_context, with_context_mut, Context, PropertyId};
pub use transform::Transform;

// Re-export glam types for convenience
pub use glam::{Mat4, Quat, UVec3, Vec3, Vec4};
