//! The contract between a bake and the external distance sampling kernel.
//!
//! A kernel receives one [`SampleRequest`] per bake together with a
//! [`Completion`]. It answers exactly once by consuming the completion,
//! either synchronously inside [`SamplingKernel::sample`] or later from
//! another thread. Jitter seed, jitter scale and samples per voxel are
//! opaque kernel configuration.

use std::sync::mpsc::{self, Receiver, SyncSender};

use glam::{Mat4, UVec3, Vec3};
use sdfr_core::{Aabb, GridGeometry, Result};
use sdfr_structures::{RawDistanceField, SurfaceSet};

/// Everything a kernel needs to sample one grid.
#[derive(Debug, Clone)]
pub struct SampleRequest {
    /// Snapshot of the grid being baked.
    pub grid: GridGeometry,
    /// Surfaces to measure distances to.
    pub surfaces: SurfaceSet,
    /// Rays cast per voxel.
    pub samples_per_voxel: u32,
    /// Jitter seed.
    pub jitter_seed: i32,
    /// Jitter scale.
    pub jitter_scale: f32,
}

impl SampleRequest {
    /// Number of voxels on each axis.
    #[must_use]
    pub fn dimensions(&self) -> UVec3 {
        self.grid.dimensions()
    }

    /// Grid bounds in the anchor frame.
    #[must_use]
    pub fn bounds_local(&self) -> Aabb {
        self.grid.bounds_local()
    }

    /// Translation and rotation placing the grid in the world.
    #[must_use]
    pub fn transform(&self) -> Mat4 {
        self.grid.local_to_world_no_scale()
    }

    /// Number of distances the kernel must return.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.grid.cell_count()
    }

    /// World-space position of every voxel, in buffer order.
    pub fn voxel_positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        (0..self.grid.cell_count()).map(|i| self.grid.coordinate_to_world_position(i))
    }
}

/// Single-use handle a kernel answers a request with.
///
/// Consuming the handle delivers the answer; dropping it unanswered makes the
/// bake fail with a sampler failure.
#[derive(Debug)]
pub struct Completion {
    sender: SyncSender<Result<RawDistanceField>>,
}

impl Completion {
    /// Delivers the sampled distances, or the kernel's failure.
    pub fn complete(self, result: Result<RawDistanceField>) {
        if self.sender.send(result).is_err() {
            log::warn!("bake result delivered after the bake was abandoned");
        }
    }

    /// Delivers sampled distances and the normalization divisor.
    pub fn succeed(self, distances: Vec<f32>, max_distance: f32) {
        self.complete(Ok(RawDistanceField::new(distances, max_distance)));
    }
}

/// Creates a completion handle and the receiving end that waits for it.
pub(crate) fn completion_channel() -> (Completion, Receiver<Result<RawDistanceField>>) {
    let (sender, receiver) = mpsc::sync_channel(1);
    (Completion { sender }, receiver)
}

/// An external distance sampler.
pub trait SamplingKernel {
    /// Starts sampling `request`; the answer goes through `completion`.
    fn sample(&mut self, request: SampleRequest, completion: Completion);
}

impl<F> SamplingKernel for F
where
    F: FnMut(SampleRequest, Completion),
{
    fn sample(&mut self, request: SampleRequest, completion: Completion) {
        self(request, completion);
    }
}
