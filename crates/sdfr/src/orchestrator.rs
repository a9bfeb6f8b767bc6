//! End-to-end bake driver.
//!
//! A bake moves through `Idle -> CollectingSurfaces -> Sampling -> Packaging
//! -> Complete`, or to `Failed` from any step. Only one bake may be in
//! flight per orchestrator: between [`BakeOrchestrator::start`] and
//! [`BakeOrchestrator::finish`] every further bake request is rejected with
//! [`SdfrError::BakeInProgress`]. Dropping a [`PendingBake`] without
//! finishing it, wherever that happens, releases the orchestrator that
//! started it as if the bake had been abandoned.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use sdfr_core::{BakeSettings, GridGeometry, Result, SdfrError, Transform};
use sdfr_structures::{
    package, Collection, RawDistanceField, SurfaceCollector, SurfaceSet, SurfaceSource,
    VolumeAsset,
};

use crate::sampler::{completion_channel, SampleRequest, SamplingKernel};
use crate::sink::AssetSink;

static NEXT_BAKE_ID: AtomicU64 = AtomicU64::new(1);

/// Where a bake currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BakeState {
    /// No bake has run yet.
    #[default]
    Idle,
    /// Selecting surfaces and fitting bounds.
    CollectingSurfaces,
    /// Waiting for the sampling kernel.
    Sampling,
    /// Normalizing and storing the result.
    Packaging,
    /// The last bake produced an asset.
    Complete,
    /// The last bake produced nothing.
    Failed,
}

impl BakeState {
    /// Returns true while a bake is in flight.
    #[must_use]
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            BakeState::CollectingSurfaces | BakeState::Sampling | BakeState::Packaging
        )
    }
}

/// A bake waiting for its kernel to answer.
///
/// Hand it back to [`BakeOrchestrator::finish`] (or
/// [`BakeOrchestrator::abandon`]) to release the orchestrator. Dropping it
/// anywhere else counts as abandoning the bake.
#[must_use = "a pending bake keeps the orchestrator busy until it is finished"]
#[derive(Debug)]
pub struct PendingBake {
    id: u64,
    surfaces: SurfaceSet,
    receiver: Receiver<Result<RawDistanceField>>,
    dropped: Arc<AtomicBool>,
}

impl PendingBake {
    /// Surfaces handed to the kernel.
    #[must_use]
    pub fn surfaces(&self) -> &SurfaceSet {
        &self.surfaces
    }
}

impl Drop for PendingBake {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::Release);
    }
}

/// The bake an orchestrator is waiting on.
#[derive(Debug)]
struct InFlight {
    id: u64,
    dropped: Arc<AtomicBool>,
}

impl InFlight {
    fn is_dropped(&self) -> bool {
        self.dropped.load(Ordering::Acquire)
    }
}

/// Drives surface collection, sampling and packaging for one grid.
pub struct BakeOrchestrator {
    settings: BakeSettings,
    grid: GridGeometry,
    collector: SurfaceCollector,
    state: BakeState,
    in_flight: Option<InFlight>,
    asset: Option<Arc<VolumeAsset>>,
    baked_surfaces: SurfaceSet,
    sink: Option<Box<dyn AssetSink + Send>>,
}

impl BakeOrchestrator {
    /// Creates an orchestrator whose grid is anchored to `transform`.
    pub fn new(transform: Option<Transform>, settings: BakeSettings) -> Result<Self> {
        settings.validate()?;
        let grid = GridGeometry::initialize(transform, settings.dimensions, settings.bounds)?;

        Ok(Self {
            collector: SurfaceCollector::new(settings.fit_to_vertices),
            settings,
            grid,
            state: BakeState::Idle,
            in_flight: None,
            asset: None,
            baked_surfaces: SurfaceSet::new(),
            sink: None,
        })
    }

    /// Sets where baked assets are stored.
    #[must_use]
    pub fn with_sink(mut self, sink: impl AssetSink + Send + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Replaces the asset sink.
    pub fn set_sink(&mut self, sink: Option<Box<dyn AssetSink + Send>>) {
        self.sink = sink;
    }

    /// Replaces the settings and rebuilds the grid from them.
    ///
    /// The anchor transform is kept. Rejected while a bake is in flight.
    pub fn set_settings(&mut self, settings: BakeSettings) -> Result<()> {
        self.ensure_idle()?;
        settings.validate()?;
        let grid = GridGeometry::initialize(
            self.grid.transform().copied(),
            settings.dimensions,
            settings.bounds,
        )?;

        log::debug!("grid rebuilt from new settings");
        self.grid = grid;
        self.collector = SurfaceCollector::new(settings.fit_to_vertices);
        self.settings = settings;
        Ok(())
    }

    /// Moves the grid anchor. Rejected while a bake is in flight.
    pub fn set_transform(&mut self, transform: Option<Transform>) -> Result<()> {
        self.ensure_idle()?;
        self.grid.set_transform(transform);
        Ok(())
    }

    /// Current settings. Bounds reflect the last fit.
    #[must_use]
    pub fn settings(&self) -> &BakeSettings {
        &self.settings
    }

    /// The grid being baked.
    #[must_use]
    pub fn grid(&self) -> &GridGeometry {
        &self.grid
    }

    /// Current state.
    ///
    /// A bake whose pending handle was dropped unfinished reports `Failed`.
    #[must_use]
    pub fn state(&self) -> BakeState {
        if self.in_flight.as_ref().is_some_and(InFlight::is_dropped) {
            return BakeState::Failed;
        }
        self.state
    }

    /// The asset of the last successful bake.
    #[must_use]
    pub fn asset(&self) -> Option<&Arc<VolumeAsset>> {
        self.asset.as_ref()
    }

    /// Surfaces used by the last successful bake.
    #[must_use]
    pub fn baked_surfaces(&self) -> &SurfaceSet {
        &self.baked_surfaces
    }

    /// Releases a bake whose pending handle was dropped without being finished.
    fn release_dropped(&mut self) {
        if self.in_flight.as_ref().is_some_and(InFlight::is_dropped) {
            self.in_flight = None;
            self.state = BakeState::Failed;
            log::warn!("pending bake dropped without being finished");
        }
    }

    fn ensure_idle(&mut self) -> Result<()> {
        self.release_dropped();
        if self.state.is_busy() {
            return Err(SdfrError::BakeInProgress);
        }
        Ok(())
    }

    /// Selects surfaces for the next bake, re-fitting the grid when they
    /// come from the anchor's children.
    pub fn collect_surfaces(&mut self, source: &dyn SurfaceSource) -> Result<Collection> {
        self.ensure_idle()?;
        self.state = BakeState::CollectingSurfaces;

        match self.collector.collect(source, &mut self.grid) {
            Ok(collection) => {
                if let Some(bounds) = collection.fitted_bounds {
                    self.settings.bounds = bounds;
                }
                self.state = BakeState::Idle;
                Ok(collection)
            }
            Err(e) => {
                self.state = BakeState::Failed;
                Err(e)
            }
        }
    }

    /// Collects surfaces and hands the grid to `kernel`.
    ///
    /// Fails before the kernel is invoked when no surfaces are found or the
    /// fitted bounds are unusable.
    pub fn start(
        &mut self,
        source: &dyn SurfaceSource,
        kernel: &mut dyn SamplingKernel,
    ) -> Result<PendingBake> {
        let collection = self.collect_surfaces(source)?;
        log::info!(
            "baking {} surface(s) via {:?} into {} voxels",
            collection.surfaces.len(),
            collection.strategy,
            self.grid.cell_count()
        );

        let id = NEXT_BAKE_ID.fetch_add(1, Ordering::Relaxed);
        let dropped = Arc::new(AtomicBool::new(false));
        self.in_flight = Some(InFlight {
            id,
            dropped: Arc::clone(&dropped),
        });
        self.state = BakeState::Sampling;

        let request = SampleRequest {
            grid: self.grid,
            surfaces: collection.surfaces.clone(),
            samples_per_voxel: self.settings.ray_samples,
            jitter_seed: self.settings.jitter_seed,
            jitter_scale: self.settings.jitter_scale,
        };
        let (completion, receiver) = completion_channel();
        kernel.sample(request, completion);

        Ok(PendingBake {
            id,
            surfaces: collection.surfaces,
            receiver,
            dropped,
        })
    }

    /// Waits for the kernel's answer, packages it and stores the asset.
    ///
    /// On success the new asset replaces the previous one entirely. On
    /// failure the state becomes `Failed` and the previous asset is kept.
    ///
    /// A handle started by another orchestrator is rejected and dropped,
    /// which releases its own orchestrator; this one is left untouched.
    pub fn finish(&mut self, mut pending: PendingBake) -> Result<Arc<VolumeAsset>> {
        if !self.owns(&pending) {
            return Err(SdfrError::SamplerFailure(
                "completion does not belong to the bake in flight".to_string(),
            ));
        }
        self.in_flight = None;

        let result = self.receive_and_package(&pending);
        match result {
            Ok(asset) => {
                let asset = Arc::new(asset);
                self.asset = Some(Arc::clone(&asset));
                self.baked_surfaces = std::mem::take(&mut pending.surfaces);
                self.state = BakeState::Complete;
                log::info!("bake complete");
                Ok(asset)
            }
            Err(e) => {
                self.state = BakeState::Failed;
                log::warn!("bake failed: {e}");
                Err(e)
            }
        }
    }

    fn receive_and_package(&mut self, pending: &PendingBake) -> Result<VolumeAsset> {
        let field = pending.receiver.recv().map_err(|_| {
            SdfrError::SamplerFailure("kernel dropped its completion without answering".to_string())
        })??;

        self.state = BakeState::Packaging;
        let asset = package(&self.grid, field)?;

        if let Some(sink) = self.sink.as_mut() {
            sink.store(&asset, self.settings.field_format)?;
        }
        Ok(asset)
    }

    /// Gives up on a pending bake. Its late answer, if any, is discarded.
    pub fn abandon(&mut self, pending: PendingBake) {
        if self.owns(&pending) {
            self.in_flight = None;
            self.state = BakeState::Failed;
            log::warn!("bake abandoned");
        }
    }

    /// Returns true if `pending` is the bake this orchestrator is waiting on.
    #[must_use]
    pub fn owns(&self, pending: &PendingBake) -> bool {
        self.in_flight.as_ref().is_some_and(|f| f.id == pending.id)
    }

    /// Runs a whole bake, blocking until the kernel answers.
    pub fn bake(
        &mut self,
        source: &dyn SurfaceSource,
        kernel: &mut dyn SamplingKernel,
    ) -> Result<Arc<VolumeAsset>> {
        let pending = self.start(source, kernel)?;
        self.finish(pending)
    }
}

impl std::fmt::Debug for BakeOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BakeOrchestrator")
            .field("settings", &self.settings)
            .field("grid", &self.grid)
            .field("state", &self.state)
            .field("has_asset", &self.asset.is_some())
            .field("has_sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}
