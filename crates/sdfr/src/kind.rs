//! Volume kinds and the capability interface shared by their bakers.

use std::sync::Arc;

use sdfr_core::{BakeSettings, Result, Transform};
use sdfr_structures::{Collection, MaterialPropertyBlock, SurfaceSource, VolumeAsset};

use crate::orchestrator::BakeOrchestrator;
use crate::sampler::SamplingKernel;

/// The kind of field a volume holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VolumeKind {
    /// Normalized signed distances to the baked surfaces.
    #[default]
    SignedDistance,
}

impl VolumeKind {
    /// Short display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            VolumeKind::SignedDistance => "SDF",
        }
    }
}

/// What every volume baker can do, whatever field it produces.
pub trait VolumeBaker {
    /// The kind of field this baker produces.
    fn kind(&self) -> VolumeKind;

    /// Selects the surfaces the next bake will sample.
    fn collect(&mut self, source: &dyn SurfaceSource) -> Result<Collection>;

    /// Runs a complete bake.
    fn bake(
        &mut self,
        source: &dyn SurfaceSource,
        kernel: &mut dyn SamplingKernel,
    ) -> Result<Arc<VolumeAsset>>;

    /// Fills preview material parameters from the last baked asset.
    ///
    /// Returns `false` when nothing has been baked yet.
    fn preview(&self, props: &mut MaterialPropertyBlock) -> Result<bool>;
}

impl VolumeBaker for BakeOrchestrator {
    fn kind(&self) -> VolumeKind {
        VolumeKind::SignedDistance
    }

    fn collect(&mut self, source: &dyn SurfaceSource) -> Result<Collection> {
        self.collect_surfaces(source)
    }

    fn bake(
        &mut self,
        source: &dyn SurfaceSource,
        kernel: &mut dyn SamplingKernel,
    ) -> Result<Arc<VolumeAsset>> {
        BakeOrchestrator::bake(self, source, kernel)
    }

    fn preview(&self, props: &mut MaterialPropertyBlock) -> Result<bool> {
        match self.asset() {
            Some(asset) => {
                asset.set_material_properties(props)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Creates the baker for `kind`.
pub fn create_baker(
    kind: VolumeKind,
    transform: Option<Transform>,
    settings: BakeSettings,
) -> Result<Box<dyn VolumeBaker + Send>> {
    match kind {
        VolumeKind::SignedDistance => Ok(Box::new(BakeOrchestrator::new(transform, settings)?)),
    }
}
