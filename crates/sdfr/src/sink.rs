//! Destinations for baked assets.

use std::path::{Path, PathBuf};

use sdfr_core::{FieldFormat, Result};
use sdfr_structures::{save_asset, VolumeAsset};

/// Stores a freshly baked asset.
///
/// A failing store fails the bake that produced the asset.
pub trait AssetSink {
    /// Persists `asset` with its distances stored as `format`.
    fn store(&mut self, asset: &VolumeAsset, format: FieldFormat) -> Result<()>;
}

impl<F> AssetSink for F
where
    F: FnMut(&VolumeAsset, FieldFormat) -> Result<()>,
{
    fn store(&mut self, asset: &VolumeAsset, format: FieldFormat) -> Result<()> {
        self(asset, format)
    }
}

/// Writes each baked asset to one file path, replacing the previous file.
#[derive(Debug, Clone)]
pub struct FileAssetSink {
    path: PathBuf,
}

impl FileAssetSink {
    /// Creates a sink writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The destination path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AssetSink for FileAssetSink {
    fn store(&mut self, asset: &VolumeAsset, format: FieldFormat) -> Result<()> {
        save_asset(&self.path, asset, format)
    }
}
