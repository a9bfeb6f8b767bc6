//! Error types for sdfr-rs.

use thiserror::Error;

/// The main error type for sdfr-rs operations.
#[derive(Error, Debug)]
pub enum SdfrError {
    /// Grid dimensions, bounds or bake settings are unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Neither the anchor's children nor the world produced a bakeable surface.
    #[error("no surfaces to bake")]
    NoSurfaces,

    /// The sampling kernel failed or answered with an unusable result.
    #[error("sampler failure: {0}")]
    SamplerFailure(String),

    /// Distance buffer size does not match the grid cell count.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// A bake was requested while another one is still in flight.
    #[error("a bake is already in progress")]
    BakeInProgress,

    /// The asset destination could not be written or read.
    #[error("asset I/O error: {0}")]
    AssetIo(#[from] std::io::Error),

    /// Persisted asset bytes are malformed.
    #[error("invalid asset data: {0}")]
    AssetFormat(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The process-wide context has not been initialized.
    #[error("sdfr not initialized - call sdfr::init() first")]
    NotInitialized,

    /// The process-wide context has already been initialized.
    #[error("sdfr already initialized")]
    AlreadyInitialized,
}

impl SdfrError {
    /// Returns true for errors raised synchronously while validating
    /// dimensions, bounds or settings.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, SdfrError::Configuration(_))
    }
}

/// A specialized Result type for sdfr-rs operations.
pub type Result<T> = std::result::Result<T, SdfrError>;
