//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the report needs:
//! identify, resize-to-JPEG, and thumbnail. The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend); tests use the recording
//! [`MockBackend`](tests::MockBackend).

use super::params::{ResizeParams, ThumbnailParams};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// `Sync` so a single backend can be shared across rayon workers while the
/// composer prepares images in parallel.
pub trait ImageBackend: Sync {
    /// Read pixel dimensions without a full decode where the format allows.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode, resize to the exact target, and return JPEG bytes.
    fn resize_jpeg(&self, params: &ResizeParams) -> Result<Vec<u8>, BackendError>;

    /// Write a JPEG thumbnail to `params.output`.
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError>;
}
