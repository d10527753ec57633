//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They sit between
//! the [`operations`](super::operations) module (which decides sizes from
//! layout rules) and the [`backend`](super::backend) (which does the pixel
//! work), so a mock backend can stand in during tests.
//!
//! - [`Quality`]: JPEG quality (1–100, default 90). Clamped on construction.
//! - [`ResizeParams`]: source, exact target pixels, quality. The result is
//!   returned as encoded bytes, never written next to the source.
//! - [`ThumbnailParams`]: source, output file, target height, quality.

use std::path::PathBuf;

/// Quality setting for JPEG encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Re-encode `source` at exactly `width` x `height` pixels as JPEG.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

/// Write a preview thumbnail of `source` to `output`.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}
