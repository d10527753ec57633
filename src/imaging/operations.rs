//! High-level image operations.
//!
//! These functions combine calculations with backend execution. They take
//! sizing rules, compute parameters, and call the backend.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{
    EmbedSize, ImageClass, PIXELS_PER_CM_96DPI, classify_width, fit_height, physical_width_cm,
    pixel_size, thumbnail_dimensions,
};
use super::params::{Quality, ResizeParams, ThumbnailParams};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Physical layout rules for embedded images.
#[derive(Debug, Clone, PartialEq)]
pub struct SizingRules {
    pub pixels_per_cm: f64,
    /// Images at or below this physical width are [`ImageClass::Small`].
    pub small_width_cm: f64,
    pub single_height_cm: f64,
    pub grouped_height_cm: f64,
    pub max_single_width_cm: f64,
    pub quality: Quality,
}

impl Default for SizingRules {
    fn default() -> Self {
        Self {
            pixels_per_cm: PIXELS_PER_CM_96DPI,
            small_width_cm: 7.5,
            single_height_cm: 10.0,
            grouped_height_cm: 6.0,
            max_single_width_cm: 15.0,
            quality: Quality::default(),
        }
    }
}

/// How an image is placed in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Alone on its own centered paragraph.
    Single,
    /// In a cell of a borderless group table.
    Grouped,
}

/// A re-encoded image ready to embed.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedImage {
    pub jpeg: Vec<u8>,
    pub size: EmbedSize,
}

/// Classify an image by its native physical width.
pub fn classify(backend: &impl ImageBackend, path: &Path, rules: &SizingRules) -> Result<ImageClass> {
    let dims = backend.identify(path)?;
    let width_cm = physical_width_cm(dims.width, rules.pixels_per_cm);
    Ok(classify_width(width_cm, rules.small_width_cm))
}

/// Compute the embed size for an image of `source` pixels.
pub fn plan_embed(source: (u32, u32), placement: Placement, rules: &SizingRules) -> EmbedSize {
    match placement {
        Placement::Single => fit_height(
            source,
            rules.single_height_cm,
            Some(rules.max_single_width_cm),
        ),
        Placement::Grouped => fit_height(source, rules.grouped_height_cm, None),
    }
}

/// Resize an image for embedding and return its JPEG bytes with the
/// physical size it should occupy.
pub fn prepare_embed(
    backend: &impl ImageBackend,
    path: &Path,
    placement: Placement,
    rules: &SizingRules,
) -> Result<PreparedImage> {
    let dims = backend.identify(path)?;
    let size = plan_embed((dims.width, dims.height), placement, rules);
    let (width, height) = pixel_size(size, rules.pixels_per_cm);

    let jpeg = backend.resize_jpeg(&ResizeParams {
        source: path.to_path_buf(),
        width,
        height,
        quality: rules.quality,
    })?;

    Ok(PreparedImage { jpeg, size })
}

/// Create a preview thumbnail at a fixed pixel height.
pub fn create_thumbnail(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    height: u32,
    quality: Quality,
) -> Result<()> {
    let dims = backend.identify(source)?;
    let (width, height) = thumbnail_dimensions((dims.width, dims.height), height);
    backend.thumbnail(&ThumbnailParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        width,
        height,
        quality,
    })
}
