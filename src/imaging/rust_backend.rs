//! Pure Rust image processing backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG) | `image::ImageReader` with content sniffing |
//! | Identify | `ImageReader::into_dimensions` (header only) |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{ResizeParams, ThumbnailParams};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::Write;
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Open with the format sniffed from content, so a PNG saved as `.jpg`
/// still decodes.
fn open_reader(path: &Path) -> Result<ImageReader<std::io::BufReader<std::fs::File>>, BackendError> {
    Ok(ImageReader::open(path)?.with_guessed_format()?)
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    open_reader(path)?.decode().map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
    })
}

/// JPEG has no alpha channel, so everything is flattened to RGB8 first.
fn encode_jpeg(img: &DynamicImage, writer: impl Write, quality: u32) -> Result<(), BackendError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let encoder = JpegEncoder::new_with_quality(writer, quality.clamp(1, 100) as u8);
    rgb.write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = open_reader(path)?.into_dimensions().map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn resize_jpeg(&self, params: &ResizeParams) -> Result<Vec<u8>, BackendError> {
        let img = load_image(&params.source)?;
        let resized = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
        let mut bytes = Vec::new();
        encode_jpeg(&resized, &mut bytes, params.quality.value())?;
        Ok(bytes)
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let thumb = img.resize_exact(params.width, params.height, FilterType::Triangle);
        let file = std::fs::File::create(&params.output)?;
        encode_jpeg(&thumb, std::io::BufWriter::new(file), params.quality.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::Quality;
    use crate::test_helpers::{create_test_jpeg, create_test_png};

    #[test]
    fn identify_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 200, 150);

        let backend = RustBackend::new();
        let dims = backend.identify(&path).unwrap();
        assert_eq!(dims.width, 200);
        assert_eq!(dims.height, 150);
    }

    #[test]
    fn identify_sniffs_mislabelled_png() {
        let tmp = tempfile::TempDir::new().unwrap();
        let png = tmp.path().join("real.png");
        create_test_png(&png, 64, 32);
        let mislabelled = tmp.path().join("photo.jpg");
        std::fs::rename(&png, &mislabelled).unwrap();

        let dims = RustBackend::new().identify(&mislabelled).unwrap();
        assert_eq!((dims.width, dims.height), (64, 32));
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        let backend = RustBackend::new();
        let result = backend.identify(Path::new("/nonexistent/image.jpg"));
        assert!(result.is_err());
    }

    #[test]
    fn identify_empty_file_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("empty.jpg");
        std::fs::write(&path, b"").unwrap();
        assert!(RustBackend::new().identify(&path).is_err());
    }

    #[test]
    fn resize_png_to_jpeg_bytes() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.png");
        create_test_png(&source, 400, 300);

        let bytes = RustBackend::new()
            .resize_jpeg(&ResizeParams {
                source,
                width: 200,
                height: 150,
                quality: Quality::new(90),
            })
            .unwrap();

        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 150));
    }

    #[test]
    fn thumbnail_written_at_requested_size() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 800, 600);

        let output = tmp.path().join("thumb.jpg");
        RustBackend::new()
            .thumbnail(&ThumbnailParams {
                source,
                output: output.clone(),
                width: 200,
                height: 150,
                quality: Quality::new(80),
            })
            .unwrap();

        let dims = RustBackend::new().identify(&output).unwrap();
        assert_eq!((dims.width, dims.height), (200, 150));
    }
}
