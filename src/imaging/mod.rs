//! Image classification and resizing for embedding.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageReader::into_dimensions` |
//! | **Classify** | native width ÷ pixels-per-cm vs. small threshold |
//! | **Resize → JPEG** | Lanczos3 + `JpegEncoder` |
//! | **Thumbnail** | fixed-height resize for the preview |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for physical-size math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{EmbedSize, ImageClass, PIXELS_PER_CM_96DPI, cm_to_emu, fit_height};
pub use operations::{
    Placement, PreparedImage, SizingRules, classify, create_thumbnail, plan_embed, prepare_embed,
};
pub use params::Quality;
pub use rust_backend::RustBackend;
