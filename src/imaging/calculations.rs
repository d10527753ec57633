//! Pure calculation functions for image classification and sizing.
//!
//! All functions here are pure and testable without any I/O or images.
//! Physical lengths are centimetres; document extents are EMUs
//! (English Metric Units, 360 000 per centimetre).

/// EMUs per centimetre in OOXML drawing extents.
pub const EMU_PER_CM: f64 = 360_000.0;

/// Pixels per centimetre at 96 dpi (96 px per 2.54 cm).
pub const PIXELS_PER_CM_96DPI: f64 = 96.0 / 2.54;

/// Layout class of a single image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageClass {
    /// Narrow enough to share a table row with other small images.
    Small,
    /// Embedded on its own, centered.
    Large,
}

/// Physical width of an image of `width_px` pixels.
pub fn physical_width_cm(width_px: u32, pixels_per_cm: f64) -> f64 {
    width_px as f64 / pixels_per_cm
}

/// Classify by physical width: at or below the threshold is small.
pub fn classify_width(width_cm: f64, small_width_cm: f64) -> ImageClass {
    if width_cm <= small_width_cm {
        ImageClass::Small
    } else {
        ImageClass::Large
    }
}

/// Physical size of an embedded image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmbedSize {
    pub width_cm: f64,
    pub height_cm: f64,
}

impl EmbedSize {
    /// Drawing extent as `(cx, cy)` EMUs.
    pub fn extent_emu(&self) -> (u64, u64) {
        (cm_to_emu(self.width_cm), cm_to_emu(self.height_cm))
    }
}

/// Fix the height, scale the width by the source aspect ratio.
///
/// When `max_width_cm` is given and the scaled width exceeds it, the width is
/// clamped and the height recomputed so the aspect ratio still holds.
///
/// # Examples
/// ```
/// # use photo_report::imaging::fit_height;
/// // 4:3 landscape at 10 cm tall → 13.33 cm wide
/// let size = fit_height((800, 600), 10.0, None);
/// assert!((size.width_cm - 13.333).abs() < 0.01);
/// ```
pub fn fit_height(source: (u32, u32), height_cm: f64, max_width_cm: Option<f64>) -> EmbedSize {
    let (src_w, src_h) = source;
    let aspect = src_w as f64 / src_h.max(1) as f64;
    let width_cm = height_cm * aspect;

    match max_width_cm {
        Some(max) if width_cm > max => EmbedSize {
            width_cm: max,
            height_cm: max / aspect,
        },
        _ => EmbedSize {
            width_cm,
            height_cm,
        },
    }
}

/// Pixel dimensions for re-encoding an image at a physical size.
/// Never returns a zero dimension.
pub fn pixel_size(size: EmbedSize, pixels_per_cm: f64) -> (u32, u32) {
    let w = (size.width_cm * pixels_per_cm).round().max(1.0) as u32;
    let h = (size.height_cm * pixels_per_cm).round().max(1.0) as u32;
    (w, h)
}

/// Thumbnail dimensions for a fixed pixel height, preserving aspect ratio.
pub fn thumbnail_dimensions(source: (u32, u32), height: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    let w = (height as f64 * src_w as f64 / src_h.max(1) as f64).round() as u32;
    (w.max(1), height.max(1))
}

pub fn cm_to_emu(cm: f64) -> u64 {
    (cm * EMU_PER_CM).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // classification
    // =========================================================================

    #[test]
    fn width_at_threshold_is_small() {
        assert_eq!(classify_width(7.5, 7.5), ImageClass::Small);
    }

    #[test]
    fn width_one_unit_above_threshold_is_large() {
        assert_eq!(classify_width(8.5, 7.5), ImageClass::Large);
    }

    #[test]
    fn pixel_threshold_at_96_dpi() {
        // 7.5 cm at 96 dpi is 283.46 px
        let small = physical_width_cm(283, PIXELS_PER_CM_96DPI);
        let large = physical_width_cm(284, PIXELS_PER_CM_96DPI);
        assert_eq!(classify_width(small, 7.5), ImageClass::Small);
        assert_eq!(classify_width(large, 7.5), ImageClass::Large);
    }

    // =========================================================================
    // fit_height
    // =========================================================================

    #[test]
    fn fit_height_preserves_aspect_landscape() {
        let size = fit_height((1600, 1200), 10.0, None);
        assert_eq!(size.height_cm, 10.0);
        assert!((size.width_cm - 13.3333).abs() < 0.001);
    }

    #[test]
    fn fit_height_preserves_aspect_portrait() {
        let size = fit_height((600, 800), 6.0, None);
        assert_eq!(size.height_cm, 6.0);
        assert!((size.width_cm - 4.5).abs() < 1e-9);
    }

    #[test]
    fn fit_height_clamps_panorama_width() {
        // 4:1 panorama at 10 cm would be 40 cm wide
        let size = fit_height((4000, 1000), 10.0, Some(15.0));
        assert_eq!(size.width_cm, 15.0);
        assert!((size.height_cm - 3.75).abs() < 1e-9);
    }

    #[test]
    fn fit_height_within_cap_is_untouched() {
        let size = fit_height((1000, 1000), 10.0, Some(15.0));
        assert_eq!(size.width_cm, 10.0);
        assert_eq!(size.height_cm, 10.0);
    }

    // =========================================================================
    // pixel and EMU conversion
    // =========================================================================

    #[test]
    fn pixel_size_at_96_dpi() {
        let size = EmbedSize {
            width_cm: 2.54,
            height_cm: 5.08,
        };
        assert_eq!(pixel_size(size, PIXELS_PER_CM_96DPI), (96, 192));
    }

    #[test]
    fn pixel_size_never_zero() {
        let size = EmbedSize {
            width_cm: 0.001,
            height_cm: 0.001,
        };
        assert_eq!(pixel_size(size, PIXELS_PER_CM_96DPI), (1, 1));
    }

    #[test]
    fn extent_in_emu() {
        let size = EmbedSize {
            width_cm: 1.0,
            height_cm: 10.0,
        };
        assert_eq!(size.extent_emu(), (360_000, 3_600_000));
    }

    #[test]
    fn thumbnail_keeps_aspect() {
        assert_eq!(thumbnail_dimensions((800, 600), 150), (200, 150));
        assert_eq!(thumbnail_dimensions((600, 800), 200), (150, 200));
    }
}
