//! Mask compositing and PNG encoding.
//!
//! The remote API expects an opaque PNG at the source image's native
//! resolution where every pixel is either black (keep) or white
//! (selected). The mask surface holds white strokes over transparency,
//! so exporting is: fill black, draw the mask on top, binarize.

use image::{GrayImage, ImageEncoder, Luma, RgbaImage};
use tiny_skia::{Color, Pixmap, PixmapPaint, Transform};

use crate::surface::Surface;
use crate::types::{Dimensions, ExportError};

/// Gray level at and above which a composited pixel counts as selected.
const SELECTED_THRESHOLD: u8 = 128;

/// An encoded mask ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskExport {
    /// PNG bytes (8-bit grayscale, values 0 and 255 only).
    pub png: Vec<u8>,
    /// Pixel size, equal to the source image's natural size.
    pub dimensions: Dimensions,
    /// `true` if compositing failed and an all-black mask was produced
    /// instead.
    pub fallback: bool,
}

/// Composite `mask` over an opaque black background at `dimensions`.
///
/// Falls back to an all-black image (with `true` in the second slot) if
/// the mask surface does not match `dimensions` or the composite buffer
/// cannot be allocated.
#[must_use = "returns the composited mask"]
pub fn composite_mask(mask: &Surface, dimensions: Dimensions) -> (GrayImage, bool) {
    if mask.dimensions() != dimensions {
        log::warn!(
            "mask surface is {} but source image is {dimensions}, exporting all-black mask",
            mask.dimensions(),
        );
        return (black(dimensions), true);
    }

    let Some(mut canvas) = Pixmap::new(dimensions.width, dimensions.height) else {
        log::warn!("could not allocate {dimensions} composite, exporting all-black mask");
        return (black(dimensions), true);
    };
    canvas.fill(Color::BLACK);
    canvas.draw_pixmap(
        0,
        0,
        mask.pixmap().as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );

    let gray = GrayImage::from_fn(dimensions.width, dimensions.height, |x, y| {
        let value = canvas.pixel(x, y).map_or(0, |p| p.demultiply().red());
        Luma([if value >= SELECTED_THRESHOLD { 255 } else { 0 }])
    });
    (gray, false)
}

/// Composite and PNG-encode a mask surface.
///
/// # Errors
///
/// Returns [`ExportError::PngEncode`] if PNG encoding fails.
pub fn export_mask(mask: &Surface, dimensions: Dimensions) -> Result<MaskExport, ExportError> {
    let (gray, fallback) = composite_mask(mask, dimensions);
    let png = encode_gray_png(&gray)?;
    Ok(MaskExport {
        png,
        dimensions,
        fallback,
    })
}

/// Encode a grayscale image as PNG bytes.
///
/// # Errors
///
/// Returns [`ExportError::PngEncode`] if the encoder fails.
pub fn encode_gray_png(image: &GrayImage) -> Result<Vec<u8>, ExportError> {
    let mut png = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::L8,
    )?;
    Ok(png)
}

/// Draw the display surface over a decoded copy of the source image.
///
/// Used for previews outside the browser, where there is no `<img>`
/// element underneath the drawing canvas. Returns `None` if the sizes
/// differ.
#[must_use]
pub fn compose_preview(source: &RgbaImage, display: &Surface) -> Option<RgbaImage> {
    let dims = Dimensions::new(source.width(), source.height());
    if display.dimensions() != dims {
        return None;
    }

    let mut out = source.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let Some([r, g, b, a]) = display.pixel(x, y) else {
            continue;
        };
        if a == 0 {
            continue;
        }
        let alpha = u16::from(a);
        let inv = 255 - alpha;
        let [dr, dg, db, _] = pixel.0;
        #[allow(clippy::cast_possible_truncation)]
        let blend = |s: u8, d: u8| ((u16::from(s) * alpha + u16::from(d) * inv) / 255) as u8;
        pixel.0 = [blend(r, dr), blend(g, dg), blend(b, db), 255];
    }
    Some(out)
}

fn black(dimensions: Dimensions) -> GrayImage {
    GrayImage::new(dimensions.width, dimensions.height)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::surface::Ink;
    use crate::types::MaskPoint;

    #[test]
    fn empty_mask_exports_all_black() {
        let dims = Dimensions::new(12, 9);
        let mask = Surface::new(dims).unwrap();
        let (gray, fallback) = composite_mask(&mask, dims);
        assert!(!fallback);
        assert_eq!(gray.dimensions(), (12, 9));
        assert!(gray.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn painted_pixels_export_white_and_rest_black() {
        let dims = Dimensions::new(30, 30);
        let mut mask = Surface::new(dims).unwrap();
        mask.draw_dot(MaskPoint::new(15.0, 15.0), 6.0, Ink::MASK);
        let (gray, _) = composite_mask(&mask, dims);
        assert_eq!(gray.get_pixel(15, 15).0[0], 255);
        assert_eq!(gray.get_pixel(0, 0).0[0], 0);
        assert!(gray.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn size_mismatch_falls_back_to_black() {
        let mut mask = Surface::new(Dimensions::new(10, 10)).unwrap();
        mask.draw_dot(MaskPoint::new(5.0, 5.0), 6.0, Ink::MASK);
        let (gray, fallback) = composite_mask(&mask, Dimensions::new(20, 8));
        assert!(fallback);
        assert_eq!(gray.dimensions(), (20, 8));
        assert!(gray.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn exported_png_decodes_to_mask_size() {
        let dims = Dimensions::new(40, 25);
        let mut mask = Surface::new(dims).unwrap();
        mask.draw_segment(
            MaskPoint::new(5.0, 5.0),
            MaskPoint::new(35.0, 20.0),
            5.0,
            Ink::MASK,
        );
        let export = export_mask(&mask, dims).unwrap();
        assert!(!export.fallback);
        assert_eq!(export.dimensions, dims);

        let decoded = image::load_from_memory(&export.png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 25));
        assert_eq!(decoded.color(), image::ColorType::L8);
    }

    #[test]
    fn preview_blends_display_over_source() {
        let dims = Dimensions::new(10, 10);
        let source = RgbaImage::from_pixel(10, 10, image::Rgba([0, 0, 255, 255]));
        let mut display = Surface::new(dims).unwrap();
        display.draw_dot(MaskPoint::new(5.0, 5.0), 4.0, Ink::tint(255, 0, 0, 128));

        let out = compose_preview(&source, &display).unwrap();
        let [r, _, b, a] = out.get_pixel(5, 5).0;
        assert_eq!(a, 255);
        assert!(r > 100 && b > 100, "expected a red/blue mix, got r={r} b={b}");
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 255, 255]);
    }

    #[test]
    fn preview_rejects_mismatched_sizes() {
        let source = RgbaImage::new(4, 4);
        let display = Surface::new(Dimensions::new(5, 4)).unwrap();
        assert!(compose_preview(&source, &display).is_none());
    }
}
