//! Shared types for the visionary mask editor.

use serde::{Deserialize, Serialize};

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create new dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either side is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// The rendered (CSS) size of the display surface at the moment of an
/// input event.
///
/// This is the size the element occupies on screen after responsive
/// layout, which generally differs from the backing pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplaySize {
    /// Rendered width in CSS pixels.
    pub width: f64,
    /// Rendered height in CSS pixels.
    pub height: f64,
}

impl DisplaySize {
    /// Create a new display size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Returns `true` if the size can be used as a divisor on both axes.
    #[must_use]
    pub fn is_usable(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

impl From<Dimensions> for DisplaySize {
    fn from(d: Dimensions) -> Self {
        Self::new(f64::from(d.width), f64::from(d.height))
    }
}

/// A pointer position relative to the top-left corner of the display
/// surface, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    /// Horizontal offset from the left edge.
    pub x: f64,
    /// Vertical offset from the top edge.
    pub y: f64,
}

impl ScreenPoint {
    /// Create a new screen point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A position on the mask surface, in source-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaskPoint {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl MaskPoint {
    /// Create a new mask point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Per-axis scale from display (CSS) space to mask pixel space.
///
/// Computed fresh for every input event from the current mask size and
/// the current rendered size, never cached across events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleRatio {
    /// `mask.width / display.width`
    pub x: f64,
    /// `mask.height / display.height`
    pub y: f64,
}

impl ScaleRatio {
    /// Ratio between a mask of `mask` pixels and its rendered `display` size.
    ///
    /// Returns `None` if the display size is zero or not finite (e.g. the
    /// element is hidden or not laid out yet).
    #[must_use]
    pub fn between(mask: Dimensions, display: DisplaySize) -> Option<Self> {
        if !display.is_usable() || mask.is_empty() {
            return None;
        }
        Some(Self {
            x: f64::from(mask.width) / display.width,
            y: f64::from(mask.height) / display.height,
        })
    }

    /// Map a screen point into mask space.
    #[must_use]
    pub fn apply(self, p: ScreenPoint) -> MaskPoint {
        MaskPoint::new(p.x * self.x, p.y * self.y)
    }
}

/// Integer pixel rectangle touched by a drawing operation.
///
/// Always clamped to the surface it was produced for. A rectangle with
/// zero width or height means nothing visible changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DirtyRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl DirtyRect {
    /// The whole surface.
    #[must_use]
    pub const fn full(d: Dimensions) -> Self {
        Self {
            x: 0,
            y: 0,
            width: d.width,
            height: d.height,
        }
    }

    /// Returns `true` if the rectangle covers no pixels.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Bounding box of a disc of radius `radius` swept from `a` to `b`,
    /// padded by one pixel for anti-aliasing and clamped to `bounds`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn around_segment(a: MaskPoint, b: MaskPoint, radius: f64, bounds: Dimensions) -> Self {
        let pad = radius + 1.0;
        let left = (a.x.min(b.x) - pad).floor().max(0.0);
        let top = (a.y.min(b.y) - pad).floor().max(0.0);
        let right = (a.x.max(b.x) + pad).ceil().min(f64::from(bounds.width));
        let bottom = (a.y.max(b.y) + pad).ceil().min(f64::from(bounds.height));
        if !(right > left && bottom > top) {
            return Self::default();
        }
        Self {
            x: left as u32,
            y: top as u32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        }
    }

    /// Smallest rectangle covering both `self` and `other`.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        Self {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }
}

/// Errors that can occur while loading a source image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// The selected file contained no bytes.
    #[error("input image data is empty")]
    EmptyInput,

    /// The image data could not be decoded.
    #[error("failed to decode image: {0}")]
    ImageDecode(String),

    /// The image decoded but reports no natural size.
    #[error("image has no natural dimensions ({0})")]
    ZeroSize(Dimensions),
}

impl From<image::ImageError> for LoadError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageDecode(err.to_string())
    }
}

/// Reasons a new stroke can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StrokeError {
    /// No source image has been loaded.
    #[error("no image loaded")]
    NoImage,

    /// The surfaces could not be sized from the image's natural size.
    #[error("drawing surfaces unavailable for a {0} image")]
    SurfaceUnavailable(Dimensions),

    /// The display surface has no rendered size, so the pointer
    /// position cannot be mapped.
    #[error("display surface has no rendered size")]
    DisplayUnsized,
}

/// Errors that can occur while exporting the mask.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExportError {
    /// The mask surface has not been sized yet.
    #[error("mask is not ready yet, please wait for the image to load")]
    NotReady,

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    PngEncode(String),
}

impl From<image::ImageError> for ExportError {
    fn from(err: image::ImageError) -> Self {
        Self::PngEncode(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ratio_maps_half_size_display() {
        let ratio =
            ScaleRatio::between(Dimensions::new(400, 300), DisplaySize::new(200.0, 150.0)).unwrap();
        assert_eq!(ratio.apply(ScreenPoint::new(100.0, 75.0)), MaskPoint::new(200.0, 150.0));
        assert_eq!(ratio.apply(ScreenPoint::new(120.0, 75.0)), MaskPoint::new(240.0, 150.0));
    }

    #[test]
    fn ratio_is_independent_per_axis() {
        let ratio =
            ScaleRatio::between(Dimensions::new(100, 100), DisplaySize::new(50.0, 200.0)).unwrap();
        assert_eq!(ratio.apply(ScreenPoint::new(10.0, 10.0)), MaskPoint::new(20.0, 5.0));
    }

    #[test]
    fn ratio_rejects_unlaid_out_display() {
        let mask = Dimensions::new(10, 10);
        assert!(ScaleRatio::between(mask, DisplaySize::new(0.0, 10.0)).is_none());
        assert!(ScaleRatio::between(mask, DisplaySize::new(10.0, 0.0)).is_none());
        assert!(ScaleRatio::between(mask, DisplaySize::new(f64::NAN, 10.0)).is_none());
        assert!(ScaleRatio::between(Dimensions::new(0, 0), DisplaySize::new(10.0, 10.0)).is_none());
    }

    #[test]
    fn dirty_rect_is_clamped_to_bounds() {
        let bounds = Dimensions::new(50, 40);
        let rect = DirtyRect::around_segment(
            MaskPoint::new(2.0, 2.0),
            MaskPoint::new(48.0, 38.0),
            10.0,
            bounds,
        );
        assert_eq!(rect, DirtyRect::full(bounds));
    }

    #[test]
    fn dirty_rect_covers_padded_segment() {
        let rect = DirtyRect::around_segment(
            MaskPoint::new(20.0, 20.0),
            MaskPoint::new(30.0, 20.0),
            2.0,
            Dimensions::new(100, 100),
        );
        assert_eq!(
            rect,
            DirtyRect {
                x: 17,
                y: 17,
                width: 16,
                height: 6
            }
        );
    }

    #[test]
    fn dirty_rect_outside_bounds_is_empty() {
        let rect = DirtyRect::around_segment(
            MaskPoint::new(500.0, 500.0),
            MaskPoint::new(600.0, 600.0),
            3.0,
            Dimensions::new(100, 100),
        );
        assert!(rect.is_empty());
    }

    #[test]
    fn dirty_rect_union() {
        let a = DirtyRect {
            x: 0,
            y: 0,
            width: 2,
            height: 2,
        };
        let b = DirtyRect {
            x: 5,
            y: 1,
            width: 1,
            height: 4,
        };
        assert_eq!(
            a.union(b),
            DirtyRect {
                x: 0,
                y: 0,
                width: 6,
                height: 5
            }
        );
        assert_eq!(DirtyRect::default().union(b), b);
    }

    #[test]
    fn error_display() {
        assert_eq!(LoadError::EmptyInput.to_string(), "input image data is empty");
        assert_eq!(
            LoadError::ZeroSize(Dimensions::new(0, 0)).to_string(),
            "image has no natural dimensions (0x0)",
        );
        assert_eq!(
            ExportError::NotReady.to_string(),
            "mask is not ready yet, please wait for the image to load",
        );
    }

    #[test]
    fn dimensions_serde_round_trip() {
        let d = Dimensions::new(640, 480);
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, r#"{"width":640,"height":480}"#);
        let back: Dimensions = serde_json::from_str(&json).unwrap();
        assert_eq!(d, back);
    }
}
