//! Pointer position relative to the drawing canvas.
//!
//! The canvas is CSS-scaled, so both the offset and the rendered size
//! are read from its bounding rect at event time.

use visionary_mask::{DisplaySize, ScreenPoint};

/// Canvas-relative point and rendered canvas size for one event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    /// Position inside the canvas, in CSS pixels.
    pub point: ScreenPoint,
    /// The canvas's rendered size, in CSS pixels.
    pub display: DisplaySize,
}

/// A bounding rectangle in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientRect {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Rendered width.
    pub width: f64,
    /// Rendered height.
    pub height: f64,
}

impl From<&web_sys::DomRect> for ClientRect {
    fn from(rect: &web_sys::DomRect) -> Self {
        Self {
            left: rect.left(),
            top: rect.top(),
            width: rect.width(),
            height: rect.height(),
        }
    }
}

/// Translate a client-space position into a canvas-relative sample.
#[must_use]
pub fn sample(client_x: f64, client_y: f64, rect: ClientRect) -> PointerSample {
    PointerSample {
        point: ScreenPoint::new(client_x - rect.left, client_y - rect.top),
        display: DisplaySize::new(rect.width, rect.height),
    }
}

/// Sample a pointer event against the element with id `element_id`.
///
/// Returns `None` if the element is not in the document.
#[must_use]
pub fn sample_element(element_id: &str, client_x: f64, client_y: f64) -> Option<PointerSample> {
    let element = web_sys::window()?
        .document()?
        .get_element_by_id(element_id)?;
    let rect = ClientRect::from(&element.get_bounding_client_rect());
    Some(sample(client_x, client_y, rect))
}
