//! Blob handles and canvas blitting.
//!
//! [`ObjectUrl`] owns a `blob:` URL for as long as something displays
//! it and revokes it on drop. [`blit_region`] copies the changed part of
//! the display surface into the on-page `<canvas>`.

use visionary_mask::{DirtyRect, MaskCanvasController};
use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{BlobPropertyBag, CanvasRenderingContext2d, HtmlCanvasElement};

/// Errors that can occur while creating blobs or drawing to a canvas.
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    /// No `<canvas>` with the requested id is in the document.
    #[error("canvas #{0} not found")]
    CanvasNotFound(String),

    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    JsError(String),
}

impl From<JsValue> for RasterError {
    fn from(value: JsValue) -> Self {
        Self::JsError(format!("{value:?}"))
    }
}

/// Wrap `bytes` in a `Blob` of type `mime`.
///
/// # Errors
///
/// Returns the browser's error if `Blob` construction fails.
pub fn bytes_to_blob(bytes: &[u8], mime: &str) -> Result<web_sys::Blob, JsValue> {
    let uint8_array = js_sys::Uint8Array::from(bytes);
    let parts = js_sys::Array::new();
    parts.push(&uint8_array);

    let opts = BlobPropertyBag::new();
    opts.set_type(mime);
    web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &opts)
}

/// An object URL that is revoked when dropped.
///
/// Use it for `<img src>` previews and download anchors; keep it alive
/// exactly as long as the element referencing it.
#[derive(Debug, PartialEq, Eq)]
pub struct ObjectUrl {
    url: String,
}

impl ObjectUrl {
    /// Create an object URL for `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::JsError`] if Blob or URL creation fails.
    pub fn from_bytes(bytes: &[u8], mime: &str) -> Result<Self, RasterError> {
        let blob = bytes_to_blob(bytes, mime)?;
        let url = web_sys::Url::create_object_url_with_blob(&blob)?;
        Ok(Self { url })
    }

    /// The `blob:` URL.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        // Best-effort: the page may already be unloading.
        let _ = web_sys::Url::revoke_object_url(&self.url);
    }
}

/// Copy `rect` of the controller's display surface into `<canvas id=canvas_id>`.
///
/// Does nothing if the controller has no surfaces or `rect` is empty.
///
/// # Errors
///
/// Returns [`RasterError::CanvasNotFound`] if the element is missing or
/// not a canvas, and [`RasterError::JsError`] if the 2D context or
/// `ImageData` cannot be created.
pub fn blit_region(
    canvas_id: &str,
    controller: &MaskCanvasController,
    rect: DirtyRect,
) -> Result<(), RasterError> {
    let Some(display) = controller.display_surface() else {
        return Ok(());
    };
    let rect = clamp_to(rect, display.dimensions().width, display.dimensions().height);
    if rect.is_empty() {
        return Ok(());
    }

    let context = context_2d(canvas_id)?;
    let pixels = display.rgba_region(rect);
    let image_data = web_sys::ImageData::new_with_u8_clamped_array_and_sh(
        Clamped(pixels.as_slice()),
        rect.width,
        rect.height,
    )?;
    context.put_image_data(&image_data, f64::from(rect.x), f64::from(rect.y))?;
    Ok(())
}

/// Repaint the whole display surface.
///
/// # Errors
///
/// See [`blit_region`].
pub fn blit_all(canvas_id: &str, controller: &MaskCanvasController) -> Result<(), RasterError> {
    match controller.surface_dimensions() {
        Some(dims) => blit_region(canvas_id, controller, DirtyRect::full(dims)),
        None => Ok(()),
    }
}

/// Intersect `rect` with a `width` x `height` surface.
///
/// `ImageData` dimensions must match the pixel buffer exactly, so the
/// rectangle handed to the browser has to be the clamped one.
fn clamp_to(rect: DirtyRect, width: u32, height: u32) -> DirtyRect {
    let x = rect.x.min(width);
    let y = rect.y.min(height);
    DirtyRect {
        x,
        y,
        width: rect.x.saturating_add(rect.width).min(width) - x,
        height: rect.y.saturating_add(rect.height).min(height) - y,
    }
}

fn context_2d(canvas_id: &str) -> Result<CanvasRenderingContext2d, RasterError> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| RasterError::JsError("no document".into()))?;
    let canvas = document
        .get_element_by_id(canvas_id)
        .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        .ok_or_else(|| RasterError::CanvasNotFound(canvas_id.to_owned()))?;
    canvas
        .get_context("2d")?
        .ok_or_else(|| RasterError::JsError("2d context unavailable".into()))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|e| RasterError::JsError(format!("failed to cast context: {e:?}")))
}
