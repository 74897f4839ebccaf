//! The mask canvas controller.
//!
//! Owns the source image and two coupled raster surfaces of identical
//! pixel size:
//!
//! - the **display** surface, rendered scaled to fit the viewport and
//!   used only as visual feedback, and
//! - the **mask** surface, hidden and authoritative, which is what gets
//!   exported and uploaded.
//!
//! Every input event carries the display's current rendered size, and
//! the screen-to-mask ratio is recomputed from it on each call. Both
//! surfaces always have the source image's natural size, so the mapping
//! is a pure per-axis scale.

use crate::config::{BrushConfig, Overlay, clamp_brush_width};
use crate::export::{self, MaskExport};
use crate::source::{SourceImage, Upload};
use crate::surface::{Ink, Surface};
use crate::types::{
    Dimensions, DirtyRect, DisplaySize, ExportError, LoadError, MaskPoint, ScaleRatio,
    ScreenPoint, StrokeError,
};

/// The outcome of a successful drawing step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeUpdate {
    /// Where the input landed on the mask surface.
    pub point: MaskPoint,
    /// Display-surface pixels that changed and need repainting.
    pub dirty: DirtyRect,
}

/// One brush path from press to release.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    /// Brush width in effect when the stroke started.
    pub width: f32,
    /// Mapped points, in input order.
    pub points: Vec<MaskPoint>,
}

struct Surfaces {
    display: Surface,
    mask: Surface,
}

impl Surfaces {
    fn allocate(dimensions: Dimensions) -> Option<Self> {
        Some(Self {
            display: Surface::new(dimensions)?,
            mask: Surface::new(dimensions)?,
        })
    }
}

/// Keeps the display and mask surfaces in sync with pointer input and
/// produces the upload-ready mask.
pub struct MaskCanvasController {
    overlay: Overlay,
    brush: BrushConfig,
    source: Option<SourceImage>,
    surfaces: Option<Surfaces>,
    active: Option<Stroke>,
    painted: bool,
}

impl MaskCanvasController {
    /// Create an empty controller.
    #[must_use]
    pub fn new(overlay: Overlay, brush: BrushConfig) -> Self {
        Self {
            overlay,
            brush,
            source: None,
            surfaces: None,
            active: None,
            painted: false,
        }
    }

    /// Decode `upload`, size both surfaces to its natural dimensions, and
    /// start with both surfaces clear.
    ///
    /// Any previous image and mask are discarded first, so a failed load
    /// leaves the controller empty.
    ///
    /// # Errors
    ///
    /// Returns the [`LoadError`] from decoding. The surfaces stay unsized
    /// and every subsequent stroke is rejected until a load succeeds.
    pub fn load_image(&mut self, upload: Upload) -> Result<Dimensions, LoadError> {
        self.reset();

        let source = SourceImage::decode(upload).inspect_err(|e| {
            log::warn!("image load failed: {e}");
        })?;
        let dimensions = source.dimensions();
        self.source = Some(source);

        // Allocation failure is not fatal here: `begin_stroke` retries.
        self.ensure_surfaces();
        log::debug!("loaded {dimensions} image");
        Ok(dimensions)
    }

    /// Drop the image, both surfaces, and any stroke in progress.
    pub fn reset(&mut self) {
        self.source = None;
        self.surfaces = None;
        self.active = None;
        self.painted = false;
    }

    /// Start a stroke at `point`, given the display's current rendered
    /// size.
    ///
    /// A stroke that was never ended (e.g. the pointer-up was lost) is
    /// ended first. The start point is marked immediately so a click
    /// without motion still leaves a visible dot.
    ///
    /// # Errors
    ///
    /// - [`StrokeError::NoImage`] if nothing is loaded.
    /// - [`StrokeError::SurfaceUnavailable`] if the surfaces are unsized
    ///   and cannot be sized from the image now.
    /// - [`StrokeError::DisplayUnsized`] if `display` is zero or not
    ///   finite.
    pub fn begin_stroke(
        &mut self,
        point: ScreenPoint,
        display: DisplaySize,
    ) -> Result<StrokeUpdate, StrokeError> {
        let dimensions = self
            .source
            .as_ref()
            .map(SourceImage::dimensions)
            .ok_or(StrokeError::NoImage)?;
        if !self.ensure_surfaces() {
            log::warn!("stroke rejected: no surfaces for {dimensions} image");
            return Err(StrokeError::SurfaceUnavailable(dimensions));
        }
        let ratio = ScaleRatio::between(dimensions, display).ok_or(StrokeError::DisplayUnsized)?;

        if self.active.is_some() {
            self.end_stroke();
        }

        let at = ratio.apply(point);
        let width = self.brush.width();
        let display_ink = self.display_ink();
        let Some(surfaces) = self.surfaces.as_mut() else {
            return Err(StrokeError::SurfaceUnavailable(dimensions));
        };
        let marked = surfaces.mask.draw_dot(at, width, Ink::MASK);
        let dirty = surfaces.display.draw_dot(at, width, display_ink);
        self.painted = self.painted || surfaces.mask.has_content_in(marked);

        self.active = Some(Stroke {
            width,
            points: vec![at],
        });
        Ok(StrokeUpdate { point: at, dirty })
    }

    /// Extend the current stroke to `point`.
    ///
    /// Returns `None` (and draws nothing) if no stroke is in progress or
    /// the display has no usable size at this moment.
    pub fn extend_stroke(
        &mut self,
        point: ScreenPoint,
        display: DisplaySize,
    ) -> Option<StrokeUpdate> {
        let display_ink = self.display_ink();
        let stroke = self.active.as_mut()?;
        let surfaces = self.surfaces.as_mut()?;
        let ratio = ScaleRatio::between(surfaces.mask.dimensions(), display)?;

        let at = ratio.apply(point);
        let from = stroke.points.last().copied().unwrap_or(at);
        let marked = surfaces.mask.draw_segment(from, at, stroke.width, Ink::MASK);
        let dirty = surfaces
            .display
            .draw_segment(from, at, stroke.width, display_ink);
        stroke.points.push(at);
        self.painted = self.painted || surfaces.mask.has_content_in(marked);

        Some(StrokeUpdate { point: at, dirty })
    }

    /// Finish the current stroke and return it.
    ///
    /// Returns `None` if no stroke was in progress.
    pub fn end_stroke(&mut self) -> Option<Stroke> {
        self.active.take()
    }

    /// Set the brush width for subsequent strokes, clamped to the allowed
    /// range. Returns the width actually applied.
    ///
    /// A stroke in progress keeps the width it started with.
    pub fn set_brush_width(&mut self, px: f32) -> f32 {
        let width = clamp_brush_width(px);
        if (width - px).abs() > f32::EPSILON {
            log::debug!("brush width {px} clamped to {width}");
        }
        self.brush = BrushConfig::new(width);
        width
    }

    /// Erase all strokes from both surfaces. The source image is kept.
    pub fn clear_mask(&mut self) {
        if let Some(surfaces) = self.surfaces.as_mut() {
            surfaces.display.clear();
            surfaces.mask.clear();
        }
        self.active = None;
        self.painted = false;
    }

    /// Composite the mask as white-on-black and encode it as PNG.
    ///
    /// If compositing fails the export degrades to an all-black mask,
    /// flagged by [`MaskExport::fallback`].
    ///
    /// # Errors
    ///
    /// - [`ExportError::NotReady`] if the mask surface is unsized.
    /// - [`ExportError::PngEncode`] if encoding fails.
    pub fn export_mask(&self) -> Result<MaskExport, ExportError> {
        let (Some(source), Some(surfaces)) = (self.source.as_ref(), self.surfaces.as_ref()) else {
            return Err(ExportError::NotReady);
        };
        let export = export::export_mask(&surfaces.mask, source.dimensions())?;
        if export.fallback {
            log::warn!("mask export fell back to all-black");
        }
        Ok(export)
    }

    /// The source image with the display surface drawn over it.
    ///
    /// Returns `None` until an image is loaded and the surfaces are sized.
    #[must_use]
    pub fn preview(&self) -> Option<image::RgbaImage> {
        let source = self.source.as_ref()?;
        let display = self.display_surface()?;
        let decoded = image::load_from_memory(source.bytes())
            .inspect_err(|e| log::warn!("preview: source no longer decodes: {e}"))
            .ok()?;
        export::compose_preview(&decoded.to_rgba8(), display)
    }

    /// The loaded source image, if any.
    #[must_use]
    pub const fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    /// Backing size of both surfaces, or `None` while unsized.
    #[must_use]
    pub fn surface_dimensions(&self) -> Option<Dimensions> {
        self.surfaces.as_ref().map(|s| s.mask.dimensions())
    }

    /// Returns `true` if both surfaces are sized and drawing can start.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.surfaces.is_some()
    }

    /// Returns `true` while a stroke is in progress.
    #[must_use]
    pub const fn is_drawing(&self) -> bool {
        self.active.is_some()
    }

    /// Returns `true` if a stroke has marked at least one mask pixel since
    /// the last clear. Strokes that land entirely off the image do not
    /// count.
    #[must_use]
    pub const fn has_strokes(&self) -> bool {
        self.painted
    }

    /// The stroke in progress, if any.
    #[must_use]
    pub const fn active_stroke(&self) -> Option<&Stroke> {
        self.active.as_ref()
    }

    /// Width that the next stroke will use.
    #[must_use]
    pub const fn brush_width(&self) -> f32 {
        self.brush.width()
    }

    /// How strokes are shown on the display surface.
    #[must_use]
    pub const fn overlay(&self) -> Overlay {
        self.overlay
    }

    /// The visible feedback surface.
    #[must_use]
    pub fn display_surface(&self) -> Option<&Surface> {
        self.surfaces.as_ref().map(|s| &s.display)
    }

    /// The authoritative mask surface.
    #[must_use]
    pub fn mask_surface(&self) -> Option<&Surface> {
        self.surfaces.as_ref().map(|s| &s.mask)
    }

    /// Size the surfaces from the source image if they are not sized yet.
    ///
    /// Returns `true` if surfaces exist afterwards.
    fn ensure_surfaces(&mut self) -> bool {
        if self.surfaces.is_some() {
            return true;
        }
        let Some(dimensions) = self.source.as_ref().map(SourceImage::dimensions) else {
            return false;
        };
        self.surfaces = Surfaces::allocate(dimensions);
        if self.surfaces.is_none() {
            log::warn!("could not allocate {dimensions} drawing surfaces");
        }
        self.surfaces.is_some()
    }

    const fn display_ink(&self) -> Ink {
        match self.overlay {
            Overlay::Tinted { r, g, b, a } => Ink::tint(r, g, b, a),
            Overlay::Mirror => Ink::MASK,
        }
    }
}

impl Default for MaskCanvasController {
    fn default() -> Self {
        Self::new(Overlay::default(), BrushConfig::default())
    }
}

impl std::fmt::Debug for MaskCanvasController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaskCanvasController")
            .field("overlay", &self.overlay)
            .field("brush", &self.brush)
            .field("source", &self.source.as_ref().map(SourceImage::dimensions))
            .field("surfaces", &self.surface_dimensions())
            .field("active", &self.active)
            .field("painted", &self.painted)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::source::tests::png_bytes;

    fn loaded(w: u32, h: u32) -> MaskCanvasController {
        let mut c = MaskCanvasController::default();
        c.load_image(Upload::new(png_bytes(w, h), "in.png")).unwrap();
        c
    }

    fn decode_mask(c: &MaskCanvasController) -> image::GrayImage {
        let export = c.export_mask().unwrap();
        image::load_from_memory(&export.png).unwrap().to_luma8()
    }

    #[test]
    fn load_sizes_both_surfaces_to_natural_size() {
        let c = loaded(400, 300);
        assert_eq!(c.surface_dimensions(), Some(Dimensions::new(400, 300)));
        assert_eq!(c.display_surface().unwrap().dimensions(), Dimensions::new(400, 300));
        assert_eq!(c.mask_surface().unwrap().dimensions(), Dimensions::new(400, 300));
        assert!(!c.has_strokes());
    }

    #[test]
    fn failed_load_leaves_surfaces_unsized_and_rejects_strokes() {
        let mut c = loaded(10, 10);
        let err = c.load_image(Upload::new(Vec::new(), "empty.png")).unwrap_err();
        assert_eq!(err, LoadError::EmptyInput);
        assert!(c.surface_dimensions().is_none());
        assert!(c.source().is_none());

        let result = c.begin_stroke(ScreenPoint::new(1.0, 1.0), DisplaySize::new(10.0, 10.0));
        assert_eq!(result, Err(StrokeError::NoImage));
        assert_eq!(c.export_mask(), Err(ExportError::NotReady));
    }

    #[test]
    fn begin_stroke_maps_through_current_ratio() {
        let mut c = loaded(400, 300);
        let update = c
            .begin_stroke(ScreenPoint::new(100.0, 75.0), DisplaySize::new(200.0, 150.0))
            .unwrap();
        assert_eq!(update.point, MaskPoint::new(200.0, 150.0));
        assert!(c.is_drawing());
    }

    #[test]
    fn extend_draws_segment_on_full_resolution_mask() {
        let mut c = loaded(400, 300);
        let display = DisplaySize::new(200.0, 150.0);
        c.set_brush_width(10.0);
        c.begin_stroke(ScreenPoint::new(100.0, 75.0), display).unwrap();
        let update = c.extend_stroke(ScreenPoint::new(120.0, 75.0), display).unwrap();
        assert_eq!(update.point, MaskPoint::new(240.0, 150.0));
        let stroke = c.end_stroke().unwrap();
        assert_eq!(
            stroke.points,
            vec![MaskPoint::new(200.0, 150.0), MaskPoint::new(240.0, 150.0)]
        );

        let mask = decode_mask(&c);
        assert_eq!(mask.dimensions(), (400, 300));
        for x in 200..=240 {
            assert_eq!(mask.get_pixel(x, 150).0[0], 255, "x = {x}");
        }
        assert_eq!(mask.get_pixel(220, 100).0[0], 0);
        assert_eq!(mask.get_pixel(300, 150).0[0], 0);
    }

    #[test]
    fn ratio_follows_display_resizes_between_events() {
        let mut c = loaded(400, 300);
        c.begin_stroke(ScreenPoint::new(100.0, 75.0), DisplaySize::new(200.0, 150.0))
            .unwrap();
        // Layout reflowed: the element is now rendered at full size.
        let update = c
            .extend_stroke(ScreenPoint::new(100.0, 75.0), DisplaySize::new(400.0, 300.0))
            .unwrap();
        assert_eq!(update.point, MaskPoint::new(100.0, 75.0));
    }

    #[test]
    fn extend_without_stroke_is_noop() {
        let mut c = loaded(50, 50);
        assert!(
            c.extend_stroke(ScreenPoint::new(5.0, 5.0), DisplaySize::new(50.0, 50.0))
                .is_none()
        );
        assert!(!c.has_strokes());
        assert!(c.end_stroke().is_none());
    }

    #[test]
    fn click_without_motion_leaves_visible_dot() {
        let mut c = loaded(100, 100);
        c.begin_stroke(ScreenPoint::new(25.0, 40.0), DisplaySize::new(50.0, 50.0))
            .unwrap();
        let stroke = c.end_stroke().unwrap();
        assert_eq!(stroke.points, vec![MaskPoint::new(50.0, 80.0)]);

        let mask = decode_mask(&c);
        assert_eq!(mask.get_pixel(50, 80).0[0], 255);
    }

    #[test]
    fn dot_off_the_image_paints_nothing() {
        let mut c = loaded(100, 100);
        let display = DisplaySize::new(100.0, 100.0);
        c.begin_stroke(ScreenPoint::new(-60.0, -60.0), display).unwrap();
        c.end_stroke();
        assert!(!c.has_strokes());
        assert!(decode_mask(&c).pixels().all(|p| p.0[0] == 0));

        c.begin_stroke(ScreenPoint::new(-60.0, 50.0), display).unwrap();
        assert!(!c.has_strokes());
        c.extend_stroke(ScreenPoint::new(30.0, 50.0), display).unwrap();
        assert!(c.has_strokes());
    }

    #[test]
    fn unusable_display_size_rejects_stroke() {
        let mut c = loaded(20, 20);
        let result = c.begin_stroke(ScreenPoint::new(1.0, 1.0), DisplaySize::new(0.0, 0.0));
        assert_eq!(result, Err(StrokeError::DisplayUnsized));
        assert!(!c.has_strokes());
    }

    #[test]
    fn clear_mask_exports_fully_black() {
        let mut c = loaded(60, 60);
        let display = DisplaySize::new(60.0, 60.0);
        c.begin_stroke(ScreenPoint::new(10.0, 10.0), display).unwrap();
        c.extend_stroke(ScreenPoint::new(50.0, 50.0), display);
        c.end_stroke();
        assert!(c.has_strokes());

        c.clear_mask();
        assert!(!c.has_strokes());
        assert!(c.source().is_some());
        assert!(decode_mask(&c).pixels().all(|p| p.0[0] == 0));
        assert!(!c.display_surface().unwrap().has_content());
    }

    #[test]
    fn brush_change_applies_to_next_stroke_only() {
        let mut c = loaded(100, 100);
        let display = DisplaySize::new(100.0, 100.0);
        c.set_brush_width(10.0);
        c.begin_stroke(ScreenPoint::new(10.0, 10.0), display).unwrap();
        c.set_brush_width(80.0);
        c.extend_stroke(ScreenPoint::new(20.0, 10.0), display);
        let first = c.end_stroke().unwrap();
        assert!((first.width - 10.0).abs() < f32::EPSILON);

        c.begin_stroke(ScreenPoint::new(60.0, 60.0), display).unwrap();
        let second = c.end_stroke().unwrap();
        assert!((second.width - 80.0).abs() < f32::EPSILON);
    }

    #[test]
    fn brush_width_is_clamped() {
        let mut c = MaskCanvasController::default();
        assert!((c.set_brush_width(1.0) - 5.0).abs() < f32::EPSILON);
        assert!((c.set_brush_width(1000.0) - 100.0).abs() < f32::EPSILON);
        assert!((c.brush_width() - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn export_keeps_source_size_across_brushes_and_strokes() {
        let mut c = loaded(73, 41);
        let display = DisplaySize::new(36.5, 20.5);
        for (i, width) in [5.0_f32, 20.0, 55.5, 100.0].into_iter().enumerate() {
            c.set_brush_width(width);
            #[allow(clippy::cast_precision_loss)]
            let offset = i as f64 * 5.0;
            c.begin_stroke(ScreenPoint::new(offset, 3.0), display).unwrap();
            c.extend_stroke(ScreenPoint::new(30.0, offset + 2.0), display);
            c.end_stroke();
            let export = c.export_mask().unwrap();
            assert_eq!(export.dimensions, Dimensions::new(73, 41));
            assert_eq!(decode_mask(&c).dimensions(), (73, 41));
        }
    }

    #[test]
    fn mirror_overlay_shows_mask_strokes() {
        let mut c = MaskCanvasController::new(Overlay::Mirror, BrushConfig::default());
        c.load_image(Upload::new(png_bytes(30, 30), "in.png")).unwrap();
        c.begin_stroke(ScreenPoint::new(15.0, 15.0), DisplaySize::new(30.0, 30.0))
            .unwrap();
        let display = c.display_surface().unwrap();
        assert_eq!(display.pixel(15, 15), Some([255, 255, 255, 255]));
    }

    #[test]
    fn tinted_overlay_is_translucent_while_mask_is_opaque() {
        let mut c = loaded(30, 30);
        c.begin_stroke(ScreenPoint::new(15.0, 15.0), DisplaySize::new(30.0, 30.0))
            .unwrap();
        let [_, _, _, display_alpha] = c.display_surface().unwrap().pixel(15, 15).unwrap();
        let [_, _, _, mask_alpha] = c.mask_surface().unwrap().pixel(15, 15).unwrap();
        assert_eq!(display_alpha, 115);
        assert_eq!(mask_alpha, 255);
    }

    #[test]
    fn preview_shows_strokes_over_source() {
        let mut c = loaded(30, 30);
        assert_eq!(c.preview().unwrap().get_pixel(15, 15).0, [90, 120, 200, 255]);
        c.begin_stroke(ScreenPoint::new(15.0, 15.0), DisplaySize::new(30.0, 30.0))
            .unwrap();
        let preview = c.preview().unwrap();
        assert_eq!(preview.dimensions(), (30, 30));
        assert_ne!(preview.get_pixel(15, 15).0, [90, 120, 200, 255]);
        assert_eq!(preview.get_pixel(0, 0).0, [90, 120, 200, 255]);
        assert!(MaskCanvasController::default().preview().is_none());
    }

    #[test]
    fn new_load_discards_previous_mask() {
        let mut c = loaded(20, 20);
        c.begin_stroke(ScreenPoint::new(5.0, 5.0), DisplaySize::new(20.0, 20.0))
            .unwrap();
        c.load_image(Upload::new(png_bytes(30, 10), "next.png")).unwrap();
        assert!(!c.has_strokes());
        assert!(!c.is_drawing());
        assert_eq!(c.surface_dimensions(), Some(Dimensions::new(30, 10)));
        assert!(decode_mask(&c).pixels().all(|p| p.0[0] == 0));
    }
}
