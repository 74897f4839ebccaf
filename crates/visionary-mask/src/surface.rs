//! Raster surfaces backed by `tiny-skia` pixmaps.
//!
//! A [`Surface`] is a fixed-size RGBA buffer that strokes are
//! accumulated into destructively. Pixels are stored premultiplied, as
//! `tiny-skia` requires; accessors return straight (non-premultiplied)
//! RGBA, which is what `ImageData` and the `image` crate expect.

use tiny_skia::{
    BlendMode, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform,
};

use crate::types::{Dimensions, DirtyRect, MaskPoint};

/// Paint used for one surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ink {
    /// Straight RGBA color.
    pub rgba: [u8; 4],
    /// `true` to replace pixels under the brush instead of blending over
    /// them. Overlapping strokes then never build up opacity.
    pub replace: bool,
    /// Anti-aliased edges.
    pub anti_alias: bool,
}

impl Ink {
    /// Opaque white without anti-aliasing: every mask pixel is either
    /// fully painted or untouched.
    pub const MASK: Self = Self {
        rgba: [255, 255, 255, 255],
        replace: false,
        anti_alias: false,
    };

    /// Translucent overlay color.
    #[must_use]
    pub const fn tint(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            rgba: [r, g, b, a],
            replace: true,
            anti_alias: true,
        }
    }

    fn paint(self) -> Paint<'static> {
        let [r, g, b, a] = self.rgba;
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = self.anti_alias;
        paint.blend_mode = if self.replace {
            BlendMode::Source
        } else {
            BlendMode::SourceOver
        };
        paint
    }
}

/// A fixed-size raster surface.
#[derive(Debug, Clone)]
pub struct Surface {
    pixmap: Pixmap,
}

impl Surface {
    /// Allocate a fully transparent surface.
    ///
    /// Returns `None` for zero-sized or unallocatable dimensions.
    #[must_use]
    pub fn new(dimensions: Dimensions) -> Option<Self> {
        Pixmap::new(dimensions.width, dimensions.height).map(|pixmap| Self { pixmap })
    }

    /// Backing pixel size.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.pixmap.width(), self.pixmap.height())
    }

    /// Erase everything.
    pub fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    /// Draw a round-capped line of `width` from `from` to `to`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn draw_segment(
        &mut self,
        from: MaskPoint,
        to: MaskPoint,
        width: f32,
        ink: Ink,
    ) -> DirtyRect {
        if from == to {
            return self.draw_dot(from, width, ink);
        }

        let mut pb = PathBuilder::new();
        pb.move_to(from.x as f32, from.y as f32);
        pb.line_to(to.x as f32, to.y as f32);
        let Some(path) = pb.finish() else {
            return DirtyRect::default();
        };

        let stroke = Stroke {
            width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &ink.paint(), &stroke, Transform::identity(), None);

        DirtyRect::around_segment(from, to, f64::from(width) / 2.0, self.dimensions())
    }

    /// Draw the mark a zero-length round-capped segment leaves: a disc of
    /// diameter `width` centered on `at`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn draw_dot(&mut self, at: MaskPoint, width: f32, ink: Ink) -> DirtyRect {
        let radius = (width / 2.0).max(0.5);
        let Some(path) = PathBuilder::from_circle(at.x as f32, at.y as f32, radius) else {
            return DirtyRect::default();
        };
        self.pixmap.fill_path(
            &path,
            &ink.paint(),
            FillRule::Winding,
            Transform::identity(),
            None,
        );

        DirtyRect::around_segment(at, at, f64::from(radius), self.dimensions())
    }

    /// Straight RGBA value of one pixel.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.pixmap.pixel(x, y).map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
    }

    /// Straight RGBA bytes for `rect`, row-major, 4 bytes per pixel.
    ///
    /// `rect` is clamped to the surface; an empty rectangle yields an
    /// empty buffer.
    #[must_use]
    pub fn rgba_region(&self, rect: DirtyRect) -> Vec<u8> {
        let dims = self.dimensions();
        let x0 = rect.x.min(dims.width);
        let y0 = rect.y.min(dims.height);
        let x1 = rect.x.saturating_add(rect.width).min(dims.width);
        let y1 = rect.y.saturating_add(rect.height).min(dims.height);

        let pixels = self.pixmap.pixels();
        let stride = dims.width as usize;
        let mut out = Vec::with_capacity(((x1 - x0) * (y1 - y0) * 4) as usize);
        for y in y0..y1 {
            let row = y as usize * stride;
            for p in &pixels[row + x0 as usize..row + x1 as usize] {
                let c = p.demultiply();
                out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
            }
        }
        out
    }

    /// Returns `true` if any pixel has non-zero alpha.
    #[must_use]
    pub fn has_content(&self) -> bool {
        self.pixmap.pixels().iter().any(|p| p.alpha() != 0)
    }

    /// Returns `true` if any pixel inside `rect` has non-zero alpha.
    #[must_use]
    pub fn has_content_in(&self, rect: DirtyRect) -> bool {
        self.rgba_region(rect).chunks_exact(4).any(|px| px[3] != 0)
    }

    /// The underlying pixmap, for compositing.
    #[must_use]
    pub const fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn surface(w: u32, h: u32) -> Surface {
        Surface::new(Dimensions::new(w, h)).unwrap()
    }

    #[test]
    fn new_surface_is_transparent() {
        let s = surface(8, 6);
        assert_eq!(s.dimensions(), Dimensions::new(8, 6));
        assert!(!s.has_content());
        assert_eq!(s.pixel(3, 3), Some([0, 0, 0, 0]));
    }

    #[test]
    fn zero_size_surface_is_not_allocated() {
        assert!(Surface::new(Dimensions::new(0, 0)).is_none());
        assert!(Surface::new(Dimensions::new(10, 0)).is_none());
    }

    #[test]
    fn mask_segment_paints_opaque_white_along_the_line() {
        let mut s = surface(60, 40);
        let dirty = s.draw_segment(
            MaskPoint::new(10.0, 20.0),
            MaskPoint::new(50.0, 20.0),
            6.0,
            Ink::MASK,
        );
        for x in 10..=50 {
            assert_eq!(s.pixel(x, 20), Some([255, 255, 255, 255]), "x = {x}");
        }
        assert_eq!(s.pixel(30, 5), Some([0, 0, 0, 0]));
        assert!(dirty.x <= 7 && dirty.x + dirty.width >= 53);
        assert!(dirty.y <= 17 && dirty.y + dirty.height >= 23);
    }

    #[test]
    fn mask_ink_never_produces_partial_alpha() {
        let mut s = surface(40, 40);
        s.draw_segment(
            MaskPoint::new(3.3, 7.7),
            MaskPoint::new(36.1, 29.4),
            9.0,
            Ink::MASK,
        );
        for px in s.pixmap().pixels() {
            assert!(px.alpha() == 0 || px.alpha() == 255);
        }
    }

    #[test]
    fn dot_paints_its_center() {
        let mut s = surface(20, 20);
        s.draw_dot(MaskPoint::new(10.0, 10.0), 5.0, Ink::MASK);
        assert_eq!(s.pixel(10, 10), Some([255, 255, 255, 255]));
        assert_eq!(s.pixel(0, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn zero_length_segment_draws_a_dot() {
        let mut s = surface(20, 20);
        let p = MaskPoint::new(7.0, 9.0);
        let dirty = s.draw_segment(p, p, 8.0, Ink::MASK);
        assert!(!dirty.is_empty());
        assert_eq!(s.pixel(7, 9), Some([255, 255, 255, 255]));
    }

    #[test]
    fn overlapping_tint_does_not_accumulate() {
        let mut s = surface(40, 20);
        let ink = Ink::tint(255, 0, 64, 115);
        s.draw_segment(MaskPoint::new(5.0, 10.0), MaskPoint::new(30.0, 10.0), 8.0, ink);
        s.draw_segment(MaskPoint::new(30.0, 10.0), MaskPoint::new(5.0, 10.0), 8.0, ink);
        let [r, g, _, a] = s.pixel(18, 10).unwrap();
        assert_eq!(a, 115);
        assert!(r >= 250 && g <= 2, "unexpected tint color r={r} g={g}");
    }

    #[test]
    fn content_check_is_limited_to_the_rect() {
        let mut s = surface(30, 30);
        let dirty = s.draw_dot(MaskPoint::new(5.0, 5.0), 4.0, Ink::MASK);
        assert!(s.has_content_in(dirty));
        let far = DirtyRect {
            x: 20,
            y: 20,
            width: 5,
            height: 5,
        };
        assert!(!s.has_content_in(far));
        assert!(!s.has_content_in(DirtyRect::default()));
    }

    #[test]
    fn clear_erases_strokes() {
        let mut s = surface(20, 20);
        s.draw_dot(MaskPoint::new(10.0, 10.0), 10.0, Ink::MASK);
        assert!(s.has_content());
        s.clear();
        assert!(!s.has_content());
    }

    #[test]
    fn rgba_region_extracts_straight_pixels() {
        let mut s = surface(10, 10);
        s.draw_dot(MaskPoint::new(5.0, 5.0), 4.0, Ink::MASK);
        let rect = DirtyRect {
            x: 4,
            y: 4,
            width: 3,
            height: 2,
        };
        let bytes = s.rgba_region(rect);
        assert_eq!(bytes.len(), 3 * 2 * 4);
        // Pixel (5, 5) is row 1, column 1 of the region.
        let off = (3 + 1) * 4;
        assert_eq!(&bytes[off..off + 4], &[255, 255, 255, 255]);
    }

    #[test]
    fn rgba_region_clamps_out_of_bounds_rect() {
        let s = surface(4, 4);
        let bytes = s.rgba_region(DirtyRect {
            x: 2,
            y: 2,
            width: 10,
            height: 10,
        });
        assert_eq!(bytes.len(), 2 * 2 * 4);
        assert!(s.rgba_region(DirtyRect::default()).is_empty());
    }
}
