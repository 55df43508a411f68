//! PNG output through a tiny-skia pixmap.
//!
//! tiny-skia has no text layout of its own: glyphs are only drawn from their outlines,
//! so glyphs without a face (or all glyphs, when outlines are disabled) are skipped.

use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use super::{Cursor, OutputSurface, Role, Surface};
use crate::boxes::Glyph;
use crate::color::RGBA;
use crate::error::SurfaceError;

pub struct PngOutput {
    /// A canvas to draw onto
    pixmap: Pixmap,
    /// Current transform, from the coordinates given to the surface to pixmap coordinates
    transform: Transform,
    color: RGBA,
    use_path: bool,
}

impl PngOutput {
    /// Creates a transparent pixmap of `width` x `height` pixels.
    pub fn new(width: i32, height: i32, use_path: bool) -> Result<Self, SurfaceError> {
        let pixmap = u32::try_from(width).ok()
            .zip(u32::try_from(height).ok())
            .and_then(|(w, h)| Pixmap::new(w, h))
            .ok_or_else(|| SurfaceError::Creation {
                width,
                height,
                reason: "pixmap dimensions must be positive".to_string(),
            })?;
        Ok(Self {
            pixmap,
            transform: Transform::identity(),
            color: RGBA::BLACK,
            use_path,
        })
    }

    fn paint(&self) -> Paint<'static> {
        let RGBA(r, g, b, a) = self.color;
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = true;
        paint
    }
}

impl Surface for PngOutput {
    fn translate(&mut self, dx: f64, dy: f64) {
        self.transform = self.transform.pre_translate(dx as f32, dy as f32);
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.transform = self.transform.pre_scale(sx as f32, sy as f32);
    }

    fn color(&self) -> RGBA {
        self.color
    }

    fn set_color(&mut self, color: RGBA) {
        self.color = color;
    }

    fn glyph(&mut self, pos: Cursor, glyph: &Glyph) {
        // Make the tiny_skia path builder implement the necessary trait to receive the outline
        struct Builder {
            open_path: PathBuilder,
        }

        impl ttf_parser::OutlineBuilder for Builder {
            fn move_to(&mut self, x: f32, y: f32) {
                self.open_path.move_to(x, y);
            }
            fn line_to(&mut self, x: f32, y: f32) {
                self.open_path.line_to(x, y);
            }
            fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
                self.open_path.quad_to(x1, y1, x, y);
            }
            fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
                self.open_path.cubic_to(x1, y1, x2, y2, x, y);
            }
            fn close(&mut self) {
                self.open_path.close();
            }
        }

        let face = match (&glyph.font, self.use_path) {
            (Some(face), true) => face,
            _ => {
                debug!("skipping glyph '{}': no outline to draw", glyph.ch);
                return;
            }
        };

        let size = glyph.size.to_unitless() as f32;
        let ttf_parser::cff::Matrix { sx, ky, kx, sy, tx, ty } = face.font_matrix();
        let transform = Transform::from_row(sx, ky, kx, sy, tx, ty)
            // font units to em, Y flipped
            .post_scale(size, -size)
            .post_translate(pos.x as f32, pos.y as f32)
            .post_concat(self.transform);

        let mut builder = Builder { open_path: PathBuilder::new() };
        face.outline(glyph.id, &mut builder);
        if let Some(path) = builder.open_path.finish() {
            let paint = self.paint();
            self.pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
        }
    }

    fn rule(&mut self, pos: Cursor, width: f64, height: f64) {
        if let Some(rect) = Rect::from_xywh(pos.x as f32, pos.y as f32, width as f32, height as f32) {
            let paint = self.paint();
            self.pixmap.fill_rect(rect, &paint, self.transform, None);
        }
    }

    fn bbox(&mut self, pos: Cursor, width: f64, height: f64, role: Role) {
        let (r, g, b) = match role {
            Role::Glyph => (0, 200, 0),
            Role::HBox  => (0, 0, 200),
            Role::VBox  => (200, 0, 0),
            Role::Decor => (200, 0, 200),
            Role::Strut => (128, 128, 128),
        };
        let rect = match Rect::from_xywh(pos.x as f32, pos.y as f32, width as f32, height as f32) {
            Some(rect) => rect,
            None => return,
        };
        let path = PathBuilder::from_rect(rect);
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, 0xff);
        let stroke = Stroke { width: 0.1, ..Stroke::default() };
        self.pixmap.stroke_path(&path, &paint, &stroke, self.transform, None);
    }
}

impl OutputSurface for PngOutput {
    fn finish(self) -> Result<Vec<u8>, SurfaceError> {
        self.pixmap.encode_png().map_err(|e| SurfaceError::Finish(e.to_string()))
    }
}
