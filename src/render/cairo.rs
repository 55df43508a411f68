//! SVG output through a cairo SVG surface writing to memory.

use cairo::{Context, SvgSurface};

use super::{Cursor, OutputSurface, Role, Surface};
use crate::boxes::Glyph;
use crate::color::RGBA;
use crate::error::SurfaceError;

pub struct SvgOutput {
    context : Context,
    surface : SvgSurface,
    current_color : RGBA,
    use_path : bool,
    error : Option<String>,
}

impl SvgOutput {
    /// Creates an SVG surface of `width` x `height` pixels whose document is kept in memory.
    pub fn new(width: i32, height: i32, use_path: bool) -> Result<Self, SurfaceError> {
        let creation = |reason: String| SurfaceError::Creation { width, height, reason };
        let surface = SvgSurface::for_stream(f64::from(width), f64::from(height), Vec::<u8>::new())
            .map_err(|e| creation(e.to_string()))?;
        let context = Context::new(&surface)
            .map_err(|e| creation(e.to_string()))?;
        context.set_source_rgba(0., 0., 0., 1.);
        Ok(Self {
            context,
            surface,
            current_color: RGBA::BLACK,
            use_path,
            error: None,
        })
    }

    fn set_current_color(&mut self) {
        let (r, g, b, a) = self.current_color.to_unit_floats();
        self.context.set_source_rgba(r, g, b, a);
    }

    // Cairo errors are sticky on the context, only the first one is kept.
    fn check(&mut self, result: Result<(), cairo::Error>) {
        if let Err(e) = result {
            if self.error.is_none() {
                warn!("cairo error while drawing: {}", e);
                self.error = Some(e.to_string());
            }
        }
    }

    fn fill_outline(&mut self, pos: Cursor, glyph: &Glyph) -> bool {
        use ttf_parser::OutlineBuilder;

        let face = match &glyph.font {
            Some(face) => face,
            None => return false,
        };

        struct Builder<'a> {
            context : &'a Context,
            start   : (f64, f64),
            current : (f64, f64),
        }

        impl<'a> OutlineBuilder for Builder<'a> {
            fn move_to(&mut self, x: f32, y: f32) {
                self.start = (x.into(), y.into());
                self.current = self.start;
                self.context.move_to(x.into(), y.into());
            }

            fn line_to(&mut self, x: f32, y: f32) {
                self.current = (x.into(), y.into());
                self.context.line_to(x.into(), y.into());
            }

            // cairo only knows cubic curves
            fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
                let end = (x.into(), y.into());
                let (c1, c2) = super::quad_to_cubic(self.current, (x1.into(), y1.into()), end);
                self.context.curve_to(c1.0, c1.1, c2.0, c2.1, end.0, end.1);
                self.current = end;
            }

            fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
                self.current = (x.into(), y.into());
                self.context.curve_to(x1.into(), y1.into(), x2.into(), y2.into(), x.into(), y.into(),)
            }

            fn close(&mut self) {
                self.current = self.start;
                self.context.close_path();
            }
        }

        let size = glyph.size.to_unitless();
        let matrix = face.font_matrix();
        let context = self.context.clone();
        let saved = context.save();
        self.check(saved);
        context.translate(pos.x, pos.y);
        context.scale(size, -size);
        context.scale(matrix.sx.into(), matrix.sy.into());
        context.set_fill_rule(cairo::FillRule::Winding);
        context.new_path();

        let mut builder = Builder { context: &context, start: (0., 0.), current: (0., 0.) };
        let found = face.outline(glyph.id, &mut builder);
        let filled = context.fill();
        self.check(filled);
        let restored = context.restore();
        self.check(restored);
        found
    }

    fn show_text(&mut self, pos: Cursor, glyph: &Glyph) {
        let context = self.context.clone();
        if let Some(face) = &glyph.font {
            context.select_font_face(face.family(), cairo::FontSlant::Normal, cairo::FontWeight::Normal);
        }
        context.set_font_size(glyph.size.to_unitless());
        context.move_to(pos.x, pos.y);
        let shown = context.show_text(&glyph.ch.to_string());
        self.check(shown);
    }
}

impl Surface for SvgOutput {
    fn translate(&mut self, dx: f64, dy: f64) {
        self.context.translate(dx, dy);
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.context.scale(sx, sy);
    }

    fn color(&self) -> RGBA {
        self.current_color
    }

    fn set_color(&mut self, color: RGBA) {
        self.current_color = color;
        self.set_current_color();
    }

    fn glyph(&mut self, pos: Cursor, glyph: &Glyph) {
        if self.use_path && self.fill_outline(pos, glyph) {
            return;
        }
        self.show_text(pos, glyph);
    }

    fn rule(&mut self, pos: Cursor, width: f64, height: f64) {
        self.context.rectangle(pos.x, pos.y, width, height);
        let filled = self.context.fill();
        self.check(filled);
    }

    fn bbox(&mut self, pos: Cursor, width: f64, height: f64, role: Role) {
        match role {
            Role::Glyph => self.context.set_source_rgb(0., 0.785, 0.),
            Role::VBox  => self.context.set_source_rgb(0.785, 0., 0.),
            Role::HBox  => self.context.set_source_rgb(0., 0., 0.785),
            Role::Decor => self.context.set_source_rgb(0.785, 0., 0.785),
            Role::Strut => self.context.set_source_rgb(0.5, 0.5, 0.5),
        }
        self.context.set_line_width(1.0);
        self.context.rectangle(pos.x, pos.y, width, height);
        let stroked = self.context.stroke();
        self.check(stroked);
        self.set_current_color();
    }
}

impl OutputSurface for SvgOutput {
    fn finish(self) -> Result<Vec<u8>, SurfaceError> {
        let SvgOutput { context, surface, error, .. } = self;
        drop(context);
        if let Some(e) = error {
            return Err(SurfaceError::Finish(e));
        }
        surface.flush();
        let stream = surface.finish_output_stream()
            .map_err(|e| SurfaceError::Finish(e.error.to_string()))?;
        stream.downcast::<Vec<u8>>()
            .map(|bytes| *bytes)
            .map_err(|_| SurfaceError::Finish("unexpected stream type".to_string()))
    }
}
