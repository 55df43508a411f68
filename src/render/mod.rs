//! Draw a box tree onto a [`Surface`], such as a list of recorded commands, an SVG document or a PNG image.
//!
//! The [`Surface`] trait represents all graphical operations that are needed to paint a formula:
//!
//!   - moving and scaling the origin: [`Surface::translate`] and [`Surface::scale`]
//!   - setting colors: [`Surface::color`] and [`Surface::set_color`]
//!   - drawing a filled rectangle: [`Surface::rule`]
//!   - drawing a glyph: [`Surface::glyph`]
//!   - outlining an annotated box: [`Surface::bbox`] (optional)
//!
//! Surfaces which accumulate output implement [`OutputSurface`]. The following are available:
//!
//!  - [`record::RecordingSurface`] : always available, serializes the paint commands as JSON
//!  - Cairo SVG surface : `cairo-renderer`
//!  - tiny-skia PNG surface : `tinyskia-renderer`
//!
//! ## Caveat on coordinate systems
//!
//! The top is oriented along -Y. So in particular, the Y coordinate of the position of a superscript is less than the Y coordinate of its base.
//! Glyph outlines in font files are given with the opposite convention: the top of the glyph has the highest Y coordinate.
//! Surfaces filling glyph outlines must flip the Y-axis.

use crate::boxes::{BoxTree, BoxKind, BoxId, Glyph, Orientation, Decor, Decoration};
use crate::color::RGBA;
use crate::error::SurfaceError;
use crate::handle::Render;

pub mod record;
#[cfg(feature="cairo-renderer")]
pub mod cairo;
#[cfg(feature="tinyskia-renderer")]
pub mod tinyskia;


/// Position of the cursor in space, in the current coordinates of the surface.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Cursor {
    /// x-coordinate
    pub x: f64,
    /// y-coordinate (NB: `cursor1.y` < `cursor2.y`  means `cursor1` is above `cursor2` on the screen)
    pub y: f64,
}

impl Cursor {
    /// Adds `dx` and `dy` to the x- and y- coordinates resp. of the cursor
    pub fn translate(self, dx: f64, dy: f64) -> Cursor {
        Cursor {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Moves cursor by `dx` in the direction +X
    pub fn right(self, dx: f64) -> Cursor {
        Cursor {
            x: self.x + dx,
            y: self.y,
        }
    }
    /// Moves cursor by `dy` in the direction -Y
    pub fn up(self, dy: f64) -> Cursor {
        Cursor {
            x: self.x,
            y: self.y - dy,
        }
    }
    /// Moves cursor by `dy` in the direction +Y
    pub fn down(self, dy: f64) -> Cursor {
        Cursor {
            x: self.x,
            y: self.y + dy,
        }
    }
}


/// The type of box enclosed by a debug rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
pub enum Role {
    /// glyph
    Glyph,
    /// horizontal group
    HBox,
    /// vertical group
    VBox,
    /// decoration
    Decor,
    /// spacer
    Strut,
}

/// Something glyphs and rules can be painted onto.
///
/// Transformations are cumulative: `translate` and `scale` act on the current coordinates, like in cairo.
pub trait Surface {
    /// Moves the origin by `(dx, dy)` in current coordinates.
    fn translate(&mut self, dx: f64, dy: f64);
    /// Scales current coordinates.
    fn scale(&mut self, sx: f64, sy: f64);
    /// The color used for subsequent painting
    fn color(&self) -> RGBA;
    /// Makes `color` the color used for subsequent painting.
    fn set_color(&mut self, color: RGBA);
    /// Draws `glyph` with its baseline origin at `pos`.
    fn glyph(&mut self, pos: Cursor, glyph: &Glyph);
    /// Draws a filled rectangle whose top-left corner is at `pos`.
    fn rule(&mut self, pos: Cursor, width: f64, height: f64);
    /// Outlines a rectangle whose top-left corner is at `_pos`, enclosing a box of kind `_role`.
    /// Only called for debug annotations. Does nothing by default.
    fn bbox(&mut self, _pos: Cursor, _width: f64, _height: f64, _role: Role) {}
}

/// A surface accumulating output bytes.
pub trait OutputSurface : Surface + Sized {
    /// Flushes the surface and returns everything it produced.
    fn finish(self) -> Result<Vec<u8>, SurfaceError>;
}


/// Paints the boxes of a tree.
pub struct Renderer<'t> {
    tree: &'t BoxTree,
}

impl<'t> Renderer<'t> {
    /// Creates a renderer for `tree`.
    pub fn new(tree: &'t BoxTree) -> Self {
        Self { tree }
    }

    /// Paints node `id` with its baseline origin at `pos`.
    pub fn render<S: Surface + ?Sized>(&self, out: &mut S, pos: Cursor, id: BoxId) {
        self.render_node(out, pos, id);
    }

    fn render_node<S: Surface + ?Sized>(&self, out: &mut S, pos: Cursor, id: BoxId) {
        let node = self.tree.node(id);
        match &node.kind {
            BoxKind::Char(glyph) => out.glyph(pos, glyph),
            BoxKind::Strut => { /* NOOP */ }
            BoxKind::Group(group) => match group.orientation {
                Orientation::Horizontal => self.render_hbox(out, pos, &group.children),
                Orientation::Vertical   => self.render_vbox(out, pos, node.height.to_unitless(), &group.children),
            },
            BoxKind::Decor(decor) => self.render_decor(out, pos, node.width.to_unitless(), node.height.to_unitless(), node.depth.to_unitless(), decor),
            BoxKind::Debug(target) => {
                let height = node.height.to_unitless();
                out.bbox(pos.up(height), node.width.to_unitless(), node.vlen().to_unitless(), self.role(*target));
            }
        }
    }

    fn render_hbox<S: Surface + ?Sized>(&self, out: &mut S, pos: Cursor, children: &[BoxId]) {
        let mut x = pos.x;
        for &child in children {
            let node = self.tree.node(child);
            self.render_node(out, Cursor { x, y: pos.y + node.shift.to_unitless() }, child);
            x += node.width.to_unitless();
        }
    }

    fn render_vbox<S: Surface + ?Sized>(&self, out: &mut S, pos: Cursor, height: f64, children: &[BoxId]) {
        let mut y = pos.y - height;
        for &child in children {
            let node = self.tree.node(child);
            y += node.height.to_unitless();
            self.render_node(out, Cursor { x: pos.x + node.shift.to_unitless(), y }, child);
            y += node.depth.to_unitless();
        }
    }

    fn render_decor<S: Surface + ?Sized>(&self, out: &mut S, pos: Cursor, width: f64, height: f64, depth: f64, decor: &Decor) {
        let t = decor.thickness.to_unitless();
        let base = self.tree.node(decor.base);
        match decor.decoration {
            Decoration::Underline => {
                self.render_node(out, pos, decor.base);
                out.rule(pos.down(base.depth.to_unitless() + t), width, t);
            }
            Decoration::Overline => {
                self.render_node(out, pos, decor.base);
                out.rule(pos.up(base.height.to_unitless() + 2. * t), width, t);
            }
            Decoration::Frame => {
                self.render_node(out, pos.right(2. * t), decor.base);
                let top = pos.up(height);
                let vlen = height + depth;
                out.rule(top, width, t);
                out.rule(pos.down(depth - t), width, t);
                out.rule(top, t, vlen);
                out.rule(top.right(width - t), t, vlen);
            }
        }
    }

    fn role(&self, id: BoxId) -> Role {
        match &self.tree.node(id).kind {
            BoxKind::Char(_) => Role::Glyph,
            BoxKind::Strut => Role::Strut,
            BoxKind::Group(group) => match group.orientation {
                Orientation::Horizontal => Role::HBox,
                Orientation::Vertical   => Role::VBox,
            },
            BoxKind::Decor(_) => Role::Decor,
            BoxKind::Debug(target) => self.role(*target),
        }
    }
}


/// The kinds of bytes a render can be turned into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// JSON list of paint commands
    Commands,
    /// SVG document
    Svg,
    /// PNG image
    Png,
}

/// Whether some surface able to fill glyph outlines is compiled in.
pub const fn has_glyph_path_render() -> bool {
    cfg!(any(feature="cairo-renderer", feature="tinyskia-renderer"))
}

/// Draws `render` onto a new surface of kind `kind` sized to the render's pixel dimensions, and returns its bytes.
///
/// When `use_path` is set, surfaces able to do so fill glyph outlines from the glyph's face.
pub fn draw_to_bytes(render: &Render, kind: OutputKind, use_path: bool) -> Result<Vec<u8>, SurfaceError> {
    let (width, height) = (render.width(), render.height());
    trace!("drawing {:?} output of {}x{} px", kind, width, height);
    match kind {
        OutputKind::Commands => draw_into(render, record::RecordingSurface::new(width, height)),

        #[cfg(feature="cairo-renderer")]
        OutputKind::Svg => draw_into(render, self::cairo::SvgOutput::new(width, height, use_path)?),
        #[cfg(not(feature="cairo-renderer"))]
        OutputKind::Svg => {
            let _ = use_path;
            Err(SurfaceError::Unsupported("SVG"))
        }

        #[cfg(feature="tinyskia-renderer")]
        OutputKind::Png => draw_into(render, self::tinyskia::PngOutput::new(width, height, use_path)?),
        #[cfg(not(feature="tinyskia-renderer"))]
        OutputKind::Png => Err(SurfaceError::Unsupported("PNG")),
    }
}

fn draw_into<S: OutputSurface>(render: &Render, mut surface: S) -> Result<Vec<u8>, SurfaceError> {
    render.draw(&mut surface, 0., 0.);
    let bytes = surface.finish()?;
    if bytes.is_empty() {
        return Err(SurfaceError::EmptyOutput);
    }
    Ok(bytes)
}


/// Control points of the cubic Bézier curve tracing the quadratic one from `from` to `to` with control `ctrl`.
#[cfg_attr(not(feature="cairo-renderer"), allow(dead_code))]
pub(crate) fn quad_to_cubic(from: (f64, f64), ctrl: (f64, f64), to: (f64, f64)) -> ((f64, f64), (f64, f64)) {
    let towards = |p: (f64, f64)| (p.0 + 2. / 3. * (ctrl.0 - p.0), p.1 + 2. / 3. * (ctrl.1 - p.1));
    (towards(from), towards(to))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubic_at(p0: (f64, f64), c1: (f64, f64), c2: (f64, f64), p1: (f64, f64), t: f64) -> (f64, f64) {
        let u = 1. - t;
        let at = |a: f64, b: f64, c: f64, d: f64| u*u*u*a + 3.*u*u*t*b + 3.*u*t*t*c + t*t*t*d;
        (at(p0.0, c1.0, c2.0, p1.0), at(p0.1, c1.1, c2.1, p1.1))
    }

    #[test]
    fn quadratic_curves_become_cubic() {
        let (from, ctrl, to) = ((0., 0.), (3., 6.), (6., 0.));
        let (c1, c2) = quad_to_cubic(from, ctrl, to);
        let close = |a: (f64, f64), b: (f64, f64)| (a.0 - b.0).abs() < 1e-12 && (a.1 - b.1).abs() < 1e-12;
        assert!(close(c1, (2., 4.)), "{:?}", c1);
        assert!(close(c2, (4., 4.)), "{:?}", c2);

        // the quadratic curve peaks at (3, 3), and so must the cubic one
        assert!(close(cubic_at(from, c1, c2, to, 0.5), (3., 3.)));
    }
}
