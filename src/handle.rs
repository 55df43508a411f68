//! The render handle: one laid-out formula, ready to be measured and drawn at any text size.

use crate::boxes::{self, BoxTree, CharMetrics};
use crate::color::RGBA;
use crate::config::Settings;
use crate::dimensions::{Unit, Internal, Px};
use crate::dimensions::units::FixedScale;
use crate::render::{Cursor, Renderer, Surface};
use crate::report::RenderMetrics;


/// A laid-out formula.
///
/// The geometry of the box tree is fixed at construction; only the scale at which it is measured
/// and drawn changes with [`Render::set_text_size`].
#[derive(Debug)]
pub struct Render {
    tree: BoxTree,
    text_size: f64,
    reference_text_size: f64,
    fixed_scale: Unit<FixedScale>,
    foreground: RGBA,
    is_split: bool,
}

impl Render {
    /// Takes ownership of `tree`, instrumenting it first if `settings.debug` asks for it.
    ///
    /// A tree without root is accepted and measures zero in every direction.
    /// Ids of `tree` are trusted: trees from an engine go through [`BoxTree::validate`] first.
    pub fn new(mut tree: BoxTree, text_size: f64, is_split: bool, settings: &Settings) -> Self {
        boxes::instrument(&mut tree, &settings.debug);
        let reference_text_size = settings.reference_text_size;
        Self {
            tree,
            text_size,
            reference_text_size,
            fixed_scale: fixed_scale(text_size, reference_text_size),
            foreground: RGBA::TRANSPARENT,
            is_split,
        }
    }

    /// The box tree drawn, instrumented or not
    pub fn tree(&self) -> &BoxTree {
        &self.tree
    }

    /// Current text size
    pub fn text_size(&self) -> f64 {
        self.text_size
    }

    /// Pixels per internal unit at the current text size
    pub fn fixed_scale(&self) -> Unit<FixedScale> {
        self.fixed_scale
    }

    /// Changes the text size. The tree is not laid out again: only the scale changes.
    pub fn set_text_size(&mut self, text_size: f64) {
        self.text_size = text_size;
        self.fixed_scale = fixed_scale(text_size, self.reference_text_size);
    }

    /// Color to draw with. A transparent color means black.
    pub fn set_foreground(&mut self, color: RGBA) {
        self.foreground = color;
    }

    /// Color set with [`Render::set_foreground`], possibly transparent
    pub fn foreground(&self) -> RGBA {
        self.foreground
    }

    /// Whether the formula was broken into several lines
    pub fn is_split(&self) -> bool {
        self.is_split
    }

    fn root_extent(&self) -> (Unit<Internal>, Unit<Internal>, Unit<Internal>) {
        match self.tree.root_node() {
            Some(root) => (root.width, root.height, root.depth),
            None => (Unit::ZERO, Unit::ZERO, Unit::ZERO),
        }
    }

    fn to_px(&self, length: Unit<Internal>) -> Unit<Px> {
        length * self.fixed_scale
    }

    /// Width in pixels
    pub fn width(&self) -> i32 {
        let (width, _, _) = self.root_extent();
        self.to_px(width).round_px()
    }

    /// Total height (ascent + depth) in pixels
    pub fn height(&self) -> i32 {
        let (_, height, depth) = self.root_extent();
        self.to_px(height + depth).round_px()
    }

    /// Depth (below baseline) in pixels
    pub fn depth(&self) -> i32 {
        let (_, _, depth) = self.root_extent();
        self.to_px(depth).round_px()
    }

    /// Ascent (above baseline) in pixels
    pub fn ascent(&self) -> i32 {
        let (_, height, _) = self.root_extent();
        self.to_px(height).round_px()
    }

    /// Position of the baseline as a fraction of the total height, from the top.
    /// `None` when the formula has no vertical extent.
    pub fn baseline(&self) -> Option<f64> {
        let (_, height, depth) = self.root_extent();
        let total = height + depth;
        if total.is_zero() {
            return None;
        }
        Some((height / total).as_unitless())
    }

    /// Ascent of the root in internal units, the reference for converting glyph heights to pixels.
    ///
    /// This is *not* the total height: depth is excluded.
    pub fn box_tree_height(&self) -> Unit<Internal> {
        let (_, height, _) = self.root_extent();
        height
    }

    /// Heights and depths of key characters, in internal units
    pub fn key_char_metrics(&self) -> CharMetrics {
        boxes::key_char_metrics(&self.tree)
    }

    /// Pixel dimensions at the current text size
    pub fn metrics(&self) -> RenderMetrics {
        RenderMetrics {
            width: self.width(),
            height: self.height(),
            depth: self.depth(),
            ascent: self.ascent(),
        }
    }

    /// Draws the formula with the top-left corner of its bounding box at `(x, y)`.
    ///
    /// The surface's color and transform are left as they were found.
    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S, x: f64, y: f64) {
        let root = match self.tree.root() {
            Some(root) => root,
            None => return,
        };
        let scale = self.fixed_scale.to_unitless();
        if !scale.is_normal() {
            debug!("not drawing at text size {}: scale {} cannot be undone", self.text_size, scale);
            return;
        }
        let color = if self.foreground.is_transparent() { RGBA::BLACK } else { self.foreground };

        let mut state = SurfaceState::enter(surface, color, x, y, scale);
        let ascent = self.tree.node(root).height.to_unitless();
        Renderer::new(&self.tree).render(state.surface(), Cursor { x: 0., y: ascent }, root);
    }
}

fn fixed_scale(text_size: f64, reference_text_size: f64) -> Unit<FixedScale> {
    Unit::<Px>::new(text_size) / Unit::<Internal>::new(reference_text_size)
}

/// Color and transform changes made to a surface for drawing, undone in reverse order on drop.
struct SurfaceState<'s, S: Surface + ?Sized> {
    surface: &'s mut S,
    old_color: RGBA,
    x: f64,
    y: f64,
    scale: f64,
}

impl<'s, S: Surface + ?Sized> SurfaceState<'s, S> {
    fn enter(surface: &'s mut S, color: RGBA, x: f64, y: f64, scale: f64) -> Self {
        let old_color = surface.color();
        surface.set_color(color);
        surface.translate(x, y);
        surface.scale(scale, scale);
        Self { surface, old_color, x, y, scale }
    }

    fn surface(&mut self) -> &mut S {
        &mut *self.surface
    }
}

impl<'s, S: Surface + ?Sized> Drop for SurfaceState<'s, S> {
    fn drop(&mut self) {
        self.surface.scale(self.scale.recip(), self.scale.recip());
        self.surface.translate(-self.x, -self.y);
        self.surface.set_color(self.old_color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxes::builders::*;
    use crate::boxes::{DebugConfig, Glyph};
    use crate::render::record::{DrawCmd, RecordingSurface, Transform};

    fn single_glyph() -> BoxTree {
        let mut tree = BoxTree::new();
        let x = tree.push(char_box(Glyph::new('x', 10.), 6., 10., 2.));
        let root = hbox(&mut tree, [x]);
        tree.set_root(root);
        tree
    }

    #[test]
    fn dimensions_scale_with_text_size() {
        let render = Render::new(single_glyph(), 20., false, &Settings::default());
        assert_eq!(render.fixed_scale().to_unitless(), 2.);
        assert_eq!(render.width(), 12);
        assert_eq!(render.height(), 24);
        assert_eq!(render.depth(), 4);
        assert_eq!(render.ascent(), 20);
        assert_eq!(render.baseline(), Some(10. / 12.));
        assert_eq!(render.box_tree_height().to_unitless(), 10.);
    }

    #[test]
    fn set_text_size_only_changes_scale() {
        let mut render = Render::new(single_glyph(), 20., true, &Settings::default());
        render.set_text_size(5.);
        assert_eq!(render.text_size(), 5.);
        assert_eq!(render.width(), 3);
        assert_eq!(render.height(), 6);
        assert_eq!(render.box_tree_height().to_unitless(), 10.);
        assert!(render.is_split());
    }

    #[test]
    fn empty_tree_measures_zero() {
        let render = Render::new(BoxTree::new(), 20., false, &Settings::default());
        assert_eq!((render.width(), render.height(), render.depth()), (0, 0, 0));
        assert_eq!(render.baseline(), None);
        assert!(render.key_char_metrics().is_empty());
    }

    #[test]
    fn draw_restores_surface() {
        let mut render = Render::new(single_glyph(), 20., false, &Settings::default());
        render.set_foreground(RGBA(0xff, 0, 0, 0xff));
        let mut surface = RecordingSurface::new(render.width(), render.height());
        surface.set_color(RGBA(0, 0xff, 0, 0xff));
        render.draw(&mut surface, 3., 4.);

        assert_eq!(surface.color(), RGBA(0, 0xff, 0, 0xff));
        assert_eq!(surface.transform(), Transform::default());
        assert_eq!(surface.commands(), &[DrawCmd::Glyph {
            pos: (3., 24.),
            glyph_id: 0,
            ch: 'x',
            size: 20.,
            color: RGBA(0xff, 0, 0, 0xff),
        }]);
    }

    #[test]
    fn transparent_foreground_draws_black() {
        let render = Render::new(single_glyph(), 10., false, &Settings::default());
        let mut surface = RecordingSurface::new(render.width(), render.height());
        render.draw(&mut surface, 0., 0.);
        assert!(matches!(surface.commands()[0], DrawCmd::Glyph { color: RGBA::BLACK, .. }));
    }

    #[test]
    fn zero_text_size_draws_nothing() {
        let render = Render::new(single_glyph(), 0., false, &Settings::default());
        let mut surface = RecordingSurface::new(0, 0);
        render.draw(&mut surface, 0., 0.);
        assert!(surface.commands().is_empty());
        assert_eq!(surface.transform(), Transform::default());
    }

    #[test]
    fn debug_keeps_dimensions() {
        let plain = Render::new(single_glyph(), 20., false, &Settings::default());
        let settings = Settings {
            debug: DebugConfig { enabled: true, show_only_glyph_leaves: false },
            ..Settings::default()
        };
        let debug = Render::new(single_glyph(), 20., false, &settings);
        assert_eq!(plain.metrics(), debug.metrics());
        assert_eq!(plain.baseline(), debug.baseline());
        assert!(debug.tree().len() > plain.tree().len());

        let mut surface = RecordingSurface::new(debug.width(), debug.height());
        debug.draw(&mut surface, 0., 0.);
        assert!(surface.commands().iter().any(|cmd| matches!(cmd, DrawCmd::BBox { .. })));
    }
}
