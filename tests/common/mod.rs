#![allow(dead_code)]

use std::sync::Once;

use rexbox::boxes::builders::{char_box, decor, hbox, strut, vbox};
use rexbox::boxes::{BoxId, BoxTree, Decoration, Glyph};
use rexbox::config::Settings;
use rexbox::dimensions::Unit;
use rexbox::engine::{Formula, LayoutRequest};
use rexbox::error::{LayoutError, LayoutResult};
use rexbox::font::FontRegistry;
use rexbox::render::record::{DrawCmd, RecordingSurface};
use rexbox::{Render, RGBA};

static LOGGER : Once = Once::new();

pub fn init_logger() {
    LOGGER.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Description of a box tree, easier to generate and print than the tree itself.
#[derive(Debug, Clone)]
pub enum Shape {
    Glyph(char, f64, f64, f64),
    Space(f64),
    HBox(Vec<Shape>),
    VBox(Vec<Shape>),
    Underline(Box<Shape>),
    Frame(Box<Shape>),
    Shifted(Box<Shape>, f64),
}

impl Shape {
    pub fn build(&self, tree: &mut BoxTree) -> BoxId {
        match self {
            Shape::Glyph(ch, w, h, d) => tree.push(char_box(Glyph::new(*ch, 10.), *w, *h, *d)),
            Shape::Space(w) => tree.push(strut(*w, 0., 0.)),
            Shape::HBox(children) => {
                let children : Vec<_> = children.iter().map(|c| c.build(tree)).collect();
                hbox(tree, children)
            }
            Shape::VBox(children) => {
                let children : Vec<_> = children.iter().map(|c| c.build(tree)).collect();
                vbox(tree, children)
            }
            Shape::Underline(base) => {
                let base = base.build(tree);
                decor(tree, Decoration::Underline, 0.5, base)
            }
            Shape::Frame(base) => {
                let base = base.build(tree);
                decor(tree, Decoration::Frame, 0.5, base)
            }
            Shape::Shifted(inner, shift) => {
                let id = inner.build(tree);
                tree.node_mut(id).shift = Unit::new(*shift);
                id
            }
        }
    }

    /// A tree whose root is a horizontal group holding this shape.
    pub fn tree(&self) -> BoxTree {
        let mut tree = BoxTree::new();
        let id = self.build(&mut tree);
        let root = hbox(&mut tree, [id]);
        tree.set_root(root);
        tree
    }

    /// A tree whose root is this shape itself.
    pub fn bare_tree(&self) -> BoxTree {
        let mut tree = BoxTree::new();
        let id = self.build(&mut tree);
        tree.set_root(id);
        tree
    }

    /// Either [`Shape::bare_tree`] or [`Shape::tree`].
    pub fn tree_as(&self, bare: bool) -> BoxTree {
        if bare { self.bare_tree() } else { self.tree() }
    }

    pub fn glyph_count(&self) -> usize {
        match self {
            Shape::Glyph(..) => 1,
            Shape::Space(_) => 0,
            Shape::HBox(children) | Shape::VBox(children) => children.iter().map(Shape::glyph_count).sum(),
            Shape::Underline(base) | Shape::Frame(base) | Shape::Shifted(base, _) => base.glyph_count(),
        }
    }
}

/// `x^2 + y`, roughly: a glyph, a raised glyph, a space and a glyph.
pub fn sample_formula() -> Formula {
    let mut tree = BoxTree::new();
    let x = tree.push(char_box(Glyph::new('x', 10.), 6., 5., 0.));
    let two = tree.push(char_box(Glyph::new('2', 7.), 4., 7., 0.).shifted(-4.));
    let space = tree.push(strut(2., 0., 0.));
    let y = tree.push(char_box(Glyph::new('y', 10.), 6., 5., 2.));
    let root = hbox(&mut tree, [x, two, space, y]);
    tree.set_root(root);
    Formula { tree, is_split: false }
}

/// Engine laying out the sample formula, an empty formula for an empty source, and failing on `\fail`.
pub fn sample_engine(request: &LayoutRequest<'_>, _: &FontRegistry) -> LayoutResult<Formula> {
    match request.tex {
        "" => Ok(Formula::default()),
        r"\fail" => Err(LayoutError::Parse(String::from("unknown command \\fail"))),
        _ => Ok(sample_formula()),
    }
}

pub fn request(tex: &str, text_size: f64) -> LayoutRequest<'_> {
    LayoutRequest {
        tex,
        width: 720,
        text_size,
        line_space: text_size / 3.,
        foreground: RGBA::BLACK,
        fill_width: true,
        style_override: None,
    }
}

pub fn debug_settings(show_only_glyph_leaves: bool) -> Settings {
    let mut settings = Settings::default();
    settings.debug.enabled = true;
    settings.debug.show_only_glyph_leaves = show_only_glyph_leaves;
    settings
}

/// Paint commands of `render` drawn at the origin
pub fn commands(render: &Render) -> Vec<DrawCmd> {
    let mut surface = RecordingSurface::new(render.width(), render.height());
    render.draw(&mut surface, 0., 0.);
    surface.into_drawing().commands
}
