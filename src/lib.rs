/*! # Box trees of laid-out math formulas: measuring, drawing, debugging and handing results to C.

This crate sits between a TeX math layout engine and a foreign caller (typically a mobile or web runtime
talking through a C ABI). The layout engine produces a [`BoxTree`](crate::boxes::BoxTree): nested
horizontal and vertical groups of glyphs, struts and decorations, with width, height (above the baseline)
and depth (below the baseline) in internal units. This crate

  - instruments the tree with debug annotations that do not change its geometry, cf [`boxes::instrument`]
  - measures it in pixels at any text size, cf [`Render`]
  - collects the heights of its key characters, cf [`boxes::key_char_metrics`] and [`report::KeyCharReport`]
  - draws it on a [`Surface`](crate::render::Surface): a list of recorded commands, an SVG document or a PNG image
  - hands the resulting bytes over to foreign callers as reference-counted buffers, cf [`buffer::BufferRegistry`]

Trees coming from an engine are checked with [`BoxTree::validate`](crate::boxes::BoxTree::validate) before
anything walks them.

## Basic usage

The layout engine itself is plugged in through the [`FormulaEngine`](crate::engine::FormulaEngine) trait.
Any closure with the right signature will do:

```
use rexbox::boxes::{BoxTree, Glyph, builders::{char_box, hbox}};
use rexbox::engine::{Formula, LayoutRequest};
use rexbox::error::LayoutResult;
use rexbox::font::FontRegistry;
use rexbox::capi::Boundary;

let boundary = Boundary::new();
boundary.install_engine(std::sync::Arc::new(|_: &LayoutRequest<'_>, _: &FontRegistry| -> LayoutResult<Formula> {
    let mut tree = BoxTree::new();
    let x = tree.push(char_box(Glyph::new('x', 10.), 6., 10., 2.));
    let root = hbox(&mut tree, [x]);
    tree.set_root(root);
    Ok(Formula { tree, is_split: false })
}));

let request = LayoutRequest {
    tex: "x",
    width: 720,
    text_size: 20.,
    line_space: 20. / 3.,
    foreground: rexbox::RGBA::BLACK,
    fill_width: true,
    style_override: None,
};
let render = boundary.parse_render(&request).expect("no engine");

// the engine lays out for a reference text size of 10: at 20, everything doubles
assert_eq!(render.width(), 12);
assert_eq!(render.height(), 24);
```

## Drawing

[`Render::draw`] paints the formula with the top-left corner of its bounding box at a given point.
Surfaces producing bytes are selected with [`render::OutputKind`]:

  - commands as JSON: always available
  - SVG: feature `cairo-renderer`
  - PNG: feature `tinyskia-renderer`

SVG documents can be tagged with a resolution and resized to their painted content, cf [`svg::SvgOptions`].
Text which is not drawn from outlines is measured by the host platform through [`text::TextLayout`].

## Debugging layouts

When [`Settings::debug`](crate::config::Settings) is enabled, every render's tree is instrumented on construction:
each box (or only glyphs, cf [`boxes::DebugConfig`]) gets an outline drawn on top of it, tagged with the role of the
box. Dimensions, baseline and key character metrics are the same as without instrumentation.

## C ABI

Functions of the [`capi`] module are exported unmangled with the prefix `rexbox_`. They never unwind:
failures yield null, zero, NaN or `false` and a message on the [`log`](https://docs.rs/log) facade.
*/



#[macro_use]
extern crate serde_derive;



#[macro_use]
extern crate log;

pub mod error;
pub mod dimensions;
pub mod color;
pub mod font;
pub mod text;
pub mod boxes;
pub mod render;
pub mod svg;
pub mod config;
pub mod engine;
pub mod handle;
pub mod report;
pub mod buffer;
pub mod capi;

pub use color::RGBA;
pub use handle::Render;
pub use error::{RenderError, RenderResult};
