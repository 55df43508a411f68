//! Constructors for box nodes, computing the aggregate geometry of groups and decorations.
//!
//! Layout producers build trees with these: leaves with [`char_box`] and [`strut`],
//! then groups with [`hbox`] / [`vbox`] (or a [`GroupBuilder`] when children come one at a time)
//! and decorations with [`decor`].

use std::sync::Arc;

use super::{BoxTree, BoxNode, BoxKind, BoxId, Glyph, Group, Orientation, Decor, Decoration};
use crate::dimensions::{Unit, Internal};
use crate::font::{FontFace, GlyphId};


/// A glyph leaf with the given metrics.
pub fn char_box(glyph: Glyph, width: f64, height: f64, depth: f64) -> BoxNode {
    BoxNode {
        width:  Unit::new(width),
        height: Unit::new(height),
        depth:  Unit::new(depth),
        shift:  Unit::ZERO,
        kind:   BoxKind::Char(glyph),
    }
}

/// An invisible spacer.
pub fn strut(width: f64, height: f64, depth: f64) -> BoxNode {
    BoxNode {
        width:  Unit::new(width),
        height: Unit::new(height),
        depth:  Unit::new(depth),
        shift:  Unit::ZERO,
        kind:   BoxKind::Strut,
    }
}

impl Glyph {
    /// A glyph without a registered face. Surfaces draw it with their own text layout.
    pub fn new(ch: char, size: f64) -> Self {
        Self {
            id:   GlyphId::default(),
            ch,
            size: Unit::new(size),
            font: None,
        }
    }

    /// A glyph of a registered face. The glyph index is looked up in the face's cmap.
    pub fn from_face(face: Arc<FontFace>, ch: char, size: f64) -> Self {
        let id = face.glyph_index(ch).unwrap_or_default();
        Self {
            id,
            ch,
            size: Unit::new(size),
            font: Some(face),
        }
    }
}

impl BoxNode {
    /// Sets the shift of the box.
    pub fn shifted(mut self, shift: f64) -> Self {
        self.shift = Unit::new(shift);
        self
    }
}


/// Accumulates children of a group before it is built in a tree.
pub struct GroupBuilder {
    orientation: Orientation,
    shift: Unit<Internal>,
    children: Vec<BoxId>,
}

impl GroupBuilder {
    /// Builder for a horizontal group
    pub fn horizontal() -> Self {
        Self { orientation: Orientation::Horizontal, shift: Unit::ZERO, children: Vec::new() }
    }

    /// Builder for a vertical group
    pub fn vertical() -> Self {
        Self { orientation: Orientation::Vertical, shift: Unit::ZERO, children: Vec::new() }
    }

    /// Appends a child.
    pub fn add_node(&mut self, child: BoxId) -> &mut Self {
        self.children.push(child);
        self
    }

    /// Sets the shift of the group itself.
    pub fn set_offset(&mut self, shift: f64) -> &mut Self {
        self.shift = Unit::new(shift);
        self
    }

    /// Moves the group into `tree` and returns its id.
    pub fn build(self, tree: &mut BoxTree) -> BoxId {
        let group = tree.push(BoxNode::new(BoxKind::Group(Group {
            orientation: self.orientation,
            children: Vec::with_capacity(self.children.len()),
        })));
        for child in self.children {
            tree.add(group, child);
        }
        tree.node_mut(group).shift = self.shift;
        group
    }
}

/// Builds a horizontal group of `children` in `tree`.
pub fn hbox(tree: &mut BoxTree, children: impl IntoIterator<Item = BoxId>) -> BoxId {
    let mut builder = GroupBuilder::horizontal();
    for child in children {
        builder.add_node(child);
    }
    builder.build(tree)
}

/// Builds a vertical group of `children` in `tree`: the first child's baseline is the group's baseline.
pub fn vbox(tree: &mut BoxTree, children: impl IntoIterator<Item = BoxId>) -> BoxId {
    let mut builder = GroupBuilder::vertical();
    for child in children {
        builder.add_node(child);
    }
    builder.build(tree)
}

/// Builds a decoration around `base`.
///
/// Each rule is `thickness` thick and separated from the base by `thickness`.
pub fn decor(tree: &mut BoxTree, decoration: Decoration, thickness: f64, base: BoxId) -> BoxId {
    let t = Unit::<Internal>::new(thickness);
    let (width, height, depth) = {
        let b = tree.node(base);
        (b.width, b.height, b.depth)
    };
    let (width, height, depth) = match decoration {
        Decoration::Underline => (width, height, depth + t.scale(2.)),
        Decoration::Overline  => (width, height + t.scale(2.), depth),
        Decoration::Frame     => (width + t.scale(4.), height + t.scale(2.), depth + t.scale(2.)),
    };
    tree.push(BoxNode {
        width,
        height,
        depth,
        shift: Unit::ZERO,
        kind: BoxKind::Decor(Decor { decoration, thickness: t, base }),
    })
}
