//! The box tree: the geometry of a laid-out formula.
//!
//! A formula, once laid out, is a tree of boxes. Every box has a width, a height (distance from the baseline
//! to its top), a depth (distance from the baseline to its bottom, positive below the baseline) and a shift
//! (displacement relative to its parent's reference line, orthogonal to the parent's direction).
//! All of these are in [`Internal`] units.
//!
//! Boxes come in five kinds, cf [`BoxKind`]:
//!
//!  - glyph leaves ([`BoxKind::Char`]),
//!  - invisible spacers ([`BoxKind::Strut`]),
//!  - horizontal and vertical groups of boxes ([`BoxKind::Group`]),
//!  - decorations around exactly one base box ([`BoxKind::Decor`]),
//!  - debug annotations ([`BoxKind::Debug`]), only ever added by [`instrument`](crate::boxes::instrument).
//!
//! Nodes live in an arena ([`BoxTree`]) and refer to one another by [`BoxId`]. A debug annotation refers to the
//! box it annotates without taking it away from its parent, so the same node may be reachable twice.

use std::sync::Arc;

use crate::dimensions::{Unit, Internal};
use crate::error::{LayoutError, LayoutResult};
use crate::font::{FontFace, GlyphId};

pub mod builders;
pub mod instrument;
pub mod metrics;

pub use self::instrument::{instrument, DebugConfig};
pub use self::metrics::{key_char_metrics, CharMetrics};


/// Index of a node in a [`BoxTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoxId(usize);

impl BoxId {
    /// Position of the node in the arena
    pub fn index(self) -> usize {
        self.0
    }
}


/// A node of the box tree, with its geometry.
#[derive(Debug, Clone)]
pub struct BoxNode {
    /// horizontal advance
    pub width:  Unit<Internal>,
    /// extent above the baseline
    pub height: Unit<Internal>,
    /// extent below the baseline
    pub depth:  Unit<Internal>,
    /// displacement from the parent's reference line
    pub shift:  Unit<Internal>,
    /// what the box is
    pub kind:   BoxKind,
}

/// The five kinds of boxes
#[derive(Debug, Clone)]
pub enum BoxKind {
    /// A laid-out glyph. Terminal.
    Char(Glyph),
    /// Invisible spacer. Terminal.
    Strut,
    /// Ordered children, in paint order.
    Group(Group),
    /// A decoration drawn around exactly one base box.
    Decor(Decor),
    /// Visual annotation of another box. Terminal: the annotated box is not owned.
    Debug(BoxId),
}

/// A glyph as laid out by the formula layout producer
#[derive(Debug, Clone)]
pub struct Glyph {
    /// index of the glyph in its face
    pub id:   GlyphId,
    /// the character the glyph was chosen for
    pub ch:   char,
    /// font size, i.e. the length of one em
    pub size: Unit<Internal>,
    /// the face the glyph comes from, if the producer used a registered face
    pub font: Option<Arc<FontFace>>,
}

/// Direction along which a group lays out its children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// children side by side, on a common baseline
    Horizontal,
    /// children stacked top to bottom
    Vertical,
}

/// Children of a group box
#[derive(Debug, Clone)]
pub struct Group {
    /// direction of layout
    pub orientation: Orientation,
    /// children, in paint order
    pub children: Vec<BoxId>,
}

/// The kinds of decorations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoration {
    /// rule below the base
    Underline,
    /// rule above the base
    Overline,
    /// rectangle around the base
    Frame,
}

/// A decoration around a base box
#[derive(Debug, Clone)]
pub struct Decor {
    /// which decoration
    pub decoration: Decoration,
    /// thickness of the rules drawn
    pub thickness: Unit<Internal>,
    /// the decorated box
    pub base: BoxId,
}


impl BoxNode {
    /// A box with the given kind and no extent.
    pub fn new(kind: BoxKind) -> Self {
        Self {
            width:  Unit::ZERO,
            height: Unit::ZERO,
            depth:  Unit::ZERO,
            shift:  Unit::ZERO,
            kind,
        }
    }

    /// Whitespace boxes are never annotated. Every strut is whitespace.
    pub fn is_space(&self) -> bool {
        matches!(self.kind, BoxKind::Strut)
    }

    /// Is it a glyph leaf?
    pub fn is_char(&self) -> bool {
        matches!(self.kind, BoxKind::Char(_))
    }

    /// Is it a group (horizontal or vertical)?
    pub fn is_group(&self) -> bool {
        matches!(self.kind, BoxKind::Group(_))
    }

    /// Total vertical extent
    pub fn vlen(&self) -> Unit<Internal> {
        self.height + self.depth
    }
}


/// An arena of boxes with an optional root.
///
/// A tree without a root is the empty formula: it has no extent and paints nothing.
#[derive(Debug, Clone, Default)]
pub struct BoxTree {
    nodes: Vec<BoxNode>,
    root:  Option<BoxId>,
}

impl BoxTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `node` into the arena. The node is not attached anywhere yet.
    pub fn push(&mut self, node: BoxNode) -> BoxId {
        self.nodes.push(node);
        BoxId(self.nodes.len() - 1)
    }

    /// The node with the given id
    ///
    /// # Panics
    /// If the id does not come from this tree.
    pub fn node(&self, id: BoxId) -> &BoxNode {
        &self.nodes[id.0]
    }

    /// The node with the given id
    ///
    /// # Panics
    /// If the id does not come from this tree.
    pub fn node_mut(&mut self, id: BoxId) -> &mut BoxNode {
        &mut self.nodes[id.0]
    }

    /// The node with the given id, if any.
    pub fn get(&self, id: BoxId) -> Option<&BoxNode> {
        self.nodes.get(id.0)
    }

    /// The root box, if any
    pub fn root(&self) -> Option<BoxId> {
        self.root
    }

    /// Makes `id` the root of the tree.
    pub fn set_root(&mut self, id: BoxId) {
        self.root = Some(id);
    }

    /// The root node, if any
    pub fn root_node(&self) -> Option<&BoxNode> {
        self.root.map(|id| self.node(id))
    }

    /// Number of nodes in the arena, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Is the arena empty?
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Snapshot of the children of a group, independent of later mutation of the group.
    /// Empty for anything but a group.
    pub fn children(&self, id: BoxId) -> Vec<BoxId> {
        match &self.node(id).kind {
            BoxKind::Group(group) => group.children.clone(),
            _ => Vec::new(),
        }
    }

    /// Appends `child` to group `parent` and updates the group's aggregate geometry.
    /// Does nothing if `parent` is not a group.
    pub fn add(&mut self, parent: BoxId, child: BoxId) {
        let (width, height, depth, shift) = {
            let c = self.node(child);
            (c.width, c.height, c.depth, c.shift)
        };
        let first = self.children(parent).is_empty();
        let node = self.node_mut(parent);
        let orientation = match &mut node.kind {
            BoxKind::Group(group) => {
                group.children.push(child);
                group.orientation
            }
            _ => {
                warn!("cannot add a child to non-group box {:?}", parent);
                return;
            }
        };

        match orientation {
            Orientation::Horizontal => {
                node.width += width;
                node.height = Unit::max(node.height, height - shift);
                node.depth  = Unit::max(node.depth, depth + shift);
            }
            Orientation::Vertical => {
                node.width = Unit::max(node.width, width + shift);
                if first {
                    node.height = height;
                    node.depth  = depth;
                } else {
                    node.depth += height + depth;
                }
            }
        }
    }

    /// Appends `child` to group `parent` without touching the group's geometry.
    /// Does nothing if `parent` is not a group.
    pub fn add_only(&mut self, parent: BoxId, child: BoxId) {
        match &mut self.node_mut(parent).kind {
            BoxKind::Group(group) => group.children.push(child),
            _ => warn!("cannot add a child to non-group box {:?}", parent),
        }
    }

    /// Checks that every id reachable from the root belongs to this arena, annotation targets
    /// included, and that no box contains itself. A box may be reached more than once.
    ///
    /// Trees built by an external engine are checked with this before any other traversal,
    /// since [`BoxTree::node`] and [`BoxTree::walk`] trust their ids.
    pub fn validate(&self) -> LayoutResult<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark { New, Open, Done }

        let root = match self.root {
            Some(root) => root,
            None => return Ok(()),
        };
        let dangling = |id: BoxId| LayoutError::MalformedTree(
            format!("box {} is out of an arena of {} boxes", id.0, self.nodes.len())
        );

        let mut marks = vec![Mark::New; self.nodes.len()];
        let mut stack = vec![(root, false)];
        while let Some((id, leaving)) = stack.pop() {
            let node = self.get(id).ok_or_else(|| dangling(id))?;
            if leaving {
                marks[id.0] = Mark::Done;
                continue;
            }
            match marks[id.0] {
                Mark::Done => continue,
                Mark::Open => return Err(LayoutError::MalformedTree(format!("box {} contains itself", id.0))),
                Mark::New => marks[id.0] = Mark::Open,
            }
            stack.push((id, true));
            match &node.kind {
                BoxKind::Group(group) => stack.extend(group.children.iter().rev().map(|&child| (child, false))),
                BoxKind::Decor(decor) => stack.push((decor.base, false)),
                BoxKind::Debug(target) => {
                    self.get(*target).ok_or_else(|| dangling(*target))?;
                }
                BoxKind::Char(_) | BoxKind::Strut => (),
            }
        }
        Ok(())
    }

    /// Nodes reachable from the root, in paint order. A node reachable twice is listed twice.
    /// Annotated boxes are not reached through their annotation.
    pub fn walk(&self) -> Vec<BoxId> {
        let mut out = Vec::new();
        if let Some(root) = self.root {
            self.walk_from(root, &mut out);
        }
        out
    }

    fn walk_from(&self, id: BoxId, out: &mut Vec<BoxId>) {
        out.push(id);
        match &self.node(id).kind {
            BoxKind::Group(group) => {
                for &child in &group.children {
                    self.walk_from(child, out);
                }
            }
            BoxKind::Decor(decor) => self.walk_from(decor.base, out),
            BoxKind::Char(_) | BoxKind::Strut | BoxKind::Debug(_) => (),
        }
    }
}
