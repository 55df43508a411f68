//! Extraction of the metrics of key characters: glyph leaves reachable from the root through groups only.

use super::{BoxTree, BoxKind, BoxId};
use crate::dimensions::{Unit, Internal};

/// Heights and depths of key characters, in paint order. Both lists have the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharMetrics {
    /// ascent of each glyph
    pub heights: Vec<Unit<Internal>>,
    /// descent of each glyph, paired with `heights`
    pub depths:  Vec<Unit<Internal>>,
}

impl CharMetrics {
    /// Number of glyphs found
    pub fn len(&self) -> usize {
        self.heights.len()
    }

    /// No glyph found?
    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }
}

/// Collects `(height, depth)` of every glyph leaf with a strictly positive height.
///
/// Only groups are descended into: glyphs under a decoration or behind a debug annotation are not reached.
pub fn key_char_metrics(tree: &BoxTree) -> CharMetrics {
    let mut metrics = CharMetrics::default();
    if let Some(root) = tree.root() {
        collect(tree, root, &mut metrics);
    }
    trace!("found {} key characters", metrics.len());
    metrics
}

fn collect(tree: &BoxTree, id: BoxId, metrics: &mut CharMetrics) {
    let node = tree.node(id);
    match &node.kind {
        BoxKind::Char(_) => {
            if node.height > Unit::ZERO {
                metrics.heights.push(node.height);
                metrics.depths.push(node.depth);
            }
        }
        BoxKind::Group(group) => {
            for &child in &group.children {
                collect(tree, child, metrics);
            }
        }
        BoxKind::Strut | BoxKind::Decor(_) | BoxKind::Debug(_) => (),
    }
}
