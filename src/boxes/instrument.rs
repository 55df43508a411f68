//! Debug instrumentation of a box tree.
//!
//! Instrumenting a tree overlays annotations on its boxes without changing what is laid out:
//! every group gets, after its original children, a negative strut bringing the paint cursor back to
//! the group's origin, followed by one entry per original child. That entry is the child itself for
//! spaces, a [`BoxKind::Debug`] annotation for children accepted by the filter, and a placeholder strut
//! of the same size otherwise. None of these additions update the group's geometry.

use super::{BoxTree, BoxNode, BoxKind, BoxId, Orientation, Group};
use crate::dimensions::Unit;

/// Debug options of a render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Annotate the tree at all
    pub enabled: bool,
    /// Only annotate glyph leaves, instead of every box which is not a space
    pub show_only_glyph_leaves: bool,
}

impl DebugConfig {
    /// Should `node` be annotated?
    pub fn accepts(&self, node: &BoxNode) -> bool {
        if self.show_only_glyph_leaves {
            node.is_char()
        } else {
            !node.is_space()
        }
    }
}

/// Instruments `tree` for debugging, if `config` asks for it.
///
/// The root is made a group if it is not one already, by wrapping it in a horizontal group,
/// then every group reachable from it is instrumented.
pub fn instrument(tree: &mut BoxTree, config: &DebugConfig) {
    if !config.enabled {
        return;
    }
    let root = match tree.root() {
        Some(root) => root,
        None => return,
    };
    let root = wrap(tree, root);
    tree.set_root(root);
    debug!("instrumenting box tree of {} nodes", tree.len());
    build_debug(tree, None, root, config);
}

/// Returns `id` if it is a group, or a new horizontal group holding a copy of `id` otherwise.
///
/// The group takes the exact footprint of the node, which may have a negative depth that
/// `BoxTree::add` would clamp. Roots and decoration bases are painted without their shift,
/// so the copy inside the group gets none either.
fn wrap(tree: &mut BoxTree, id: BoxId) -> BoxId {
    let node = tree.node(id);
    if node.is_group() {
        return id;
    }
    let unshifted = BoxNode { shift: Unit::ZERO, ..node.clone() };
    let group = BoxNode {
        kind: BoxKind::Group(Group {
            orientation: Orientation::Horizontal,
            children: Vec::new(),
        }),
        ..same_footprint(node)
    };
    let child = tree.push(unshifted);
    let group = tree.push(group);
    tree.add_only(group, child);
    group
}

fn build_debug(tree: &mut BoxTree, parent: Option<BoxId>, id: BoxId, config: &DebugConfig) {
    if let Some(parent) = parent {
        let node = tree.node(id);
        let entry = if node.is_space() {
            id
        } else if config.accepts(node) {
            let annotation = BoxNode {
                kind: BoxKind::Debug(id),
                ..same_footprint(node)
            };
            tree.push(annotation)
        } else {
            let placeholder = same_footprint(node);
            tree.push(placeholder)
        };
        tree.add_only(parent, entry);
    }

    let node = tree.node(id);
    match node.kind {
        BoxKind::Group(_) => {
            let kern = BoxNode {
                width:  -node.width,
                height: -node.height,
                depth:  -node.depth,
                shift:  -node.shift,
                kind:   BoxKind::Strut,
            };
            let children = tree.children(id);
            let kern = tree.push(kern);
            tree.add_only(id, kern);
            for child in children {
                build_debug(tree, Some(id), child, config);
            }
        }
        BoxKind::Decor(ref decor) => {
            let base = decor.base;
            let wrapped = wrap(tree, base);
            if let BoxKind::Decor(decor) = &mut tree.node_mut(id).kind {
                decor.base = wrapped;
            }
            build_debug(tree, None, wrapped, config);
        }
        BoxKind::Char(_) | BoxKind::Strut | BoxKind::Debug(_) => (),
    }
}

fn same_footprint(node: &BoxNode) -> BoxNode {
    BoxNode {
        width:  node.width,
        height: node.height,
        depth:  node.depth,
        shift:  node.shift,
        kind:   BoxKind::Strut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxes::builders::*;
    use crate::boxes::Glyph;

    const ON : DebugConfig = DebugConfig { enabled: true, show_only_glyph_leaves: false };

    fn sample() -> BoxTree {
        let mut tree = BoxTree::new();
        let x = tree.push(char_box(Glyph::new('x', 10.), 5., 4., 0.));
        let space = tree.push(strut(2., 0., 0.));
        let y = tree.push(char_box(Glyph::new('y', 10.), 5., 4., 2.));
        let root = hbox(&mut tree, [x, space, y]);
        tree.set_root(root);
        tree
    }

    #[test]
    fn disabled_is_a_no_op() {
        let mut tree = sample();
        let before = tree.len();
        instrument(&mut tree, &DebugConfig::default());
        assert_eq!(tree.len(), before);
    }

    #[test]
    fn group_gets_kern_and_annotations() {
        let mut tree = sample();
        let root = tree.root().unwrap();
        let original = tree.children(root);
        instrument(&mut tree, &ON);

        assert_eq!(tree.root(), Some(root));
        let children = tree.children(root);
        assert_eq!(children.len(), 2 * original.len() + 1);
        assert_eq!(&children[..3], &original[..]);

        let kern = tree.node(children[3]);
        assert!(kern.is_space());
        assert_eq!(kern.width.to_unitless(), -12.);
        assert_eq!(kern.height.to_unitless(), -4.);
        assert_eq!(kern.depth.to_unitless(), -2.);

        assert!(matches!(tree.node(children[4]).kind, BoxKind::Debug(id) if id == original[0]));
        assert_eq!(children[5], original[1]);
        assert!(matches!(tree.node(children[6]).kind, BoxKind::Debug(id) if id == original[2]));
        assert_eq!(tree.node(root).width.to_unitless(), 12.);
    }

    #[test]
    fn leaf_root_keeps_its_footprint() {
        let mut tree = BoxTree::new();
        let minus = tree.push(char_box(Glyph::new('-', 10.), 6., 3., -1.).shifted(2.));
        tree.set_root(minus);
        instrument(&mut tree, &ON);

        let root = tree.root().unwrap();
        assert_ne!(root, minus);
        let node = tree.node(root);
        assert!(node.is_group());
        assert_eq!((node.width.to_unitless(), node.height.to_unitless(), node.depth.to_unitless()), (6., 3., -1.));

        // roots are painted without their shift, and so is the copy inside the wrapper
        let inner = tree.children(root)[0];
        let copy = tree.node(inner);
        assert!(copy.is_char());
        assert!(copy.shift.is_zero());
        assert_eq!((copy.height.to_unitless(), copy.depth.to_unitless()), (3., -1.));
        assert!(matches!(tree.node(tree.children(root)[2]).kind, BoxKind::Debug(id) if id == inner));
    }

    #[test]
    fn glyph_only_filter_uses_placeholders() {
        let mut tree = BoxTree::new();
        let x = tree.push(char_box(Glyph::new('x', 10.), 5., 4., 1.));
        let inner = hbox(&mut tree, [x]);
        let root = hbox(&mut tree, [inner]);
        tree.set_root(root);
        instrument(&mut tree, &DebugConfig { enabled: true, show_only_glyph_leaves: true });

        let children = tree.children(root);
        let placeholder = tree.node(children[2]);
        assert!(matches!(placeholder.kind, BoxKind::Strut));
        assert_eq!(placeholder.width.to_unitless(), 5.);

        let inner_children = tree.children(inner);
        assert!(matches!(tree.node(inner_children[2]).kind, BoxKind::Debug(id) if id == x));
    }

    #[test]
    fn decor_base_is_promoted_to_group() {
        let mut tree = BoxTree::new();
        let x = tree.push(char_box(Glyph::new('x', 10.), 5., 4., 1.));
        let under = decor(&mut tree, crate::boxes::Decoration::Underline, 0.5, x);
        tree.set_root(under);
        instrument(&mut tree, &ON);

        let base = match &tree.node(under).kind {
            BoxKind::Decor(decor) => decor.base,
            other => panic!("expected decor, got {:?}", other),
        };
        assert_ne!(base, x);
        let copy = tree.children(base)[0];
        assert!(tree.node(copy).is_char());
        assert!(matches!(tree.node(tree.children(base)[2]).kind, BoxKind::Debug(id) if id == copy));
    }

    #[test]
    fn decor_base_with_negative_depth_keeps_its_footprint() {
        let mut tree = BoxTree::new();
        let minus = tree.push(char_box(Glyph::new('-', 10.), 6., 3., -1.));
        let under = decor(&mut tree, crate::boxes::Decoration::Underline, 0.5, minus);
        let root = hbox(&mut tree, [under]);
        tree.set_root(root);
        let before = tree.node(root).clone();
        instrument(&mut tree, &ON);

        let base = match &tree.node(under).kind {
            BoxKind::Decor(decor) => decor.base,
            other => panic!("expected decor, got {:?}", other),
        };
        let base = tree.node(base);
        assert_eq!((base.height.to_unitless(), base.depth.to_unitless()), (3., -1.));
        let after = tree.node(root);
        assert_eq!((after.width, after.height, after.depth), (before.width, before.height, before.depth));
    }
}
