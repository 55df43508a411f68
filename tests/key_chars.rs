use rexbox::boxes::builders::{char_box, decor, hbox, strut};
use rexbox::boxes::{BoxTree, Decoration, Glyph};
use rexbox::config::Settings;
use rexbox::report::KeyCharReport;
use rexbox::Render;

mod common;
use common::{debug_settings, init_logger};

fn single_glyph() -> BoxTree {
    let mut tree = BoxTree::new();
    let x = tree.push(char_box(Glyph::new('x', 10.), 6., 10., 2.));
    let root = hbox(&mut tree, [x]);
    tree.set_root(root);
    tree
}

#[test]
fn heights_in_pixels() {
    init_logger();
    let render = Render::new(single_glyph(), 20., false, &Settings::default());
    assert_eq!(render.height(), 24);

    // 10 internal units of ascent for 24 px of total height
    let report = KeyCharReport::from_render(&render);
    assert_eq!(report.box_tree_height, 10.);
    assert_eq!(report.key_char_count, 1);
    assert!((report.key_char_heights[0] - 24.).abs() < 1e-9);
    assert_eq!(report.max_char_height, report.key_char_heights[0]);
    assert_eq!(report.min_char_height, report.key_char_heights[0]);
}

#[test]
fn same_report_with_debug() {
    let plain = Render::new(single_glyph(), 20., false, &Settings::default());
    let debug = Render::new(single_glyph(), 20., false, &debug_settings(false));
    assert_eq!(KeyCharReport::from_render(&plain), KeyCharReport::from_render(&debug));
}

#[test]
fn spaces_and_flat_glyphs_are_skipped() {
    let mut tree = BoxTree::new();
    let a = tree.push(char_box(Glyph::new('a', 10.), 5., 5., 0.));
    let space = tree.push(strut(3., 0., 0.));
    let minus = tree.push(char_box(Glyph::new('-', 10.), 5., 0., 0.));
    let root = hbox(&mut tree, [a, space, minus]);
    tree.set_root(root);

    let render = Render::new(tree, 10., false, &Settings::default());
    let report = KeyCharReport::from_render(&render);
    assert_eq!(report.key_char_count, 1);
    assert_eq!(report.key_char_heights, vec![5.]);
}

#[test]
fn decorated_glyphs_are_not_reached() {
    let mut tree = BoxTree::new();
    let a = tree.push(char_box(Glyph::new('a', 10.), 5., 5., 0.));
    let underlined = decor(&mut tree, Decoration::Underline, 0.5, a);
    let root = hbox(&mut tree, [underlined]);
    tree.set_root(root);

    let render = Render::new(tree, 10., false, &Settings::default());
    assert_eq!(KeyCharReport::from_render(&render).key_char_count, 0);
}

#[test]
fn empty_report_json() {
    let render = Render::new(BoxTree::new(), 20., false, &Settings::default());
    let json = String::from_utf8(KeyCharReport::from_render(&render).to_json().unwrap()).unwrap();
    insta::assert_snapshot!(json, @r###"{"key_char_heights":[],"key_char_count":0,"average_char_height":0.0,"max_char_height":0.0,"min_char_height":0.0,"box_tree_height":0.0}"###);
}
