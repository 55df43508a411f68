//! The formula layout producer: turns formula source into a box tree.
//!
//! Parsing TeX and typesetting it is not done by this crate. A [`FormulaEngine`] is installed at the
//! boundary (cf [`Boundary::install_engine`](crate::capi::Boundary::install_engine)) and every
//! parse-and-render request is delegated to it.

use crate::boxes::BoxTree;
use crate::color::RGBA;
use crate::error::LayoutResult;
use crate::font::FontRegistry;


/// TeX styles, in the order used by the numeric style values of the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize)]
pub enum TexStyle {
    /// $$...$$ formulas
    Display,
    CrampedDisplay,
    /// $...$ formulas
    Text,
    CrampedText,
    /// first level of sub/superscripts
    Script,
    CrampedScript,
    /// second level of sub/superscripts and beyond
    ScriptScript,
    CrampedScriptScript,
}

impl TexStyle {
    /// All styles, indexed by their numeric value
    pub const ALL : [TexStyle; 8] = [
        TexStyle::Display,
        TexStyle::CrampedDisplay,
        TexStyle::Text,
        TexStyle::CrampedText,
        TexStyle::Script,
        TexStyle::CrampedScript,
        TexStyle::ScriptScript,
        TexStyle::CrampedScriptScript,
    ];

    /// Style with the given numeric value, if any
    pub fn from_index(index: u32) -> Option<TexStyle> {
        Self::ALL.get(index as usize).copied()
    }

    /// Resolves the pair of arguments the boundary receives: an override flag and a numeric style.
    /// An out-of-range style means no override.
    pub fn override_from(enabled: bool, index: u32) -> Option<TexStyle> {
        if !enabled {
            return None;
        }
        let style = Self::from_index(index);
        if style.is_none() {
            warn!("ignoring unknown TeX style {}", index);
        }
        style
    }
}


/// Everything the layout engine is asked to honor
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutRequest<'a> {
    /// formula source
    pub tex: &'a str,
    /// available width, in pixels at `text_size`
    pub width: i32,
    /// text size, in pixels
    pub text_size: f64,
    /// space between lines, in pixels
    pub line_space: f64,
    /// default color of the formula
    pub foreground: RGBA,
    /// stretch the formula to `width`
    pub fill_width: bool,
    /// style to force, instead of the one implied by the formula
    pub style_override: Option<TexStyle>,
}

/// A laid-out formula
#[derive(Debug, Clone, Default)]
pub struct Formula {
    /// the geometry
    pub tree: BoxTree,
    /// the formula was broken into several lines to fit the available width
    pub is_split: bool,
}

/// The seam behind which the TeX parser and typesetter live.
///
/// Box trees are expected in [`Internal`](crate::dimensions::Internal) units, laid out for the
/// reference text size of the settings in effect.
pub trait FormulaEngine : Send + Sync {
    /// Parses and lays out `request.tex` with the registered fonts.
    fn layout(&self, request: &LayoutRequest<'_>, fonts: &FontRegistry) -> LayoutResult<Formula>;
}

impl<F> FormulaEngine for F
where
    F: Fn(&LayoutRequest<'_>, &FontRegistry) -> LayoutResult<Formula> + Send + Sync,
{
    fn layout(&self, request: &LayoutRequest<'_>, fonts: &FontRegistry) -> LayoutResult<Formula> {
        self(request, fonts)
    }
}
