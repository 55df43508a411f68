//! The font service: registered font faces, the default math/main families, and glyph outlines.
//!
//! Font data is kept as shared bytes and parsed with `ttf-parser` on demand, since
//! `ttf_parser::Face` borrows its data and is cheap to construct.

use std::sync::Arc;

use crate::error::{FontError, FontResult};
use crate::text::{FontDesc, LaidOutText, TextLayout};


/// Index of a glyph in a font face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(Serialize, Deserialize)]
pub struct GlyphId(pub u16);

impl From<u16> for GlyphId {
    fn from(x: u16) -> Self { Self(x) }
}

impl From<GlyphId> for u16 {
    fn from(gid: GlyphId) -> Self { gid.0 }
}

impl From<GlyphId> for ttf_parser::GlyphId {
    fn from(gid: GlyphId) -> Self { ttf_parser::GlyphId(gid.0) }
}


/// A parsed font face, shared between the registry and the glyphs of every box tree laid out with it.
pub struct FontFace {
    family: String,
    name: String,
    is_math: bool,
    units_per_em: u16,
    font_matrix: ttf_parser::cff::Matrix,
    data: Arc<[u8]>,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("family", &self.family)
            .field("name", &self.name)
            .field("is_math", &self.is_math)
            .field("units_per_em", &self.units_per_em)
            .field("len", &self.data.len())
            .finish()
    }
}

impl FontFace {
    /// Parses the first face of the given font data.
    pub fn parse(data: Vec<u8>) -> FontResult<Self> {
        let data : Arc<[u8]> = data.into();
        let face = ttf_parser::Face::parse(&data, 0)
            .map_err(|e| FontError::Unparsable(e.to_string()))?;

        let family = find_name(&face, ttf_parser::name_id::TYPOGRAPHIC_FAMILY)
            .or_else(|| find_name(&face, ttf_parser::name_id::FAMILY))
            .ok_or(FontError::MissingFamilyName)?;
        let name = find_name(&face, ttf_parser::name_id::FULL_NAME)
            .or_else(|| find_name(&face, ttf_parser::name_id::POST_SCRIPT_NAME))
            .unwrap_or_else(|| family.clone());
        let is_math = face.tables().math.is_some();
        let units_per_em = face.units_per_em();

        let font_matrix = match face.tables().cff {
            Some(cff) => cff.matrix(),
            None => {
                let per_em = f32::from(units_per_em.max(1)).recip();
                ttf_parser::cff::Matrix { sx: per_em, ky: 0., kx: 0., sy: per_em, tx: 0., ty: 0. }
            }
        };

        debug!("parsed font '{}' ({}), math table: {}", name, family, is_math);
        Ok(Self {
            family,
            name,
            is_math,
            units_per_em,
            font_matrix,
            data,
        })
    }

    /// Family name, e.g. "XITS Math"
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Full name of the face
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the face carries an OpenType MATH table
    pub fn is_math(&self) -> bool {
        self.is_math
    }

    /// Design units per em
    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    /// Matrix going from font design units to em
    pub fn font_matrix(&self) -> ttf_parser::cff::Matrix {
        self.font_matrix
    }

    /// Returns a parsed view of the font data
    pub fn face(&self) -> FontResult<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, 0)
            .map_err(|e| FontError::Unparsable(e.to_string()))
    }

    /// Looks up the glyph mapped to `ch` by the face's cmap.
    pub fn glyph_index(&self, ch: char) -> Option<GlyphId> {
        let face = self.face().ok()?;
        face.glyph_index(ch).map(|gid| GlyphId(gid.0))
    }

    /// Feeds the outline of glyph `gid` to `builder`, in font design units (Y pointing up).
    /// Returns false if the glyph has no outline.
    pub fn outline(&self, gid: GlyphId, builder: &mut dyn ttf_parser::OutlineBuilder) -> bool {
        match self.face() {
            Ok(face) => face.outline_glyph(gid.into(), builder).is_some(),
            Err(e) => {
                warn!("cannot outline glyph {}: {}", gid.0, e);
                false
            }
        }
    }

    /// Description of the face handed over to foreign callers
    pub fn meta(&self) -> FontMeta {
        FontMeta {
            family: self.family.clone(),
            name: self.name.clone(),
            is_math_font: self.is_math,
        }
    }
}

fn find_name(face: &ttf_parser::Face<'_>, name_id: u16) -> Option<String> {
    face.names()
        .into_iter()
        .filter(|name| name.name_id == name_id)
        .find_map(|name| name.to_string())
}


/// Description of a registered face
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
pub struct FontMeta {
    /// family name
    pub family: String,
    /// full name
    pub name: String,
    /// whether the face has a MATH table
    pub is_math_font: bool,
}


/// The set of registered faces, which families to use by default for math and for text,
/// and the platform text layout, if any.
///
/// Cloning is cheap: faces are shared.
#[derive(Debug, Default, Clone)]
pub struct FontRegistry {
    faces: Vec<Arc<FontFace>>,
    default_math_family: Option<String>,
    default_main_family: Option<String>,
    text_layout: Option<Arc<dyn TextLayout>>,
}

impl FontRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and registers font data.
    pub fn add(&mut self, data: Vec<u8>) -> FontResult<FontMeta> {
        let face = FontFace::parse(data)?;
        let meta = face.meta();
        self.faces.push(Arc::new(face));
        Ok(meta)
    }

    /// Number of registered faces
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// No face registered?
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Forgets all faces and default families. The text layout stays registered.
    /// Glyphs of existing box trees keep their face alive.
    pub fn clear(&mut self) {
        self.faces.clear();
        self.default_math_family = None;
        self.default_main_family = None;
    }

    /// Registers the platform text layout, replacing any previous one.
    pub fn set_text_layout(&mut self, layout: Option<Arc<dyn TextLayout>>) {
        self.text_layout = layout;
    }

    /// The platform text layout, if any
    pub fn text_layout(&self) -> Option<&Arc<dyn TextLayout>> {
        self.text_layout.as_ref()
    }

    /// Lays out `text` with the platform text layout.
    /// `None` if there is no text layout or it could not lay the text out.
    pub fn lay_out_text(&self, text: &str, font: &FontDesc) -> Option<LaidOutText> {
        let layout = self.text_layout.clone()?;
        LaidOutText::new(layout, text, font)
    }

    /// First registered face of the given family
    pub fn by_family(&self, family: &str) -> Option<Arc<FontFace>> {
        self.faces.iter()
            .find(|face| face.family() == family)
            .cloned()
    }

    /// Sets the family used for math when a formula does not ask for one.
    pub fn set_default_math_font(&mut self, family: &str) -> FontResult<()> {
        self.by_family(family).ok_or_else(|| FontError::UnknownFamily(family.to_string()))?;
        self.default_math_family = Some(family.to_string());
        Ok(())
    }

    /// Sets the family used for text when a formula does not ask for one.
    pub fn set_default_main_font(&mut self, family: &str) -> FontResult<()> {
        self.by_family(family).ok_or_else(|| FontError::UnknownFamily(family.to_string()))?;
        self.default_main_family = Some(family.to_string());
        Ok(())
    }

    /// The default math face: the chosen family, else the first face with a MATH table.
    pub fn math_font(&self) -> FontResult<Arc<FontFace>> {
        if let Some(family) = &self.default_math_family {
            return self.by_family(family).ok_or_else(|| FontError::UnknownFamily(family.clone()));
        }
        self.faces.iter()
            .find(|face| face.is_math())
            .cloned()
            .ok_or(FontError::NoFont)
    }

    /// The default text face: the chosen family, else the first face without a MATH table,
    /// else the math face.
    pub fn main_font(&self) -> FontResult<Arc<FontFace>> {
        if let Some(family) = &self.default_main_family {
            return self.by_family(family).ok_or_else(|| FontError::UnknownFamily(family.clone()));
        }
        self.faces.iter()
            .find(|face| !face.is_math())
            .or_else(|| self.faces.first())
            .cloned()
            .ok_or(FontError::NoFont)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_is_not_a_font() {
        let mut registry = FontRegistry::new();
        let err = registry.add(b"definitely not an OpenType file".to_vec()).unwrap_err();
        assert!(matches!(err, FontError::Unparsable(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn empty_registry_has_no_defaults() {
        let mut registry = FontRegistry::new();
        assert_eq!(registry.math_font().unwrap_err(), FontError::NoFont);
        assert_eq!(registry.main_font().unwrap_err(), FontError::NoFont);
        assert_eq!(
            registry.set_default_math_font("XITS Math"),
            Err(FontError::UnknownFamily("XITS Math".to_string()))
        );
    }

    #[test]
    fn text_layout_survives_clear() {
        use crate::text::tests::FixedPitch;

        let mut registry = FontRegistry::new();
        let font = FontDesc { font_size: 8., ..FontDesc::default() };
        assert!(registry.lay_out_text("ab", &font).is_none());

        registry.set_text_layout(Some(Arc::new(FixedPitch::default())));
        registry.clear();
        let text = registry.lay_out_text("ab", &font).unwrap();
        assert_eq!(text.bounds().width, 8.);
        assert!(registry.clone().text_layout().is_some());
    }

    #[test]
    fn glyph_id_conversions() {
        let gid = GlyphId::from(42u16);
        assert_eq!(u16::from(gid), 42);
        assert_eq!(ttf_parser::GlyphId::from(gid), ttf_parser::GlyphId(42));
    }
}
