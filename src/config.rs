//! Settings applying to every render: debug instrumentation, reference text size, glyph drawing mode
//! and post-processing of SVG output.

use crate::boxes::DebugConfig;
use crate::error::SettingsError;
use crate::svg::SvgOptions;

/// Text size for which box trees are laid out. A render's fixed scale is its text size divided by this.
pub const DEFAULT_REFERENCE_TEXT_SIZE : f64 = 10.0;

/// Process-wide render settings, passed explicitly to every [`Render`](crate::handle::Render).
///
/// Missing fields take their default value when deserializing, so `{}` is a valid document.
#[derive(Debug, Clone, PartialEq)]
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub debug: DebugConfig,
    pub reference_text_size: f64,
    pub render_glyph_use_path: bool,
    pub svg: SvgOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: DebugConfig::default(),
            reference_text_size: DEFAULT_REFERENCE_TEXT_SIZE,
            render_glyph_use_path: false,
            svg: SvgOptions::default(),
        }
    }
}

impl Settings {
    /// Reads settings from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings : Settings = serde_json::from_str(json)
            .map_err(|e| SettingsError::Json(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks that the reference text size can scale anything.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.reference_text_size.is_finite() && self.reference_text_size > 0.) {
            return Err(SettingsError::ReferenceTextSize(self.reference_text_size));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(Settings::from_json("{}").unwrap(), Settings::default());
    }

    #[test]
    fn partial_document() {
        let settings = Settings::from_json(r#"{"debug": {"enabled": true}, "render_glyph_use_path": true}"#).unwrap();
        assert!(settings.debug.enabled);
        assert!(!settings.debug.show_only_glyph_leaves);
        assert!(settings.render_glyph_use_path);
        assert_eq!(settings.reference_text_size, DEFAULT_REFERENCE_TEXT_SIZE);
        assert_eq!(settings.svg, SvgOptions::default());
    }

    #[test]
    fn svg_options() {
        let settings = Settings::from_json(r#"{"svg": {"dpi": 720}}"#).unwrap();
        assert_eq!(settings.svg, SvgOptions { dpi: Some(720), fit_height: false });
        assert!(matches!(Settings::from_json(r#"{"svg": {"dpi": -1}}"#), Err(SettingsError::Json(_))));
    }

    #[test]
    fn rejects_bad_reference_size() {
        assert_eq!(
            Settings::from_json(r#"{"reference_text_size": 0}"#),
            Err(SettingsError::ReferenceTextSize(0.))
        );
        assert!(matches!(Settings::from_json("[1, 2]"), Err(SettingsError::Json(_))));
    }
}
