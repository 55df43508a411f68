//! Text laid out by the host platform.
//!
//! Glyphs which are not filled from font outlines (cf [`Settings::render_glyph_use_path`](crate::config::Settings))
//! are measured and drawn by the platform's own text stack. A [`TextLayout`] is registered on the
//! [`FontRegistry`](crate::font::FontRegistry) so that engines can measure such text while laying out.

use std::fmt;
use std::sync::Arc;

/// Style of a run of text, as handed to the platform
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[derive(Serialize, Deserialize)]
pub struct FontDesc {
    pub is_bold: bool,
    pub is_italic: bool,
    pub is_sans_serif: bool,
    pub is_monospace: bool,
    /// in pixels
    pub font_size: f32,
}

/// Extent of a laid out run of text, in pixels
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[derive(Serialize, Deserialize)]
pub struct TextLayoutBounds {
    pub width: f32,
    /// total height, ascent included
    pub height: f32,
    pub ascent: f32,
}

/// A platform text stack.
///
/// Layouts are identified by the ids `create` returns, and live until `release` is called with that id.
pub trait TextLayout: Send + Sync {
    /// Lays out `text`, returning the id of the layout or `None` if the platform cannot.
    fn create(&self, text: &str, font: &FontDesc) -> Option<u32>;

    /// Extent of a layout
    fn bounds(&self, id: u32) -> TextLayoutBounds;

    /// Frees a layout. The id is not used afterwards.
    fn release(&self, id: u32);

    /// Can the layout be drawn as a path?
    fn path_exists(&self, id: u32) -> bool;
}

impl fmt::Debug for dyn TextLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TextLayout")
    }
}

/// A layout created by a [`TextLayout`], released when dropped.
pub struct LaidOutText {
    layout: Arc<dyn TextLayout>,
    id: u32,
}

impl LaidOutText {
    /// Lays out `text` with `layout`.
    pub fn new(layout: Arc<dyn TextLayout>, text: &str, font: &FontDesc) -> Option<Self> {
        let id = layout.create(text, font)?;
        trace!("laid out {:?} as text layout {}", text, id);
        Some(Self { layout, id })
    }

    /// Id given by the platform
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn bounds(&self) -> TextLayoutBounds {
        self.layout.bounds(self.id)
    }

    pub fn path_exists(&self) -> bool {
        self.layout.path_exists(self.id)
    }
}

impl Drop for LaidOutText {
    fn drop(&mut self) {
        self.layout.release(self.id);
    }
}

impl fmt::Debug for LaidOutText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaidOutText").field("id", &self.id).finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Every character is `font_size / 2` wide, and layouts are tracked until released.
    #[derive(Default)]
    pub struct FixedPitch {
        pub live: Mutex<Vec<(u32, f32)>>,
        next: Mutex<u32>,
    }

    impl TextLayout for FixedPitch {
        fn create(&self, text: &str, font: &FontDesc) -> Option<u32> {
            if text.is_empty() {
                return None;
            }
            let mut next = self.next.lock();
            *next += 1;
            let width = text.chars().count() as f32 * font.font_size / 2.;
            self.live.lock().push((*next, width));
            Some(*next)
        }

        fn bounds(&self, id: u32) -> TextLayoutBounds {
            let live = self.live.lock();
            let width = live.iter().find(|(live, _)| *live == id).map_or(0., |(_, width)| *width);
            TextLayoutBounds { width, height: 12., ascent: 9. }
        }

        fn release(&self, id: u32) {
            self.live.lock().retain(|(live, _)| *live != id);
        }

        fn path_exists(&self, _: u32) -> bool {
            true
        }
    }

    #[test]
    fn layouts_are_released_on_drop() {
        let platform = Arc::new(FixedPitch::default());
        let font = FontDesc { is_monospace: true, font_size: 10., ..FontDesc::default() };

        let text = LaidOutText::new(platform.clone(), "abc", &font).unwrap();
        assert_eq!(text.bounds(), TextLayoutBounds { width: 15., height: 12., ascent: 9. });
        assert!(text.path_exists());
        assert_eq!(platform.live.lock().len(), 1);

        drop(text);
        assert!(platform.live.lock().is_empty());
        assert!(LaidOutText::new(platform, "", &font).is_none());
    }
}
