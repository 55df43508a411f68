//! A surface which records paint commands in device coordinates instead of drawing them.
//!
//! Its output is the JSON serialization of [`RecordedDrawing`]. It is what the boundary hands over as
//! "drawing data" to callers painting with their own graphics stack, and what tests inspect.

use super::{Cursor, OutputSurface, Role, Surface};
use crate::boxes::Glyph;
use crate::color::RGBA;
use crate::error::SurfaceError;


/// Affine transform without rotation: `device = (x * sx + tx, y * sy + ty)`
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct Transform {
    pub tx: f64,
    pub ty: f64,
    pub sx: f64,
    pub sy: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self { tx: 0., ty: 0., sx: 1., sy: 1. }
    }
}

impl Transform {
    fn apply(&self, pos: Cursor) -> (f64, f64) {
        (pos.x * self.sx + self.tx, pos.y * self.sy + self.ty)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[derive(Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum DrawCmd {
    Glyph {
        pos      : (f64, f64),
        glyph_id : u16,
        ch       : char,
        size     : f64,
        color    : RGBA,
    },
    Rule {
        pos    : (f64, f64),
        width  : f64,
        height : f64,
        color  : RGBA,
    },
    BBox {
        pos    : (f64, f64),
        width  : f64,
        height : f64,
        role   : Role,
    },
}

/// Everything a [`RecordingSurface`] produced
#[derive(Debug, Clone, PartialEq, Default)]
#[derive(Serialize, Deserialize)]
pub struct RecordedDrawing {
    pub width    : i32,
    pub height   : i32,
    pub commands : Vec<DrawCmd>,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    drawing   : RecordedDrawing,
    transform : Transform,
    color     : RGBA,
}

impl RecordingSurface {
    /// A surface of `width` x `height` pixels, with black as current color.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            drawing: RecordedDrawing { width, height, commands: Vec::new() },
            transform: Transform::default(),
            color: RGBA::BLACK,
        }
    }

    pub fn commands(&self) -> &[DrawCmd] {
        &self.drawing.commands
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn into_drawing(self) -> RecordedDrawing {
        self.drawing
    }
}

impl Surface for RecordingSurface {
    fn translate(&mut self, dx: f64, dy: f64) {
        self.transform.tx += dx * self.transform.sx;
        self.transform.ty += dy * self.transform.sy;
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.transform.sx *= sx;
        self.transform.sy *= sy;
    }

    fn color(&self) -> RGBA {
        self.color
    }

    fn set_color(&mut self, color: RGBA) {
        self.color = color;
    }

    fn glyph(&mut self, pos: Cursor, glyph: &Glyph) {
        self.drawing.commands.push(DrawCmd::Glyph {
            pos: self.transform.apply(pos),
            glyph_id: glyph.id.into(),
            ch: glyph.ch,
            size: glyph.size.to_unitless() * self.transform.sy,
            color: self.color,
        });
    }

    fn rule(&mut self, pos: Cursor, width: f64, height: f64) {
        self.drawing.commands.push(DrawCmd::Rule {
            pos: self.transform.apply(pos),
            width: width * self.transform.sx,
            height: height * self.transform.sy,
            color: self.color,
        });
    }

    fn bbox(&mut self, pos: Cursor, width: f64, height: f64, role: Role) {
        self.drawing.commands.push(DrawCmd::BBox {
            pos: self.transform.apply(pos),
            width: width * self.transform.sx,
            height: height * self.transform.sy,
            role,
        });
    }
}

impl OutputSurface for RecordingSurface {
    fn finish(self) -> Result<Vec<u8>, SurfaceError> {
        serde_json::to_vec(&self.drawing).map_err(|e| SurfaceError::Finish(e.to_string()))
    }
}
