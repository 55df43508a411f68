//! Defines different error types related to the phases of producing an output for a formula.
//!   - [`FontError`] : errors that have to do with the font data registered (unparsable data, unknown family).
//!   - [`LayoutError`] : the formula layout producer could not produce a box tree.
//!   - [`SurfaceError`] : a drawing surface could not be created or finalized.
//!   - [`BufferError`] : an output buffer could not be handed over to the foreign caller.
//!   - [`SettingsError`] : settings supplied by a caller are malformed.
//!   - [`RenderError`] : any of the above.

use std::fmt;

/// Result type for the [`FontError`]
pub type FontResult<T> = ::std::result::Result<T, FontError>;
/// Result type for the [`LayoutError`]
pub type LayoutResult<T> = ::std::result::Result<T, LayoutError>;
/// Result type for the [`RenderError`]
pub type RenderResult<T> = ::std::result::Result<T, RenderError>;

/// Errors having to do with font data provided
#[derive(Debug, Clone, PartialEq)]
pub enum FontError {
    /// The bytes could not be parsed as an OpenType/TrueType face.
    Unparsable(String),
    /// The face does not have a family name in its `name` table.
    MissingFamilyName,
    /// No face with that family has been registered.
    UnknownFamily(String),
    /// No font has been registered at all.
    NoFont,
}

/// Errors of the formula layout producer
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// a font error
    Font(FontError),
    /// No layout engine has been installed.
    NoEngine,
    /// The engine rejected the formula source.
    Parse(String),
    /// The engine failed for a reason of its own.
    Engine(String),
    /// The engine produced a box tree with dangling ids or cycles.
    MalformedTree(String),
}

/// Errors when creating, drawing onto or finalizing a drawing surface
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceError {
    /// The surface could not be created with the requested size.
    Creation { width: i32, height: i32, reason: String },
    /// The surface could not flush its accumulated output.
    Finish(String),
    /// The surface produced no bytes.
    EmptyOutput,
    /// The output kind was not compiled in.
    Unsupported(&'static str),
}

/// Errors when handing a buffer over the foreign boundary
#[derive(Debug, Clone, PartialEq)]
pub enum BufferError {
    /// The allocator returned null.
    Allocation(usize),
    /// Nothing to hand over.
    Empty,
    /// A JSON payload could not be assembled.
    Json(String),
}

/// Errors in settings provided by a caller
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
    /// The document is not valid JSON for settings.
    Json(String),
    /// The reference text size is not a positive finite number.
    ReferenceTextSize(f64),
}

/// A generic error type covering any error that may happen while producing output for a formula.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// a font error
    Font(FontError),
    /// a layout error
    Layout(LayoutError),
    /// a drawing surface error
    Surface(SurfaceError),
    /// a buffer handoff error
    Buffer(BufferError),
}

impl From<FontError> for LayoutError {
    fn from(e: FontError) -> Self {
        LayoutError::Font(e)
    }
}
impl From<FontError> for RenderError {
    fn from(e: FontError) -> Self {
        RenderError::Font(e)
    }
}
impl From<LayoutError> for RenderError {
    fn from(e: LayoutError) -> Self {
        RenderError::Layout(e)
    }
}
impl From<SurfaceError> for RenderError {
    fn from(e: SurfaceError) -> Self {
        RenderError::Surface(e)
    }
}
impl From<BufferError> for RenderError {
    fn from(e: BufferError) -> Self {
        RenderError::Buffer(e)
    }
}
impl From<serde_json::Error> for BufferError {
    fn from(e: serde_json::Error) -> Self {
        BufferError::Json(e.to_string())
    }
}


impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::FontError::*;
        match *self {
            Unparsable(ref reason) =>
                write!(f, "failed to parse font data: {}", reason),
            MissingFamilyName =>
                write!(f, "font has no family name"),
            UnknownFamily(ref family) =>
                write!(f, "no font registered with family '{}'", family),
            NoFont =>
                write!(f, "no font registered"),
        }
    }
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::LayoutError::*;
        match *self {
            Font(ref e) =>
                write!(f, "font error during layout: {}", e),
            NoEngine =>
                write!(f, "no formula layout engine installed"),
            Parse(ref reason) =>
                write!(f, "failed to parse formula: {}", reason),
            Engine(ref reason) =>
                write!(f, "layout engine failed: {}", reason),
            MalformedTree(ref reason) =>
                write!(f, "malformed box tree: {}", reason),
        }
    }
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::SurfaceError::*;
        match *self {
            Creation { width, height, ref reason } =>
                write!(f, "failed to create a {}x{} surface: {}", width, height, reason),
            Finish(ref reason) =>
                write!(f, "failed to finish surface output: {}", reason),
            EmptyOutput =>
                write!(f, "surface produced no output"),
            Unsupported(kind) =>
                write!(f, "{} output support not compiled", kind),
        }
    }
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::BufferError::*;
        match *self {
            Allocation(len) =>
                write!(f, "allocation failed for {} bytes", len),
            Empty =>
                write!(f, "refusing to hand over an empty buffer"),
            Json(ref reason) =>
                write!(f, "failed to create JSON: {}", reason),
        }
    }
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SettingsError::Json(ref reason) =>
                write!(f, "invalid settings: {}", reason),
            SettingsError::ReferenceTextSize(size) =>
                write!(f, "reference text size must be positive, got {}", size),
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            RenderError::Font(ref e)    => e.fmt(f),
            RenderError::Layout(ref e)  => e.fmt(f),
            RenderError::Surface(ref e) => e.fmt(f),
            RenderError::Buffer(ref e)  => e.fmt(f),
        }
    }
}

impl std::error::Error for FontError {}
impl std::error::Error for LayoutError {}
impl std::error::Error for SurfaceError {}
impl std::error::Error for BufferError {}
impl std::error::Error for SettingsError {}
impl std::error::Error for RenderError {}
