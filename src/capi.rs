//! The C boundary.
//!
//! [`Boundary`] holds everything calls from a foreign runtime share: registered fonts, settings, the
//! installed [`FormulaEngine`] and the [`BufferRegistry`] of buffers handed over. The `extern "C"`
//! functions of this module drive one process-wide instance of it.
//!
//! No entry point unwinds or aborts: invalid handles, missing engines, drawing failures and panics all
//! end in a null, zero or `false` result, with a diagnostic sent to the `log` facade.
//!
//! Buffers returned by `rexbox_get_drawing_data`, `rexbox_render_to_*` and `rexbox_get_key_char_metrics`
//! are registered with a count of 1. Callers share them with `rexbox_retain_buffer` and give them back
//! with `rexbox_free_buffer`.

use std::ffi::{CStr, CString};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use libc::{c_char, c_float, c_int, c_uint, c_ulong};
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::buffer::{BufferAllocator, BufferRegistry, MallocAllocator};
use crate::color::RGBA;
use crate::config::Settings;
use crate::engine::{FormulaEngine, LayoutRequest};
use crate::error::{FontResult, LayoutError, RenderResult, SettingsError};
use crate::font::{FontMeta, FontRegistry};
use crate::handle::Render;
use crate::render::{self, OutputKind};
use crate::report::{self, KeyCharReport};
use crate::svg;
use crate::text::{FontDesc, TextLayout, TextLayoutBounds};


struct State {
    fonts: FontRegistry,
    settings: Settings,
    engine: Option<Arc<dyn FormulaEngine>>,
    initialized: bool,
}

/// Shared state of the boundary.
pub struct Boundary<A: BufferAllocator = MallocAllocator> {
    buffers: BufferRegistry<A>,
    state: RwLock<State>,
}

impl Default for Boundary<MallocAllocator> {
    fn default() -> Self {
        Self::new()
    }
}

impl Boundary<MallocAllocator> {
    /// A boundary with no font, default settings and no engine.
    pub fn new() -> Self {
        Self::with_allocator(MallocAllocator)
    }
}

impl<A: BufferAllocator> Boundary<A> {
    /// Like [`Boundary::new`], with buffers allocated by `allocator`.
    pub fn with_allocator(allocator: A) -> Self {
        Self {
            buffers: BufferRegistry::with_allocator(allocator),
            state: RwLock::new(State {
                fonts: FontRegistry::new(),
                settings: Settings::default(),
                engine: None,
                initialized: false,
            }),
        }
    }

    /// Registry of the buffers handed over
    pub fn buffers(&self) -> &BufferRegistry<A> {
        &self.buffers
    }

    /// Registers the first font and marks the boundary initialized.
    pub fn init(&self, data: Vec<u8>) -> FontResult<FontMeta> {
        let mut state = self.state.write();
        let meta = state.fonts.add(data)?;
        state.initialized = true;
        info!("initialized with font '{}'", meta.name);
        Ok(meta)
    }

    /// Registers another font.
    pub fn add_font(&self, data: Vec<u8>) -> FontResult<FontMeta> {
        self.state.write().fonts.add(data)
    }

    /// Forgets all fonts. Existing renders are unaffected.
    pub fn release(&self) {
        let mut state = self.state.write();
        state.fonts.clear();
        state.initialized = false;
    }

    /// Whether [`Boundary::init`] succeeded since the last [`Boundary::release`]
    pub fn is_initialized(&self) -> bool {
        self.state.read().initialized
    }

    /// Sets the family used for math by default.
    pub fn set_default_math_font(&self, family: &str) -> FontResult<()> {
        self.state.write().fonts.set_default_math_font(family)
    }

    /// Sets the family used for text by default.
    pub fn set_default_main_font(&self, family: &str) -> FontResult<()> {
        self.state.write().fonts.set_default_main_font(family)
    }

    /// Fill glyph outlines instead of using the surface's own text layout.
    pub fn set_render_glyph_use_path(&self, use_path: bool) {
        self.state.write().settings.render_glyph_use_path = use_path;
    }

    /// Cf [`Boundary::set_render_glyph_use_path`]
    pub fn is_render_glyph_use_path(&self) -> bool {
        self.state.read().settings.render_glyph_use_path
    }

    /// Replaces the settings with those of a JSON document.
    pub fn configure(&self, json: &str) -> Result<(), SettingsError> {
        let settings = Settings::from_json(json)?;
        debug!("new settings: {:?}", settings);
        self.state.write().settings = settings;
        Ok(())
    }

    /// Current settings
    pub fn settings(&self) -> Settings {
        self.state.read().settings.clone()
    }

    /// Installs the engine that parse-and-render requests are delegated to, replacing any previous one.
    pub fn install_engine(&self, engine: Arc<dyn FormulaEngine>) {
        self.state.write().engine = Some(engine);
    }

    /// Registers the platform text layout engines may measure text with, or forgets it.
    pub fn set_text_layout(&self, layout: Option<Arc<dyn TextLayout>>) {
        self.state.write().fonts.set_text_layout(layout);
    }

    /// Cf [`Boundary::set_text_layout`]
    pub fn text_layout(&self) -> Option<Arc<dyn TextLayout>> {
        self.state.read().fonts.text_layout().cloned()
    }

    /// Lays out `request` with the installed engine and wraps the result in a render.
    ///
    /// The engine runs on a snapshot of the fonts and settings, without any lock held, so it may call
    /// back into the boundary. The tree it returns is checked before anything walks it.
    pub fn parse_render(&self, request: &LayoutRequest<'_>) -> RenderResult<Render> {
        let (engine, fonts, settings) = {
            let state = self.state.read();
            let engine = state.engine.clone().ok_or(LayoutError::NoEngine)?;
            (engine, state.fonts.clone(), state.settings.clone())
        };
        let formula = engine.layout(request, &fonts)?;
        formula.tree.validate()?;
        let mut render = Render::new(formula.tree, request.text_size, formula.is_split, &settings);
        render.set_foreground(request.foreground);
        Ok(render)
    }

    /// Draws `render` into bytes of the given kind. SVG documents are post-processed
    /// according to [`Settings::svg`].
    pub fn render_bytes(&self, render: &Render, kind: OutputKind) -> RenderResult<Vec<u8>> {
        let (use_path, svg_options) = {
            let state = self.state.read();
            (state.settings.render_glyph_use_path, state.settings.svg)
        };
        let bytes = render::draw_to_bytes(render, kind, use_path)?;
        match kind {
            OutputKind::Svg => Ok(svg::post_process(bytes, &svg_options)?),
            _ => Ok(bytes),
        }
    }

    /// SVG document of `render` with its metrics, as JSON.
    pub fn svg_with_metrics(&self, render: &Render) -> RenderResult<Vec<u8>> {
        let svg = self.render_bytes(render, OutputKind::Svg)?;
        Ok(report::svg_with_metrics(&svg, render.metrics())?)
    }

    /// Key character report of `render`, as JSON.
    pub fn key_char_metrics(&self, render: &Render) -> RenderResult<Vec<u8>> {
        Ok(KeyCharReport::from_render(render).to_json()?)
    }

    /// Copies the bytes of `output` into a registered buffer and writes its length to `out_len`.
    /// Any failure is logged and yields null with a length of 0.
    ///
    /// # Safety
    /// `out_len` must be null or valid for writes.
    pub unsafe fn hand_over(&self, name: &str, output: RenderResult<Vec<u8>>, out_len: *mut c_ulong) -> *mut u8 {
        let buffer = output.and_then(|bytes| {
            let ptr = self.buffers.allocate(&bytes)?;
            Ok((ptr, bytes.len()))
        });
        match buffer {
            Ok((ptr, len)) => {
                set_len(out_len, len);
                ptr
            }
            Err(e) => {
                error!("{}: {}", name, e);
                set_len(out_len, 0);
                std::ptr::null_mut()
            }
        }
    }
}


static BOUNDARY : Lazy<Boundary> = Lazy::new(Boundary::new);

/// The process-wide boundary the `extern "C"` functions use.
pub fn boundary() -> &'static Boundary {
    &BOUNDARY
}

/// Installs the formula layout engine used by `rexbox_parse_render`.
pub fn install_engine(engine: Arc<dyn FormulaEngine>) {
    boundary().install_engine(engine)
}


/// Runs `f`, turning a panic into `sentinel`.
fn guarded<T>(name: &str, sentinel: T, f: impl FnOnce() -> T) -> T {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error!("{}: panicked", name);
            sentinel
        }
    }
}

unsafe fn set_len(out_len: *mut c_ulong, len: usize) {
    if !out_len.is_null() {
        *out_len = len as c_ulong;
    }
}

unsafe fn render_ref<'a>(render: *const Render, name: &str) -> Option<&'a Render> {
    if render.is_null() {
        warn!("{}: invalid render pointer", name);
    }
    render.as_ref()
}

unsafe fn render_mut<'a>(render: *mut Render, name: &str) -> Option<&'a mut Render> {
    if render.is_null() {
        warn!("{}: invalid render pointer", name);
    }
    render.as_mut()
}

unsafe fn c_str<'a>(ptr: *const c_char, name: &str) -> Option<&'a str> {
    if ptr.is_null() {
        warn!("{}: null string", name);
        return None;
    }
    match CStr::from_ptr(ptr).to_str() {
        Ok(s) => Some(s),
        Err(e) => {
            warn!("{}: string is not UTF-8: {}", name, e);
            None
        }
    }
}

unsafe fn font_data(len: c_ulong, data: *const u8) -> Vec<u8> {
    if data.is_null() || len == 0 {
        return Vec::new();
    }
    std::slice::from_raw_parts(data, len as usize).to_vec()
}


/// A registered font's description, owned by the foreign caller until `rexbox_release_font_meta`.
pub struct FontMetaHandle {
    family: CString,
    name: CString,
    is_math_font: bool,
}

impl From<FontMeta> for FontMetaHandle {
    fn from(meta: FontMeta) -> Self {
        fn c_string(s: String) -> CString {
            CString::new(s.replace('\0', "")).unwrap_or_default()
        }
        Self {
            family: c_string(meta.family),
            name: c_string(meta.name),
            is_math_font: meta.is_math_font,
        }
    }
}

fn meta_handle(name: &str, meta: FontResult<FontMeta>) -> *mut FontMetaHandle {
    match meta {
        Ok(meta) => Box::into_raw(Box::new(FontMetaHandle::from(meta))),
        Err(e) => {
            error!("{}: {}", name, e);
            std::ptr::null_mut()
        }
    }
}


static VERSION : &str = concat!(env!("CARGO_PKG_VERSION"), "\0");

/// Library version, as a static NUL-terminated string.
#[no_mangle]
pub extern "C" fn rexbox_version() -> *const c_char {
    VERSION.as_ptr() as *const c_char
}

/// Registers the first font and marks the library initialized.
///
/// # Safety
/// `data` must be null or valid for reads of `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn rexbox_init(len: c_ulong, data: *const u8) -> *mut FontMetaHandle {
    guarded("rexbox_init", std::ptr::null_mut(), || {
        meta_handle("rexbox_init", boundary().init(font_data(len, data)))
    })
}

/// Registers another font.
///
/// # Safety
/// `data` must be null or valid for reads of `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn rexbox_add_font(len: c_ulong, data: *const u8) -> *mut FontMetaHandle {
    guarded("rexbox_add_font", std::ptr::null_mut(), || {
        meta_handle("rexbox_add_font", boundary().add_font(font_data(len, data)))
    })
}

/// Family name of a font. The string lives as long as `meta`.
///
/// # Safety
/// `meta` must be null or a live pointer from `rexbox_init`/`rexbox_add_font`.
#[no_mangle]
pub unsafe extern "C" fn rexbox_get_font_family(meta: *const FontMetaHandle) -> *const c_char {
    match meta.as_ref() {
        Some(meta) => meta.family.as_ptr(),
        None => std::ptr::null(),
    }
}

/// Full name of a font. The string lives as long as `meta`.
///
/// # Safety
/// Cf [`rexbox_get_font_family`].
#[no_mangle]
pub unsafe extern "C" fn rexbox_get_font_name(meta: *const FontMetaHandle) -> *const c_char {
    match meta.as_ref() {
        Some(meta) => meta.name.as_ptr(),
        None => std::ptr::null(),
    }
}

/// Whether a font has a MATH table.
///
/// # Safety
/// Cf [`rexbox_get_font_family`].
#[no_mangle]
pub unsafe extern "C" fn rexbox_is_math_font(meta: *const FontMetaHandle) -> bool {
    meta.as_ref().map_or(false, |meta| meta.is_math_font)
}

/// Frees a font description.
///
/// # Safety
/// `meta` must be null or a live pointer from `rexbox_init`/`rexbox_add_font`, released once.
#[no_mangle]
pub unsafe extern "C" fn rexbox_release_font_meta(meta: *mut FontMetaHandle) {
    if !meta.is_null() {
        drop(Box::from_raw(meta));
    }
}

/// Forgets all fonts.
#[no_mangle]
pub extern "C" fn rexbox_release() {
    guarded("rexbox_release", (), || boundary().release())
}

#[no_mangle]
pub extern "C" fn rexbox_is_initialized() -> bool {
    guarded("rexbox_is_initialized", false, || boundary().is_initialized())
}

/// # Safety
/// `name` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn rexbox_set_default_math_font(name: *const c_char) {
    guarded("rexbox_set_default_math_font", (), || {
        if let Some(family) = c_str(name, "rexbox_set_default_math_font") {
            if let Err(e) = boundary().set_default_math_font(family) {
                warn!("rexbox_set_default_math_font: {}", e);
            }
        }
    })
}

/// # Safety
/// `name` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn rexbox_set_default_main_font(name: *const c_char) {
    guarded("rexbox_set_default_main_font", (), || {
        if let Some(family) = c_str(name, "rexbox_set_default_main_font") {
            if let Err(e) = boundary().set_default_main_font(family) {
                warn!("rexbox_set_default_main_font: {}", e);
            }
        }
    })
}

/// Whether some output can fill glyph outlines.
#[no_mangle]
pub extern "C" fn rexbox_has_glyph_path_render() -> bool {
    render::has_glyph_path_render()
}

#[no_mangle]
pub extern "C" fn rexbox_set_render_glyph_use_path(use_path: bool) {
    guarded("rexbox_set_render_glyph_use_path", (), || boundary().set_render_glyph_use_path(use_path))
}

#[no_mangle]
pub extern "C" fn rexbox_is_render_glyph_use_path() -> bool {
    guarded("rexbox_is_render_glyph_use_path", false, || boundary().is_render_glyph_use_path())
}

/// Replaces the settings with a JSON document. Returns false, keeping the previous settings,
/// if the document is invalid.
///
/// # Safety
/// `json` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn rexbox_configure(json: *const c_char) -> bool {
    guarded("rexbox_configure", false, || {
        let json = match c_str(json, "rexbox_configure") {
            Some(json) => json,
            None => return false,
        };
        match boundary().configure(json) {
            Ok(()) => true,
            Err(e) => {
                warn!("rexbox_configure: {}", e);
                false
            }
        }
    })
}

/// Lays out text and returns the id of the layout.
pub type CreateTextLayout = unsafe extern "C" fn(text: *const c_char, font: *const FontDesc) -> c_uint;
/// Fills in the bounds of a layout, typically with `rexbox_set_text_layout_bounds`.
pub type GetTextLayoutBounds = unsafe extern "C" fn(id: c_uint, bounds: *mut TextLayoutBounds);
/// Frees a layout.
pub type ReleaseTextLayout = unsafe extern "C" fn(id: c_uint);
/// Whether a layout can be drawn as a path.
pub type IsPathExists = unsafe extern "C" fn(id: c_uint) -> bool;

/// The platform text layout of a foreign caller, as a set of callbacks.
#[derive(Debug, Clone, Copy)]
pub struct CallbackTextLayout {
    pub create: CreateTextLayout,
    pub get_bounds: GetTextLayoutBounds,
    pub release: ReleaseTextLayout,
    pub is_path_exists: IsPathExists,
}

impl TextLayout for CallbackTextLayout {
    fn create(&self, text: &str, font: &FontDesc) -> Option<u32> {
        let text = match CString::new(text) {
            Ok(text) => text,
            Err(e) => {
                warn!("cannot hand text over to the platform: {}", e);
                return None;
            }
        };
        Some(unsafe { (self.create)(text.as_ptr(), font) })
    }

    fn bounds(&self, id: u32) -> TextLayoutBounds {
        let mut bounds = TextLayoutBounds::default();
        unsafe { (self.get_bounds)(id, &mut bounds) };
        bounds
    }

    fn release(&self, id: u32) {
        unsafe { (self.release)(id) }
    }

    fn path_exists(&self, id: u32) -> bool {
        unsafe { (self.is_path_exists)(id) }
    }
}

/// Registers the platform text layout. Any null callback unregisters it.
#[no_mangle]
pub extern "C" fn rexbox_register_callbacks(
    create: Option<CreateTextLayout>,
    get_bounds: Option<GetTextLayoutBounds>,
    release: Option<ReleaseTextLayout>,
    is_path_exists: Option<IsPathExists>,
) {
    guarded("rexbox_register_callbacks", (), || {
        let layout = match (create, get_bounds, release, is_path_exists) {
            (Some(create), Some(get_bounds), Some(release), Some(is_path_exists)) => {
                debug!("text layout callbacks registered");
                Some(Arc::new(CallbackTextLayout { create, get_bounds, release, is_path_exists }) as Arc<dyn TextLayout>)
            }
            _ => {
                info!("rexbox_register_callbacks: null callback, text layout unregistered");
                None
            }
        };
        boundary().set_text_layout(layout);
    })
}

/// For `GetTextLayoutBounds` callbacks.
///
/// # Safety
/// `bounds` must be null or valid for writes.
#[no_mangle]
pub unsafe extern "C" fn rexbox_set_text_layout_bounds(bounds: *mut TextLayoutBounds, width: c_float, height: c_float, ascent: c_float) {
    if let Some(bounds) = bounds.as_mut() {
        *bounds = TextLayoutBounds { width, height, ascent };
    }
}

/// # Safety
/// `desc` must be null or point to a font description handed to a `CreateTextLayout` callback.
#[no_mangle]
pub unsafe extern "C" fn rexbox_is_bold(desc: *const FontDesc) -> bool {
    desc.as_ref().map_or(false, |desc| desc.is_bold)
}

/// # Safety
/// Cf [`rexbox_is_bold`].
#[no_mangle]
pub unsafe extern "C" fn rexbox_is_italic(desc: *const FontDesc) -> bool {
    desc.as_ref().map_or(false, |desc| desc.is_italic)
}

/// # Safety
/// Cf [`rexbox_is_bold`].
#[no_mangle]
pub unsafe extern "C" fn rexbox_is_sans_serif(desc: *const FontDesc) -> bool {
    desc.as_ref().map_or(false, |desc| desc.is_sans_serif)
}

/// # Safety
/// Cf [`rexbox_is_bold`].
#[no_mangle]
pub unsafe extern "C" fn rexbox_is_monospace(desc: *const FontDesc) -> bool {
    desc.as_ref().map_or(false, |desc| desc.is_monospace)
}

/// Font size in pixels, NaN for a null description.
///
/// # Safety
/// Cf [`rexbox_is_bold`].
#[no_mangle]
pub unsafe extern "C" fn rexbox_font_size(desc: *const FontDesc) -> c_float {
    desc.as_ref().map_or(c_float::NAN, |desc| desc.font_size)
}

/// Parses and lays out `tex`, returning a render handle to delete with `rexbox_delete_render`,
/// or null on failure.
///
/// # Safety
/// `tex` must be null or a NUL-terminated string.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn rexbox_parse_render(
    tex: *const c_char,
    width: c_int,
    text_size: c_float,
    line_space: c_float,
    color: c_uint,
    fill_width: bool,
    enable_override_tex_style: bool,
    tex_style: c_uint,
) -> *mut Render {
    guarded("rexbox_parse_render", std::ptr::null_mut(), || {
        let tex = match c_str(tex, "rexbox_parse_render") {
            Some(tex) => tex,
            None => return std::ptr::null_mut(),
        };
        trace!("parse: {}", tex);
        let request = LayoutRequest {
            tex,
            width,
            text_size: f64::from(text_size),
            line_space: f64::from(line_space),
            foreground: RGBA::from_argb(color),
            fill_width,
            style_override: crate::engine::TexStyle::override_from(enable_override_tex_style, tex_style),
        };
        match boundary().parse_render(&request) {
            Ok(render) => Box::into_raw(Box::new(render)),
            Err(e) => {
                error!("rexbox_parse_render: {}", e);
                std::ptr::null_mut()
            }
        }
    })
}

/// # Safety
/// `render` must be null or a live handle from `rexbox_parse_render`, deleted once.
#[no_mangle]
pub unsafe extern "C" fn rexbox_delete_render(render: *mut Render) {
    if !render.is_null() {
        guarded("rexbox_delete_render", (), || drop(Box::from_raw(render)))
    }
}

/// # Safety
/// `render` must be null or a live handle from `rexbox_parse_render`.
#[no_mangle]
pub unsafe extern "C" fn rexbox_get_render_width(render: *const Render) -> c_int {
    guarded("rexbox_get_render_width", 0, || {
        render_ref(render, "rexbox_get_render_width").map_or(0, Render::width)
    })
}

/// Total height, ascent + depth.
///
/// # Safety
/// Cf [`rexbox_get_render_width`].
#[no_mangle]
pub unsafe extern "C" fn rexbox_get_render_height(render: *const Render) -> c_int {
    guarded("rexbox_get_render_height", 0, || {
        render_ref(render, "rexbox_get_render_height").map_or(0, Render::height)
    })
}

/// # Safety
/// Cf [`rexbox_get_render_width`].
#[no_mangle]
pub unsafe extern "C" fn rexbox_get_render_depth(render: *const Render) -> c_int {
    guarded("rexbox_get_render_depth", 0, || {
        render_ref(render, "rexbox_get_render_depth").map_or(0, Render::depth)
    })
}

/// Ascent over total height; NaN when the formula has no height or the handle is null.
///
/// # Safety
/// Cf [`rexbox_get_render_width`].
#[no_mangle]
pub unsafe extern "C" fn rexbox_get_render_baseline(render: *const Render) -> c_float {
    guarded("rexbox_get_render_baseline", c_float::NAN, || {
        render_ref(render, "rexbox_get_render_baseline")
            .and_then(Render::baseline)
            .map_or(c_float::NAN, |baseline| baseline as c_float)
    })
}

/// # Safety
/// Cf [`rexbox_get_render_width`].
#[no_mangle]
pub unsafe extern "C" fn rexbox_is_render_split(render: *const Render) -> bool {
    guarded("rexbox_is_render_split", false, || {
        render_ref(render, "rexbox_is_render_split").map_or(false, Render::is_split)
    })
}

/// # Safety
/// `render` must be null or a live handle from `rexbox_parse_render`, not in use by another thread.
#[no_mangle]
pub unsafe extern "C" fn rexbox_set_render_text_size(render: *mut Render, size: c_float) {
    guarded("rexbox_set_render_text_size", (), || {
        if let Some(render) = render_mut(render, "rexbox_set_render_text_size") {
            render.set_text_size(f64::from(size));
        }
    })
}

/// Sets the color, packed as `0xAARRGGBB`. Transparent means black.
///
/// # Safety
/// Cf [`rexbox_set_render_text_size`].
#[no_mangle]
pub unsafe extern "C" fn rexbox_set_render_foreground(render: *mut Render, color: c_uint) {
    guarded("rexbox_set_render_foreground", (), || {
        if let Some(render) = render_mut(render, "rexbox_set_render_foreground") {
            render.set_foreground(RGBA::from_argb(color));
        }
    })
}

unsafe fn output(
    name: &str,
    render: *const Render,
    out_len: *mut c_ulong,
    produce: impl FnOnce(&Boundary, &Render) -> RenderResult<Vec<u8>>,
) -> *mut u8 {
    guarded(name, std::ptr::null_mut(), || {
        let render = match render_ref(render, name) {
            Some(render) => render,
            None => {
                set_len(out_len, 0);
                return std::ptr::null_mut();
            }
        };
        let boundary = boundary();
        boundary.hand_over(name, produce(boundary, render), out_len)
    })
}

/// Paint commands of the render as JSON.
///
/// # Safety
/// `render` must be null or a live handle from `rexbox_parse_render`; `out_len` null or valid for writes.
#[no_mangle]
pub unsafe extern "C" fn rexbox_get_drawing_data(render: *const Render, out_len: *mut c_ulong) -> *mut u8 {
    output("rexbox_get_drawing_data", render, out_len, |b, r| b.render_bytes(r, OutputKind::Commands))
}

/// SVG document of the render. Null when SVG support is not compiled.
///
/// # Safety
/// Cf [`rexbox_get_drawing_data`].
#[no_mangle]
pub unsafe extern "C" fn rexbox_render_to_svg(render: *const Render, out_len: *mut c_ulong) -> *mut u8 {
    output("rexbox_render_to_svg", render, out_len, |b, r| b.render_bytes(r, OutputKind::Svg))
}

/// PNG image of the render. Null when PNG support is not compiled.
///
/// # Safety
/// Cf [`rexbox_get_drawing_data`].
#[no_mangle]
pub unsafe extern "C" fn rexbox_render_to_png(render: *const Render, out_len: *mut c_ulong) -> *mut u8 {
    output("rexbox_render_to_png", render, out_len, |b, r| b.render_bytes(r, OutputKind::Png))
}

/// `{"svg": ..., "metrics": {"width", "height", "depth", "ascent"}}`.
///
/// # Safety
/// Cf [`rexbox_get_drawing_data`].
#[no_mangle]
pub unsafe extern "C" fn rexbox_render_to_svg_with_metrics(render: *const Render, out_len: *mut c_ulong) -> *mut u8 {
    output("rexbox_render_to_svg_with_metrics", render, out_len, |b, r| b.svg_with_metrics(r))
}

/// Key character report as JSON.
///
/// # Safety
/// Cf [`rexbox_get_drawing_data`].
#[no_mangle]
pub unsafe extern "C" fn rexbox_get_key_char_metrics(render: *const Render, out_len: *mut c_ulong) -> *mut u8 {
    output("rexbox_get_key_char_metrics", render, out_len, |b, r| b.key_char_metrics(r))
}

/// Adds a reference to a buffer. An unknown buffer starts being tracked.
#[no_mangle]
pub extern "C" fn rexbox_retain_buffer(buf: *mut u8) {
    guarded("rexbox_retain_buffer", (), || { boundary().buffers().retain(buf); })
}

/// Drops a reference to a buffer, freeing it with the last one. An unknown buffer is freed directly.
///
/// # Safety
/// `buf` must be null, a buffer returned by this library and not freed yet, or a pointer from `malloc`.
#[no_mangle]
pub unsafe extern "C" fn rexbox_free_buffer(buf: *mut u8) {
    guarded("rexbox_free_buffer", (), || { boundary().buffers().release(buf); })
}

#[no_mangle]
pub extern "C" fn rexbox_is_little_endian() -> bool {
    cfg!(target_endian = "little")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxes::builders::*;
    use crate::boxes::{BoxTree, Glyph};
    use crate::engine::Formula;
    use crate::error::{LayoutResult, RenderError};

    fn one_glyph(request: &LayoutRequest<'_>, _: &FontRegistry) -> LayoutResult<Formula> {
        if request.tex.is_empty() {
            return Ok(Formula::default());
        }
        let mut tree = BoxTree::new();
        let x = tree.push(char_box(Glyph::new('x', 10.), 6., 10., 2.));
        let root = hbox(&mut tree, [x]);
        tree.set_root(root);
        Ok(Formula { tree, is_split: false })
    }

    fn request(tex: &str) -> LayoutRequest<'_> {
        LayoutRequest {
            tex,
            width: 720,
            text_size: 20.,
            line_space: 20. / 3.,
            foreground: RGBA::from_argb(0xff000000),
            fill_width: true,
            style_override: None,
        }
    }

    #[test]
    fn no_engine_no_render() {
        let boundary = Boundary::new();
        assert_eq!(
            boundary.parse_render(&request("x")).unwrap_err(),
            RenderError::Layout(LayoutError::NoEngine)
        );
    }

    #[test]
    fn parse_render_applies_settings() {
        let boundary = Boundary::new();
        boundary.install_engine(Arc::new(one_glyph));
        boundary.configure(r#"{"debug": {"enabled": true}}"#).unwrap();
        let render = boundary.parse_render(&request("x")).unwrap();
        assert_eq!(render.height(), 24);
        assert_eq!(render.foreground(), RGBA::BLACK);
        assert!(render.tree().len() > 2);
    }

    fn dangling_root(_: &LayoutRequest<'_>, _: &FontRegistry) -> LayoutResult<Formula> {
        let mut other = BoxTree::new();
        let mut last = other.push(strut(1., 1., 0.));
        for _ in 0..3 {
            last = other.push(strut(1., 1., 0.));
        }
        let mut tree = BoxTree::new();
        tree.set_root(last);
        Ok(Formula { tree, is_split: false })
    }

    #[test]
    fn malformed_trees_are_rejected() {
        let boundary = Boundary::new();
        boundary.install_engine(Arc::new(dangling_root));
        assert!(matches!(
            boundary.parse_render(&request("x")),
            Err(RenderError::Layout(LayoutError::MalformedTree(_)))
        ));
    }

    #[test]
    fn queries_never_unwind() {
        // a render built around an unchecked tree panics when measured
        let formula = dangling_root(&request("x"), &FontRegistry::new()).unwrap();
        let render = Render::new(formula.tree, 20., false, &Settings::default());
        let render : *mut Render = Box::into_raw(Box::new(render));
        unsafe {
            assert_eq!(rexbox_get_render_width(render), 0);
            assert_eq!(rexbox_get_render_height(render), 0);
            assert_eq!(rexbox_get_render_depth(render), 0);
            assert!(rexbox_get_render_baseline(render).is_nan());
            rexbox_delete_render(render);
        }
    }

    static REENTRANT : Lazy<Boundary> = Lazy::new(Boundary::new);

    fn reentrant(request: &LayoutRequest<'_>, fonts: &FontRegistry) -> LayoutResult<Formula> {
        REENTRANT.set_render_glyph_use_path(true);
        REENTRANT.release();
        one_glyph(request, fonts)
    }

    #[test]
    fn engine_may_call_back_into_the_boundary() {
        REENTRANT.install_engine(Arc::new(reentrant));
        let render = REENTRANT.parse_render(&request("x")).unwrap();
        assert_eq!(render.width(), 12);
        assert!(REENTRANT.is_render_glyph_use_path());
    }

    unsafe extern "C" fn create_layout(text: *const c_char, font: *const FontDesc) -> c_uint {
        let len = CStr::from_ptr(text).to_bytes().len() as c_float;
        (len * rexbox_font_size(font)) as c_uint
    }

    unsafe extern "C" fn layout_bounds(id: c_uint, bounds: *mut TextLayoutBounds) {
        rexbox_set_text_layout_bounds(bounds, id as c_float, 12., 9.);
    }

    unsafe extern "C" fn release_layout(_: c_uint) {}

    unsafe extern "C" fn layout_path_exists(id: c_uint) -> bool {
        id % 2 == 0
    }

    #[test]
    fn text_layout_callbacks() {
        rexbox_register_callbacks(Some(create_layout), Some(layout_bounds), Some(release_layout), Some(layout_path_exists));
        let layout = boundary().text_layout().unwrap();
        let font = FontDesc { font_size: 10., ..FontDesc::default() };
        let id = layout.create("abc", &font).unwrap();
        assert_eq!(id, 30);
        assert_eq!(layout.bounds(id), TextLayoutBounds { width: 30., height: 12., ascent: 9. });
        assert!(layout.path_exists(id));
        assert!(layout.create("a\0b", &font).is_none());

        rexbox_register_callbacks(Some(create_layout), None, Some(release_layout), Some(layout_path_exists));
        assert!(boundary().text_layout().is_none());
    }

    #[test]
    fn font_description_queries() {
        let desc = FontDesc { is_bold: true, is_italic: false, is_sans_serif: true, is_monospace: false, font_size: 14.5 };
        unsafe {
            assert!(rexbox_is_bold(&desc));
            assert!(!rexbox_is_italic(&desc));
            assert!(rexbox_is_sans_serif(&desc));
            assert!(!rexbox_is_monospace(&desc));
            assert_eq!(rexbox_font_size(&desc), 14.5);

            assert!(!rexbox_is_bold(std::ptr::null()));
            assert!(rexbox_font_size(std::ptr::null()).is_nan());
            rexbox_set_text_layout_bounds(std::ptr::null_mut(), 1., 2., 3.);
        }
    }

    #[test]
    fn hand_over_reports_length() {
        let boundary = Boundary::new();
        let mut len : c_ulong = 99;
        let ptr = unsafe { boundary.hand_over("test", Ok(b"{}".to_vec()), &mut len) };
        assert_eq!(len, 2);
        assert_eq!(boundary.buffers().ref_count(ptr), Some(1));
        unsafe { boundary.buffers().release(ptr) };

        let ptr = unsafe { boundary.hand_over("test", Ok(Vec::new()), &mut len) };
        assert!(ptr.is_null());
        assert_eq!(len, 0);
    }

    #[test]
    fn null_handles_give_sentinels() {
        unsafe {
            assert_eq!(rexbox_get_render_width(std::ptr::null()), 0);
            assert_eq!(rexbox_get_render_height(std::ptr::null()), 0);
            assert!(rexbox_get_render_baseline(std::ptr::null()).is_nan());
            assert!(!rexbox_is_render_split(std::ptr::null()));
            let mut len : c_ulong = 7;
            assert!(rexbox_get_key_char_metrics(std::ptr::null(), &mut len).is_null());
            assert_eq!(len, 0);
            rexbox_set_render_text_size(std::ptr::null_mut(), 12.);
            rexbox_delete_render(std::ptr::null_mut());
            rexbox_free_buffer(std::ptr::null_mut());
        }
    }

    #[test]
    fn version_is_nul_terminated() {
        let version = unsafe { CStr::from_ptr(rexbox_version()) };
        assert_eq!(version.to_str().unwrap(), env!("CARGO_PKG_VERSION"));
    }
}
