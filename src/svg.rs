//! Post-processing of SVG documents: DPI metadata, and fitting the height to the painted paths.
//!
//! Both work on the text of the document with regular expressions, which is enough for the documents
//! our surfaces produce: one `<svg>` root, with glyphs and rules as `<path>` elements.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::error::SurfaceError;

/// Paths reaching less than this below the top are not worth resizing for.
const MIN_PAINTED_HEIGHT : f64 = 0.02;

/// Options applied to every SVG handed out. None of them is on by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct SvgOptions {
    /// Records this resolution as a `data-dpi` attribute of the root element.
    pub dpi: Option<u32>,
    /// Resizes the document to the lowest painted point, centering the content vertically.
    pub fit_height: bool,
}

impl SvgOptions {
    fn is_noop(&self) -> bool {
        self.dpi.is_none() && !self.fit_height
    }
}

type Compiled = Lazy<Result<Regex, regex::Error>>;

static SVG_TAG   : Compiled = Lazy::new(|| Regex::new(r"<svg\b[^>]*?(/?>)"));
static PATH_TAG  : Compiled = Lazy::new(|| Regex::new(r"<path\b[^>]*>"));
static PATH_DATA : Compiled = Lazy::new(|| Regex::new(r#"\sd="([^"]*)""#));
static MATRIX    : Compiled = Lazy::new(|| Regex::new(r#"\stransform="matrix\(([^)]*)\)""#));
static NUMBER    : Compiled = Lazy::new(|| Regex::new(r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?"));
static HEIGHT    : Compiled = Lazy::new(|| Regex::new(r#"(\sheight=")[-+]?[\d.]+([^"]*")"#));
static VIEW_BOX  : Compiled = Lazy::new(|| Regex::new(r#"(\sviewBox=")([^"]*)(")"#));

fn compiled(re: &'static Compiled) -> Result<&'static Regex, SurfaceError> {
    Lazy::force(re).as_ref().map_err(|e| SurfaceError::Finish(format!("invalid SVG pattern: {}", e)))
}

/// Applies `options` to an SVG document.
pub fn post_process(svg: Vec<u8>, options: &SvgOptions) -> Result<Vec<u8>, SurfaceError> {
    if options.is_noop() {
        return Ok(svg);
    }
    let mut svg = String::from_utf8(svg)
        .map_err(|e| SurfaceError::Finish(format!("SVG is not UTF-8: {}", e)))?;
    if let Some(dpi) = options.dpi {
        svg = add_dpi(&svg, dpi)?;
    }
    if options.fit_height {
        svg = fit_height(&svg)?;
    }
    Ok(svg.into_bytes())
}

/// Adds `data-dpi="<dpi>"` to the root element. A document without `<svg>` element is returned as is.
pub fn add_dpi(svg: &str, dpi: u32) -> Result<String, SurfaceError> {
    let end = match compiled(&SVG_TAG)?.captures(svg).and_then(|caps| caps.get(1)) {
        Some(end) => end.start(),
        None => return Ok(svg.to_string()),
    };
    Ok(format!("{} data-dpi=\"{}\"{}", &svg[..end], dpi, &svg[end..]))
}

/// Largest Y coordinate of all path data, after each path's `matrix(...)` transform.
///
/// Coordinates are read in (x, y) pairs, which holds for the move, line and curve commands
/// our surfaces emit.
pub fn max_path_y(svg: &str) -> Result<Option<f64>, SurfaceError> {
    let (path_tag, path_data, matrix, number) =
        (compiled(&PATH_TAG)?, compiled(&PATH_DATA)?, compiled(&MATRIX)?, compiled(&NUMBER)?);
    let numbers = |text: &str| -> Vec<f64> {
        number.find_iter(text).filter_map(|m| m.as_str().parse().ok()).collect()
    };

    let mut max_y : Option<f64> = None;
    for tag in path_tag.find_iter(svg) {
        let tag = tag.as_str();
        let data = match path_data.captures(tag) {
            Some(caps) => numbers(&caps[1]),
            None => continue,
        };
        let transform = matrix.captures(tag)
            .map(|caps| numbers(&caps[1]))
            .filter(|values| values.len() >= 6);

        for pair in data.chunks_exact(2) {
            let (x, y) = (pair[0], pair[1]);
            let y = match &transform {
                Some(m) => m[1] * x + m[3] * y + m[5],
                None => y,
            };
            max_y = Some(max_y.map_or(y, |max| f64::max(max, y)));
        }
    }
    Ok(max_y)
}

/// Sets the height of the document (and of its view box) to the lowest painted point rounded up,
/// and moves the content down by half the added space.
///
/// The document is returned as is when nothing is painted lower than a small tolerance, or when its
/// root element has no content.
pub fn fit_height(svg: &str) -> Result<String, SurfaceError> {
    let max_y = match max_path_y(svg)? {
        Some(y) if y >= MIN_PAINTED_HEIGHT => y,
        _ => return Ok(svg.to_string()),
    };
    let caps = match compiled(&SVG_TAG)?.captures(svg) {
        Some(caps) => caps,
        None => return Ok(svg.to_string()),
    };
    let (tag, end) = match (caps.get(0), caps.get(1)) {
        (Some(tag), Some(end)) if end.as_str() == ">" => (tag, end),
        _ => return Ok(svg.to_string()),
    };
    let close = match svg.rfind("</svg>") {
        Some(close) if close > tag.end() => close,
        _ => return Ok(svg.to_string()),
    };

    let height = max_y.ceil();
    let offset = (height - max_y) / 2.;
    debug!("fitting SVG height to {} (lowest point {})", height, max_y);

    let attributes = &svg[tag.start()..end.start()];
    let height_attr = compiled(&HEIGHT)?;
    let attributes = if height_attr.is_match(attributes) {
        height_attr.replace(attributes, |caps: &Captures<'_>| format!("{}{}{}", &caps[1], height, &caps[2]))
    } else {
        format!("{} height=\"{}\"", attributes, height).into()
    };
    let attributes = compiled(&VIEW_BOX)?.replace(&attributes, |caps: &Captures<'_>| {
        let parts : Vec<&str> = caps[2].split_whitespace().collect();
        match parts.as_slice() {
            [x, y, width, _] => format!("{}{} {} {} {}{}", &caps[1], x, y, width, height, &caps[3]),
            _ => caps[0].to_string(),
        }
    });

    Ok(format!(
        "{}{}><g transform=\"translate(0, {})\">{}</g>{}",
        &svg[..tag.start()],
        attributes,
        offset,
        &svg[tag.end()..close],
        &svg[close..],
    ))
}
