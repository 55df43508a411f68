//! JSON payloads handed over the boundary: pixel metrics, SVG with metrics, and key character metrics.

use crate::boxes::CharMetrics;
use crate::error::BufferError;
use crate::handle::Render;


/// Pixel dimensions of a render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[derive(Serialize, Deserialize)]
pub struct RenderMetrics {
    /// width
    pub width: i32,
    /// total height, ascent + depth
    pub height: i32,
    /// below the baseline
    pub depth: i32,
    /// above the baseline
    pub ascent: i32,
}

impl RenderMetrics {
    /// Width over total height, 1 when the render has no height.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height > 0 {
            self.width as f32 / self.height as f32
        } else {
            1.0
        }
    }

    /// Share of the total height above the baseline: close to 1 for formulas made of superscripts,
    /// close to 0 for deep fractions. 0.5 when the render has no height.
    pub fn baseline_ratio(&self) -> f32 {
        if self.height > 0 {
            self.ascent as f32 / self.height as f32
        } else {
            0.5
        }
    }
}

#[derive(Serialize)]
struct SvgWithMetrics<'a> {
    svg: &'a str,
    metrics: RenderMetrics,
}

/// Wraps an SVG document and the render's metrics in one JSON object: `{"svg": "...", "metrics": {...}}`.
pub fn svg_with_metrics(svg: &[u8], metrics: RenderMetrics) -> Result<Vec<u8>, BufferError> {
    let svg = String::from_utf8_lossy(svg);
    let payload = SvgWithMetrics { svg: &svg, metrics };
    Ok(serde_json::to_vec(&payload)?)
}


/// Heights of key characters converted to pixels, with summary statistics.
///
/// Aggregates of an empty list are all zero.
#[derive(Debug, Clone, PartialEq, Default)]
#[derive(Serialize, Deserialize)]
pub struct KeyCharReport {
    pub key_char_heights: Vec<f64>,
    pub key_char_count: usize,
    pub average_char_height: f64,
    pub max_char_height: f64,
    pub min_char_height: f64,
    /// Ascent of the root in internal units, as used for the conversion
    pub box_tree_height: f64,
}

impl KeyCharReport {
    /// Converts glyph heights by `box_tree_height / rendered_height` (internal units per pixel),
    /// or leaves them as they are when either is not positive.
    pub fn new(metrics: &CharMetrics, box_tree_height: f64, rendered_height: i32) -> Self {
        let rendered_height = f64::from(rendered_height);
        let ratio = if box_tree_height > 0. && rendered_height > 0. {
            box_tree_height / rendered_height
        } else {
            1.0
        };

        let key_char_heights : Vec<f64> = metrics.heights.iter()
            .map(|h| h.to_unitless() / ratio)
            .filter(|&h| h > 0.)
            .collect();

        let mut sum = 0.;
        let mut max = 0.;
        let mut min = f64::MAX;
        for &h in &key_char_heights {
            sum += h;
            max = f64::max(max, h);
            min = f64::min(min, h);
        }
        let count = key_char_heights.len();
        let (average, min) = match count {
            0 => (0., 0.),
            n => (sum / n as f64, min),
        };

        Self {
            key_char_heights,
            key_char_count: count,
            average_char_height: average,
            max_char_height: max,
            min_char_height: min,
            box_tree_height,
        }
    }

    /// Report for the current state of `render`.
    pub fn from_render(render: &Render) -> Self {
        Self::new(
            &render.key_char_metrics(),
            render.box_tree_height().to_unitless(),
            render.height(),
        )
    }

    /// JSON serialization of the report
    pub fn to_json(&self) -> Result<Vec<u8>, BufferError> {
        Ok(serde_json::to_vec(self)?)
    }
}
