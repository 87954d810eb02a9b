//! Glyph validation and normalization.

use image::GrayImage;

use crate::contours::ContourExtractor;
use crate::preprocess::{self, RectKernel};

/// Size and fill rule for a cut-out character.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GlyphRule {
    /// Maximum foreground fraction of the bounding box.
    pub max_fill: f32,
    /// Exclusive lower bound on width / height.
    pub min_aspect: f32,
    /// Nominal character width / height.
    pub aspect_ratio: f32,
    /// Relative tolerance above `aspect_ratio`; the upper bound is exclusive.
    pub aspect_tolerance: f32,
    /// Minimum glyph height (pixels).
    pub min_height: u32,
    /// Exclusive upper bound on glyph width (pixels).
    pub max_width: u32,
}

impl Default for GlyphRule {
    fn default() -> Self {
        Self {
            max_fill: 0.99,
            min_aspect: 0.10,
            aspect_ratio: 45.0 / 77.0,
            aspect_tolerance: 0.35,
            min_height: 22,
            max_width: 28,
        }
    }
}

impl GlyphRule {
    pub fn max_aspect(&self) -> f32 {
        self.aspect_ratio * (1.0 + self.aspect_tolerance)
    }

    /// Check a binary glyph cut (non-zero = ink) against the rule.
    pub fn accepts(&self, glyph: &GrayImage) -> bool {
        let (w, h) = glyph.dimensions();
        if w == 0 || h == 0 {
            return false;
        }
        let fill = preprocess::count_nonzero(glyph) as f32 / (w * h) as f32;
        let aspect = w as f32 / h as f32;
        fill <= self.max_fill
            && aspect > self.min_aspect
            && aspect < self.max_aspect()
            && h >= self.min_height
            && w < self.max_width
    }
}

/// Padding and cleanup applied to accepted glyphs.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GlyphNormalization {
    /// Added to the longer glyph side to get the canvas width.
    pub padding: u32,
    /// Extra rows below the square canvas.
    pub extra_rows: u32,
    /// Downward shift of the glyph from the canvas center (pixels).
    pub vertical_bias: u32,
    /// Closing kernel applied to glyphs that enclose a hole.
    pub hole_close_kernel: RectKernel,
    /// Opening kernel applied after `hole_close_kernel`.
    pub hole_open_kernel: RectKernel,
}

impl Default for GlyphNormalization {
    fn default() -> Self {
        Self {
            padding: 10,
            extra_rows: 6,
            vertical_bias: 3,
            hole_close_kernel: RectKernel::new(1, 5),
            hole_open_kernel: RectKernel::new(2, 2),
        }
    }
}

/// Pad a binary glyph onto a canvas, clean looped glyphs and invert.
///
/// The canvas is `side` wide and `side + extra_rows` tall, with
/// `side = max(w, h) + padding`; the glyph is offset by
/// `(side/2 - w/2, side/2 - h/2 + vertical_bias)` (integer division).
pub fn normalize_glyph(
    glyph: &GrayImage,
    config: &GlyphNormalization,
    extractor: &dyn ContourExtractor,
) -> GrayImage {
    let (w, h) = glyph.dimensions();
    let side = w.max(h) + config.padding;
    let mut canvas = GrayImage::new(side, side + config.extra_rows);
    let tx = (side / 2) as i64 - (w / 2) as i64;
    let ty = (side / 2) as i64 - (h / 2) as i64 + config.vertical_bias as i64;
    image::imageops::replace(&mut canvas, glyph, tx, ty);

    if extractor.has_hole(&canvas) {
        canvas = preprocess::close(&canvas, config.hole_close_kernel, 1);
        canvas = preprocess::open(&canvas, config.hole_open_kernel, 1);
    }
    preprocess::invert(&canvas)
}
