//! Character segmentation of a canonical plate image.
//!
//! Dark glyphs are isolated with an inverse fixed threshold, their outer
//! contours are grouped ([`merge`]), and each group's bounding box is cut
//! from the thresholded image, validated and normalized ([`glyph`]).

pub mod glyph;
pub mod merge;

use image::GrayImage;

pub use glyph::{normalize_glyph, GlyphNormalization, GlyphRule};
pub use merge::{merge_fragments, ContourGroup, MergeConfig, WideContourPolicy};

use crate::contours::ContourExtractor;
use crate::plate::CharacterSegment;
use crate::preprocess;

/// Configuration for character segmentation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Pixels at or below this level are treated as ink.
    pub ink_threshold: u8,
    pub merge: MergeConfig,
    pub rule: GlyphRule,
    pub normalization: GlyphNormalization,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            ink_threshold: 60,
            merge: MergeConfig::default(),
            rule: GlyphRule::default(),
            normalization: GlyphNormalization::default(),
        }
    }
}

/// Segment a plate into glyphs, in group discovery order.
pub fn segment_characters(
    plate: &GrayImage,
    config: &SegmentConfig,
    extractor: &dyn ContourExtractor,
) -> Vec<CharacterSegment> {
    segment_characters_traced(plate, config, extractor).0
}

/// Same as [`segment_characters`], also returning the thresholded plate.
pub fn segment_characters_traced(
    plate: &GrayImage,
    config: &SegmentConfig,
    extractor: &dyn ContourExtractor,
) -> (Vec<CharacterSegment>, GrayImage) {
    let binary = preprocess::threshold_binary_inv(plate, config.ink_threshold);
    let contours = extractor.external_contours(&binary);
    let groups = merge_fragments(&contours, &config.merge);

    let mut segments = Vec::with_capacity(groups.len());
    for group in &groups {
        let Some(rect) = group.bounding_rect() else {
            continue;
        };
        let cut =
            image::imageops::crop_imm(&binary, rect.x, rect.y, rect.width, rect.height).to_image();
        if !config.rule.accepts(&cut) {
            tracing::trace!(
                "segment: rejected {}x{} group at ({}, {})",
                rect.width,
                rect.height,
                rect.x,
                rect.y
            );
            continue;
        }
        segments.push(CharacterSegment {
            glyph: normalize_glyph(&cut, &config.normalization, extractor),
            rect,
        });
    }

    tracing::debug!(
        "segment: {} contours -> {} groups -> {} glyphs",
        contours.len(),
        groups.len(),
        segments.len()
    );
    (segments, binary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contours::ImageprocContours;
    use crate::geometry::PixelRect;
    use crate::test_utils::{fill_rect, glyph_plate, BRIGHT, INK};
    use image::Luma;

    #[test]
    fn canonical_plate_yields_one_segment_per_glyph() {
        let segs = segment_characters(&glyph_plate(), &SegmentConfig::default(), &ImageprocContours);
        assert_eq!(segs.len(), 6);
        let mut xs: Vec<u32> = segs.iter().map(|s| s.rect.x).collect();
        xs.sort_unstable();
        assert_eq!(xs, vec![8, 26, 44, 66, 90, 108]);
        let i_glyph = segs.iter().find(|s| s.rect.x == 66).unwrap();
        assert_eq!(i_glyph.rect, PixelRect::new(66, 4, 4, 24));
    }

    #[test]
    fn every_segment_satisfies_glyph_rule() {
        let cfg = SegmentConfig::default();
        let mut plate = glyph_plate();
        // Noise: a solid block and a short speck, both invalid.
        fill_rect(&mut plate, 126, 4, 10, 24, INK);
        fill_rect(&mut plate, 2, 30, 3, 2, INK);
        let (segs, binary) = segment_characters_traced(&plate, &cfg, &ImageprocContours);
        assert_eq!(segs.len(), 6);
        for s in &segs {
            let r = s.rect;
            let cut = image::imageops::crop_imm(&binary, r.x, r.y, r.width, r.height).to_image();
            assert!(cfg.rule.accepts(&cut), "segment {r:?}");
            let side = r.width.max(r.height) + 10;
            assert_eq!(s.glyph.dimensions(), (side, side + 6));
        }
    }

    #[test]
    fn blank_plate_has_no_segments() {
        let plate = GrayImage::from_pixel(144, 33, Luma([BRIGHT]));
        let segs = segment_characters(&plate, &SegmentConfig::default(), &ImageprocContours);
        assert!(segs.is_empty());
    }
}
