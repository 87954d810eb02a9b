//! platescan: license plate localisation, character segmentation and
//! syntax correction.
//!
//! The pipeline stages are:
//!
//! 1. **Proposal** – x-derivative edges, morphology and minimum-area
//!    rectangles yield oriented plate-sized regions.
//! 2. **Refinement** – seeded flood fill, rectangle refit, rotation
//!    normalization and resampling to a canonical 144x33 plate.
//! 3. **Classification** – an external plate/non-plate decision on the
//!    flattened canonical plate.
//! 4. **Segmentation** – inverse threshold, fragment merging, glyph
//!    validation and normalization.
//! 5. **Recognition** – an external single-glyph OCR engine, with one
//!    retry behind an isolation border.
//! 6. **Syntax correction** – letter/digit look-alike repair against the
//!    regional plate grammar.
//!
//! # Public API
//! - [`PlateReader`] as the primary entry point
//! - [`ReadConfig`] for tuning every stage
//! - the collaborator traits [`PlateClassifier`] and [`CharacterRecognizer`]
//!   and the backend traits [`ContourExtractor`] and [`FloodFiller`]
//! - result structures ([`ReadResult`], [`RecognizedPlate`])

mod api;
mod classify;
mod config;
mod contours;
mod error;
mod geometry;
mod ocr;
mod pipeline;
mod plate;
mod preprocess;
mod region;
mod segment;
mod syntax;

#[cfg(test)]
pub(crate) mod test_utils;

pub use api::PlateReader;
pub use classify::{AcceptAll, LinearPlateClassifier, PlateClassifier};
pub use config::ReadConfig;
pub use contours::{Contour, ContourExtractor, ImageprocContours};
pub use error::{PlateError, PlateResult};
pub use geometry::{min_area_rect, PixelRect, PlateSizeRule, RotatedRegion};
pub use ocr::{CharacterRecognizer, OcrConfig, PLATE_WHITELIST};
#[cfg(feature = "tesseract")]
pub use ocr::TesseractRecognizer;
pub use pipeline::{annotate, ReadResult, RecognizedPlate};
pub use plate::{CharacterSegment, Plate, PlateCandidate, PlateChar};
pub use preprocess::RectKernel;
pub use region::{
    propose_regions, propose_regions_traced, refine_region, seed_points, FixedRangeFloodFill,
    FloodFiller, ProposalConfig, ProposalTrace, RefineConfig,
};
pub use segment::{
    merge_fragments, normalize_glyph, segment_characters, segment_characters_traced,
    ContourGroup, GlyphNormalization, GlyphRule, MergeConfig, SegmentConfig, WideContourPolicy,
};
pub use syntax::{PlateGrammar, SyntaxCorrector};
