//! High-level read API.
//!
//! [`PlateReader`] is the primary entry point. It wraps a [`ReadConfig`],
//! the compiled plate grammar and the region-level backends, and exposes
//! the full pipeline plus its individual stages.

use image::{GrayImage, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::classify::PlateClassifier;
use crate::config::ReadConfig;
use crate::contours::{ContourExtractor, ImageprocContours};
use crate::error::PlateResult;
use crate::geometry::RotatedRegion;
use crate::ocr::CharacterRecognizer;
use crate::pipeline::{self, Backends, ReadResult};
use crate::plate::{CharacterSegment, Plate, PlateCandidate};
use crate::region::{self, FixedRangeFloodFill, FloodFiller, ProposalTrace};
use crate::segment;
use crate::syntax::SyntaxCorrector;

/// Primary plate reading interface.
///
/// Create once, read many images. The reader holds no per-image state.
///
/// # Examples
///
/// ```no_run
/// use platescan::{AcceptAll, CharacterRecognizer, PlateReader, PlateResult, ReadConfig};
/// use image::GrayImage;
///
/// struct Blind;
/// impl CharacterRecognizer for Blind {
///     fn recognize(&mut self, _glyph: &GrayImage) -> PlateResult<String> {
///         Ok(String::new())
///     }
/// }
///
/// let reader = PlateReader::new(ReadConfig::default()).unwrap();
/// let image = image::open("car.jpg").unwrap().to_rgb8();
/// let result = reader.read(&image, &AcceptAll, &mut Blind);
/// for plate in &result.plates {
///     println!("{} at {:?}", plate.text, plate.position);
/// }
/// ```
pub struct PlateReader {
    config: ReadConfig,
    corrector: SyntaxCorrector,
    extractor: Box<dyn ContourExtractor + Send + Sync>,
    filler: Box<dyn FloodFiller + Send + Sync>,
}

impl PlateReader {
    /// Create a reader with the default imageproc-based backends.
    ///
    /// Fails when the grammar patterns do not compile.
    pub fn new(config: ReadConfig) -> PlateResult<Self> {
        let corrector = SyntaxCorrector::new(&config.grammar)?;
        Ok(Self {
            config,
            corrector,
            extractor: Box::new(ImageprocContours),
            filler: Box::new(FixedRangeFloodFill),
        })
    }

    /// Replace the contour extraction and flood-fill backends.
    pub fn with_backends(
        mut self,
        extractor: Box<dyn ContourExtractor + Send + Sync>,
        filler: Box<dyn FloodFiller + Send + Sync>,
    ) -> Self {
        self.extractor = extractor;
        self.filler = filler;
        self
    }

    /// Access the current configuration.
    pub fn config(&self) -> &ReadConfig {
        &self.config
    }

    fn backends(&self) -> Backends<'_> {
        Backends {
            extractor: self.extractor.as_ref(),
            filler: self.filler.as_ref(),
        }
    }

    /// Seed RNG for one read: fixed when `config.seed` is set, fresh
    /// entropy otherwise.
    fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn corrector(&self) -> Option<&SyntaxCorrector> {
        self.config.syntax_correction.then_some(&self.corrector)
    }

    /// Read every plate in a color image.
    pub fn read(
        &self,
        image: &RgbImage,
        classifier: &dyn PlateClassifier,
        recognizer: &mut dyn CharacterRecognizer,
    ) -> ReadResult {
        let mut rng = self.rng();
        self.read_with_rng(image, classifier, recognizer, &mut rng)
    }

    /// [`read`](Self::read) with an explicit random source for flood-fill
    /// seeds.
    pub fn read_with_rng<R: Rng + ?Sized>(
        &self,
        image: &RgbImage,
        classifier: &dyn PlateClassifier,
        recognizer: &mut dyn CharacterRecognizer,
        rng: &mut R,
    ) -> ReadResult {
        pipeline::read_image(
            image,
            &self.config,
            self.corrector(),
            self.backends(),
            classifier,
            recognizer,
            rng,
        )
    }

    /// Proposed plate regions, with every intermediate proposal image.
    pub fn propose(&self, image: &RgbImage) -> (Vec<RotatedRegion>, ProposalTrace) {
        region::propose_regions_traced(
            image,
            &self.config.proposal,
            &self.config.plate_size,
            self.extractor.as_ref(),
        )
    }

    /// Refined canonical plate candidates, before classification.
    pub fn candidates(&self, image: &RgbImage) -> Vec<PlateCandidate> {
        let mut rng = self.rng();
        self.candidates_with_rng(image, &mut rng)
    }

    pub fn candidates_with_rng<R: Rng + ?Sized>(
        &self,
        image: &RgbImage,
        rng: &mut R,
    ) -> Vec<PlateCandidate> {
        pipeline::find_candidates(image, &self.config, self.backends(), rng).0
    }

    /// Segment a canonical plate image into glyphs. Also returns the
    /// thresholded plate.
    pub fn segment(&self, plate: &GrayImage) -> (Vec<CharacterSegment>, GrayImage) {
        segment::segment_characters_traced(plate, &self.config.segment, self.extractor.as_ref())
    }

    /// Segment and recognize an accepted plate; characters end up sorted
    /// left to right.
    pub fn recognize(
        &self,
        plate: &mut Plate,
        recognizer: &mut dyn CharacterRecognizer,
    ) -> PlateResult<()> {
        pipeline::recognize_plate(plate, &self.config, self.extractor.as_ref(), recognizer)
    }

    /// Apply the syntax corrector (regardless of `config.syntax_correction`).
    pub fn correct(&self, raw: &str) -> String {
        self.corrector.correct(raw)
    }
}
