//! Top-level pipeline orchestrator: propose -> refine -> classify -> segment
//! -> recognize -> correct.

use image::RgbImage;
use rand::Rng;

use super::{ReadResult, RecognizedPlate};
use crate::classify::PlateClassifier;
use crate::config::ReadConfig;
use crate::contours::ContourExtractor;
use crate::error::PlateResult;
use crate::ocr::{self, CharacterRecognizer};
use crate::plate::{Plate, PlateCandidate};
use crate::region::{self, FloodFiller};
use crate::segment;
use crate::syntax::SyntaxCorrector;

/// Region-level capabilities used by proposal, refinement and segmentation.
#[derive(Clone, Copy)]
pub(crate) struct Backends<'a> {
    pub extractor: &'a dyn ContourExtractor,
    pub filler: &'a dyn FloodFiller,
}

/// Proposal plus refinement. Returns the candidates and the number of
/// proposed regions.
pub(crate) fn find_candidates<R: Rng + ?Sized>(
    image: &RgbImage,
    config: &ReadConfig,
    backends: Backends<'_>,
    rng: &mut R,
) -> (Vec<PlateCandidate>, usize) {
    let regions = region::propose_regions(
        image,
        &config.proposal,
        &config.plate_size,
        backends.extractor,
    );
    let candidates: Vec<PlateCandidate> = regions
        .iter()
        .filter_map(|r| {
            region::refine_region(
                image,
                r,
                &config.refine,
                &config.plate_size,
                backends.filler,
                &mut *rng,
            )
        })
        .collect();
    tracing::debug!(
        "refine: {} regions -> {} candidates",
        regions.len(),
        candidates.len()
    );
    (candidates, regions.len())
}

/// Segment and recognize every glyph of an accepted plate, then sort the
/// characters left to right.
pub(crate) fn recognize_plate(
    plate: &mut Plate,
    config: &ReadConfig,
    extractor: &dyn ContourExtractor,
    recognizer: &mut dyn CharacterRecognizer,
) -> PlateResult<()> {
    let segments = segment::segment_characters(&plate.candidate.image, &config.segment, extractor);
    for seg in &segments {
        if let Some(ch) = ocr::recognize_with_retry(recognizer, &seg.glyph, &config.ocr)? {
            plate.push(ch, seg.rect);
        }
    }
    plate.sort_characters();
    Ok(())
}

/// Classify, read and correct refined candidates into `result`.
pub(crate) fn read_candidates(
    candidates: Vec<PlateCandidate>,
    config: &ReadConfig,
    corrector: Option<&SyntaxCorrector>,
    extractor: &dyn ContourExtractor,
    classifier: &dyn PlateClassifier,
    recognizer: &mut dyn CharacterRecognizer,
    result: &mut ReadResult,
) {
    for candidate in candidates {
        match classifier.predict(candidate.features()) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                tracing::warn!(
                    "classifier failed for candidate at {:?}: {e}",
                    candidate.position
                );
                result.n_dropped += 1;
                continue;
            }
        }
        result.n_accepted += 1;

        let mut plate = Plate::new(candidate);
        if let Err(e) = recognize_plate(&mut plate, config, extractor, recognizer) {
            tracing::warn!(
                "recognizer failed for plate at {:?}: {e}",
                plate.candidate.position
            );
            result.n_dropped += 1;
            continue;
        }

        let raw_text = plate.text();
        let text = match corrector {
            Some(c) => c.correct(&raw_text),
            None => raw_text.clone(),
        };
        if text.is_empty() {
            tracing::debug!(
                "plate at {:?} read as empty string",
                plate.candidate.position
            );
            continue;
        }

        result.plates.push(RecognizedPlate {
            text,
            raw_text,
            position: plate.candidate.position,
            region: plate.candidate.region,
            characters: plate.characters,
        });
    }
}

/// Run the full pipeline on one image.
pub(crate) fn read_image<R: Rng + ?Sized>(
    image: &RgbImage,
    config: &ReadConfig,
    corrector: Option<&SyntaxCorrector>,
    backends: Backends<'_>,
    classifier: &dyn PlateClassifier,
    recognizer: &mut dyn CharacterRecognizer,
    rng: &mut R,
) -> ReadResult {
    let (w, h) = image.dimensions();
    let mut result = ReadResult::empty(
        w,
        h,
        [config.refine.plate_width, config.refine.plate_height],
    );
    if w == 0 || h == 0 {
        tracing::debug!("read: empty {}x{} image", w, h);
        return result;
    }
    let (candidates, n_regions) = find_candidates(image, config, backends, rng);
    result.n_regions = n_regions;
    result.n_candidates = candidates.len();

    read_candidates(
        candidates,
        config,
        corrector,
        backends.extractor,
        classifier,
        recognizer,
        &mut result,
    );

    tracing::debug!(
        "read: {} regions, {} candidates, {} accepted, {} dropped, {} plates",
        result.n_regions,
        result.n_candidates,
        result.n_accepted,
        result.n_dropped,
        result.plates.len()
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::AcceptAll;
    use crate::contours::ImageprocContours;
    use crate::error::PlateError;
    use crate::geometry::{PixelRect, RotatedRegion};
    use crate::region::FixedRangeFloodFill;
    use crate::test_utils::{glyph_plate, striped_plate_scene};
    use image::GrayImage;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::VecDeque;

    struct RejectAll;

    impl PlateClassifier for RejectAll {
        fn predict(&self, _features: &[u8]) -> PlateResult<bool> {
            Ok(false)
        }
    }

    struct BrokenClassifier;

    impl PlateClassifier for BrokenClassifier {
        fn predict(&self, _features: &[u8]) -> PlateResult<bool> {
            Err(PlateError::Classifier("model not loaded".into()))
        }
    }

    /// Answers from a fixed script, then empty strings.
    struct Scripted(VecDeque<PlateResult<String>>);

    impl Scripted {
        fn chars(s: &str) -> Self {
            Self(s.chars().map(|c| Ok(c.to_string())).collect())
        }
    }

    impl CharacterRecognizer for Scripted {
        fn recognize(&mut self, _glyph: &GrayImage) -> PlateResult<String> {
            self.0.pop_front().unwrap_or_else(|| Ok(String::new()))
        }
    }

    fn candidate() -> PlateCandidate {
        PlateCandidate {
            image: glyph_plate(),
            position: PixelRect::new(40, 50, 200, 46),
            region: RotatedRegion::new([139.5, 72.5], [45.0, 199.0], -90.0),
        }
    }

    fn read(
        config: &ReadConfig,
        corrector: Option<&SyntaxCorrector>,
        classifier: &dyn PlateClassifier,
        recognizer: &mut dyn CharacterRecognizer,
    ) -> ReadResult {
        let mut result = ReadResult::empty(320, 240, [144, 33]);
        read_candidates(
            vec![candidate()],
            config,
            corrector,
            &ImageprocContours,
            classifier,
            recognizer,
            &mut result,
        );
        result
    }

    #[test]
    fn accepted_plate_is_read_sorted_and_corrected() {
        let cfg = ReadConfig::default();
        let corrector = SyntaxCorrector::new(&cfg.grammar).unwrap();
        let mut ocr = Scripted::chars("bgG2ab");
        let result = read(&cfg, Some(&corrector), &AcceptAll, &mut ocr);
        assert_eq!(result.n_accepted, 1);
        assert_eq!(result.plates.len(), 1);
        let plate = &result.plates[0];
        assert_eq!(plate.raw_text, "BGG2AB");
        assert_eq!(plate.text, "BG62AB");
        assert_eq!(plate.position, PixelRect::new(40, 50, 200, 46));
        assert_eq!(plate.characters.len(), 6);
        assert!(plate
            .characters
            .windows(2)
            .all(|w| w[0].rect.x < w[1].rect.x));
    }

    #[test]
    fn correction_can_be_skipped() {
        let cfg = ReadConfig::default();
        let mut ocr = Scripted::chars("BGG2AB");
        let result = read(&cfg, None, &AcceptAll, &mut ocr);
        assert_eq!(result.plates[0].text, "BGG2AB");
    }

    #[test]
    fn rejected_candidate_is_discarded() {
        let cfg = ReadConfig::default();
        let mut ocr = Scripted::chars("BG1234");
        let result = read(&cfg, None, &RejectAll, &mut ocr);
        assert_eq!(result.n_accepted, 0);
        assert_eq!(result.n_dropped, 0);
        assert!(result.plates.is_empty());
        assert_eq!(ocr.0.len(), 6, "OCR must not run on rejected plates");
    }

    #[test]
    fn collaborator_failures_drop_the_candidate() {
        let cfg = ReadConfig::default();
        let mut ocr = Scripted::chars("BG1234");
        let result = read(&cfg, None, &BrokenClassifier, &mut ocr);
        assert_eq!(result.n_dropped, 1);
        assert!(result.plates.is_empty());

        let mut failing = Scripted(VecDeque::from(vec![
            Ok("B".to_string()),
            Err(PlateError::Recognizer("engine crashed".into())),
        ]));
        let result = read(&cfg, None, &AcceptAll, &mut failing);
        assert_eq!(result.n_accepted, 1);
        assert_eq!(result.n_dropped, 1);
        assert!(result.plates.is_empty());
    }

    #[test]
    fn unreadable_plate_is_excluded() {
        let cfg = ReadConfig::default();
        let mut ocr = Scripted(VecDeque::new());
        let result = read(&cfg, None, &AcceptAll, &mut ocr);
        assert_eq!(result.n_accepted, 1);
        assert!(result.plates.is_empty());
    }

    #[test]
    fn empty_retry_answers_shorten_the_string() {
        let cfg = ReadConfig::default();
        // Second glyph: empty, then empty again after the border retry.
        let mut ocr = Scripted(VecDeque::from(vec![
            Ok("B".to_string()),
            Ok(String::new()),
            Ok(String::new()),
            Ok("1".to_string()),
            Ok("2".to_string()),
            Ok("3".to_string()),
            Ok("A".to_string()),
        ]));
        let result = read(&cfg, None, &AcceptAll, &mut ocr);
        assert_eq!(result.plates[0].raw_text, "B123A");
        assert_eq!(result.plates[0].characters.len(), 5);
    }

    #[test]
    fn image_without_plates_reads_cleanly() {
        let cfg = ReadConfig::default();
        let img = striped_plate_scene(400, 300, [100, 130], [200, 40]);
        let backends = Backends {
            extractor: &ImageprocContours,
            filler: &FixedRangeFloodFill,
        };
        let mut ocr = Scripted(VecDeque::new());
        let result = read_image(
            &img,
            &cfg,
            None,
            backends,
            &AcceptAll,
            &mut ocr,
            &mut StdRng::seed_from_u64(1),
        );
        assert_eq!(result.image_size, [400, 300]);
        assert!(result.n_regions >= 1);
        assert!(result.n_candidates <= result.n_regions);
        assert!(result.n_accepted <= result.n_candidates);
        assert!(result.plates.iter().all(|p| !p.text.is_empty()));
    }
}
