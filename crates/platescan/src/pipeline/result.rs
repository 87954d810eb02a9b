use crate::geometry::{PixelRect, RotatedRegion};
use crate::plate::PlateChar;

/// A plate that was accepted, read and (optionally) syntax-corrected.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RecognizedPlate {
    /// Final plate string.
    pub text: String,
    /// Characters as recognized, sorted left to right, before correction.
    pub raw_text: String,
    /// Upright bounding rectangle in source-image pixels.
    pub position: PixelRect,
    /// Refined oriented region in source-image pixels.
    pub region: RotatedRegion,
    /// Recognized characters, left to right. Boxes are in canonical plate
    /// coordinates.
    pub characters: Vec<PlateChar>,
}

/// Full read result for a single image.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ReadResult {
    /// Plates with a non-empty string.
    pub plates: Vec<RecognizedPlate>,
    /// Image dimensions [width, height].
    pub image_size: [u32; 2],
    /// Canonical plate dimensions [width, height] used for character boxes.
    pub plate_size: [u32; 2],
    /// Regions produced by proposal.
    pub n_regions: usize,
    /// Regions that survived refinement.
    pub n_candidates: usize,
    /// Candidates accepted by the classifier.
    pub n_accepted: usize,
    /// Candidates dropped because a collaborator failed.
    pub n_dropped: usize,
}

impl ReadResult {
    /// Construct an empty result for an image with the provided dimensions.
    pub fn empty(width: u32, height: u32, plate_size: [u32; 2]) -> Self {
        Self {
            plates: Vec::new(),
            image_size: [width, height],
            plate_size,
            n_regions: 0,
            n_candidates: 0,
            n_accepted: 0,
            n_dropped: 0,
        }
    }

    /// Map a canonical-plate character box back into source pixels.
    ///
    /// Uses the plate's upright bounding box, so the mapping is approximate
    /// for rotated plates.
    pub fn char_rect_in_image(&self, plate: &RecognizedPlate, rect: PixelRect) -> PixelRect {
        let [pw, ph] = self.plate_size;
        if pw == 0 || ph == 0 {
            return plate.position;
        }
        let sx = plate.position.width as f32 / pw as f32;
        let sy = plate.position.height as f32 / ph as f32;
        let x0 = plate.position.x as f32 + rect.x as f32 * sx;
        let y0 = plate.position.y as f32 + rect.y as f32 * sy;
        PixelRect::new(
            x0.round() as u32,
            y0.round() as u32,
            ((rect.width as f32 * sx).round() as u32).max(1),
            ((rect.height as f32 * sy).round() as u32).max(1),
        )
    }
}
