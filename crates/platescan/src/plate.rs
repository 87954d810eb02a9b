//! Plate-level data carried between pipeline stages.

use image::GrayImage;

use crate::geometry::{PixelRect, RotatedRegion};

/// A refined region resampled to the canonical plate size.
#[derive(Debug, Clone)]
pub struct PlateCandidate {
    /// Canonical grayscale plate (orientation, size and contrast normalized).
    pub image: GrayImage,
    /// Upright bounding rectangle of the refined region in the source image.
    pub position: PixelRect,
    /// Refined oriented region in source-image coordinates.
    pub region: RotatedRegion,
}

impl PlateCandidate {
    /// Row-major flattened pixels, the classifier's feature vector.
    pub fn features(&self) -> &[u8] {
        self.image.as_raw()
    }
}

/// A segmented glyph and where it came from on the plate.
#[derive(Debug, Clone)]
pub struct CharacterSegment {
    /// Padded, polarity-inverted glyph (dark ink on white).
    pub glyph: GrayImage,
    /// Bounding rectangle in plate-local coordinates.
    pub rect: PixelRect,
}

/// One recognized character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlateChar {
    pub ch: char,
    /// Bounding rectangle in plate-local coordinates.
    pub rect: PixelRect,
}

/// A candidate accepted by the classifier, with its recognized characters.
///
/// Characters are pushed in recognition order; [`Plate::sort_characters`]
/// puts them left to right.
#[derive(Debug, Clone)]
pub struct Plate {
    pub candidate: PlateCandidate,
    pub characters: Vec<PlateChar>,
}

impl Plate {
    pub fn new(candidate: PlateCandidate) -> Self {
        Self {
            candidate,
            characters: Vec::new(),
        }
    }

    pub fn push(&mut self, ch: char, rect: PixelRect) {
        self.characters.push(PlateChar { ch, rect });
    }

    /// Stable sort by the left edge of each character box.
    pub fn sort_characters(&mut self) {
        self.characters.sort_by_key(|c| c.rect.x);
    }

    /// Characters concatenated in their current order.
    pub fn text(&self) -> String {
        self.characters.iter().map(|c| c.ch).collect()
    }
}
