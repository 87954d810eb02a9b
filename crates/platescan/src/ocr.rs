//! Character recognition contract and the retry rule around it.
//!
//! The recognizer itself is external. This module owns what the pipeline
//! does with its answers: take the first character of the trimmed,
//! uppercased text, and when nothing comes back, draw a thin isolation
//! border inside the glyph and ask exactly once more.

use image::{GrayImage, Luma};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::error::PlateResult;

/// Characters a recognizer may return for plate glyphs.
pub const PLATE_WHITELIST: &str =
    "0123456789abcdefghijklmnoprstuwxyzABCČĆDĐEFGHIJKLMNOPRSŠTUVWXYZŽ";

/// Single-glyph recognizer.
///
/// Implementations read one normalized glyph (dark ink on white) and return
/// whatever text they see, possibly empty. Errors abort OCR for the plate.
pub trait CharacterRecognizer {
    fn recognize(&mut self, glyph: &GrayImage) -> PlateResult<String>;
}

/// OCR settings.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Recognizer language code(s), e.g. `hrv+eng`.
    pub language: String,
    /// Allowed output characters.
    pub whitelist: String,
    /// Inset of the isolation border from the glyph edges (pixels).
    pub border_inset: u32,
    /// Retry once with an isolation border when the first answer is empty.
    pub retry_with_border: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "hrv+eng".to_string(),
            whitelist: PLATE_WHITELIST.to_string(),
            border_inset: 2,
            retry_with_border: true,
        }
    }
}

/// First character of the trimmed, uppercased text.
///
/// Uppercasing can expand a character (e.g. `ß`); only the first produced
/// character is kept.
pub fn first_char(text: &str) -> Option<char> {
    text.trim().chars().next().and_then(|c| c.to_uppercase().next())
}

/// Copy of `glyph` with a one-pixel black rectangle `inset` pixels inside
/// each edge. Glyphs too small for the border are returned unchanged.
pub fn draw_isolation_border(glyph: &GrayImage, inset: u32) -> GrayImage {
    let mut out = glyph.clone();
    let (w, h) = glyph.dimensions();
    if w > 2 * inset && h > 2 * inset {
        let rect = Rect::at(inset as i32, inset as i32).of_size(w - 2 * inset, h - 2 * inset);
        draw_hollow_rect_mut(&mut out, rect, Luma([0u8]));
    }
    out
}

/// Recognize one glyph, retrying once with an isolation border if the first
/// answer has no characters. `Ok(None)` means both attempts came back empty.
pub fn recognize_with_retry(
    recognizer: &mut dyn CharacterRecognizer,
    glyph: &GrayImage,
    config: &OcrConfig,
) -> PlateResult<Option<char>> {
    if let Some(c) = first_char(&recognizer.recognize(glyph)?) {
        return Ok(Some(c));
    }
    if !config.retry_with_border {
        return Ok(None);
    }
    let bordered = draw_isolation_border(glyph, config.border_inset);
    let c = first_char(&recognizer.recognize(&bordered)?);
    if c.is_none() {
        tracing::trace!("ocr: empty answer after isolation border");
    }
    Ok(c)
}

#[cfg(feature = "tesseract")]
mod tesseract {
    use std::io::Cursor;

    use image::{DynamicImage, GrayImage, ImageFormat};
    use leptess::{LepTess, Variable};

    use super::{CharacterRecognizer, OcrConfig};
    use crate::error::{PlateError, PlateResult};

    /// Tesseract page segmentation mode "treat the image as a single word".
    const PSM_SINGLE_WORD: &str = "8";

    /// [`CharacterRecognizer`] backed by Tesseract through `leptess`.
    pub struct TesseractRecognizer {
        engine: LepTess,
    }

    impl TesseractRecognizer {
        /// Initialize Tesseract for `config.language`, with traineddata looked
        /// up in `data_path` (or Tesseract's default location).
        pub fn new(data_path: Option<&str>, config: &OcrConfig) -> PlateResult<Self> {
            let mut engine = LepTess::new(data_path, &config.language)
                .map_err(|e| PlateError::Recognizer(e.to_string()))?;
            engine
                .set_variable(Variable::TesseditCharWhitelist, &config.whitelist)
                .map_err(|e| PlateError::Recognizer(e.to_string()))?;
            engine
                .set_variable(Variable::TesseditPagesegMode, PSM_SINGLE_WORD)
                .map_err(|e| PlateError::Recognizer(e.to_string()))?;
            Ok(Self { engine })
        }
    }

    impl CharacterRecognizer for TesseractRecognizer {
        fn recognize(&mut self, glyph: &GrayImage) -> PlateResult<String> {
            let mut png = Vec::new();
            DynamicImage::ImageLuma8(glyph.clone())
                .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
            self.engine
                .set_image_from_mem(&png)
                .map_err(|e| PlateError::Recognizer(e.to_string()))?;
            self.engine
                .get_utf8_text()
                .map_err(|e| PlateError::Recognizer(e.to_string()))
        }
    }
}

#[cfg(feature = "tesseract")]
pub use tesseract::TesseractRecognizer;
