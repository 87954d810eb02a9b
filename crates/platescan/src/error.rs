//! Error type for the fallible surfaces of the crate.
//!
//! The detection pipeline itself never fails for an image: rejected regions,
//! contours and glyphs are filtered out silently. Errors only come from
//! loading files and from the external collaborators (classifier, OCR).

use thiserror::Error;

/// Errors raised by loaders and collaborator backends.
#[derive(Debug, Error)]
pub enum PlateError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid plate grammar pattern: {0}")]
    Grammar(#[from] regex::Error),

    /// Feature vector handed to a classifier has the wrong length.
    #[error("feature vector has {actual} entries, expected {expected}")]
    FeatureLength { expected: usize, actual: usize },

    #[error("plate classifier failed: {0}")]
    Classifier(String),

    #[error("character recognizer failed: {0}")]
    Recognizer(String),
}

pub type PlateResult<T> = Result<T, PlateError>;
