//! Plate / non-plate decision on canonical candidates.

use std::path::Path;

use crate::error::{PlateError, PlateResult};

/// Binary plate classifier over a flattened canonical plate image.
pub trait PlateClassifier {
    /// `true` when the candidate looks like a plate.
    fn predict(&self, features: &[u8]) -> PlateResult<bool>;
}

/// Accepts every candidate. Useful when no trained model is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl PlateClassifier for AcceptAll {
    fn predict(&self, _features: &[u8]) -> PlateResult<bool> {
        Ok(true)
    }
}

/// Linear decision function `w . x + b >= 0` over raw pixel values.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LinearPlateClassifier {
    pub weights: Vec<f32>,
    pub bias: f32,
}

impl LinearPlateClassifier {
    pub fn new(weights: Vec<f32>, bias: f32) -> Self {
        Self { weights, bias }
    }

    /// Load `{ "weights": [...], "bias": b }` from a JSON file.
    pub fn from_json_file(path: &Path) -> PlateResult<Self> {
        let data = std::fs::read_to_string(path)?;
        let model: Self = serde_json::from_str(&data)?;
        if model.weights.is_empty() {
            return Err(PlateError::Classifier(format!(
                "model {} has no weights",
                path.display()
            )));
        }
        Ok(model)
    }

    /// Signed decision value.
    pub fn decision(&self, features: &[u8]) -> PlateResult<f32> {
        if features.len() != self.weights.len() {
            return Err(PlateError::FeatureLength {
                expected: self.weights.len(),
                actual: features.len(),
            });
        }
        let dot: f32 = self
            .weights
            .iter()
            .zip(features)
            .map(|(&w, &x)| w * x as f32)
            .sum();
        Ok(dot + self.bias)
    }
}

impl PlateClassifier for LinearPlateClassifier {
    fn predict(&self, features: &[u8]) -> PlateResult<bool> {
        Ok(self.decision(features)? >= 0.0)
    }
}
