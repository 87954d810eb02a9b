//! Aggregate configuration for a plate read.

use std::path::Path;

use crate::error::PlateResult;
use crate::geometry::PlateSizeRule;
use crate::ocr::OcrConfig;
use crate::region::{ProposalConfig, RefineConfig};
use crate::segment::SegmentConfig;
use crate::syntax::PlateGrammar;

/// Every tunable of the pipeline. Missing JSON fields take their defaults.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ReadConfig {
    /// Size rule shared by proposal and refinement.
    pub plate_size: PlateSizeRule,
    pub proposal: ProposalConfig,
    pub refine: RefineConfig,
    pub segment: SegmentConfig,
    pub ocr: OcrConfig,
    pub grammar: PlateGrammar,
    /// Run the syntax correction pass on recognized strings.
    pub syntax_correction: bool,
    /// Fixed seed for flood-fill seed sampling; fresh entropy per read when
    /// unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            plate_size: PlateSizeRule::default(),
            proposal: ProposalConfig::default(),
            refine: RefineConfig::default(),
            segment: SegmentConfig::default(),
            ocr: OcrConfig::default(),
            grammar: PlateGrammar::default(),
            syntax_correction: true,
            seed: None,
        }
    }
}

impl ReadConfig {
    /// Load overrides from a JSON file.
    pub fn from_json_file(path: &Path) -> PlateResult<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}
