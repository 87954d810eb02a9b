//! Plate region proposal from vertical-stroke density.
//!
//! Plates are rows of dark characters on a light band, so after binarizing
//! and taking the x-derivative they show up as a dense run of vertical
//! edges. A wide closing merges those edges into one blob, two openings
//! strip blobs that are too thin or too narrow, and the minimum-area
//! rectangles of the surviving outer contours become candidates.

use image::{GrayImage, RgbImage};

use crate::contours::{self, ContourExtractor};
use crate::geometry::{min_area_rect, PlateSizeRule, RotatedRegion};
use crate::preprocess::{self, RectKernel};

/// Configuration for plate region proposal.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ProposalConfig {
    /// Gaussian sigma applied to the grayscale image before binarization.
    pub blur_sigma: f32,
    /// Closing kernel that bridges character strokes into a solid band.
    pub close_kernel: RectKernel,
    /// First opening kernel: removes thin, short structures.
    pub open_kernel: RectKernel,
    /// Second opening kernel: removes blobs narrower than a plate.
    pub wide_open_kernel: RectKernel,
    /// Iterations used for each morphological operation.
    pub morph_iterations: u32,
}

impl Default for ProposalConfig {
    fn default() -> Self {
        Self {
            // Matches a 5x5 kernel with automatic sigma.
            blur_sigma: 1.1,
            close_kernel: RectKernel::new(25, 7),
            open_kernel: RectKernel::new(5, 13),
            wide_open_kernel: RectKernel::new(50, 5),
            morph_iterations: 2,
        }
    }
}

/// Intermediate images of one proposal run, for inspection and dumps.
#[derive(Debug, Clone)]
pub struct ProposalTrace {
    pub gray: GrayImage,
    pub blurred: GrayImage,
    pub binary: GrayImage,
    pub otsu_level: u8,
    pub edges: GrayImage,
    pub closed: GrayImage,
    pub opened: GrayImage,
    pub opened_wide: GrayImage,
}

impl ProposalTrace {
    /// Trace of a run that was skipped: every stage is a blank `w` x `h`
    /// image.
    pub fn empty(w: u32, h: u32) -> Self {
        let blank = GrayImage::new(w, h);
        Self {
            gray: blank.clone(),
            blurred: blank.clone(),
            binary: blank.clone(),
            otsu_level: 0,
            edges: blank.clone(),
            closed: blank.clone(),
            opened: blank.clone(),
            opened_wide: blank,
        }
    }

    /// Named stages in pipeline order.
    pub fn stages(&self) -> [(&'static str, &GrayImage); 7] {
        [
            ("gray", &self.gray),
            ("blurred", &self.blurred),
            ("binary", &self.binary),
            ("edges", &self.edges),
            ("closed", &self.closed),
            ("opened", &self.opened),
            ("opened_wide", &self.opened_wide),
        ]
    }
}

fn run_stages(image: &RgbImage, config: &ProposalConfig) -> ProposalTrace {
    let gray = preprocess::to_gray(image);
    let blurred = preprocess::blur(&gray, config.blur_sigma);
    let (binary, otsu_level) = preprocess::binarize_otsu(&blurred);
    let edges = preprocess::sobel_x(&binary);
    let closed = preprocess::close(&edges, config.close_kernel, config.morph_iterations);
    let opened = preprocess::open(&closed, config.open_kernel, config.morph_iterations);
    let opened_wide = preprocess::open(&opened, config.wide_open_kernel, config.morph_iterations);
    ProposalTrace {
        gray,
        blurred,
        binary,
        otsu_level,
        edges,
        closed,
        opened,
        opened_wide,
    }
}

fn regions_from_mask(
    mask: &GrayImage,
    size_rule: &PlateSizeRule,
    extractor: &dyn ContourExtractor,
) -> Vec<RotatedRegion> {
    let contours = extractor.external_contours(mask);
    let n_contours = contours.len();
    let regions: Vec<RotatedRegion> = contours
        .iter()
        .map(|c| min_area_rect(&contours::to_f32(c)))
        .filter(|r| {
            let ok = size_rule.accepts(r);
            if !ok {
                tracing::trace!(
                    "proposal rejected: size {:.1}x{:.1} at ({:.1}, {:.1})",
                    r.size[0],
                    r.size[1],
                    r.center[0],
                    r.center[1]
                );
            }
            ok
        })
        .collect();
    tracing::debug!(
        "proposal: {} contours -> {} plate-sized regions",
        n_contours,
        regions.len()
    );
    regions
}

/// Propose candidate plate regions in a color image.
///
/// Returns regions in contour discovery order; the list may be empty.
pub fn propose_regions(
    image: &RgbImage,
    config: &ProposalConfig,
    size_rule: &PlateSizeRule,
    extractor: &dyn ContourExtractor,
) -> Vec<RotatedRegion> {
    propose_regions_traced(image, config, size_rule, extractor).0
}

/// Same as [`propose_regions`], also returning every intermediate image.
pub fn propose_regions_traced(
    image: &RgbImage,
    config: &ProposalConfig,
    size_rule: &PlateSizeRule,
    extractor: &dyn ContourExtractor,
) -> (Vec<RotatedRegion>, ProposalTrace) {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        tracing::debug!("proposal: skipping empty {}x{} image", w, h);
        return (Vec::new(), ProposalTrace::empty(w, h));
    }
    let trace = run_stages(image, config);
    tracing::trace!("proposal: otsu level {}", trace.otsu_level);
    let regions = regions_from_mask(&trace.opened_wide, size_rule, extractor);
    (regions, trace)
}
