//! Candidate refinement: flood-fill the plate body, refit the oriented box,
//! undo the rotation and resample to the canonical plate size.

use image::{GrayImage, Rgb, RgbImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use nalgebra::Matrix3;
use rand::Rng;

use super::flood::{self, FloodFiller};
use crate::geometry::{min_area_rect, PlateSizeRule, RotatedRegion};
use crate::plate::PlateCandidate;
use crate::preprocess;

/// Configuration for candidate refinement.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RefineConfig {
    /// Number of random flood-fill seeds per candidate.
    pub n_seeds: usize,
    /// Seed spread as a fraction of the candidate's shorter side. Seeds are
    /// drawn uniformly from a square of this side centered on the candidate.
    pub seed_spread: f32,
    /// Per-channel flood-fill tolerance, applied in both directions.
    pub flood_tolerance: [u8; 3],
    /// Canonical plate width (pixels).
    pub plate_width: u32,
    /// Canonical plate height (pixels).
    pub plate_height: u32,
    /// Gaussian sigma applied to the canonical grayscale plate.
    pub blur_sigma: f32,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            n_seeds: 10,
            seed_spread: 0.5,
            flood_tolerance: [30, 30, 30],
            plate_width: 144,
            plate_height: 33,
            // Matches a 3x3 kernel with automatic sigma.
            blur_sigma: 0.8,
        }
    }
}

/// Draw flood-fill seeds around the region center.
///
/// Offsets are integers in `[-s/2, s/2)` with `s = seed_spread * short_side`
/// (truncated); a degenerate spread puts every seed on the center.
pub fn seed_points<R: Rng + ?Sized>(
    region: &RotatedRegion,
    config: &RefineConfig,
    rng: &mut R,
) -> Vec<[i64; 2]> {
    let spread = region.short_side() * config.seed_spread;
    let span = if spread.is_finite() && spread >= 1.0 {
        spread as i64
    } else {
        0
    };
    let half = spread.max(0.0) / 2.0;
    let [cx, cy] = region.center;
    (0..config.n_seeds)
        .map(|_| {
            let (dx, dy) = if span > 0 {
                (
                    rng.gen_range(0..span) as f32 - half,
                    rng.gen_range(0..span) as f32 - half,
                )
            } else {
                (0.0, 0.0)
            };
            [(cx + dx) as i64, (cy + dy) as i64]
        })
        .collect()
}

/// Source-to-plate transform: rotate by `angle_deg` about `center`, take a
/// `crop` sized window centered there and scale it onto an `out` sized
/// image.
///
/// Positive angles rotate counter-clockwise on screen (y down), which brings
/// an edge pointing at `angle_deg` onto the +x axis. Each output pixel maps
/// back to a single source point, so sampling stays linear interpolation
/// whatever the scale.
pub fn rotation_crop_matrix(
    center: [f32; 2],
    angle_deg: f32,
    crop: [u32; 2],
    out: [u32; 2],
) -> Matrix3<f32> {
    let (s, c) = angle_deg.to_radians().sin_cos();
    let sx = out[0] as f32 / crop[0] as f32;
    let sy = out[1] as f32 / crop[1] as f32;
    let to_origin = Matrix3::new(1.0, 0.0, -center[0], 0.0, 1.0, -center[1], 0.0, 0.0, 1.0);
    let rotate = Matrix3::new(c, s, 0.0, -s, c, 0.0, 0.0, 0.0, 1.0);
    let to_plate = Matrix3::new(
        sx,
        0.0,
        (out[0] as f32 - 1.0) * 0.5,
        0.0,
        sy,
        (out[1] as f32 - 1.0) * 0.5,
        0.0,
        0.0,
        1.0,
    );
    to_plate * rotate * to_origin
}

/// Rotate the source about `center` and sample the `crop` window straight
/// into an `out` sized image.
fn rotate_and_resample(
    image: &RgbImage,
    center: [f32; 2],
    angle_deg: f32,
    crop: [u32; 2],
    out: [u32; 2],
) -> Option<RgbImage> {
    let m = rotation_crop_matrix(center, angle_deg, crop, out);
    let projection = Projection::from_matrix([
        m[(0, 0)],
        m[(0, 1)],
        m[(0, 2)],
        m[(1, 0)],
        m[(1, 1)],
        m[(1, 2)],
        m[(2, 0)],
        m[(2, 1)],
        m[(2, 2)],
    ])?;
    let mut plate = RgbImage::new(out[0], out[1]);
    warp_into(
        image,
        &projection,
        Interpolation::Bilinear,
        Rgb([0, 0, 0]),
        &mut plate,
    );
    Some(plate)
}

/// Convert to gray, blur lightly and equalize.
fn canonicalize(plate: &RgbImage, config: &RefineConfig) -> GrayImage {
    let gray = preprocess::to_gray(plate);
    let blurred = preprocess::blur(&gray, config.blur_sigma);
    imageproc::contrast::equalize_histogram(&blurred)
}

/// Undo the ambiguous orientation of a fitted box so the long side runs
/// along x. Returns the rotation angle and `(width, height)` in pixels.
pub fn normalize_orientation(region: &RotatedRegion) -> (f32, [f32; 2]) {
    let [w, h] = region.size;
    if h > 0.0 && w / h < 1.0 {
        (region.angle_deg + 90.0, [h, w])
    } else {
        (region.angle_deg, [w, h])
    }
}

/// Refine one proposed region into a canonical plate candidate.
///
/// Returns `None` when no seed grows a region, when the refitted box fails
/// the size rule, or when the crop is empty.
pub fn refine_region<R: Rng + ?Sized>(
    image: &RgbImage,
    region: &RotatedRegion,
    config: &RefineConfig,
    size_rule: &PlateSizeRule,
    filler: &dyn FloodFiller,
    rng: &mut R,
) -> Option<PlateCandidate> {
    let (img_w, img_h) = image.dimensions();
    if img_w == 0 || img_h == 0 {
        return None;
    }
    let mut mask = flood::new_mask(image);
    for seed in seed_points(region, config, rng) {
        filler.fill(image, &mut mask, seed, config.flood_tolerance);
    }

    let points = flood::filled_points(&mask);
    if points.is_empty() {
        tracing::trace!("refine: empty flood fill at {:?}", region.center);
        return None;
    }

    let fitted = min_area_rect(&points);
    if !size_rule.accepts(&fitted) {
        tracing::trace!(
            "refine: refitted region {:.1}x{:.1} fails size rule",
            fitted.size[0],
            fitted.size[1]
        );
        return None;
    }

    let (angle, [w, h]) = normalize_orientation(&fitted);
    let crop_size = [w as u32, h as u32];
    let plate_size = [config.plate_width, config.plate_height];
    if crop_size.contains(&0) || plate_size.contains(&0) {
        return None;
    }
    let plate = rotate_and_resample(image, fitted.center, angle, crop_size, plate_size)?;
    let position = fitted.bounding_rect(img_w, img_h)?;

    Some(PlateCandidate {
        image: canonicalize(&plate, config),
        position,
        region: fitted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::flood::FixedRangeFloodFill;
    use crate::test_utils::blank_plate_scene;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn seeds_stay_within_spread() {
        let region = RotatedRegion::new([100.0, 50.0], [40.0, 200.0], -90.0);
        let cfg = RefineConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        let seeds = seed_points(&region, &cfg, &mut rng);
        assert_eq!(seeds.len(), 10);
        for s in seeds {
            assert!((90..=110).contains(&s[0]), "seed {s:?}");
            assert!((40..=60).contains(&s[1]), "seed {s:?}");
        }
    }

    #[test]
    fn seeds_are_reproducible_with_fixed_rng() {
        let region = RotatedRegion::new([60.0, 60.0], [30.0, 120.0], -90.0);
        let cfg = RefineConfig::default();
        let a = seed_points(&region, &cfg, &mut StdRng::seed_from_u64(3));
        let b = seed_points(&region, &cfg, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn degenerate_region_seeds_on_center() {
        let region = RotatedRegion::new([10.4, 20.7], [0.5, 3.0], -90.0);
        let seeds = seed_points(&region, &RefineConfig::default(), &mut StdRng::seed_from_u64(1));
        assert!(seeds.iter().all(|s| *s == [10, 20]));
    }

    #[test]
    fn orientation_normalization_puts_long_side_on_x() {
        let upright = RotatedRegion::new([0.0, 0.0], [20.0, 100.0], -90.0);
        let (angle, size) = normalize_orientation(&upright);
        assert_abs_diff_eq!(angle, 0.0);
        assert_eq!(size, [100.0, 20.0]);

        let tilted = RotatedRegion::new([0.0, 0.0], [100.0, 20.0], -10.0);
        let (angle, size) = normalize_orientation(&tilted);
        assert_abs_diff_eq!(angle, -10.0);
        assert_eq!(size, [100.0, 20.0]);
    }

    #[test]
    fn rotation_matrix_maps_edge_direction_to_x_axis() {
        let m = rotation_crop_matrix([50.0, 50.0], 10.0, [101, 21], [101, 21]);
        let (s, c) = 10f32.to_radians().sin_cos();
        let p = m * nalgebra::Vector3::new(50.0 + 30.0 * c, 50.0 + 30.0 * s, 1.0);
        assert_abs_diff_eq!(p.x, 50.0 + 30.0, epsilon = 1e-3);
        assert_abs_diff_eq!(p.y, 10.0, epsilon = 1e-3);
    }

    #[test]
    fn rotation_matrix_scales_crop_onto_plate() {
        // A 288x66 window halves onto 144x33; the window center lands on
        // the plate center and edge offsets shrink by the same factor.
        let m = rotation_crop_matrix([200.0, 100.0], 0.0, [288, 66], [144, 33]);
        let center = m * nalgebra::Vector3::new(200.0, 100.0, 1.0);
        assert_abs_diff_eq!(center.x, 71.5, epsilon = 1e-3);
        assert_abs_diff_eq!(center.y, 16.0, epsilon = 1e-3);
        let p = m * nalgebra::Vector3::new(300.0, 120.0, 1.0);
        assert_abs_diff_eq!(p.x, 121.5, epsilon = 1e-3);
        assert_abs_diff_eq!(p.y, 26.0, epsilon = 1e-3);
    }

    #[test]
    fn refined_blank_plate_is_uniform() {
        let img = blank_plate_scene(400, 300, [110, 130], [180, 40]);
        let region = RotatedRegion::new([199.5, 149.5], [40.0, 180.0], -90.0);
        let cfg = RefineConfig {
            blur_sigma: 0.0,
            ..RefineConfig::default()
        };
        let cand = refine_region(
            &img,
            &region,
            &cfg,
            &PlateSizeRule::default(),
            &FixedRangeFloodFill,
            &mut StdRng::seed_from_u64(11),
        )
        .expect("plate should be refined");
        // Every sample of the shrunken window falls on the uniform plate.
        let values: Vec<u8> = cand.image.pixels().map(|p| p[0]).collect();
        assert!(values.iter().all(|&v| v == values[0]), "plate not uniform");
    }

    #[test]
    fn empty_image_is_rejected() {
        let region = RotatedRegion::new([0.0, 0.0], [30.0, 120.0], -90.0);
        for (w, h) in [(0, 0), (50, 0)] {
            let cand = refine_region(
                &RgbImage::new(w, h),
                &region,
                &RefineConfig::default(),
                &PlateSizeRule::default(),
                &FixedRangeFloodFill,
                &mut StdRng::seed_from_u64(2),
            );
            assert!(cand.is_none());
        }
    }

    #[test]
    fn blank_plate_is_refined_to_canonical_size() {
        // Bright 180x40 plate at (110, 130) on a dark background.
        let img = blank_plate_scene(400, 300, [110, 130], [180, 40]);
        let region = RotatedRegion::new([199.5, 149.5], [40.0, 180.0], -90.0);
        let cfg = RefineConfig::default();
        let mut rng = StdRng::seed_from_u64(11);
        let cand = refine_region(
            &img,
            &region,
            &cfg,
            &PlateSizeRule::default(),
            &FixedRangeFloodFill,
            &mut rng,
        )
        .expect("plate should be refined");
        assert_eq!(cand.image.dimensions(), (144, 33));
        assert_eq!(cand.position.x, 110);
        assert_eq!(cand.position.y, 130);
        assert_eq!(cand.position.width, 180);
        assert_eq!(cand.position.height, 40);
        assert_eq!(cand.features().len(), 144 * 33);
    }

    #[test]
    fn region_outside_image_is_rejected_without_panicking() {
        let img = blank_plate_scene(200, 100, [20, 20], [120, 30]);
        let region = RotatedRegion::new([-500.0, -500.0], [30.0, 120.0], -90.0);
        let cand = refine_region(
            &img,
            &region,
            &RefineConfig::default(),
            &PlateSizeRule::default(),
            &FixedRangeFloodFill,
            &mut StdRng::seed_from_u64(5),
        );
        assert!(cand.is_none());
    }

    #[test]
    fn background_flood_fails_size_rule() {
        // Seeds land on the uniform background, which fills the whole frame.
        let img = blank_plate_scene(200, 200, [20, 20], [120, 30]);
        let region = RotatedRegion::new([100.0, 150.0], [30.0, 120.0], -90.0);
        let cand = refine_region(
            &img,
            &region,
            &RefineConfig::default(),
            &PlateSizeRule::default(),
            &FixedRangeFloodFill,
            &mut StdRng::seed_from_u64(9),
        );
        assert!(cand.is_none());
    }
}
