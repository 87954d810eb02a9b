//! Contour extraction capability.
//!
//! Proposal and segmentation only need two questions answered about a
//! binary image: "what are the outer borders of the foreground blobs" and
//! "does any blob enclose a hole". [`ContourExtractor`] names that seam so a
//! different backend can be substituted; [`ImageprocContours`] is the
//! default, built on `imageproc::contours`.

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};

/// Ordered border pixels of one blob.
pub type Contour = Vec<[i32; 2]>;

/// Border-following backend over binary images (non-zero = foreground).
pub trait ContourExtractor {
    /// Outer borders of top-level blobs, in discovery order.
    fn external_contours(&self, binary: &GrayImage) -> Vec<Contour>;

    /// Whether any blob encloses a background hole.
    fn has_hole(&self, binary: &GrayImage) -> bool;
}

/// [`ContourExtractor`] backed by `imageproc::contours::find_contours`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageprocContours;

impl ContourExtractor for ImageprocContours {
    fn external_contours(&self, binary: &GrayImage) -> Vec<Contour> {
        find_contours::<i32>(binary)
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
            .map(|c| c.points.into_iter().map(|p| [p.x, p.y]).collect())
            .collect()
    }

    fn has_hole(&self, binary: &GrayImage) -> bool {
        find_contours::<i32>(binary)
            .iter()
            .any(|c| c.border_type == BorderType::Hole)
    }
}

/// Mean point of a contour, truncated toward zero.
pub fn centroid(points: &[[i32; 2]]) -> Option<[i32; 2]> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points.iter().fold((0.0f64, 0.0f64), |(sx, sy), p| {
        (sx + p[0] as f64, sy + p[1] as f64)
    });
    Some([(sx / n) as i32, (sy / n) as i32])
}

/// Contour points as float coordinates for rectangle fitting.
pub fn to_f32(points: &[[i32; 2]]) -> Vec<[f32; 2]> {
    points.iter().map(|p| [p[0] as f32, p[1] as f32]).collect()
}
