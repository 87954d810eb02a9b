//! Geometry primitives: oriented and upright rectangles, minimum-area
//! rectangle fitting, and the plate size rule shared by proposal and
//! refinement.
//!
//! Angle convention for [`RotatedRegion`]: `angle_deg` lies in `[-90, 0)` and
//! is the direction of the `width` edge measured from the +x axis in image
//! coordinates (y pointing down). An axis-aligned box therefore reports
//! `angle_deg == -90` with `width` equal to its vertical extent. Callers
//! that want the horizontal extent swap width and height when the angle is
//! negative (character merge) or when `width / height < 1` (plate rotation
//! normalization).

/// Oriented bounding box: center, `(width, height)` and angle in degrees.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RotatedRegion {
    /// Center (x, y) in pixels.
    pub center: [f32; 2],
    /// Edge lengths `[width, height]` in pixels.
    pub size: [f32; 2],
    /// Direction of the `width` edge, degrees in `[-90, 0)`.
    pub angle_deg: f32,
}

impl RotatedRegion {
    pub fn new(center: [f32; 2], size: [f32; 2], angle_deg: f32) -> Self {
        Self {
            center,
            size,
            angle_deg,
        }
    }

    pub fn width(&self) -> f32 {
        self.size[0]
    }

    pub fn height(&self) -> f32 {
        self.size[1]
    }

    /// Shorter of the two edges.
    pub fn short_side(&self) -> f32 {
        self.size[0].min(self.size[1])
    }

    /// The four corners, walking the `width` edge first.
    pub fn corners(&self) -> [[f32; 2]; 4] {
        let theta = self.angle_deg.to_radians();
        let (s, c) = theta.sin_cos();
        let hw = 0.5 * self.size[0];
        let hh = 0.5 * self.size[1];
        // Width direction (c, s), height direction (-s, c).
        let offsets = [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)];
        offsets.map(|(u, v)| {
            [
                self.center[0] + u * c - v * s,
                self.center[1] + u * s + v * c,
            ]
        })
    }

    /// Upright bounding rectangle of the corners, clipped to `[0, w) x [0, h)`.
    ///
    /// Returns `None` when the clipped rectangle is empty.
    pub fn bounding_rect(&self, image_w: u32, image_h: u32) -> Option<PixelRect> {
        let corners = self.corners();
        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for [x, y] in corners {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        let x0 = min_x.floor().max(0.0);
        let y0 = min_y.floor().max(0.0);
        let x1 = (max_x.floor() + 1.0).min(image_w as f32);
        let y1 = (max_y.floor() + 1.0).min(image_h as f32);
        if !(x1 > x0 && y1 > y0) {
            return None;
        }
        Some(PixelRect::new(
            x0 as u32,
            y0 as u32,
            (x1 - x0) as u32,
            (y1 - y0) as u32,
        ))
    }
}

/// Upright integer rectangle (left, top, width, height).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (exclusive).
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Tightest rectangle covering all points, pixel-inclusive.
    ///
    /// Points with negative coordinates are not expected; they are clamped
    /// to zero.
    pub fn enclosing(points: &[[i32; 2]]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y) = (first[0], first[1]);
        let (mut max_x, mut max_y) = (first[0], first[1]);
        for p in &points[1..] {
            min_x = min_x.min(p[0]);
            min_y = min_y.min(p[1]);
            max_x = max_x.max(p[0]);
            max_y = max_y.max(p[1]);
        }
        let min_x = min_x.max(0);
        let min_y = min_y.max(0);
        Some(Self::new(
            min_x as u32,
            min_y as u32,
            (max_x - min_x + 1).max(1) as u32,
            (max_y - min_y + 1).max(1) as u32,
        ))
    }
}

/// Plate size rule applied to proposed and refined regions.
///
/// A region passes when `|ratio - aspect_ratio| <= aspect_ratio * aspect_tolerance`
/// and `min_height <= height <= max_height`, where `ratio` is long/short side
/// and `height` is the short side truncated to whole pixels.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlateSizeRule {
    /// Expected long/short side ratio of a plate.
    pub aspect_ratio: f32,
    /// Allowed relative deviation from `aspect_ratio`.
    pub aspect_tolerance: f32,
    /// Minimum plate height (pixels).
    pub min_height: u32,
    /// Maximum plate height (pixels).
    pub max_height: u32,
}

impl Default for PlateSizeRule {
    fn default() -> Self {
        Self {
            aspect_ratio: 5.0,
            aspect_tolerance: 0.6,
            min_height: 15,
            max_height: 250,
        }
    }
}

impl PlateSizeRule {
    /// Check a region against the rule.
    pub fn accepts(&self, region: &RotatedRegion) -> bool {
        let [w, h] = region.size;
        if !(w.is_finite() && h.is_finite()) || w <= 0.0 || h <= 0.0 {
            return false;
        }
        let (ratio, short) = if w >= h { (w / h, h) } else { (h / w, w) };
        let height = short as u32;
        (ratio - self.aspect_ratio).abs() <= self.aspect_ratio * self.aspect_tolerance
            && height >= self.min_height
            && height <= self.max_height
    }
}

/// Minimum-area enclosing rectangle of a point set (rotating calipers over
/// the convex hull).
///
/// Degenerate inputs (empty, single point, collinear points) yield an
/// axis-aligned box that may have zero width or height.
pub fn min_area_rect(points: &[[f32; 2]]) -> RotatedRegion {
    if points.is_empty() {
        return RotatedRegion::new([0.0, 0.0], [0.0, 0.0], -90.0);
    }

    let hull = convex_hull(points);
    if hull.len() < 3 {
        return axis_aligned_box(points);
    }

    let n = hull.len();
    let mut best: Option<(f32, RotatedRegion)> = None;
    for i in 0..n {
        let p1 = hull[i];
        let p2 = hull[(i + 1) % n];
        let ex = p2[0] - p1[0];
        let ey = p2[1] - p1[1];
        let len = ex.hypot(ey);
        if len < 1e-6 {
            continue;
        }
        let (ux, uy) = (ex / len, ey / len);
        let (vx, vy) = (-uy, ux);

        let mut min_u = f32::INFINITY;
        let mut max_u = f32::NEG_INFINITY;
        let mut min_v = f32::INFINITY;
        let mut max_v = f32::NEG_INFINITY;
        for p in &hull {
            let dx = p[0] - p1[0];
            let dy = p[1] - p1[1];
            let u = dx * ux + dy * uy;
            let v = dx * vx + dy * vy;
            min_u = min_u.min(u);
            max_u = max_u.max(u);
            min_v = min_v.min(v);
            max_v = max_v.max(v);
        }

        let len_u = max_u - min_u;
        let len_v = max_v - min_v;
        let area = len_u * len_v;
        if best.as_ref().map_or(true, |(a, _)| area < *a) {
            let cu = 0.5 * (min_u + max_u);
            let cv = 0.5 * (min_v + max_v);
            let center = [p1[0] + cu * ux + cv * vx, p1[1] + cu * uy + cv * vy];
            let theta = uy.atan2(ux).to_degrees();
            best = Some((area, oriented(center, theta, len_u, len_v)));
        }
    }

    best.map(|(_, r)| r).unwrap_or_else(|| axis_aligned_box(points))
}

/// Express a box whose `len_u` edge points at `theta` degrees in the
/// `[-90, 0)` angle convention.
fn oriented(center: [f32; 2], theta: f32, len_u: f32, len_v: f32) -> RotatedRegion {
    // Edge directions are defined modulo 180 degrees.
    let mut t = (theta + 90.0).rem_euclid(180.0) - 90.0;
    if t.abs() < 1e-3 {
        t = 0.0;
    }
    if t < 0.0 {
        RotatedRegion::new(center, [len_u, len_v], t)
    } else {
        RotatedRegion::new(center, [len_v, len_u], t - 90.0)
    }
}

fn axis_aligned_box(points: &[[f32; 2]]) -> RotatedRegion {
    let mut min = [f32::INFINITY; 2];
    let mut max = [f32::NEG_INFINITY; 2];
    for p in points {
        for k in 0..2 {
            min[k] = min[k].min(p[k]);
            max[k] = max[k].max(p[k]);
        }
    }
    let center = [0.5 * (min[0] + max[0]), 0.5 * (min[1] + max[1])];
    oriented(center, 0.0, max[0] - min[0], max[1] - min[1])
}

/// Andrew's monotone chain; collinear points are dropped.
fn convex_hull(points: &[[f32; 2]]) -> Vec<[f32; 2]> {
    let mut pts = points.to_vec();
    pts.sort_by(|a, b| a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1])));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let cross = |o: [f32; 2], a: [f32; 2], b: [f32; 2]| {
        (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
    };

    let mut lower: Vec<[f32; 2]> = Vec::with_capacity(pts.len());
    for &p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }
    let mut upper: Vec<[f32; 2]> = Vec::with_capacity(pts.len());
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn box_points(x0: i32, y0: i32, w: i32, h: i32) -> Vec<[f32; 2]> {
        let mut pts = Vec::new();
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                pts.push([x as f32, y as f32]);
            }
        }
        pts
    }

    #[test]
    fn axis_aligned_box_reports_vertical_width() {
        let r = min_area_rect(&box_points(10, 20, 101, 21));
        assert_abs_diff_eq!(r.angle_deg, -90.0, epsilon = 1e-3);
        assert_abs_diff_eq!(r.width(), 20.0, epsilon = 1e-3);
        assert_abs_diff_eq!(r.height(), 100.0, epsilon = 1e-3);
        assert_abs_diff_eq!(r.center[0], 60.0, epsilon = 1e-3);
        assert_abs_diff_eq!(r.center[1], 30.0, epsilon = 1e-3);
    }

    #[test]
    fn tilted_segment_cloud_recovers_angle() {
        // Points along a 10 degree line, thickened perpendicular to it.
        let theta = 10f32.to_radians();
        let (s, c) = theta.sin_cos();
        let mut pts = Vec::new();
        for i in 0..=100 {
            for j in 0..=20 {
                let u = i as f32;
                let v = j as f32;
                pts.push([50.0 + u * c - v * s, 50.0 + u * s + v * c]);
            }
        }
        let r = min_area_rect(&pts);
        // The long edge points at +10 degrees, which is outside [-90, 0), so
        // the short edge (at -80 degrees) becomes the width.
        assert_abs_diff_eq!(r.angle_deg, -80.0, epsilon = 0.05);
        assert_abs_diff_eq!(r.width(), 20.0, epsilon = 0.05);
        assert_abs_diff_eq!(r.height(), 100.0, epsilon = 0.05);
    }

    #[test]
    fn degenerate_inputs_do_not_panic() {
        let empty = min_area_rect(&[]);
        assert_eq!(empty.size, [0.0, 0.0]);
        let single = min_area_rect(&[[3.0, 4.0]]);
        assert_eq!(single.center, [3.0, 4.0]);
        let line = min_area_rect(&[[0.0, 0.0], [5.0, 0.0], [10.0, 0.0]]);
        assert_abs_diff_eq!(line.width() * line.height(), 0.0);
    }

    #[test]
    fn size_rule_height_boundary() {
        let rule = PlateSizeRule::default();
        assert!(rule.accepts(&RotatedRegion::new([0.0, 0.0], [100.0, 15.0], -90.0)));
        assert!(!rule.accepts(&RotatedRegion::new([0.0, 0.0], [100.0, 14.0], -90.0)));
        // Orientation does not matter.
        assert!(rule.accepts(&RotatedRegion::new([0.0, 0.0], [15.0, 100.0], -90.0)));
    }

    #[test]
    fn size_rule_aspect_boundary() {
        let rule = PlateSizeRule::default();
        assert!(rule.accepts(&RotatedRegion::new([0.0, 0.0], [40.0, 20.0], -45.0)));
        assert!(rule.accepts(&RotatedRegion::new([0.0, 0.0], [160.0, 20.0], -45.0)));
        assert!(!rule.accepts(&RotatedRegion::new([0.0, 0.0], [39.0, 20.0], -45.0)));
        assert!(!rule.accepts(&RotatedRegion::new([0.0, 0.0], [161.0, 20.0], -45.0)));
        assert!(!rule.accepts(&RotatedRegion::new([0.0, 0.0], [0.0, 20.0], -45.0)));
        assert!(!rule.accepts(&RotatedRegion::new([0.0, 0.0], [300.0, 251.0], -45.0)));
    }

    #[test]
    fn accepted_regions_satisfy_ratio_and_height_bounds() {
        let rule = PlateSizeRule::default();
        for w in (1..400).step_by(7) {
            for h in (1..300).step_by(5) {
                let r = RotatedRegion::new([0.0, 0.0], [w as f32, h as f32], -30.0);
                if rule.accepts(&r) {
                    let long = w.max(h) as f32;
                    let short = w.min(h) as f32;
                    let ratio = long / short;
                    assert!((2.0..=8.0).contains(&ratio), "ratio {ratio}");
                    assert!((15.0..=250.0).contains(&short), "height {short}");
                }
            }
        }
    }

    #[test]
    fn bounding_rect_is_clipped() {
        let r = RotatedRegion::new([5.0, 5.0], [20.0, 10.0], -90.0);
        let b = r.bounding_rect(100, 100).unwrap();
        assert_eq!((b.x, b.y), (0, 0));
        assert!(b.right() <= 100 && b.bottom() <= 100);
        let outside = RotatedRegion::new([-50.0, -50.0], [4.0, 4.0], -90.0);
        assert!(outside.bounding_rect(100, 100).is_none());
    }

    #[test]
    fn enclosing_rect_is_pixel_inclusive() {
        let r = PixelRect::enclosing(&[[3, 4], [7, 4], [5, 10]]).unwrap();
        assert_eq!(r, PixelRect::new(3, 4, 5, 7));
        assert!(PixelRect::enclosing(&[]).is_none());
    }
}
