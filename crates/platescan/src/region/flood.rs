//! Fixed-range, mask-only flood fill.
//!
//! The mask is two pixels larger than the image in each dimension; image
//! pixel `(x, y)` maps to mask pixel `(x + 1, y + 1)`. Non-zero mask pixels
//! are never re-entered, so consecutive fills into the same mask accumulate
//! their union.

use std::collections::VecDeque;

use image::{GrayImage, Luma, RgbImage};

/// Mask value written for filled pixels.
pub const FILL_VALUE: u8 = 255;

/// Region-growing backend used by plate refinement.
pub trait FloodFiller {
    /// Grow a region from `seed` into `mask`, returning the number of newly
    /// filled pixels. Seeds outside the image fill nothing.
    fn fill(&self, image: &RgbImage, mask: &mut GrayImage, seed: [i64; 2], tolerance: [u8; 3])
        -> usize;
}

/// Zero-initialized mask sized for `image`.
pub fn new_mask(image: &RgbImage) -> GrayImage {
    let (w, h) = image.dimensions();
    GrayImage::new(w + 2, h + 2)
}

/// Image coordinates of every filled mask pixel.
pub fn filled_points(mask: &GrayImage) -> Vec<[f32; 2]> {
    let (mw, mh) = mask.dimensions();
    let mut out = Vec::new();
    for y in 1..mh.saturating_sub(1) {
        for x in 1..mw.saturating_sub(1) {
            if mask.get_pixel(x, y)[0] == FILL_VALUE {
                out.push([(x - 1) as f32, (y - 1) as f32]);
            }
        }
    }
    out
}

/// 4-connected fill accepting pixels whose every channel lies within
/// `seed_value ± tolerance` (range fixed to the seed, not to neighbours).
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedRangeFloodFill;

impl FloodFiller for FixedRangeFloodFill {
    fn fill(
        &self,
        image: &RgbImage,
        mask: &mut GrayImage,
        seed: [i64; 2],
        tolerance: [u8; 3],
    ) -> usize {
        let (w, h) = image.dimensions();
        if mask.dimensions() != (w + 2, h + 2) {
            return 0;
        }
        if seed[0] < 0 || seed[1] < 0 || seed[0] >= w as i64 || seed[1] >= h as i64 {
            return 0;
        }
        let (sx, sy) = (seed[0] as u32, seed[1] as u32);
        if mask.get_pixel(sx + 1, sy + 1)[0] != 0 {
            return 0;
        }

        let seed_px = image.get_pixel(sx, sy).0;
        let within = |px: [u8; 3]| {
            (0..3).all(|c| {
                let lo = seed_px[c].saturating_sub(tolerance[c]);
                let hi = seed_px[c].saturating_add(tolerance[c]);
                (lo..=hi).contains(&px[c])
            })
        };

        let mut queue = VecDeque::new();
        mask.put_pixel(sx + 1, sy + 1, Luma([FILL_VALUE]));
        queue.push_back((sx, sy));
        let mut filled = 1usize;

        while let Some((x, y)) = queue.pop_front() {
            let neighbours = [
                (x.wrapping_sub(1), y),
                (x + 1, y),
                (x, y.wrapping_sub(1)),
                (x, y + 1),
            ];
            for (nx, ny) in neighbours {
                if nx >= w || ny >= h {
                    continue;
                }
                if mask.get_pixel(nx + 1, ny + 1)[0] != 0 {
                    continue;
                }
                if !within(image.get_pixel(nx, ny).0) {
                    continue;
                }
                mask.put_pixel(nx + 1, ny + 1, Luma([FILL_VALUE]));
                filled += 1;
                queue.push_back((nx, ny));
            }
        }
        filled
    }
}
