//! Synthetic scenes shared by the image-based unit tests.

use image::{GrayImage, Luma, Rgb, RgbImage};

pub(crate) const DARK: u8 = 40;
pub(crate) const BRIGHT: u8 = 220;
pub(crate) const INK: u8 = 20;

/// Fill an axis-aligned rectangle of a gray image, clipped to the frame.
pub(crate) fn fill_rect(img: &mut GrayImage, x: u32, y: u32, w: u32, h: u32, value: u8) {
    let (iw, ih) = img.dimensions();
    for yy in y..(y + h).min(ih) {
        for xx in x..(x + w).min(iw) {
            img.put_pixel(xx, yy, Luma([value]));
        }
    }
}

/// Draw a rectangular ring with the given stroke width.
pub(crate) fn hollow_rect(
    img: &mut GrayImage,
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    stroke: u32,
    value: u8,
) {
    fill_rect(img, x, y, w, stroke, value);
    fill_rect(img, x, y + h - stroke, w, stroke, value);
    fill_rect(img, x, y, stroke, h, value);
    fill_rect(img, x + w - stroke, y, stroke, h, value);
}

/// Dark scene with a band of 4 px bright vertical bars (4 px gaps), the
/// stroke pattern a plate leaves after x-derivative edge detection.
pub(crate) fn striped_plate_scene(w: u32, h: u32, origin: [u32; 2], size: [u32; 2]) -> RgbImage {
    RgbImage::from_fn(w, h, |x, y| {
        let inside = x >= origin[0]
            && x < origin[0] + size[0]
            && y >= origin[1]
            && y < origin[1] + size[1];
        if inside && (x - origin[0]) % 8 < 4 {
            Rgb([BRIGHT; 3])
        } else {
            Rgb([DARK; 3])
        }
    })
}

/// Dark scene with one uniform bright rectangle.
pub(crate) fn blank_plate_scene(w: u32, h: u32, origin: [u32; 2], size: [u32; 2]) -> RgbImage {
    RgbImage::from_fn(w, h, |x, y| {
        let inside = x >= origin[0]
            && x < origin[0] + size[0]
            && y >= origin[1]
            && y < origin[1] + size[1];
        if inside {
            Rgb([BRIGHT; 3])
        } else {
            Rgb([DARK; 3])
        }
    })
}

/// Canonical 144x33 plate with dark glyphs on a bright background:
///
/// - five 12x24 rings (stroke 3) at x = 8, 26, 44, 90, 108, top y = 4;
/// - a split "i" at x = 66: 4x4 dot at y = 4 over a 4x16 bar at y = 12.
pub(crate) fn glyph_plate() -> GrayImage {
    let mut img = GrayImage::from_pixel(144, 33, Luma([BRIGHT]));
    for x in [8, 26, 44, 90, 108] {
        hollow_rect(&mut img, x, 4, 12, 24, 3, INK);
    }
    fill_rect(&mut img, 66, 4, 4, 4, INK);
    fill_rect(&mut img, 66, 12, 4, 16, INK);
    img
}

/// Dark scene with a bright 240x60 plate at `origin` carrying eight 20x44
/// dark rings (stroke 4) spaced 28 px apart.
pub(crate) fn lettered_plate_scene(w: u32, h: u32, origin: [u32; 2]) -> RgbImage {
    let mut img = blank_plate_scene(w, h, origin, [240, 60]);
    for k in 0..8 {
        let gx = origin[0] + 10 + k * 28;
        let gy = origin[1] + 8;
        for y in gy..gy + 44 {
            for x in gx..gx + 20 {
                let on_ring = x < gx + 4 || x >= gx + 16 || y < gy + 4 || y >= gy + 40;
                if on_ring {
                    img.put_pixel(x, y, Rgb([INK; 3]));
                }
            }
        }
    }
    img
}
