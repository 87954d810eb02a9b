//! Image preprocessing primitives shared by plate proposal and character
//! segmentation: blurring, thresholding, x-derivative edges and
//! rectangular-kernel morphology.
//!
//! Every function returns a new image; inputs are never modified.

use image::{GrayImage, Luma, RgbImage};
use imageproc::morphology::{grayscale_dilate, grayscale_erode, Mask};

/// Rectangular structuring element, anchored at `(width / 2, height / 2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RectKernel {
    pub width: u32,
    pub height: u32,
}

impl RectKernel {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn mask(self) -> Mask {
        // Mask images are limited to 511x511 with a u8 anchor.
        let w = self.width.clamp(1, 511);
        let h = self.height.clamp(1, 511);
        let img = GrayImage::from_pixel(w, h, Luma([255u8]));
        Mask::from_image(&img, (w / 2).min(255) as u8, (h / 2).min(255) as u8)
    }
}

/// Convert an RGB image to 8-bit luma.
pub fn to_gray(image: &RgbImage) -> GrayImage {
    image::imageops::grayscale(image)
}

/// Gaussian blur; `sigma <= 0` returns a copy.
pub fn blur(image: &GrayImage, sigma: f32) -> GrayImage {
    if sigma > 0.0 {
        imageproc::filter::gaussian_blur_f32(image, sigma)
    } else {
        image.clone()
    }
}

/// Binarize: pixels strictly above `level` become 255, others 0.
pub fn threshold_binary(image: &GrayImage, level: u8) -> GrayImage {
    map_gray(image, |v| if v > level { 255 } else { 0 })
}

/// Inverse binarization: pixels at or below `level` become 255, others 0.
pub fn threshold_binary_inv(image: &GrayImage, level: u8) -> GrayImage {
    map_gray(image, |v| if v > level { 0 } else { 255 })
}

/// Binarize with an automatically chosen Otsu level. Returns the image and
/// the level used.
pub fn binarize_otsu(image: &GrayImage) -> (GrayImage, u8) {
    let level = imageproc::contrast::otsu_level(image);
    (threshold_binary(image, level), level)
}

/// First-order x-derivative (3x3 Sobel) saturated to `[0, 255]`.
///
/// Negative responses (bright-to-dark transitions, left to right) clamp to
/// zero, as an 8-bit destination would.
pub fn sobel_x(image: &GrayImage) -> GrayImage {
    let gx = imageproc::gradients::horizontal_sobel(image);
    let (w, h) = image.dimensions();
    let data = gx
        .as_raw()
        .iter()
        .map(|&v| v.clamp(0, 255) as u8)
        .collect::<Vec<u8>>();
    // Same dimensions as the gradient image, so the buffer length matches.
    GrayImage::from_raw(w, h, data).unwrap_or_else(|| GrayImage::new(w, h))
}

/// Invert 8-bit polarity.
pub fn invert(image: &GrayImage) -> GrayImage {
    map_gray(image, |v| 255 - v)
}

/// Morphological closing (dilate `iterations` times, then erode as often).
pub fn close(image: &GrayImage, kernel: RectKernel, iterations: u32) -> GrayImage {
    let mask = kernel.mask();
    let mut out = image.clone();
    for _ in 0..iterations {
        out = grayscale_dilate(&out, &mask);
    }
    for _ in 0..iterations {
        out = grayscale_erode(&out, &mask);
    }
    out
}

/// Morphological opening (erode `iterations` times, then dilate as often).
pub fn open(image: &GrayImage, kernel: RectKernel, iterations: u32) -> GrayImage {
    let mask = kernel.mask();
    let mut out = image.clone();
    for _ in 0..iterations {
        out = grayscale_erode(&out, &mask);
    }
    for _ in 0..iterations {
        out = grayscale_dilate(&out, &mask);
    }
    out
}

/// Number of non-zero pixels.
pub fn count_nonzero(image: &GrayImage) -> usize {
    image.as_raw().iter().filter(|&&v| v != 0).count()
}

fn map_gray(image: &GrayImage, f: impl Fn(u8) -> u8) -> GrayImage {
    let mut out = image.clone();
    for p in out.pixels_mut() {
        p.0[0] = f(p.0[0]);
    }
    out
}
