//! Overlay of read results on the source image.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use super::ReadResult;
use crate::geometry::PixelRect;

const PLATE_COLOR: Rgb<u8> = Rgb([0, 200, 0]);
const CHAR_COLOR: Rgb<u8> = Rgb([0, 125, 255]);
/// Plate outline thickness in pixels.
const PLATE_STROKE: u32 = 4;

fn draw_box(image: &mut RgbImage, rect: PixelRect, color: Rgb<u8>, stroke: u32) {
    for k in 0..stroke {
        if rect.width <= 2 * k || rect.height <= 2 * k {
            break;
        }
        let r = Rect::at((rect.x + k) as i32, (rect.y + k) as i32)
            .of_size(rect.width - 2 * k, rect.height - 2 * k);
        draw_hollow_rect_mut(image, r, color);
    }
}

/// Copy of `image` with every read plate and its character boxes outlined.
pub fn annotate(image: &RgbImage, result: &ReadResult) -> RgbImage {
    let mut out = image.clone();
    for plate in &result.plates {
        draw_box(&mut out, plate.position, PLATE_COLOR, PLATE_STROKE);
        for c in &plate.characters {
            draw_box(
                &mut out,
                result.char_rect_in_image(plate, c.rect),
                CHAR_COLOR,
                1,
            );
        }
    }
    out
}
