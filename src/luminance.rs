//! RGB(A) to single-channel brightness using ITU-R BT.601 weights.

use image::{DynamicImage, GrayImage, Luma, Rgb};

/// BT.601 luminance with integer math: `(299 R + 587 G + 114 B) / 1000`.
#[inline]
pub fn luminance(pixel: Rgb<u8>) -> u8 {
    let [r, g, b] = pixel.0;
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000) as u8
}

/// Reduce an image to a brightness grid of identical dimensions.
///
/// Alpha is dropped, so transparent pixels count as their opaque color.
pub fn reduce(image: &DynamicImage) -> GrayImage {
    let rgb = image.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        Luma([luminance(*rgb.get_pixel(x, y))])
    })
}
