//! Aspect-preserving resize to a target long edge.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

/// Compute the output dimensions for a target long-edge `size`.
///
/// `scale = max(w, h) / size`, each side becomes `round(side / scale)` and is
/// clamped to at least one pixel.
pub fn target_dimensions(width: u32, height: u32, size: u32) -> (u32, u32) {
    let scale = width.max(height) as f64 / size.max(1) as f64;
    let w = (width as f64 / scale).round().max(1.0) as u32;
    let h = (height as f64 / scale).round().max(1.0) as u32;
    (w, h)
}

/// Resize so the longer edge equals `size`, using a Lanczos3 kernel.
pub fn resize(image: &DynamicImage, size: u32) -> DynamicImage {
    let (width, height) = image.dimensions();
    let (w, h) = target_dimensions(width, height, size);
    image.resize_exact(w, h, FilterType::Lanczos3)
}
