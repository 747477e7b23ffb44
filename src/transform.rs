//! Frame resizing and cosmetic enhancement.
//!
//! [`resize_to_target`] forces a frame to the fixed pixel size of an
//! [`AspectRatio`]; [`enhance`] applies a fixed chain of contrast, color,
//! brightness and sharpness boosts. Enhancement compounds: running it twice
//! boosts twice.

use std::path::Path;

use image::{DynamicImage, GrayImage, Luma, RgbImage, imageops::FilterType};

use crate::aspect::AspectRatio;
use crate::error::EpisnapError;

/// Contrast factor applied by [`enhance`].
pub const CONTRAST_FACTOR: f32 = 1.20;
/// Saturation factor applied by [`enhance`].
pub const COLOR_FACTOR: f32 = 1.10;
/// Brightness factor applied by [`enhance`].
pub const BRIGHTNESS_FACTOR: f32 = 1.05;
/// Sharpness factor applied by [`enhance`].
pub const SHARPNESS_FACTOR: f32 = 1.10;

/// 3×3 smoothing kernel used as the sharpness reference, center weighted.
const SMOOTH_KERNEL: [f32; 9] = [1.0, 1.0, 1.0, 1.0, 5.0, 1.0, 1.0, 1.0, 1.0];
const SMOOTH_DIVISOR: f32 = 13.0;

/// Resize `image` to exactly the target size of `aspect`.
///
/// This is a hard resize with Lanczos3 resampling; the source ratio is not
/// preserved, so crop first if it matters.
pub fn resize_to_target(image: &DynamicImage, aspect: AspectRatio) -> DynamicImage {
    let (width, height) = aspect.target_dimensions();
    if image.width() == width && image.height() == height {
        return image.clone();
    }
    log::debug!(
        "Resizing {}x{} -> {width}x{height}",
        image.width(),
        image.height()
    );
    image.resize_exact(width, height, FilterType::Lanczos3)
}

/// Apply contrast ×1.20, color ×1.10, brightness ×1.05 and sharpness ×1.10,
/// in that order.
///
/// Each step blends the frame away from a degenerate reference
/// (`reference + factor * (pixel - reference)`), so a factor above one
/// exaggerates whatever distinguishes the frame from that reference. Any
/// alpha channel is dropped.
pub fn enhance(image: &DynamicImage) -> DynamicImage {
    let mut rgb = image.to_rgb8();
    adjust_contrast(&mut rgb, CONTRAST_FACTOR);
    adjust_color(&mut rgb, COLOR_FACTOR);
    adjust_brightness(&mut rgb, BRIGHTNESS_FACTOR);
    adjust_sharpness(&mut rgb, SHARPNESS_FACTOR);
    DynamicImage::ImageRgb8(rgb)
}

/// Resize the image at `path` in place.
///
/// # Errors
///
/// Returns [`EpisnapError::ImageError`] on decode or encode failure.
pub fn resize_file(path: &Path, aspect: AspectRatio) -> Result<(), EpisnapError> {
    let image = image::open(path)?;
    resize_to_target(&image, aspect).save(path)?;
    Ok(())
}

/// Enhance the image at `path` in place.
///
/// # Errors
///
/// Returns [`EpisnapError::ImageError`] on decode or encode failure.
pub fn enhance_file(path: &Path) -> Result<(), EpisnapError> {
    let image = image::open(path)?;
    enhance(&image).save(path)?;
    Ok(())
}

fn blend(reference: f32, value: f32, factor: f32) -> u8 {
    (reference + factor * (value - reference)).round().clamp(0.0, 255.0) as u8
}

/// Reduce `image` to ITU-R 601-2 luma, truncated to whole levels.
///
/// This is the grayscale used for letterbox detection and for the
/// enhancement references. Any alpha channel is ignored.
pub fn luma_601(image: &DynamicImage) -> GrayImage {
    let rgb = image.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        Luma([luma(&rgb.get_pixel(x, y).0).trunc() as u8])
    })
}

/// ITU-R 601-2 luma, the weighting used for the gray references.
fn luma(pixel: &[u8]) -> f32 {
    (pixel[0] as f32 * 299.0 + pixel[1] as f32 * 587.0 + pixel[2] as f32 * 114.0) / 1000.0
}

fn adjust_contrast(rgb: &mut RgbImage, factor: f32) {
    let count = (rgb.width() as u64 * rgb.height() as u64).max(1);
    let total: f64 = rgb.pixels().map(|pixel| luma(&pixel.0).trunc() as f64).sum();
    let mean = (total / count as f64 + 0.5).trunc() as f32;

    for value in rgb.iter_mut() {
        *value = blend(mean, *value as f32, factor);
    }
}

fn adjust_color(rgb: &mut RgbImage, factor: f32) {
    for pixel in rgb.pixels_mut() {
        let gray = luma(&pixel.0).trunc();
        for channel in pixel.0.iter_mut() {
            *channel = blend(gray, *channel as f32, factor);
        }
    }
}

fn adjust_brightness(rgb: &mut RgbImage, factor: f32) {
    for value in rgb.iter_mut() {
        *value = blend(0.0, *value as f32, factor);
    }
}

fn adjust_sharpness(rgb: &mut RgbImage, factor: f32) {
    let (width, height) = rgb.dimensions();
    // Border pixels have no full neighbourhood; their reference is themselves.
    if width < 3 || height < 3 {
        return;
    }

    let source = rgb.clone();
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut smoothed = [0.0f32; 3];
            for (index, weight) in SMOOTH_KERNEL.iter().enumerate() {
                let sample_x = x + (index as u32 % 3) - 1;
                let sample_y = y + (index as u32 / 3) - 1;
                let sample = source.get_pixel(sample_x, sample_y);
                for channel in 0..3 {
                    smoothed[channel] += sample.0[channel] as f32 * weight;
                }
            }

            let original = source.get_pixel(x, y);
            let target = rgb.get_pixel_mut(x, y);
            for channel in 0..3 {
                let reference = (smoothed[channel] / SMOOTH_DIVISOR).round();
                target.0[channel] = blend(reference, original.0[channel] as f32, factor);
            }
        }
    }
}
