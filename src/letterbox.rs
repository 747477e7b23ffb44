//! Letterbox detection and aspect-ratio cropping.
//!
//! A frame is reduced to ITU-R 601 luma and every pixel brighter than a
//! threshold counts as content. The smallest rectangle enclosing all content
//! pixels is kept, then the longer axis is trimmed symmetrically until the
//! frame matches the requested [`AspectRatio`].

use std::path::Path;

use image::{DynamicImage, GrayImage};

use crate::aspect::AspectRatio;
use crate::error::EpisnapError;
use crate::stage::StageOutcome;
use crate::transform::luma_601;

/// Luminance at or below this value is treated as letterbox.
pub const DEFAULT_BRIGHTNESS_THRESHOLD: u8 = 20;

/// Ratios closer than this to the target are left alone.
const RATIO_TOLERANCE: f64 = 0.01;

/// A pixel rectangle, `x`/`y` inclusive, `width`/`height` in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Left column.
    pub x: u32,
    /// Top row.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Region {
    /// Width / height.
    pub fn ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// Find the bounding box of all pixels brighter than `threshold`.
///
/// Returns `None` when no pixel exceeds the threshold.
pub fn content_bounds(luma: &GrayImage, threshold: u8) -> Option<Region> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;

    for (x, y, pixel) in luma.enumerate_pixels() {
        if pixel.0[0] <= threshold {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((min_x, min_y, max_x, max_y)) => {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            }
        });
    }

    bounds.map(|(min_x, min_y, max_x, max_y)| Region {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    })
}

/// Trim `region` symmetrically so its ratio matches `desired`.
///
/// Only the oversized axis shrinks; the offset is rounded down.
pub fn fit_to_ratio(region: Region, desired: f64) -> Region {
    let current = region.ratio();
    if (current - desired).abs() <= RATIO_TOLERANCE {
        return region;
    }

    if current > desired {
        let width = ((region.height as f64 * desired) as u32).clamp(1, region.width);
        Region {
            x: region.x + (region.width - width) / 2,
            width,
            ..region
        }
    } else {
        let height = ((region.width as f64 / desired) as u32).clamp(1, region.height);
        Region {
            y: region.y + (region.height - height) / 2,
            height,
            ..region
        }
    }
}

/// Remove black bars from `image` and crop it to `aspect`.
///
/// An image without any pixel above `threshold` comes back
/// [`Unchanged`](StageOutcome::Unchanged) with a warning logged.
pub fn remove_letterbox(image: DynamicImage, aspect: AspectRatio, threshold: u8) -> StageOutcome {
    if image.width() == 0 || image.height() == 0 {
        return StageOutcome::Unchanged {
            image,
            reason: "empty image".to_string(),
        };
    }

    let Some(content) = content_bounds(&luma_601(&image), threshold) else {
        log::warn!("No content detected in frame, skipping letterbox removal");
        return StageOutcome::Unchanged {
            image,
            reason: format!("no pixel brighter than {threshold}"),
        };
    };

    let target = fit_to_ratio(content, aspect.ratio());
    if target.x == 0 && target.y == 0 && target.width == image.width() && target.height == image.height() {
        return StageOutcome::Unchanged {
            image,
            reason: "frame already matches content and ratio".to_string(),
        };
    }

    log::debug!(
        "Letterbox crop {}x{} -> content {:?} -> {:?}",
        image.width(),
        image.height(),
        content,
        target
    );
    StageOutcome::Applied(image.crop_imm(target.x, target.y, target.width, target.height))
}

/// File-based variant of [`remove_letterbox`].
///
/// Reads `input`, crops it, and writes the result to `output` (which may
/// be the same path). Returns `true` when a crop was written.
///
/// # Errors
///
/// Returns [`EpisnapError::ImageError`] if the frame cannot be decoded or
/// the result cannot be encoded.
pub fn remove_letterbox_file(
    input: &Path,
    output: &Path,
    aspect: AspectRatio,
    threshold: u8,
) -> Result<bool, EpisnapError> {
    let image = image::open(input)?;
    match remove_letterbox(image, aspect, threshold) {
        StageOutcome::Applied(cropped) => {
            cropped.save(output)?;
            Ok(true)
        }
        StageOutcome::Unchanged { image, .. } if input != output => {
            image.save(output)?;
            Ok(false)
        }
        StageOutcome::Unchanged { .. } => Ok(false),
        StageOutcome::Failed { error, .. } => Err(error),
    }
}
