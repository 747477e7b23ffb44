//! Error types for the `episnap` crate.
//!
//! This module defines [`EpisnapError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry the media path, the
//! timestamp or the asset involved so that a batch summary can explain each
//! failure without extra logging at the call site.

use std::{io::Error as IoError, path::PathBuf};

use image::ImageError;
use serde_json::Error as JsonError;
use thiserror::Error;

/// The unified error type for all `episnap` operations.
///
/// Post-processing stages never return this type directly to the batch;
/// they wrap it in a [`StageOutcome`](crate::StageOutcome) so the
/// orchestrator can keep going with the previous image.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EpisnapError {
    /// The duration probe could not produce a usable value.
    #[error("Failed to probe duration of {path}: {reason}")]
    Probe {
        /// Media file that was probed.
        path: PathBuf,
        /// Underlying reason the probe failed.
        reason: String,
    },

    /// The external frame extractor failed to run or reported an error.
    #[error("Failed to extract frame at {timestamp} from {path}: {reason}")]
    Extraction {
        /// Media file the frame was requested from.
        path: PathBuf,
        /// Requested timestamp in `HH:MM:SS` form.
        timestamp: String,
        /// Underlying reason the extraction failed.
        reason: String,
    },

    /// The extractor finished but the expected frame file is missing.
    #[error("Screenshot was not generated: {0}")]
    MissingFrame(PathBuf),

    /// A media duration was zero, negative, or not finite.
    #[error("Invalid media duration: {0} seconds")]
    InvalidDuration(f64),

    /// A screenshot count of zero was requested.
    #[error("Screenshot count must be greater than zero")]
    InvalidScreenshotCount,

    /// An aspect ratio string did not name a supported ratio.
    #[error("Unsupported aspect ratio: {0} (expected 16:9 or 4:3)")]
    InvalidAspectRatio(String),

    /// A timecode string could not be parsed.
    #[error("Invalid timecode: {0}")]
    InvalidTimecode(String),

    /// Neither the requested font nor any fallback font could be loaded.
    #[error("Font {name} is unavailable: {reason}")]
    FontUnavailable {
        /// The font identifier that was requested.
        name: String,
        /// Why the font and its fallbacks could not be loaded.
        reason: String,
    },

    /// Episode metadata could not be determined.
    #[error("Failed to read episode metadata from {path}: {reason}")]
    Metadata {
        /// Media file the metadata was read from.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// A settings file or option value was invalid.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The run was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while decoding or encoding a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// A settings file could not be parsed.
    #[error("Settings parse error: {0}")]
    Json(#[from] JsonError),

    /// An error originating from the libav libraries.
    #[cfg(feature = "libav")]
    #[error("libav error: {0}")]
    Libav(String),
}

#[cfg(feature = "libav")]
impl From<ffmpeg_next::Error> for EpisnapError {
    fn from(error: ffmpeg_next::Error) -> Self {
        EpisnapError::Libav(error.to_string())
    }
}
