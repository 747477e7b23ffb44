//! # episnap
//!
//! Batch-capture annotated screenshots from episode video files.
//!
//! `episnap` walks a directory of videos, works out which show, season and
//! episode each one is, and grabs a few evenly spaced stills per file with
//! FFmpeg. Every still is cleaned up in memory (black bars cropped, resized
//! to a fixed 16:9 or 4:3 frame, colors boosted) and optionally titled with
//! the episode name before being written to
//! `output/<show>/Season <NN>/`.
//!
//! ## Quick Start
//!
//! ### Screenshot a Directory
//!
//! ```no_run
//! use std::path::Path;
//!
//! use episnap::{OverlayConfig, ScreenshotConfig, ScreenshotMaker, process_directory};
//!
//! let config = ScreenshotConfig::new()
//!     .with_count(3)
//!     .with_overlay(OverlayConfig::new("Roboto-Bold.ttf").with_season_label("Roboto-Regular.ttf"));
//! let maker = ScreenshotMaker::new(config);
//!
//! let summary = process_directory(&maker, Path::new("./source"), "mkv")?;
//! println!("{summary}");
//! # Ok::<(), episnap::EpisnapError>(())
//! ```
//!
//! ### Plan Timestamps
//!
//! ```
//! use episnap::plan_timestamps;
//!
//! let plan = plan_timestamps(1800.0, 2)?;
//! assert_eq!(plan[0].to_string(), "00:10:00");
//! # Ok::<(), episnap::EpisnapError>(())
//! ```
//!
//! ### Post-process a Single Frame
//!
//! ```no_run
//! use episnap::{AspectRatio, enhance, remove_letterbox, resize_to_target};
//!
//! let frame = image::open("frame.png")?;
//! let cropped = remove_letterbox(frame, AspectRatio::Widescreen, 20).into_image();
//! let sized = resize_to_target(&cropped, AspectRatio::Widescreen);
//! enhance(&sized).save("frame.png")?;
//! # Ok::<(), episnap::EpisnapError>(())
//! ```
//!
//! ## Features
//!
//! - **Timestamp planning**: `count` points spaced `duration / (count + 1)`
//!   apart, never at the very start or end
//! - **Letterbox removal**: luminance bounding box, then a symmetric crop to
//!   the target ratio
//! - **Enhancement**: contrast, color, brightness and sharpness boosts
//! - **Title overlay**: height-relative font sizes, word wrapping, drop
//!   shadows, optional gradient backing
//! - **Failure isolation**: every post-processing stage reports a
//!   [`StageOutcome`]; nothing aborts the batch
//! - **Progress & cancellation**: [`ProgressCallback`] and
//!   [`CancellationToken`]
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `libav` | [`LibavProbe`], an in-process duration probe via `ffmpeg-next` |
//!
//! ## Requirements
//!
//! The `ffmpeg` and `ffprobe` binaries must be on `PATH` (or configured via
//! [`ToolPaths`]). The `libav` feature additionally needs the FFmpeg
//! development libraries.

pub mod aspect;
pub mod batch;
pub mod config;
pub mod error;
pub mod extract;
pub mod ffmpeg;
pub mod fonts;
pub mod letterbox;
pub mod metadata;
pub mod overlay;
pub mod probe;
pub mod progress;
pub mod screenshot;
pub mod stage;
pub mod timestamp;
pub mod transform;

pub use aspect::AspectRatio;
pub use batch::{
    BatchSummary, DEFAULT_EXTENSION, FileFailure, ScreenshotFailure, discover_media,
    process_directory, process_files,
};
pub use config::{
    GlobalOptions, LoggingSettings, ScreenshotConfig, Settings, TextOverlaySettings,
};
pub use error::EpisnapError;
pub use extract::{ExtractionRequest, FfmpegCommand, FrameExtractor};
pub use ffmpeg::{FfmpegLogLevel, ToolPaths};
pub use fonts::{FontDirectory, FontFace, FontProvider, FontdueFace, TextBitmap, TextExtent, list_fonts};
pub use letterbox::{DEFAULT_BRIGHTNESS_THRESHOLD, Region, remove_letterbox};
pub use metadata::{
    ContainerTagMetadata, EpisodeIdentity, FilenameMetadata, MetadataSource,
    clean_episode_title, parse_filename,
};
pub use overlay::{GradientOptions, OverlayConfig, OverlayMetrics, TitleOverlay};
#[cfg(feature = "libav")]
pub use probe::LibavProbe;
pub use probe::{DurationProbe, FfprobeCommand};
pub use progress::{CancellationToken, NoOpProgress, OperationType, ProgressCallback, ProgressInfo};
pub use screenshot::{
    EpisodeReport, RunContext, ScreenshotJob, ScreenshotMaker, ScreenshotReport,
    ScreenshotStatus, output_directory, screenshot_file_name,
};
pub use stage::{Stage, StageFailure, StageOutcome};
pub use timestamp::{Timestamp, parse_timecode, plan_timestamps};
pub use transform::{enhance, luma_601, resize_to_target};
