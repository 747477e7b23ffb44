//! Run configuration.
//!
//! [`ScreenshotConfig`] is a builder that threads the per-run options,
//! progress callback and cancellation token through the orchestrator
//! without polluting every function signature. [`Settings`] is the
//! on-disk JSON file the CLI reads defaults from.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use episnap::{
//!     AspectRatio, CancellationToken, OverlayConfig, ProgressCallback, ProgressInfo,
//!     ScreenshotConfig,
//! };
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{:?}: {} done", info.operation, info.current);
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let config = ScreenshotConfig::new()
//!     .with_aspect_ratio(AspectRatio::Standard)
//!     .with_count(5)
//!     .with_overwrite(false)
//!     .with_overlay(OverlayConfig::new("Roboto-Bold.ttf"))
//!     .with_progress(Arc::new(LogProgress))
//!     .with_cancellation(token.clone());
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::aspect::AspectRatio;
use crate::error::EpisnapError;
use crate::ffmpeg::ToolPaths;
use crate::letterbox::DEFAULT_BRIGHTNESS_THRESHOLD;
use crate::overlay::OverlayConfig;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Screenshots taken per video when nothing else is configured.
pub const DEFAULT_SCREENSHOT_COUNT: u32 = 3;

/// Options for one capture run.
///
/// All fields have sensible defaults: 16:9, three screenshots per video,
/// overwrite on, enhancement on, letterbox removal on, no title overlay,
/// output under the current directory.
#[derive(Clone)]
pub struct ScreenshotConfig {
    pub(crate) aspect_ratio: AspectRatio,
    pub(crate) count: u32,
    pub(crate) overwrite: bool,
    pub(crate) enhance: bool,
    pub(crate) remove_letterbox: bool,
    pub(crate) letterbox_threshold: u8,
    pub(crate) overlay: Option<OverlayConfig>,
    pub(crate) output_root: PathBuf,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
}

impl Debug for ScreenshotConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ScreenshotConfig")
            .field("aspect_ratio", &self.aspect_ratio)
            .field("count", &self.count)
            .field("overwrite", &self.overwrite)
            .field("enhance", &self.enhance)
            .field("remove_letterbox", &self.remove_letterbox)
            .field("letterbox_threshold", &self.letterbox_threshold)
            .field("overlay", &self.overlay)
            .field("output_root", &self.output_root)
            .field("has_cancellation", &self.cancellation.is_some())
            .finish()
    }
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenshotConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self {
            aspect_ratio: AspectRatio::default(),
            count: DEFAULT_SCREENSHOT_COUNT,
            overwrite: true,
            enhance: true,
            remove_letterbox: true,
            letterbox_threshold: DEFAULT_BRIGHTNESS_THRESHOLD,
            overlay: None,
            output_root: PathBuf::from("."),
            progress: Arc::new(NoOpProgress),
            cancellation: None,
        }
    }

    /// Set the output aspect ratio.
    #[must_use]
    pub fn with_aspect_ratio(mut self, aspect: AspectRatio) -> Self {
        self.aspect_ratio = aspect;
        self
    }

    /// Set how many screenshots to take per video.
    ///
    /// Zero is accepted here and rejected when the run is planned.
    #[must_use]
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Replace existing screenshots (`true`) or leave them alone.
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Toggle the contrast / color / brightness / sharpness boost.
    #[must_use]
    pub fn with_enhance(mut self, enhance: bool) -> Self {
        self.enhance = enhance;
        self
    }

    /// Toggle letterbox removal.
    #[must_use]
    pub fn with_letterbox_removal(mut self, remove: bool) -> Self {
        self.remove_letterbox = remove;
        self
    }

    /// Luminance at or below which a pixel counts as letterbox.
    #[must_use]
    pub fn with_letterbox_threshold(mut self, threshold: u8) -> Self {
        self.letterbox_threshold = threshold;
        self
    }

    /// Draw episode titles using `overlay`.
    #[must_use]
    pub fn with_overlay(mut self, overlay: OverlayConfig) -> Self {
        self.overlay = Some(overlay);
        self
    }

    /// Disable the title overlay.
    #[must_use]
    pub fn without_overlay(mut self) -> Self {
        self.overlay = None;
        self
    }

    /// Directory under which `output/<show>/Season <NN>/` is created.
    #[must_use]
    pub fn with_output_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.output_root = root.into();
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled the run stops before the next file or
    /// screenshot and returns [`EpisnapError::Cancelled`].
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Output aspect ratio.
    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    /// Screenshots per video.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Whether existing screenshots are replaced.
    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    /// Whether frames are enhanced.
    pub fn enhance(&self) -> bool {
        self.enhance
    }

    /// Whether letterboxes are removed.
    pub fn remove_letterbox(&self) -> bool {
        self.remove_letterbox
    }

    /// Letterbox luminance threshold.
    pub fn letterbox_threshold(&self) -> u8 {
        self.letterbox_threshold
    }

    /// Title overlay settings, if titles are drawn.
    pub fn overlay(&self) -> Option<&OverlayConfig> {
        self.overlay.as_ref()
    }

    /// Output root directory.
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Returns `true` if cancellation has been requested.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}

/// `global_options` section of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalOptions {
    /// Output aspect ratio (`"16:9"`, `"16x9"`, `"4:3"`, `"4x3"`).
    pub aspect_ratio: AspectRatio,
}

/// `text_overlays` section of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextOverlaySettings {
    /// Composite a bottom gradient before drawing titles.
    pub add_gradient: bool,
    /// Use the `_strong` gradient variant.
    pub prefer_strong_gradient: bool,
}

/// `logging` section of the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `env_logger` filter, e.g. `"info"` or `"episnap=debug"`.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Contents of the JSON settings file.
///
/// ```json
/// {
///   "global_options": { "aspect_ratio": "16x9" },
///   "text_overlays": { "add_gradient": true, "prefer_strong_gradient": false },
///   "logging": { "level": "info" },
///   "tools": { "ffmpeg": "ffmpeg", "ffprobe": "ffprobe" }
/// }
/// ```
///
/// Every section and key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Options that apply to every run.
    pub global_options: GlobalOptions,
    /// Title overlay options.
    pub text_overlays: TextOverlaySettings,
    /// Log output options.
    pub logging: LoggingSettings,
    /// Locations of `ffmpeg` and `ffprobe`.
    pub tools: ToolPaths,
}

impl Settings {
    /// Read settings from `path`.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EpisnapError::IoError`] if the file exists but cannot be
    /// read, or [`EpisnapError::Json`] if it is not valid settings JSON.
    pub fn load(path: &Path) -> Result<Self, EpisnapError> {
        if !path.exists() {
            log::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&text)?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Parse settings from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`EpisnapError::Json`] on malformed input.
    pub fn from_json(text: &str) -> Result<Self, EpisnapError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Apply the file's values on top of `config`.
    ///
    /// The aspect ratio is always taken from the file. Gradient options are
    /// only applied when `config` already carries an overlay.
    #[must_use]
    pub fn apply_to(&self, mut config: ScreenshotConfig) -> ScreenshotConfig {
        config.aspect_ratio = self.global_options.aspect_ratio;
        if let Some(overlay) = config.overlay.as_mut() {
            overlay.gradient.enabled = self.text_overlays.add_gradient;
            overlay.gradient.strong = self.text_overlays.prefer_strong_gradient;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ScreenshotConfig::new();
        assert_eq!(config.count(), 3);
        assert!(config.overwrite());
        assert!(config.enhance());
        assert!(config.remove_letterbox());
        assert_eq!(config.letterbox_threshold(), 20);
        assert!(config.overlay().is_none());
        assert!(!config.is_cancelled());
    }

    #[test]
    fn cancellation_is_observed() {
        let token = CancellationToken::new();
        let config = ScreenshotConfig::new().with_cancellation(token.clone());
        token.cancel();
        assert!(config.is_cancelled());
    }

    #[test]
    fn settings_apply_gradient_only_with_overlay() {
        let settings = Settings::from_json(
            r#"{"global_options":{"aspect_ratio":"4x3"},"text_overlays":{"add_gradient":true}}"#,
        )
        .expect("Failed to parse settings");

        let bare = settings.apply_to(ScreenshotConfig::new());
        assert_eq!(bare.aspect_ratio(), AspectRatio::Standard);
        assert!(bare.overlay().is_none());

        let titled = settings.apply_to(ScreenshotConfig::new().with_overlay(OverlayConfig::new("a.ttf")));
        let overlay = titled.overlay().expect("overlay kept");
        assert!(overlay.gradient.enabled);
        assert!(!overlay.gradient.strong);
    }
}
