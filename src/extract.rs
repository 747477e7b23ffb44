//! Single-frame extraction.
//!
//! The orchestrator asks a [`FrameExtractor`] to write one still per
//! timestamp and then checks that the file exists. [`FfmpegCommand`] is the
//! stock extractor and shells out to `ffmpeg`.

use std::path::{Path, PathBuf};

use crate::error::EpisnapError;
use crate::ffmpeg::{FfmpegLogLevel, run_tool};
use crate::timestamp::Timestamp;

/// Pixel format requested from the extractor by default.
pub const DEFAULT_PIXEL_FORMAT: &str = "rgb24";
/// `-q:v` value requested by default (lower is better).
pub const DEFAULT_QUALITY: u8 = 2;

/// One frame to extract.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    /// Source video.
    pub input: PathBuf,
    /// Seek position.
    pub timestamp: Timestamp,
    /// Where the still is written.
    pub output: PathBuf,
    /// Optional `-vf` filter chain.
    pub filter: Option<String>,
    /// Output pixel format.
    pub pixel_format: String,
    /// Encoder quality.
    pub quality: u8,
}

impl ExtractionRequest {
    /// Request the frame at `timestamp` of `input`, written to `output`.
    pub fn new<I, O>(input: I, timestamp: Timestamp, output: O) -> Self
    where
        I: Into<PathBuf>,
        O: Into<PathBuf>,
    {
        Self {
            input: input.into(),
            timestamp,
            output: output.into(),
            filter: None,
            pixel_format: DEFAULT_PIXEL_FORMAT.to_string(),
            quality: DEFAULT_QUALITY,
        }
    }

    /// Apply `filter` while extracting.
    #[must_use]
    pub fn with_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

/// Something that can write one frame of a video to an image file.
///
/// A successful return does not guarantee the file exists; callers check.
pub trait FrameExtractor {
    /// Write the requested frame.
    ///
    /// # Errors
    ///
    /// Returns [`EpisnapError::Extraction`] if the extractor could not run.
    fn extract(&self, request: &ExtractionRequest) -> Result<(), EpisnapError>;
}

/// Extracts frames by running `ffmpeg`.
///
/// # Example
///
/// ```no_run
/// use episnap::{AspectRatio, ExtractionRequest, FfmpegCommand, FrameExtractor, Timestamp};
///
/// let request = ExtractionRequest::new("episode.mkv", Timestamp::from_seconds(150.0), "frame.png")
///     .with_filter(AspectRatio::Widescreen.extraction_filter());
/// FfmpegCommand::new().extract(&request)?;
/// # Ok::<(), episnap::EpisnapError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    program: PathBuf,
    log_level: FfmpegLogLevel,
}

impl Default for FfmpegCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegCommand {
    /// Use `ffmpeg` from `PATH`, logging at `panic` level.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            log_level: FfmpegLogLevel::default(),
        }
    }

    /// Use the binary at `program`.
    #[must_use]
    pub fn with_program<P: Into<PathBuf>>(mut self, program: P) -> Self {
        self.program = program.into();
        self
    }

    /// Set ffmpeg's own `-loglevel`.
    #[must_use]
    pub fn with_log_level(mut self, level: FfmpegLogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Arguments passed to `ffmpeg` for `request`.
    ///
    /// The seek goes before `-i` so ffmpeg seeks the input instead of
    /// decoding up to the timestamp.
    pub fn arguments(&self, request: &ExtractionRequest) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-loglevel".to_string(),
            self.log_level.as_arg().to_string(),
            "-ss".to_string(),
            request.timestamp.to_string(),
            "-i".to_string(),
            path_arg(&request.input),
            "-frames:v".to_string(),
            "1".to_string(),
            "-q:v".to_string(),
            request.quality.to_string(),
            "-pix_fmt".to_string(),
            request.pixel_format.clone(),
        ];
        if let Some(filter) = &request.filter {
            args.push("-vf".to_string());
            args.push(filter.clone());
        }
        args.push(path_arg(&request.output));
        args
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl FrameExtractor for FfmpegCommand {
    fn extract(&self, request: &ExtractionRequest) -> Result<(), EpisnapError> {
        log::debug!(
            "Extracting {} @ {} -> {}",
            request.input.display(),
            request.timestamp,
            request.output.display()
        );

        let output = run_tool(self.program.as_os_str(), self.arguments(request)).map_err(|error| {
            EpisnapError::Extraction {
                path: request.input.clone(),
                timestamp: request.timestamp.to_string(),
                reason: format!("failed to run {}: {error}", self.program.display()),
            }
        })?;

        if !output.success {
            let stderr = output.stderr.trim();
            return Err(EpisnapError::Extraction {
                path: request.input.clone(),
                timestamp: request.timestamp.to_string(),
                reason: if stderr.is_empty() {
                    "ffmpeg exited with an error".to_string()
                } else {
                    stderr.to_string()
                },
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_follow_expected_order() {
        let request = ExtractionRequest::new("in.mkv", Timestamp::from_seconds(3725.9), "out.png")
            .with_filter("scale=1920:1080");
        let args = FfmpegCommand::new().arguments(&request);
        assert_eq!(
            args,
            [
                "-y", "-loglevel", "panic", "-ss", "01:02:05", "-i", "in.mkv", "-frames:v", "1",
                "-q:v", "2", "-pix_fmt", "rgb24", "-vf", "scale=1920:1080", "out.png",
            ]
        );
    }

    #[test]
    fn filter_is_optional() {
        let request = ExtractionRequest::new("in.mkv", Timestamp::from_seconds(1.0), "out.png");
        let args = FfmpegCommand::new()
            .with_log_level(FfmpegLogLevel::Error)
            .arguments(&request);
        assert!(!args.iter().any(|arg| arg == "-vf"));
        assert_eq!(args[2], "error");
        assert_eq!(args.last().map(String::as_str), Some("out.png"));
    }

    #[test]
    fn missing_binary_is_extraction_error() {
        let request = ExtractionRequest::new("in.mkv", Timestamp::from_seconds(1.0), "out.png");
        let extractor = FfmpegCommand::new().with_program("episnap-no-such-ffmpeg");
        assert!(matches!(
            extractor.extract(&request),
            Err(EpisnapError::Extraction { .. })
        ));
    }
}
