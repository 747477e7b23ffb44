//! Media duration probing.
//!
//! The orchestrator needs exactly one fact about a video before planning
//! screenshots: its duration. [`DurationProbe`] is the seam; [`FfprobeCommand`]
//! asks the `ffprobe` binary and, with the `libav` feature, [`LibavProbe`]
//! reads the container header in-process.

use std::path::{Path, PathBuf};

use crate::error::EpisnapError;
#[cfg(feature = "libav")]
use crate::ffmpeg::FfmpegLogLevel;
use crate::ffmpeg::run_tool;

/// Something that can tell how long a media file is.
pub trait DurationProbe {
    /// Duration of `path` in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`EpisnapError::Probe`] when no duration can be read and
    /// [`EpisnapError::InvalidDuration`] when the value is not positive.
    fn duration(&self, path: &Path) -> Result<f64, EpisnapError>;
}

/// Probes durations by running `ffprobe`.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// use episnap::{DurationProbe, FfprobeCommand};
///
/// let seconds = FfprobeCommand::new().duration(Path::new("episode.mkv"))?;
/// println!("{seconds:.1}s");
/// # Ok::<(), episnap::EpisnapError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FfprobeCommand {
    program: PathBuf,
}

impl Default for FfprobeCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl FfprobeCommand {
    /// Use `ffprobe` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("ffprobe"),
        }
    }

    /// Use the binary at `program`.
    #[must_use]
    pub fn with_program<P: Into<PathBuf>>(mut self, program: P) -> Self {
        self.program = program.into();
        self
    }

    /// Arguments passed to `ffprobe` for `path`.
    pub fn arguments(path: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-show_entries".to_string(),
            "format=duration".to_string(),
            "-of".to_string(),
            "default=noprint_wrappers=1:nokey=1".to_string(),
            path.display().to_string(),
        ]
    }
}

impl DurationProbe for FfprobeCommand {
    fn duration(&self, path: &Path) -> Result<f64, EpisnapError> {
        let output = run_tool(self.program.as_os_str(), Self::arguments(path)).map_err(|error| {
            EpisnapError::Probe {
                path: path.to_path_buf(),
                reason: format!("failed to run {}: {error}", self.program.display()),
            }
        })?;

        let text = output.stdout.trim();
        if text.is_empty() {
            log::error!("No duration found for {}", path.display());
            return Err(EpisnapError::Probe {
                path: path.to_path_buf(),
                reason: match output.stderr.trim() {
                    "" => "ffprobe reported no duration".to_string(),
                    stderr => stderr.to_string(),
                },
            });
        }

        parse_duration(path, text)
    }
}

/// Parse the first line of probe output as a positive number of seconds.
///
/// # Errors
///
/// Returns [`EpisnapError::Probe`] for non-numeric text and
/// [`EpisnapError::InvalidDuration`] for zero, negative or non-finite values.
pub fn parse_duration(path: &Path, text: &str) -> Result<f64, EpisnapError> {
    let first = text.lines().next().unwrap_or_default().trim();
    let seconds: f64 = first.parse().map_err(|_| EpisnapError::Probe {
        path: path.to_path_buf(),
        reason: format!("unparseable duration '{first}'"),
    })?;

    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(EpisnapError::InvalidDuration(seconds));
    }
    log::debug!("Duration of {}: {seconds:.3}s", path.display());
    Ok(seconds)
}

/// Probes durations in-process through libav.
///
/// Only available with the `libav` feature.
#[cfg(feature = "libav")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LibavProbe {
    log_level: FfmpegLogLevel,
}

#[cfg(feature = "libav")]
impl LibavProbe {
    /// A probe that keeps libav quiet (`panic` level).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the libav log level applied before each probe.
    #[must_use]
    pub fn with_log_level(mut self, level: FfmpegLogLevel) -> Self {
        self.log_level = level;
        self
    }
}

#[cfg(feature = "libav")]
impl DurationProbe for LibavProbe {
    fn duration(&self, path: &Path) -> Result<f64, EpisnapError> {
        // Safe to call repeatedly.
        ffmpeg_next::init()?;
        self.log_level.apply_to_libav();

        let input_context = ffmpeg_next::format::input(&path).map_err(|error| EpisnapError::Probe {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;

        let microseconds = input_context.duration();
        if microseconds <= 0 {
            return Err(EpisnapError::InvalidDuration(0.0));
        }
        let seconds = microseconds as f64 / f64::from(ffmpeg_next::ffi::AV_TIME_BASE);
        log::debug!("Duration of {}: {seconds:.3}s", path.display());
        Ok(seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ffprobe_output() {
        let seconds = parse_duration(Path::new("a.mkv"), "1325.482000\n").expect("valid duration");
        assert!((seconds - 1325.482).abs() < 1e-9);
    }

    #[test]
    fn rejects_non_numeric_output() {
        assert!(matches!(
            parse_duration(Path::new("a.mkv"), "N/A"),
            Err(EpisnapError::Probe { .. })
        ));
    }

    #[test]
    fn rejects_zero_duration() {
        assert!(matches!(
            parse_duration(Path::new("a.mkv"), "0.0"),
            Err(EpisnapError::InvalidDuration(_))
        ));
    }

    #[test]
    fn missing_binary_is_probe_error() {
        let probe = FfprobeCommand::new().with_program("episnap-no-such-ffprobe");
        assert!(matches!(
            probe.duration(Path::new("a.mkv")),
            Err(EpisnapError::Probe { .. })
        ));
    }

    #[cfg(feature = "libav")]
    #[test]
    fn libav_probe_reports_unreadable_files() {
        let probe = LibavProbe::new().with_log_level(FfmpegLogLevel::Quiet);
        assert!(matches!(
            probe.duration(Path::new("/nonexistent/episode.mkv")),
            Err(EpisnapError::Probe { .. })
        ));
    }

    #[cfg(feature = "libav")]
    #[test]
    fn libav_errors_convert() {
        let error = EpisnapError::from(ffmpeg_next::Error::Eof);
        assert!(matches!(error, EpisnapError::Libav(_)));
    }
}
