//! Directory-level batch processing.
//!
//! [`discover_media`] finds the videos under a source directory and
//! [`process_directory`] feeds them through a [`ScreenshotMaker`] one at a
//! time. A file that cannot be processed is recorded in the
//! [`BatchSummary`] and the batch moves on.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::EpisnapError;
use crate::progress::{OperationType, ProgressTracker};
use crate::screenshot::{ScreenshotMaker, ScreenshotStatus};

/// Extension scanned for when none is configured.
pub const DEFAULT_EXTENSION: &str = "mkv";

/// A video that produced no screenshots at all.
#[derive(Debug)]
pub struct FileFailure {
    /// The video.
    pub path: PathBuf,
    /// Why it was skipped.
    pub error: EpisnapError,
}

/// A screenshot that could not be produced.
#[derive(Debug)]
pub struct ScreenshotFailure {
    /// Intended output path.
    pub output: PathBuf,
    /// Why it failed.
    pub error: EpisnapError,
}

/// Totals for a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Stills written.
    pub images_created: usize,
    /// Stills left alone because they already existed.
    pub images_skipped: usize,
    /// Videos that were identified, probed and attempted.
    pub episodes_processed: usize,
    /// Non-fatal stage failures across all stills.
    pub stage_failures: usize,
    /// Videos that could not be processed.
    pub failed_files: Vec<FileFailure>,
    /// Stills that could not be produced.
    pub failed_screenshots: Vec<ScreenshotFailure>,
    /// Set when cancellation stopped the batch early.
    pub cancelled: bool,
}

impl BatchSummary {
    /// Returns `true` when no file or screenshot failed.
    pub fn is_clean(&self) -> bool {
        self.failed_files.is_empty() && self.failed_screenshots.is_empty()
    }
}

impl Display for BatchSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "Successfully created {} images for {} episodes.",
            self.images_created, self.episodes_processed
        )?;
        if self.images_skipped > 0 {
            write!(f, " Skipped {} existing images.", self.images_skipped)?;
        }
        if !self.failed_files.is_empty() {
            write!(f, "\nFailed to process {} file(s):", self.failed_files.len())?;
            for failure in &self.failed_files {
                write!(f, "\n - {}: {}", failure.path.display(), failure.error)?;
            }
        }
        if !self.failed_screenshots.is_empty() {
            write!(f, "\nFailed screenshots ({}):", self.failed_screenshots.len())?;
            for failure in &self.failed_screenshots {
                write!(f, "\n - {}: {}", failure.output.display(), failure.error)?;
            }
        }
        if self.cancelled {
            write!(f, "\nRun cancelled before completion.")?;
        }
        Ok(())
    }
}

/// Find every file under `source` whose extension matches `extension`
/// (case-insensitive), sorted by path.
///
/// # Errors
///
/// Returns [`EpisnapError::Configuration`] if `source` is not a directory,
/// or [`EpisnapError::IoError`] if it cannot be walked.
pub fn discover_media(source: &Path, extension: &str) -> Result<Vec<PathBuf>, EpisnapError> {
    if !source.is_dir() {
        return Err(EpisnapError::Configuration(format!(
            "source directory {} does not exist",
            source.display()
        )));
    }

    let wanted = extension.trim_start_matches('.');
    let mut files = Vec::new();
    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry.map_err(|error| EpisnapError::IoError(error.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted));
        if matches {
            files.push(entry.into_path());
        }
    }
    files.sort();
    log::debug!("Found {} .{wanted} files under {}", files.len(), source.display());
    Ok(files)
}

/// Discover the videos under `source` and process them.
///
/// # Errors
///
/// Only discovery errors are returned; per-file problems land in the
/// summary.
pub fn process_directory(
    maker: &ScreenshotMaker,
    source: &Path,
    extension: &str,
) -> Result<BatchSummary, EpisnapError> {
    let files = discover_media(source, extension)?;
    if files.is_empty() {
        log::warn!("No .{extension} files found in {}", source.display());
    }
    Ok(process_files(maker, &files))
}

/// Process `files` in order, checking for cancellation before each one.
pub fn process_files(maker: &ScreenshotMaker, files: &[PathBuf]) -> BatchSummary {
    let mut summary = BatchSummary::default();
    let mut tracker = ProgressTracker::new(
        maker.config().progress.clone(),
        OperationType::FileProcessing,
        Some(files.len() as u64),
    );

    for file in files {
        log::info!("Processing file: {}", file.display());
        let report = match maker.process_video(file) {
            Ok(report) => report,
            Err(EpisnapError::Cancelled) => {
                summary.cancelled = true;
                break;
            }
            Err(error) => {
                log::warn!("Skipping {}: {error}", file.display());
                summary.failed_files.push(FileFailure {
                    path: file.clone(),
                    error,
                });
                tracker.advance(Some(file.clone()), None);
                continue;
            }
        };

        summary.episodes_processed += 1;
        for screenshot in report.screenshots {
            summary.stage_failures += screenshot.stage_failures.len();
            match screenshot.status {
                ScreenshotStatus::Generated => summary.images_created += 1,
                ScreenshotStatus::Skipped => summary.images_skipped += 1,
                ScreenshotStatus::Failed(error) => {
                    summary.failed_screenshots.push(ScreenshotFailure {
                        output: screenshot.job.output,
                        error,
                    })
                }
            }
        }
        tracker.advance(Some(file.clone()), None);

        if report.cancelled {
            summary.cancelled = true;
            break;
        }
    }

    log::info!(
        "Created {} images for {} episodes",
        summary.images_created,
        summary.episodes_processed
    );
    summary
}
