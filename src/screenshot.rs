//! Per-video screenshot orchestration.
//!
//! [`ScreenshotMaker`] turns one video into a handful of finished stills.
//! For every planned timestamp it decides whether to skip, asks the
//! extractor for the raw frame, then runs the frame through letterbox
//! removal, resizing, enhancement and the title overlay in memory before
//! writing it back once. A stage that fails is recorded on the
//! [`ScreenshotReport`] and the frame continues with its previous pixels.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::config::ScreenshotConfig;
use crate::error::EpisnapError;
use crate::extract::{ExtractionRequest, FfmpegCommand, FrameExtractor};
use crate::ffmpeg::ToolPaths;
use crate::fonts::{FontDirectory, FontProvider};
use crate::letterbox::remove_letterbox;
use crate::metadata::{ContainerTagMetadata, EpisodeIdentity, MetadataSource};
use crate::overlay::TitleOverlay;
use crate::probe::{DurationProbe, FfprobeCommand};
use crate::progress::{OperationType, ProgressTracker};
use crate::stage::{Stage, StageFailure, StageOutcome};
use crate::timestamp::{Timestamp, plan_timestamps};
use crate::transform::{enhance, resize_to_target};

/// The external collaborators a run talks to.
///
/// [`RunContext::system`] wires up the stock `ffprobe`/`ffmpeg`-backed
/// implementations; tests swap individual pieces with the `with_*`
/// methods.
pub struct RunContext {
    probe: Box<dyn DurationProbe>,
    extractor: Box<dyn FrameExtractor>,
    metadata: Box<dyn MetadataSource>,
    fonts: Box<dyn FontProvider>,
}

impl RunContext {
    /// `ffprobe` for durations and tags, `ffmpeg` for frames, fonts from
    /// `./fonts`.
    pub fn system() -> Self {
        Self::from_tools(&ToolPaths::default())
    }

    /// Like [`RunContext::system`], with explicit tool locations.
    pub fn from_tools(tools: &ToolPaths) -> Self {
        Self {
            probe: Box::new(FfprobeCommand::new().with_program(&tools.ffprobe)),
            extractor: Box::new(FfmpegCommand::new().with_program(&tools.ffmpeg)),
            metadata: Box::new(ContainerTagMetadata::new().with_program(&tools.ffprobe)),
            fonts: Box::new(FontDirectory::new("./fonts")),
        }
    }

    /// Replace the duration probe.
    #[must_use]
    pub fn with_probe<P: DurationProbe + 'static>(mut self, probe: P) -> Self {
        self.probe = Box::new(probe);
        self
    }

    /// Replace the frame extractor.
    #[must_use]
    pub fn with_extractor<E: FrameExtractor + 'static>(mut self, extractor: E) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    /// Replace the metadata source.
    #[must_use]
    pub fn with_metadata<M: MetadataSource + 'static>(mut self, metadata: M) -> Self {
        self.metadata = Box::new(metadata);
        self
    }

    /// Replace the font provider.
    #[must_use]
    pub fn with_fonts<F: FontProvider + 'static>(mut self, fonts: F) -> Self {
        self.fonts = Box::new(fonts);
        self
    }

    /// The duration probe.
    pub fn probe(&self) -> &dyn DurationProbe {
        self.probe.as_ref()
    }

    /// The metadata source.
    pub fn metadata(&self) -> &dyn MetadataSource {
        self.metadata.as_ref()
    }
}

/// One screenshot to produce.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenshotJob {
    /// Capture position.
    pub timestamp: Timestamp,
    /// Final image path.
    pub output: PathBuf,
}

/// Terminal state of one screenshot.
#[derive(Debug)]
pub enum ScreenshotStatus {
    /// The still was extracted and written.
    Generated,
    /// The still already existed and overwriting is disabled.
    Skipped,
    /// No still was produced.
    Failed(EpisnapError),
}

/// What happened to one screenshot.
#[derive(Debug)]
pub struct ScreenshotReport {
    /// The job this report belongs to.
    pub job: ScreenshotJob,
    /// Terminal state.
    pub status: ScreenshotStatus,
    /// Stages that failed without stopping the screenshot.
    pub stage_failures: Vec<StageFailure>,
}

impl ScreenshotReport {
    fn new(job: ScreenshotJob, status: ScreenshotStatus) -> Self {
        Self {
            job,
            status,
            stage_failures: Vec::new(),
        }
    }

    /// Returns `true` when the still was written.
    pub fn is_generated(&self) -> bool {
        matches!(self.status, ScreenshotStatus::Generated)
    }
}

/// Everything produced for one video.
#[derive(Debug)]
pub struct EpisodeReport {
    /// The source video.
    pub video: PathBuf,
    /// Who the video turned out to be.
    pub identity: EpisodeIdentity,
    /// Probed duration in seconds.
    pub duration: f64,
    /// One report per attempted screenshot, in timestamp order.
    pub screenshots: Vec<ScreenshotReport>,
    /// Set when cancellation stopped the video part-way.
    pub cancelled: bool,
}

impl EpisodeReport {
    /// Number of stills written.
    pub fn generated(&self) -> usize {
        self.screenshots.iter().filter(|report| report.is_generated()).count()
    }
}

/// `"{show} - S{NN}E{NN} - {title} - ({HH.MM.SS}).png"`.
pub fn screenshot_file_name(identity: &EpisodeIdentity, timestamp: &Timestamp) -> String {
    format!(
        "{} - {} - {} - ({}).png",
        identity.show_name,
        identity.episode_code(),
        identity.episode_title,
        timestamp.file_label()
    )
}

/// `<root>/output/<show>/Season <NN>`.
pub fn output_directory(root: &Path, identity: &EpisodeIdentity) -> PathBuf {
    root.join("output")
        .join(&identity.show_name)
        .join(format!("Season {}", identity.padded_season()))
}

/// Drives the per-screenshot pipeline for one video at a time.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// use episnap::{ScreenshotConfig, ScreenshotMaker};
///
/// let maker = ScreenshotMaker::new(ScreenshotConfig::new().with_count(4));
/// let report = maker.process_video(Path::new("source/Show.S01E01.Pilot.mkv"))?;
/// println!("{} of {} generated", report.generated(), report.screenshots.len());
/// # Ok::<(), episnap::EpisnapError>(())
/// ```
pub struct ScreenshotMaker {
    config: ScreenshotConfig,
    context: RunContext,
}

impl ScreenshotMaker {
    /// A maker backed by the system tools.
    ///
    /// Fonts are read from the overlay's fonts directory when titles are
    /// enabled.
    pub fn new(config: ScreenshotConfig) -> Self {
        Self::with_tools(config, &ToolPaths::default())
    }

    /// A maker backed by the tools at `tools`.
    pub fn with_tools(config: ScreenshotConfig, tools: &ToolPaths) -> Self {
        let mut context = RunContext::from_tools(tools);
        if let Some(overlay) = config.overlay() {
            context = context.with_fonts(overlay.font_directory());
        }
        Self { config, context }
    }

    /// A maker using explicit collaborators.
    pub fn with_context(config: ScreenshotConfig, context: RunContext) -> Self {
        Self { config, context }
    }

    /// The run configuration.
    pub fn config(&self) -> &ScreenshotConfig {
        &self.config
    }

    /// The collaborators.
    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// Identify, probe and screenshot `video`.
    ///
    /// The output directory is created on demand.
    ///
    /// # Errors
    ///
    /// Returns [`EpisnapError::Cancelled`] if cancellation was requested
    /// before the video started, or the metadata, probe, planning or
    /// directory error that prevented any screenshot from being attempted.
    pub fn process_video(&self, video: &Path) -> Result<EpisodeReport, EpisnapError> {
        if self.config.is_cancelled() {
            return Err(EpisnapError::Cancelled);
        }

        let identity = self.context.metadata.identify(video)?;
        let duration = self.context.probe.duration(video)?;
        let jobs = self.plan_jobs(&identity, duration)?;
        if let Some(directory) = jobs.first().and_then(|job| job.output.parent()) {
            fs::create_dir_all(directory)?;
        }

        log::info!(
            "Screenshots will be saved for {} - {}",
            identity.show_name,
            identity.episode_code()
        );
        self.config
            .progress
            .on_episode_start(video, &identity, self.config.aspect_ratio);

        let mut report = EpisodeReport {
            video: video.to_path_buf(),
            identity,
            duration,
            screenshots: Vec::with_capacity(jobs.len()),
            cancelled: false,
        };

        let mut tracker = ProgressTracker::new(
            self.config.progress.clone(),
            OperationType::ScreenshotCapture,
            Some(jobs.len() as u64),
        );

        for job in jobs {
            if self.config.is_cancelled() {
                log::warn!("Cancelled before {}", job.output.display());
                report.cancelled = true;
                break;
            }
            let timestamp = job.timestamp.as_duration();
            let screenshot = self.generate(video, &report.identity, job);
            report.screenshots.push(screenshot);
            tracker.advance(Some(video.to_path_buf()), Some(timestamp));
        }

        Ok(report)
    }

    /// Plan the screenshots of a video of `duration` seconds.
    ///
    /// # Errors
    ///
    /// Returns the planning error for a zero count or unusable duration.
    pub fn plan_jobs(
        &self,
        identity: &EpisodeIdentity,
        duration: f64,
    ) -> Result<Vec<ScreenshotJob>, EpisnapError> {
        let directory = output_directory(&self.config.output_root, identity);
        Ok(plan_timestamps(duration, self.config.count)?
            .into_iter()
            .map(|timestamp| ScreenshotJob {
                output: directory.join(screenshot_file_name(identity, &timestamp)),
                timestamp,
            })
            .collect())
    }

    /// Produce one screenshot.
    ///
    /// Never fails as a whole: extraction problems yield
    /// [`ScreenshotStatus::Failed`], stage problems are listed in
    /// [`ScreenshotReport::stage_failures`].
    pub fn generate(
        &self,
        video: &Path,
        identity: &EpisodeIdentity,
        job: ScreenshotJob,
    ) -> ScreenshotReport {
        if job.output.exists() && !self.config.overwrite {
            log::info!(
                "Screenshot already exists and overwrite is disabled: {}",
                job.output.display()
            );
            return ScreenshotReport::new(job, ScreenshotStatus::Skipped);
        }

        // A stale still must not stand in for a frame the extractor never wrote.
        match fs::remove_file(&job.output) {
            Ok(()) => log::debug!("Removed previous screenshot {}", job.output.display()),
            Err(error) if error.kind() == ErrorKind::NotFound => {}
            Err(error) => {
                log::error!(
                    "Failed to replace screenshot {}: {error}",
                    job.output.display()
                );
                return ScreenshotReport::new(job, ScreenshotStatus::Failed(error.into()));
            }
        }

        let request = ExtractionRequest::new(video, job.timestamp, &job.output)
            .with_filter(self.config.aspect_ratio.extraction_filter());
        if let Err(error) = self.context.extractor.extract(&request) {
            log::error!(
                "Failed to generate screenshot for {}: {error}",
                job.output.display()
            );
            return ScreenshotReport::new(job, ScreenshotStatus::Failed(error));
        }
        if !job.output.exists() {
            log::error!("Screenshot was not generated: {}", job.output.display());
            let error = EpisnapError::MissingFrame(job.output.clone());
            return ScreenshotReport::new(job, ScreenshotStatus::Failed(error));
        }

        let mut report = ScreenshotReport::new(job, ScreenshotStatus::Generated);
        let frame = match image::open(&report.job.output) {
            Ok(frame) => frame,
            Err(error) => {
                record_failure(&mut report, Stage::Decode, error.into());
                return report;
            }
        };

        let frame = self.post_process(frame, identity, &mut report);
        if let Err(error) = frame.save(&report.job.output) {
            record_failure(&mut report, Stage::Encode, error.into());
        }
        report
    }

    fn post_process(
        &self,
        frame: DynamicImage,
        identity: &EpisodeIdentity,
        report: &mut ScreenshotReport,
    ) -> DynamicImage {
        let aspect = self.config.aspect_ratio;
        let mut frame = frame;

        if self.config.remove_letterbox {
            frame = settle(
                report,
                Stage::Letterbox,
                remove_letterbox(frame, aspect, self.config.letterbox_threshold),
            );
        }

        frame = resize_to_target(&frame, aspect);

        if self.config.enhance {
            frame = enhance(&frame);
        }

        if let Some(overlay) = &self.config.overlay {
            let label = identity.season_label();
            let stage = TitleOverlay::new(overlay, aspect, self.context.fonts.as_ref());
            frame = settle(
                report,
                Stage::Overlay,
                stage.apply(frame, &identity.episode_title, Some(&label)),
            );
        }

        frame
    }
}

/// Unwrap a stage outcome, recording a failure on `report`.
fn settle(report: &mut ScreenshotReport, stage: Stage, outcome: StageOutcome) -> DynamicImage {
    match outcome {
        StageOutcome::Applied(image) => image,
        StageOutcome::Unchanged { image, reason } => {
            log::debug!("{stage} left {} unchanged: {reason}", report.job.output.display());
            image
        }
        StageOutcome::Failed { image, error } => {
            record_failure(report, stage, error);
            image
        }
    }
}

fn record_failure(report: &mut ScreenshotReport, stage: Stage, error: EpisnapError) {
    log::error!("{stage} failed for {}: {error}", report.job.output.display());
    report.stage_failures.push(StageFailure { stage, error });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_pads_and_relabels() {
        let identity = EpisodeIdentity::new("Show", "1", "2", "Pilot");
        let name = screenshot_file_name(&identity, &Timestamp::from_seconds(3725.0));
        assert_eq!(name, "Show - S01E02 - Pilot - (01.02.05).png");
    }

    #[test]
    fn output_directory_layout() {
        let identity = EpisodeIdentity::new("Show", "3", "2", "Pilot");
        let directory = output_directory(Path::new("/media"), &identity);
        assert_eq!(directory, Path::new("/media/output/Show/Season 03"));
    }

    #[test]
    fn plan_jobs_rejects_zero_count() {
        let maker = ScreenshotMaker::new(ScreenshotConfig::new().with_count(0));
        let identity = EpisodeIdentity::new("Show", "1", "1", "Pilot");
        assert!(matches!(
            maker.plan_jobs(&identity, 600.0),
            Err(EpisnapError::InvalidScreenshotCount)
        ));
    }
}
