//! Post-processing stage results.
//!
//! Every post-processing step consumes the frame it is given and hands back
//! a [`StageOutcome`]. A stage that cannot do its job still returns the
//! frame it received, so the orchestrator always has an image to pass on.

use std::fmt::{Display, Formatter, Result as FmtResult};

use image::DynamicImage;

use crate::error::EpisnapError;

/// Identifies a step of the per-screenshot pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Stage {
    /// Reading the extracted frame back from disk.
    Decode,
    /// Letterbox detection and aspect-ratio cropping.
    Letterbox,
    /// Gradient and title text overlay.
    Overlay,
    /// Writing the final image back to disk.
    Encode,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Stage::Decode => "decode",
            Stage::Letterbox => "letterbox removal",
            Stage::Overlay => "title overlay",
            Stage::Encode => "encode",
        };
        f.write_str(name)
    }
}

/// Result of running one stage on one frame.
#[derive(Debug)]
#[must_use]
pub enum StageOutcome {
    /// The stage transformed the frame.
    Applied(DynamicImage),
    /// The stage had nothing to do and returned the frame untouched.
    Unchanged {
        /// The frame as it was handed in.
        image: DynamicImage,
        /// Why the stage left the frame alone.
        reason: String,
    },
    /// The stage failed; the frame is returned as it was handed in.
    Failed {
        /// The frame as it was handed in.
        image: DynamicImage,
        /// What went wrong.
        error: EpisnapError,
    },
}

impl StageOutcome {
    /// Returns `true` for [`StageOutcome::Failed`].
    pub fn is_failure(&self) -> bool {
        matches!(self, StageOutcome::Failed { .. })
    }

    /// Borrow the frame carried by this outcome.
    pub fn image(&self) -> &DynamicImage {
        match self {
            StageOutcome::Applied(image)
            | StageOutcome::Unchanged { image, .. }
            | StageOutcome::Failed { image, .. } => image,
        }
    }

    /// Take the frame, discarding the status.
    pub fn into_image(self) -> DynamicImage {
        match self {
            StageOutcome::Applied(image)
            | StageOutcome::Unchanged { image, .. }
            | StageOutcome::Failed { image, .. } => image,
        }
    }
}

/// A non-fatal failure recorded against a screenshot.
#[derive(Debug)]
pub struct StageFailure {
    /// Which stage failed.
    pub stage: Stage,
    /// The underlying error.
    pub error: EpisnapError,
}

impl Display for StageFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} failed: {}", self.stage, self.error)
    }
}
