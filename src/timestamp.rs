//! Screenshot timestamp planning.
//!
//! [`plan_timestamps`] spreads `count` sample points evenly across a media
//! duration, never touching the very first or very last second so that
//! opening titles and end cards are avoided.
//!
//! # Example
//!
//! ```
//! use episnap::plan_timestamps;
//!
//! let plan = plan_timestamps(600.0, 3)?;
//! let labels: Vec<String> = plan.iter().map(ToString::to_string).collect();
//! assert_eq!(labels, ["00:02:30", "00:05:00", "00:07:30"]);
//! # Ok::<(), episnap::EpisnapError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Duration;

use crate::error::EpisnapError;

/// A single planned sample point.
///
/// Keeps the exact position in seconds; the textual forms truncate the
/// fractional part.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Timestamp {
    seconds: f64,
}

impl Timestamp {
    /// Create a timestamp from a position in seconds.
    pub fn from_seconds(seconds: f64) -> Self {
        Self {
            seconds: seconds.max(0.0),
        }
    }

    /// Exact position in seconds.
    pub fn as_secs_f64(&self) -> f64 {
        self.seconds
    }

    /// Whole seconds, fraction truncated.
    pub fn whole_seconds(&self) -> u64 {
        self.seconds.trunc() as u64
    }

    /// Position as a [`Duration`].
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs_f64(self.seconds)
    }

    /// `HH.MM.SS` form used inside output file names.
    pub fn file_label(&self) -> String {
        self.to_string().replace(':', ".")
    }
}

impl Display for Timestamp {
    /// `HH:MM:SS`, zero padded. Hours are not wrapped at 24.
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let total = self.whole_seconds();
        let hours = total / 3600;
        let minutes = (total % 3600) / 60;
        let seconds = total % 60;
        write!(f, "{hours:02}:{minutes:02}:{seconds:02}")
    }
}

/// Compute `count` evenly spaced timestamps inside `(0, duration)`.
///
/// The spacing is `duration / (count + 1)`; the i-th timestamp (1-based)
/// sits at `spacing * i`.
///
/// # Errors
///
/// Returns [`EpisnapError::InvalidScreenshotCount`] when `count` is zero and
/// [`EpisnapError::InvalidDuration`] when `duration` is not a positive,
/// finite number.
pub fn plan_timestamps(duration: f64, count: u32) -> Result<Vec<Timestamp>, EpisnapError> {
    if count == 0 {
        return Err(EpisnapError::InvalidScreenshotCount);
    }
    if !duration.is_finite() || duration <= 0.0 {
        return Err(EpisnapError::InvalidDuration(duration));
    }

    let interval = duration / (count as f64 + 1.0);
    log::debug!("Planning {count} timestamps over {duration:.3}s (interval {interval:.3}s)");

    Ok((1..=count)
        .map(|index| Timestamp::from_seconds(interval * index as f64))
        .collect())
}

/// Parse a duration given as plain seconds, `MM:SS` or `HH:MM:SS[.fff]`.
///
/// # Errors
///
/// Returns [`EpisnapError::InvalidTimecode`] for anything else.
pub fn parse_timecode(value: &str) -> Result<f64, EpisnapError> {
    let invalid = || EpisnapError::InvalidTimecode(value.to_string());
    let parts: Vec<&str> = value.trim().split(':').collect();

    let seconds = match parts.as_slice() {
        [seconds] => seconds.parse::<f64>().map_err(|_| invalid())?,
        [minutes, seconds] => {
            let minutes = minutes.parse::<u64>().map_err(|_| invalid())?;
            let seconds = seconds.parse::<f64>().map_err(|_| invalid())?;
            minutes as f64 * 60.0 + seconds
        }
        [hours, minutes, seconds] => {
            let hours = hours.parse::<u64>().map_err(|_| invalid())?;
            let minutes = minutes.parse::<u64>().map_err(|_| invalid())?;
            let seconds = seconds.parse::<f64>().map_err(|_| invalid())?;
            hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds
        }
        _ => return Err(invalid()),
    };

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(invalid());
    }
    Ok(seconds)
}
