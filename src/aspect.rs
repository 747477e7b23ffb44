//! Output aspect ratios.
//!
//! Both the letterbox cropper and the resizer key their geometry off the
//! same [`AspectRatio`] value, so the ratio is parsed once at the boundary
//! (CLI flag or settings file) and passed through the pipeline as an enum.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::EpisnapError;

/// Target aspect ratio of the produced screenshots.
///
/// # Example
///
/// ```
/// use episnap::AspectRatio;
///
/// let ratio: AspectRatio = "16x9".parse().unwrap();
/// assert_eq!(ratio, AspectRatio::Widescreen);
/// assert_eq!(ratio.target_dimensions(), (1920, 1080));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AspectRatio {
    /// 16:9, rendered at 1920×1080. This is the default.
    #[default]
    Widescreen,
    /// 4:3, rendered at 1440×1080.
    Standard,
}

impl AspectRatio {
    /// Fixed output size in pixels as `(width, height)`.
    pub fn target_dimensions(self) -> (u32, u32) {
        match self {
            AspectRatio::Widescreen => (1920, 1080),
            AspectRatio::Standard => (1440, 1080),
        }
    }

    /// Desired width / height ratio.
    pub fn ratio(self) -> f64 {
        match self {
            AspectRatio::Widescreen => 16.0 / 9.0,
            AspectRatio::Standard => 4.0 / 3.0,
        }
    }

    /// Short form used in asset file names (`16x9`, `4x3`).
    pub fn slug(self) -> &'static str {
        match self {
            AspectRatio::Widescreen => "16x9",
            AspectRatio::Standard => "4x3",
        }
    }

    /// Video filter handed to the frame extractor.
    ///
    /// Square-pixel correction first, then fit inside the target box and
    /// pad the remainder so the extracted still already has the target size.
    pub fn extraction_filter(self) -> String {
        let (width, height) = self.target_dimensions();
        format!(
            "scale=iw*sar:ih,scale={width}:{height}:force_original_aspect_ratio=decrease,\
             pad={width}:{height}:(ow-iw)/2:(oh-ih)/2"
        )
    }
}

impl Display for AspectRatio {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AspectRatio::Widescreen => write!(f, "16:9"),
            AspectRatio::Standard => write!(f, "4:3"),
        }
    }
}

impl FromStr for AspectRatio {
    type Err = EpisnapError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "16:9" | "16x9" | "16/9" => Ok(AspectRatio::Widescreen),
            "4:3" | "4x3" | "4/3" => Ok(AspectRatio::Standard),
            _ => Err(EpisnapError::InvalidAspectRatio(value.to_string())),
        }
    }
}

impl Serialize for AspectRatio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AspectRatio {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_separators() {
        assert_eq!("16:9".parse::<AspectRatio>().unwrap(), AspectRatio::Widescreen);
        assert_eq!("16x9".parse::<AspectRatio>().unwrap(), AspectRatio::Widescreen);
        assert_eq!("4:3".parse::<AspectRatio>().unwrap(), AspectRatio::Standard);
        assert_eq!(" 4X3 ".parse::<AspectRatio>().unwrap(), AspectRatio::Standard);
        assert!("21:9".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn filter_mentions_target_box() {
        let filter = AspectRatio::Standard.extraction_filter();
        assert_eq!(
            filter,
            "scale=iw*sar:ih,scale=1440:1080:force_original_aspect_ratio=decrease,pad=1440:1080:(ow-iw)/2:(oh-ih)/2"
        );
    }

    #[test]
    fn ratio_matches_dimensions() {
        for aspect in [AspectRatio::Widescreen, AspectRatio::Standard] {
            let (width, height) = aspect.target_dimensions();
            assert!((width as f64 / height as f64 - aspect.ratio()).abs() < 1e-9);
        }
    }
}
