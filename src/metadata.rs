//! Episode identification.
//!
//! A screenshot's file name and overlay text come from an
//! [`EpisodeIdentity`]: show, season, episode and title. A
//! [`MetadataSource`] produces one per video. [`ContainerTagMetadata`]
//! reads the container's format tags through `ffprobe` and falls back to
//! [`parse_filename`] when a tag is missing; [`FilenameMetadata`] only looks
//! at the file name.

use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::EpisnapError;
use crate::ffmpeg::run_tool;

/// Title used when neither the tags nor the file name provide one.
pub const UNTITLED_EPISODE: &str = "Untitled Episode";

static FILENAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?)[ ._-]+[Ss]?(\d+)[Ee]?(\d+)[ ._-]+(.*?)\.[a-zA-Z0-9]+$")
        .expect("filename pattern is valid")
});
static SQUARE_BRACKETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("bracket pattern is valid"));
static ROUND_BRACKETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("parenthesis pattern is valid"));
static RELEASE_TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(WEB[-. ]?DL|WEB[-. ]?Rip|Blu[-. ]?Ray|BDRip|HDRip|HDTV|DVDRip|x264|x265|h\.?264|h\.?265|HEVC|AAC2?\.?0|AAC5\.1|EAC3|DDP5\.1|DD5\.1|Atmos|TrueHD)\b",
    )
    .expect("release tag pattern is valid")
});
static RELEASE_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_.]\s*[A-Za-z0-9]+$").expect("release group pattern is valid"));
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[_.]").expect("separator pattern is valid"));
static REPEATED_SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("space pattern is valid"));

/// Who and what a video is.
///
/// Season and episode are kept as the strings they were read as; the
/// padded forms are produced on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeIdentity {
    /// Series name.
    pub show_name: String,
    /// Season number as read.
    pub season_number: String,
    /// Episode number as read.
    pub episode_number: String,
    /// Cleaned episode title.
    pub episode_title: String,
}

impl EpisodeIdentity {
    /// Build an identity from its four parts.
    pub fn new(
        show_name: impl Into<String>,
        season_number: impl Into<String>,
        episode_number: impl Into<String>,
        episode_title: impl Into<String>,
    ) -> Self {
        Self {
            show_name: show_name.into(),
            season_number: season_number.into(),
            episode_number: episode_number.into(),
            episode_title: episode_title.into(),
        }
    }

    /// Season number left-padded with zeros to two digits.
    pub fn padded_season(&self) -> String {
        format!("{:0>2}", self.season_number)
    }

    /// Episode number left-padded with zeros to two digits.
    pub fn padded_episode(&self) -> String {
        format!("{:0>2}", self.episode_number)
    }

    /// `S01E02` style code.
    pub fn episode_code(&self) -> String {
        format!("S{}E{}", self.padded_season(), self.padded_episode())
    }

    /// Text drawn above the title, e.g. `Season 01 – Episode 02`.
    pub fn season_label(&self) -> String {
        format!(
            "Season {} – Episode {}",
            self.padded_season(),
            self.padded_episode()
        )
    }
}

impl Display for EpisodeIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{} - {} - {}",
            self.show_name,
            self.episode_code(),
            self.episode_title
        )
    }
}

/// Resolves the identity of a video.
pub trait MetadataSource {
    /// Identify the episode stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`EpisnapError::Metadata`] if no identity can be produced.
    fn identify(&self, path: &Path) -> Result<EpisodeIdentity, EpisnapError>;
}

/// Identifies episodes from their file name alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilenameMetadata;

impl MetadataSource for FilenameMetadata {
    fn identify(&self, path: &Path) -> Result<EpisodeIdentity, EpisnapError> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| EpisnapError::Metadata {
                path: path.to_path_buf(),
                reason: "file name is not valid UTF-8".to_string(),
            })?;
        Ok(parse_filename(name))
    }
}

/// Identifies episodes from container tags, falling back to the file name.
///
/// Reads the `show` (or `album`), `season_number`, `episode_sort` and
/// `title` format tags. Any missing show or title, or any probe failure,
/// falls back to [`parse_filename`].
#[derive(Debug, Clone)]
pub struct ContainerTagMetadata {
    program: PathBuf,
}

impl Default for ContainerTagMetadata {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerTagMetadata {
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
            "format_tags=title,season_number,episode_sort,show,album".to_string(),
            "-of".to_string(),
            "default=noprint_wrappers=1".to_string(),
            path.to_string_lossy().into_owned(),
        ]
    }

    fn read_tags(&self, path: &Path) -> Result<HashMap<String, String>, EpisnapError> {
        let output = run_tool(self.program.as_os_str(), Self::arguments(path)).map_err(|error| {
            EpisnapError::Metadata {
                path: path.to_path_buf(),
                reason: format!("failed to run {}: {error}", self.program.display()),
            }
        })?;
        Ok(parse_tag_lines(&output.stdout))
    }
}

impl MetadataSource for ContainerTagMetadata {
    fn identify(&self, path: &Path) -> Result<EpisodeIdentity, EpisnapError> {
        let tags = match self.read_tags(path) {
            Ok(tags) => tags,
            Err(error) => {
                log::error!("Error extracting metadata from {}: {error}", path.display());
                HashMap::new()
            }
        };

        match identity_from_tags(&tags) {
            Some(identity) => Ok(identity),
            None => {
                log::debug!(
                    "Incomplete tags for {}, parsing the file name",
                    path.display()
                );
                FilenameMetadata.identify(path)
            }
        }
    }
}

/// Parse `TAG:key=value` lines into a map keyed by lower-cased tag name.
pub fn parse_tag_lines(output: &str) -> HashMap<String, String> {
    output
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let key = key.trim();
            let key = key.strip_prefix("TAG:").unwrap_or(key);
            (key.to_ascii_lowercase(), value.trim().to_string())
        })
        .collect()
}

/// Build an identity from container tags.
///
/// Returns `None` unless both a show name and a title are present.
pub fn identity_from_tags(tags: &HashMap<String, String>) -> Option<EpisodeIdentity> {
    let tag = |name: &str| tags.get(name).map(String::as_str).filter(|value| !value.is_empty());

    let show_name = tag("show").or_else(|| tag("album"))?;
    let episode_title = tag("title")?;
    Some(EpisodeIdentity::new(
        show_name,
        tag("season_number").unwrap_or("1"),
        tag("episode_sort").unwrap_or("1"),
        clean_episode_title(episode_title),
    ))
}

/// Derive an identity from a file name such as
/// `Show.Name.S01E02.Episode.Title.mkv`.
///
/// Names that do not match yield the stem as the show, season and episode
/// `1`, and [`UNTITLED_EPISODE`].
///
/// ```
/// use episnap::parse_filename;
///
/// let identity = parse_filename("The.Show.S02E05.The.Long.Night.mkv");
/// assert_eq!(identity.show_name, "The Show");
/// assert_eq!(identity.episode_code(), "S02E05");
/// assert_eq!(identity.episode_title, "The Long Night");
/// ```
pub fn parse_filename(file_name: &str) -> EpisodeIdentity {
    let identity = match FILENAME_PATTERN.captures(file_name) {
        Some(captures) => EpisodeIdentity::new(
            captures[1].replace('.', " ").trim(),
            &captures[2],
            &captures[3],
            captures[4].replace('.', " ").trim(),
        ),
        None => {
            let stem = Path::new(file_name)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or(file_name);
            EpisodeIdentity::new(stem, "1", "1", UNTITLED_EPISODE)
        }
    };

    EpisodeIdentity {
        episode_title: clean_episode_title(&identity.episode_title),
        ..identity
    }
}

/// Strip release noise from an episode title.
///
/// Removes bracketed and parenthesized content, common quality and codec
/// tags, and a trailing release group; turns `_` and `.` into spaces;
/// collapses repeated spaces; trims spaces, dashes and dots from both ends.
///
/// ```
/// use episnap::clean_episode_title;
///
/// assert_eq!(clean_episode_title("Pilot [1080p] WEB-DL x264-GROUP"), "Pilot");
/// ```
pub fn clean_episode_title(title: &str) -> String {
    let title = SQUARE_BRACKETS.replace_all(title, "");
    let title = ROUND_BRACKETS.replace_all(&title, "");
    let title = RELEASE_TAGS.replace_all(&title, "");
    let title = RELEASE_GROUP.replace(title.trim_end(), "");
    let title = SEPARATORS.replace_all(&title, " ");
    let title = REPEATED_SPACES.replace_all(&title, " ");
    title
        .trim_matches(|c| matches!(c, ' ' | '-' | '.'))
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_keeps_long_numbers() {
        let identity = EpisodeIdentity::new("Show", "3", "112", "Title");
        assert_eq!(identity.episode_code(), "S03E112");
        assert_eq!(identity.season_label(), "Season 03 – Episode 112");
    }

    #[test]
    fn tag_lines_are_normalised() {
        let tags = parse_tag_lines("TAG:show=My Show\nTAG:TITLE=Pilot\nnot a tag\n");
        assert_eq!(tags.get("show").map(String::as_str), Some("My Show"));
        assert_eq!(tags.get("title").map(String::as_str), Some("Pilot"));
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn album_stands_in_for_show() {
        let tags = parse_tag_lines("TAG:album=Anthology\nTAG:title=Part One\nTAG:episode_sort=4\n");
        let identity = identity_from_tags(&tags).expect("complete tags");
        assert_eq!(identity.show_name, "Anthology");
        assert_eq!(identity.season_number, "1");
        assert_eq!(identity.episode_number, "4");
    }

    #[test]
    fn missing_title_tag_is_incomplete() {
        let tags = parse_tag_lines("TAG:show=My Show\n");
        assert!(identity_from_tags(&tags).is_none());
    }

    #[test]
    fn unmatched_filename_uses_defaults() {
        let identity = parse_filename("holiday_special.mkv");
        assert_eq!(identity.show_name, "holiday_special");
        assert_eq!(identity.episode_code(), "S01E01");
        assert_eq!(identity.episode_title, UNTITLED_EPISODE);
    }
}
