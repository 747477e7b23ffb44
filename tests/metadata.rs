//! Integration tests for episode identification.

use std::path::Path;

use episnap::metadata::{UNTITLED_EPISODE, identity_from_tags, parse_tag_lines};
use episnap::{
    ContainerTagMetadata, EpisodeIdentity, FilenameMetadata, MetadataSource, clean_episode_title,
    parse_filename,
};

// ── File names ─────────────────────────────────────────────────────

#[test]
fn dotted_release_name() {
    let identity = parse_filename("Some.Show.S03E07.The.Reckoning.WEB-DL.x264-GRP.mkv");
    assert_eq!(identity.show_name, "Some Show");
    assert_eq!(identity.season_number, "03");
    assert_eq!(identity.episode_number, "07");
    assert_eq!(identity.episode_title, "The Reckoning");
}

#[test]
fn spaced_name_with_dashes() {
    let identity = parse_filename("My Show - S01E02 - Pilot.mkv");
    assert_eq!(identity.show_name, "My Show");
    assert_eq!(identity.episode_code(), "S01E02");
    assert_eq!(identity.episode_title, "Pilot");
}

#[test]
fn bracketed_noise_is_removed() {
    let identity = parse_filename("Show_S02E10_Finale [1080p] (Director's Cut).mkv");
    assert_eq!(identity.show_name, "Show");
    assert_eq!(identity.episode_code(), "S02E10");
    assert_eq!(identity.episode_title, "Finale");
}

#[test]
fn unrecognised_name_falls_back() {
    let identity = parse_filename("bonus-feature.mkv");
    assert_eq!(identity.show_name, "bonus-feature");
    assert_eq!(identity.episode_code(), "S01E01");
    assert_eq!(identity.episode_title, UNTITLED_EPISODE);
}

#[test]
fn filename_source_uses_only_the_name() {
    let identity = FilenameMetadata
        .identify(Path::new("/media/library/Show.S01E05.Five.mkv"))
        .expect("Failed to identify");
    assert_eq!(identity, EpisodeIdentity::new("Show", "01", "05", "Five"));
}

// ── Titles ─────────────────────────────────────────────────────────

#[test]
fn title_cleanup() {
    assert_eq!(clean_episode_title("Pilot [1080p] WEB-DL x264-GROUP"), "Pilot");
    assert_eq!(clean_episode_title("Ozymandias-NTb"), "Ozymandias");
    assert_eq!(clean_episode_title("  -Ozymandias.  "), "Ozymandias");
    assert_eq!(clean_episode_title("Part One (2019) HDTV"), "Part One");
}

// ── Container tags ─────────────────────────────────────────────────

#[test]
fn complete_tags_win() {
    let tags = parse_tag_lines(
        "TAG:show=Tagged Show\nTAG:season_number=4\nTAG:episode_sort=11\nTAG:title=Tagged [HDTV]\n",
    );
    let identity = identity_from_tags(&tags).expect("complete tags");
    assert_eq!(identity.show_name, "Tagged Show");
    assert_eq!(identity.episode_code(), "S04E11");
    assert_eq!(identity.episode_title, "Tagged");
    assert_eq!(identity.season_label(), "Season 04 – Episode 11");
}

#[test]
fn unavailable_probe_falls_back_to_file_name() {
    let source = ContainerTagMetadata::new().with_program("episnap-no-such-ffprobe");
    let identity = source
        .identify(Path::new("Show.S01E02.Pilot.mkv"))
        .expect("file name fallback");
    assert_eq!(identity, parse_filename("Show.S01E02.Pilot.mkv"));
}

#[test]
fn probe_arguments_ask_for_format_tags() {
    let args = ContainerTagMetadata::arguments(Path::new("ep.mkv"));
    assert!(args.iter().any(|arg| arg.starts_with("format_tags=")));
    assert_eq!(args.last().map(String::as_str), Some("ep.mkv"));
}

#[test]
fn identity_serializes() {
    let identity = EpisodeIdentity::new("Show", "1", "2", "Pilot");
    let json = serde_json::to_value(&identity).unwrap();
    assert_eq!(json["show_name"], "Show");
    assert_eq!(json["episode_title"], "Pilot");
    assert_eq!(identity.to_string(), "Show - S01E02 - Pilot");
}
