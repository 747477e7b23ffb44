//! Integration tests for progress reporting and cancellation.

mod common;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use episnap::{
    CancellationToken, NoOpProgress, OperationType, ProgressCallback, ProgressInfo, RunContext,
    ScreenshotConfig, ScreenshotMaker, process_files,
};

use common::{ExtractBehavior, FakeExtractor, FixedDuration, FixedIdentity, Recorder, pilot};

fn maker_with(config: ScreenshotConfig) -> ScreenshotMaker {
    let context = RunContext::system()
        .with_probe(FixedDuration(400.0))
        .with_metadata(FixedIdentity(pilot()))
        .with_extractor(FakeExtractor::new(ExtractBehavior::WriteFrame));
    ScreenshotMaker::with_context(config, context)
}

// ── Cancellation token ─────────────────────────────────────────────

#[test]
fn token_starts_clear() {
    assert!(!CancellationToken::new().is_cancelled());
    assert!(!CancellationToken::default().is_cancelled());
}

#[test]
fn clones_share_state() {
    let token = CancellationToken::new();
    let clone = token.clone();
    clone.cancel();
    assert!(token.is_cancelled());
}

#[test]
fn cancel_from_another_thread() {
    let token = CancellationToken::new();
    let remote = token.clone();
    std::thread::spawn(move || remote.cancel())
        .join()
        .expect("thread panicked");
    assert!(token.is_cancelled());
}

// ── Callbacks ──────────────────────────────────────────────────────

#[test]
fn noop_progress_accepts_updates() {
    let info = ProgressInfo {
        operation: OperationType::FileProcessing,
        current: 1,
        total: Some(2),
        percentage: Some(50.0),
        elapsed: Duration::from_millis(10),
        estimated_remaining: Some(Duration::from_millis(10)),
        current_file: None,
        current_timestamp: None,
    };
    NoOpProgress.on_progress(&info);
}

#[test]
fn capture_updates_carry_timestamps() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let recorder = Arc::new(Recorder::default());
    let config = ScreenshotConfig::new()
        .with_output_root(dir.path())
        .with_count(3)
        .with_progress(recorder.clone());
    let maker = maker_with(config);

    let video = PathBuf::from("Show.S01E02.Pilot.mkv");
    maker.process_video(&video).expect("Failed to process video");

    let updates = recorder.updates.lock().unwrap();
    assert_eq!(updates.len(), 3);
    let timestamps: Vec<u64> = updates
        .iter()
        .map(|info| info.current_timestamp.expect("timestamp").as_secs())
        .collect();
    assert_eq!(timestamps, [100, 200, 300]);

    let last = &updates[2];
    assert_eq!(last.operation, OperationType::ScreenshotCapture);
    assert_eq!(last.current, 3);
    assert_eq!(last.total, Some(3));
    assert_eq!(last.percentage, Some(100.0));
    assert_eq!(last.estimated_remaining, Some(Duration::ZERO));
    assert_eq!(last.current_file.as_deref(), Some(video.as_path()));
}

#[test]
fn file_updates_count_every_file() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let recorder = Arc::new(Recorder::default());
    let config = ScreenshotConfig::new()
        .with_output_root(dir.path())
        .with_count(1)
        .with_progress(recorder.clone());
    let maker = maker_with(config);

    let files = [PathBuf::from("a.mkv"), PathBuf::from("b.mkv")];
    process_files(&maker, &files);

    let updates = recorder.updates.lock().unwrap();
    let file_updates: Vec<(u64, Option<f32>)> = updates
        .iter()
        .filter(|info| info.operation == OperationType::FileProcessing)
        .map(|info| (info.current, info.percentage))
        .collect();
    assert_eq!(file_updates, [(1, Some(50.0)), (2, Some(100.0))]);
}

#[test]
fn episode_header_fires_once_per_video() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let recorder = Arc::new(Recorder::default());
    let config = ScreenshotConfig::new()
        .with_output_root(dir.path())
        .with_count(2)
        .with_progress(recorder.clone());
    let maker = maker_with(config);

    process_files(&maker, &[PathBuf::from("a.mkv"), PathBuf::from("b.mkv")]);
    assert_eq!(recorder.episodes.lock().unwrap().len(), 2);
}

/// A callback that only implements the required method.
struct Minimal;

impl ProgressCallback for Minimal {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

#[test]
fn episode_header_is_optional() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = ScreenshotConfig::new()
        .with_output_root(dir.path())
        .with_count(1)
        .with_progress(Arc::new(Minimal));
    let summary = process_files(&maker_with(config), &[PathBuf::from("a.mkv")]);
    assert_eq!(summary.images_created, 1);
}
