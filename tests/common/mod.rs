//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::{DynamicImage, Rgb, RgbImage};

use episnap::{
    DurationProbe, EpisnapError, EpisodeIdentity, ExtractionRequest, FontFace, FontProvider,
    FrameExtractor, MetadataSource, ProgressCallback, ProgressInfo, TextBitmap, TextExtent,
};

/// A 1920×1080 frame with black bands above and below a mid-gray picture.
pub fn letterboxed_frame() -> DynamicImage {
    let mut frame = RgbImage::new(1920, 1080);
    for y in 108..918 {
        for x in 0..1920 {
            frame.put_pixel(x, y, Rgb([128, 128, 128]));
        }
    }
    DynamicImage::ImageRgb8(frame)
}

/// A frame whose pixels vary in both directions.
pub fn gradient_frame(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x + y) % 256) as u8,
        ])
    }))
}

// ── Probe ──────────────────────────────────────────────────────────

pub struct FixedDuration(pub f64);

impl DurationProbe for FixedDuration {
    fn duration(&self, _path: &Path) -> Result<f64, EpisnapError> {
        Ok(self.0)
    }
}

/// Fails for any path whose file name contains `needle`.
pub struct FailingProbe {
    pub needle: &'static str,
    pub duration: f64,
}

impl DurationProbe for FailingProbe {
    fn duration(&self, path: &Path) -> Result<f64, EpisnapError> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if name.contains(self.needle) {
            return Err(EpisnapError::Probe {
                path: path.to_path_buf(),
                reason: "unreadable container".to_string(),
            });
        }
        Ok(self.duration)
    }
}

// ── Metadata ───────────────────────────────────────────────────────

pub struct FixedIdentity(pub EpisodeIdentity);

impl MetadataSource for FixedIdentity {
    fn identify(&self, _path: &Path) -> Result<EpisodeIdentity, EpisnapError> {
        Ok(self.0.clone())
    }
}

pub fn pilot() -> EpisodeIdentity {
    EpisodeIdentity::new("Show", "1", "2", "Pilot")
}

// ── Extractor ──────────────────────────────────────────────────────

#[derive(Clone, Copy)]
pub enum ExtractBehavior {
    /// Write a letterboxed PNG to the requested path.
    WriteFrame,
    /// Report success without writing anything.
    WriteNothing,
    /// Write bytes that are not an image.
    WriteGarbage,
    /// Return an extraction error.
    Fail,
}

/// Records every request and reacts according to its behavior.
#[derive(Clone)]
pub struct FakeExtractor {
    pub behavior: ExtractBehavior,
    pub requests: Arc<Mutex<Vec<ExtractionRequest>>>,
}

impl FakeExtractor {
    pub fn new(behavior: ExtractBehavior) -> Self {
        Self {
            behavior,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn outputs(&self) -> Vec<PathBuf> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|request| request.output.clone())
            .collect()
    }
}

impl FrameExtractor for FakeExtractor {
    fn extract(&self, request: &ExtractionRequest) -> Result<(), EpisnapError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.behavior {
            ExtractBehavior::WriteFrame => {
                letterboxed_frame().save(&request.output)?;
                Ok(())
            }
            ExtractBehavior::WriteNothing => Ok(()),
            ExtractBehavior::WriteGarbage => {
                std::fs::write(&request.output, b"not a png")?;
                Ok(())
            }
            ExtractBehavior::Fail => Err(EpisnapError::Extraction {
                path: request.input.clone(),
                timestamp: request.timestamp.to_string(),
                reason: "decoder exploded".to_string(),
            }),
        }
    }
}

// ── Fonts ──────────────────────────────────────────────────────────

/// A face whose glyphs are solid blocks half as wide as the pixel size.
pub struct BlockFace {
    size: f32,
}

impl FontFace for BlockFace {
    fn measure(&self, text: &str) -> TextExtent {
        TextExtent {
            width: text.chars().count() as f32 * self.size * 0.5,
            height: self.size,
        }
    }

    fn rasterize(&self, text: &str) -> TextBitmap {
        let advance = text.chars().count() as f32 * self.size * 0.5;
        let width = advance.ceil() as u32;
        let height = (self.size * 0.7) as u32;
        TextBitmap {
            left: 0,
            top: -(height as i32),
            width,
            height,
            coverage: vec![255; (width * height) as usize],
            advance,
        }
    }
}

/// Records `(name, size)` for every load; fails for names in `missing`.
#[derive(Clone, Default)]
pub struct RecordingFonts {
    pub loads: Arc<Mutex<Vec<(String, f32)>>>,
    pub missing: Vec<String>,
}

impl RecordingFonts {
    pub fn missing(names: &[&str]) -> Self {
        Self {
            missing: names.iter().map(|name| name.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn loads(&self) -> Vec<(String, f32)> {
        self.loads.lock().unwrap().clone()
    }
}

impl FontProvider for RecordingFonts {
    fn load(&self, name: &str, size: f32) -> Result<Box<dyn FontFace>, EpisnapError> {
        self.loads.lock().unwrap().push((name.to_string(), size));
        if self.missing.iter().any(|missing| missing == name) {
            return Err(EpisnapError::FontUnavailable {
                name: name.to_string(),
                reason: "not installed".to_string(),
            });
        }
        Ok(Box::new(BlockFace { size }))
    }
}

// ── Progress ───────────────────────────────────────────────────────

/// Collects every progress update and episode header.
#[derive(Default)]
pub struct Recorder {
    pub updates: Mutex<Vec<ProgressInfo>>,
    pub episodes: Mutex<Vec<EpisodeIdentity>>,
}

impl ProgressCallback for Recorder {
    fn on_progress(&self, info: &ProgressInfo) {
        self.updates.lock().unwrap().push(info.clone());
    }

    fn on_episode_start(
        &self,
        _video: &Path,
        identity: &EpisodeIdentity,
        _aspect: episnap::AspectRatio,
    ) {
        self.episodes.lock().unwrap().push(identity.clone());
    }
}
