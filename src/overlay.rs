//! Episode title overlay.
//!
//! Lays the episode title out at the bottom of a frame, optionally topped by
//! a "Season NN – Episode NN" label, and draws every string twice: a
//! translucent black shadow offset by a few pixels, then the text itself in
//! white. An optional pre-rendered gradient is composited along the bottom
//! edge first so the text stays legible on bright frames.
//!
//! All sizes derive from the frame height:
//!
//! | quantity | formula |
//! |----------|---------|
//! | title font size | `max(height × 0.10, 60)` |
//! | season font size | `max(title × 0.4, 30)` |
//! | line spacing | `max(title × 0.10, 5)` |
//! | title spacing | `max(season × 0.5, 35)` |

use std::path::{Path, PathBuf};

use image::{DynamicImage, Rgba, RgbaImage, imageops, imageops::FilterType};
use serde::{Deserialize, Serialize};

use crate::aspect::AspectRatio;
use crate::error::EpisnapError;
use crate::fonts::{FontDirectory, FontFace, FontProvider, TextBitmap};
use crate::stage::StageOutcome;

/// Pixels between the last title line and the bottom edge.
pub const BOTTOM_MARGIN: f64 = 1.0;
/// Shadow displacement, applied to both axes.
pub const SHADOW_OFFSET: i32 = 3;
/// Shadow color.
pub const SHADOW_COLOR: Rgba<u8> = Rgba([0, 0, 0, 150]);
/// Text color.
pub const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
/// Share of the frame width a title line may occupy.
const MAX_TEXT_WIDTH_SHARE: f64 = 0.6;
/// Average glyph width as a share of the font size, used for wrapping.
const AVERAGE_GLYPH_WIDTH: f64 = 0.6;

/// Bottom-gradient settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientOptions {
    /// Composite a gradient before drawing text.
    pub enabled: bool,
    /// Prefer the `_strong` gradient variant.
    pub strong: bool,
    /// Directory holding `gradient_<16x9|4x3>_bottom[_strong].png`.
    pub directory: PathBuf,
}

impl Default for GradientOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            strong: false,
            directory: PathBuf::from("./gradients"),
        }
    }
}

impl GradientOptions {
    /// Path of the gradient asset for `aspect`.
    pub fn asset_path(&self, aspect: AspectRatio) -> PathBuf {
        let suffix = if self.strong { "_strong" } else { "" };
        self.directory
            .join(format!("gradient_{}_bottom{suffix}.png", aspect.slug()))
    }
}

/// Text overlay settings, resolved once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Font file used for the episode title.
    pub title_font: String,
    /// Font file used for the season/episode label. Without one the label
    /// is not drawn.
    pub season_font: Option<String>,
    /// Draw the season/episode label above the title.
    pub include_season_label: bool,
    /// Bottom gradient.
    #[serde(default)]
    pub gradient: GradientOptions,
    /// Directory the font names are resolved against.
    #[serde(default = "default_fonts_directory")]
    pub fonts_directory: PathBuf,
    /// Font tried before the system fallbacks when a font is missing.
    #[serde(default)]
    pub fallback_font: Option<PathBuf>,
}

fn default_fonts_directory() -> PathBuf {
    PathBuf::from("./fonts")
}

impl OverlayConfig {
    /// Title-only overlay using `title_font`.
    pub fn new<S: Into<String>>(title_font: S) -> Self {
        Self {
            title_font: title_font.into(),
            season_font: None,
            include_season_label: false,
            gradient: GradientOptions::default(),
            fonts_directory: default_fonts_directory(),
            fallback_font: None,
        }
    }

    /// Also draw the season/episode label in `font`.
    #[must_use]
    pub fn with_season_label<S: Into<String>>(mut self, font: S) -> Self {
        self.include_season_label = true;
        self.season_font = Some(font.into());
        self
    }

    /// Set the gradient options.
    #[must_use]
    pub fn with_gradient(mut self, gradient: GradientOptions) -> Self {
        self.gradient = gradient;
        self
    }

    /// Resolve font names against `directory`.
    #[must_use]
    pub fn with_fonts_directory<P: Into<PathBuf>>(mut self, directory: P) -> Self {
        self.fonts_directory = directory.into();
        self
    }

    /// Try `path` first when a requested font cannot be loaded.
    #[must_use]
    pub fn with_fallback_font<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.fallback_font = Some(path.into());
        self
    }

    /// A [`FontDirectory`] reading from the configured fonts directory.
    pub fn font_directory(&self) -> FontDirectory {
        let fonts = FontDirectory::new(&self.fonts_directory);
        match &self.fallback_font {
            Some(path) => fonts.with_fallback(path),
            None => fonts,
        }
    }
}

/// Height-derived sizes driving the layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayMetrics {
    /// Pixel size of the title font.
    pub title_font_size: f64,
    /// Pixel size of the season/episode font.
    pub season_font_size: f64,
    /// Gap between wrapped title lines.
    pub line_spacing: f64,
    /// Extra gap between the title block and the season label.
    pub title_spacing: f64,
}

impl OverlayMetrics {
    /// Derive all sizes from a frame height.
    pub fn for_height(height: u32) -> Self {
        let title_font_size = (height as f64 * 0.10).max(60.0);
        let season_font_size = (title_font_size * 0.4).max(30.0);
        Self {
            title_font_size,
            season_font_size,
            line_spacing: (title_font_size * 0.10).max(5.0),
            title_spacing: (season_font_size * 0.5).max(35.0),
        }
    }

    /// Estimated characters per title line for a frame `width` pixels wide.
    pub fn chars_per_line(&self, width: u32) -> usize {
        let max_width_pixels = (width as f64 * MAX_TEXT_WIDTH_SHARE).trunc();
        ((max_width_pixels / (self.title_font_size * AVERAGE_GLYPH_WIDTH)) as usize).max(1)
    }
}

/// Which font a placed string uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    /// A line of the episode title.
    Title,
    /// The season/episode label.
    Season,
}

/// A string positioned on the frame.
///
/// `x` is the horizontal center and `baseline` the baseline row of the
/// text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPlacement {
    /// The string to draw.
    pub text: String,
    /// Font selection.
    pub role: TextRole,
    /// Horizontal center.
    pub x: f64,
    /// Baseline row.
    pub baseline: f64,
}

/// Fonts plus placements for one frame.
pub struct OverlayPlan {
    /// Sizes the plan was derived from.
    pub metrics: OverlayMetrics,
    /// Placements in drawing order (title lines bottom-up, then the label).
    pub placements: Vec<TextPlacement>,
    title_face: Box<dyn FontFace>,
    season_face: Option<Box<dyn FontFace>>,
}

impl OverlayPlan {
    fn face(&self, role: TextRole) -> &dyn FontFace {
        match (role, &self.season_face) {
            (TextRole::Season, Some(face)) => face.as_ref(),
            _ => self.title_face.as_ref(),
        }
    }
}

/// Word-wrap `text` to lines of at most `width` characters.
///
/// Runs of whitespace collapse to single spaces; words longer than `width`
/// are split across lines.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let mut remaining: Vec<char> = word.chars().collect();
        while !remaining.is_empty() {
            let separator = usize::from(current_len > 0);
            if current_len + separator + remaining.len() <= width {
                if separator == 1 {
                    current.push(' ');
                }
                current_len += separator + remaining.len();
                current.extend(remaining.drain(..));
                break;
            }

            if remaining.len() <= width {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
                continue;
            }

            let space_left = width.saturating_sub(current_len + separator);
            if space_left == 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
                continue;
            }
            if separator == 1 {
                current.push(' ');
            }
            current.extend(remaining.drain(..space_left));
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
    }

    if current_len > 0 {
        lines.push(current);
    }
    lines
}

/// Title overlay stage.
///
/// # Example
///
/// ```no_run
/// use episnap::{AspectRatio, FontDirectory, OverlayConfig, TitleOverlay};
///
/// let fonts = FontDirectory::new("./fonts");
/// let config = OverlayConfig::new("Roboto-Bold.ttf").with_season_label("Roboto-Regular.ttf");
/// let overlay = TitleOverlay::new(&config, AspectRatio::Widescreen, &fonts);
///
/// let frame = image::open("frame.png").unwrap();
/// let titled = overlay
///     .apply(frame, "The One Where It Begins", Some("Season 01 – Episode 01"))
///     .into_image();
/// titled.save("frame.png").unwrap();
/// ```
pub struct TitleOverlay<'a> {
    config: &'a OverlayConfig,
    aspect: AspectRatio,
    fonts: &'a dyn FontProvider,
}

impl<'a> TitleOverlay<'a> {
    /// Create an overlay stage.
    pub fn new(config: &'a OverlayConfig, aspect: AspectRatio, fonts: &'a dyn FontProvider) -> Self {
        Self {
            config,
            aspect,
            fonts,
        }
    }

    /// Load fonts and position every string for a `width`×`height` frame.
    ///
    /// Title lines are stacked upwards from the bottom margin: each line
    /// (last line first) moves the cursor up by its own height plus the line
    /// spacing and is drawn there. The label goes above the topmost title
    /// line, a further `2 × label height + title spacing` up.
    ///
    /// # Errors
    ///
    /// Returns [`EpisnapError::FontUnavailable`] if the title font cannot
    /// be loaded. A season font that cannot be loaded drops the label.
    pub fn layout(
        &self,
        width: u32,
        height: u32,
        episode_title: &str,
        season_label: Option<&str>,
    ) -> Result<OverlayPlan, EpisnapError> {
        let metrics = OverlayMetrics::for_height(height);
        let title_face = self
            .fonts
            .load(&self.config.title_font, metrics.title_font_size as f32)?;

        let season_label = season_label.filter(|_| self.config.include_season_label);
        let season_face = match (season_label, self.config.season_font.as_deref()) {
            (Some(_), Some(name)) => match self.fonts.load(name, metrics.season_font_size as f32) {
                Ok(face) => Some(face),
                Err(error) => {
                    log::warn!("Dropping season label: {error}");
                    None
                }
            },
            (Some(_), None) => {
                log::debug!("No season font configured, skipping season label");
                None
            }
            _ => None,
        };

        let center = (width / 2) as f64;
        let lines = wrap_text(episode_title, metrics.chars_per_line(width));
        let mut placements = Vec::with_capacity(lines.len() + 1);

        let mut cursor = height as f64 - BOTTOM_MARGIN;
        for line in lines.into_iter().rev() {
            let line_height = title_face.measure(&line).height as f64;
            cursor -= line_height + metrics.line_spacing;
            placements.push(TextPlacement {
                text: line,
                role: TextRole::Title,
                x: center,
                baseline: cursor,
            });
        }

        if let (Some(label), Some(face)) = (season_label, &season_face) {
            let label_height = face.measure(label).height as f64;
            placements.push(TextPlacement {
                text: label.to_string(),
                role: TextRole::Season,
                x: center,
                baseline: cursor - label_height * 2.0 - metrics.title_spacing,
            });
        }

        Ok(OverlayPlan {
            metrics,
            placements,
            title_face,
            season_face,
        })
    }

    /// Draw the gradient, the title and the optional label onto `image`.
    ///
    /// A missing gradient asset only logs a warning. Font failures return
    /// [`StageOutcome::Failed`] with the frame untouched.
    pub fn apply(
        &self,
        image: DynamicImage,
        episode_title: &str,
        season_label: Option<&str>,
    ) -> StageOutcome {
        let (width, height) = (image.width(), image.height());
        let plan = match self.layout(width, height, episode_title, season_label) {
            Ok(plan) => plan,
            Err(error) => return StageOutcome::Failed { image, error },
        };

        let keep_alpha = image.color().has_alpha();
        let mut canvas = image.to_rgba8();

        if self.config.gradient.enabled {
            let path = self.config.gradient.asset_path(self.aspect);
            if let Err(error) = apply_gradient(&mut canvas, &path) {
                log::warn!(
                    "Gradient file '{}' not usable ({error}). Skipping gradient overlay.",
                    path.display()
                );
            }
        }

        for placement in &plan.placements {
            let bitmap = plan.face(placement.role).rasterize(&placement.text);
            draw_text_with_shadow(&mut canvas, &bitmap, placement.x, placement.baseline);
        }

        StageOutcome::Applied(if keep_alpha {
            DynamicImage::ImageRgba8(canvas)
        } else {
            DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8())
        })
    }
}

/// Composite the gradient at `path` along the bottom edge of `canvas`,
/// stretched to the canvas width.
///
/// # Errors
///
/// Returns [`EpisnapError::ImageError`] if the asset is missing or
/// undecodable.
pub fn apply_gradient(canvas: &mut RgbaImage, path: &Path) -> Result<(), EpisnapError> {
    let gradient = image::open(path)?.to_rgba8();
    let gradient = if gradient.width() == canvas.width() {
        gradient
    } else {
        imageops::resize(
            &gradient,
            canvas.width(),
            gradient.height(),
            FilterType::CatmullRom,
        )
    };
    let top = canvas.height() as i64 - gradient.height() as i64;
    imageops::overlay(canvas, &gradient, 0, top);
    Ok(())
}

/// Draw `bitmap` twice, shadow first, anchored at its baseline middle.
pub fn draw_text_with_shadow(canvas: &mut RgbaImage, bitmap: &TextBitmap, x: f64, baseline: f64) {
    let origin_x = (x - bitmap.advance as f64 / 2.0).round() as i32;
    let origin_y = baseline.round() as i32;
    blend_mask(
        canvas,
        bitmap,
        origin_x + SHADOW_OFFSET,
        origin_y + SHADOW_OFFSET,
        SHADOW_COLOR,
    );
    blend_mask(canvas, bitmap, origin_x, origin_y, TEXT_COLOR);
}

fn blend_mask(canvas: &mut RgbaImage, bitmap: &TextBitmap, origin_x: i32, origin_y: i32, color: Rgba<u8>) {
    let (canvas_width, canvas_height) = (canvas.width() as i32, canvas.height() as i32);
    let left = origin_x + bitmap.left;
    let top = origin_y + bitmap.top;

    for row in 0..bitmap.height as i32 {
        let y = top + row;
        if y < 0 || y >= canvas_height {
            continue;
        }
        for column in 0..bitmap.width as i32 {
            let x = left + column;
            if x < 0 || x >= canvas_width {
                continue;
            }
            let coverage = bitmap.coverage[(row * bitmap.width as i32 + column) as usize];
            if coverage == 0 {
                continue;
            }
            let alpha = coverage as f32 / 255.0 * color.0[3] as f32 / 255.0;
            let pixel = canvas.get_pixel_mut(x as u32, y as u32);
            for channel in 0..3 {
                let under = pixel.0[channel] as f32;
                pixel.0[channel] =
                    (under + (color.0[channel] as f32 - under) * alpha).round() as u8;
            }
            let under_alpha = pixel.0[3] as f32 / 255.0;
            pixel.0[3] = ((under_alpha + alpha * (1.0 - under_alpha)) * 255.0).round() as u8;
        }
    }
}
