//! Font resolution and text rasterization.
//!
//! The overlay engine only decides *where* text goes. Measuring and
//! rasterizing strings is delegated to a [`FontFace`], obtained from a
//! [`FontProvider`] at a requested pixel size. [`FontDirectory`] is the
//! stock provider: it reads TrueType/OpenType files from a directory with
//! [`fontdue`] and falls back to a known system font when the requested
//! file cannot be loaded.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use fontdue::{Font, FontSettings};

use crate::error::EpisnapError;

/// Fonts tried, in order, when a requested font cannot be loaded.
const SYSTEM_FALLBACK_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Size of a rendered string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextExtent {
    /// Advance width of the whole string in pixels.
    pub width: f32,
    /// Distance from the top of the ascender to the lowest inked pixel.
    pub height: f32,
}

/// A coverage mask for one string, positioned relative to its pen origin
/// (left end of the baseline).
#[derive(Debug, Clone, Default)]
pub struct TextBitmap {
    /// Horizontal offset of the mask's left edge from the pen origin.
    pub left: i32,
    /// Vertical offset of the mask's top edge from the baseline (negative is up).
    pub top: i32,
    /// Mask width in pixels.
    pub width: u32,
    /// Mask height in pixels.
    pub height: u32,
    /// Row-major coverage, one byte per pixel.
    pub coverage: Vec<u8>,
    /// Total advance width of the string.
    pub advance: f32,
}

/// A font loaded at a fixed pixel size.
pub trait FontFace {
    /// Measure `text` on a single line.
    fn measure(&self, text: &str) -> TextExtent;

    /// Rasterize `text` on a single line.
    fn rasterize(&self, text: &str) -> TextBitmap;
}

/// Resolves font identifiers to usable faces.
pub trait FontProvider {
    /// Load `name` at `size` pixels.
    ///
    /// Implementations should fall back to a default face rather than fail
    /// when `name` itself cannot be loaded.
    fn load(&self, name: &str, size: f32) -> Result<Box<dyn FontFace>, EpisnapError>;
}

/// [`FontFace`] backed by a parsed [`fontdue::Font`].
pub struct FontdueFace {
    font: Font,
    size: f32,
}

impl FontdueFace {
    /// Wrap a parsed font at the given pixel size.
    pub fn new(font: Font, size: f32) -> Self {
        Self { font, size }
    }

    fn ascent(&self) -> f32 {
        self.font
            .horizontal_line_metrics(self.size)
            .map(|metrics| metrics.ascent)
            .unwrap_or(self.size)
    }

    fn kerning(&self, previous: Option<char>, current: char) -> f32 {
        previous
            .and_then(|left| self.font.horizontal_kern(left, current, self.size))
            .unwrap_or(0.0)
    }
}

impl FontFace for FontdueFace {
    fn measure(&self, text: &str) -> TextExtent {
        let mut advance = 0.0;
        let mut descent: f32 = 0.0;
        let mut previous = None;

        for character in text.chars() {
            advance += self.kerning(previous, character);
            let metrics = self.font.metrics(character, self.size);
            if metrics.width > 0 && metrics.height > 0 {
                descent = descent.max(-(metrics.ymin as f32));
            }
            advance += metrics.advance_width;
            previous = Some(character);
        }

        TextExtent {
            width: advance,
            height: self.ascent() + descent,
        }
    }

    fn rasterize(&self, text: &str) -> TextBitmap {
        struct Placed {
            left: i32,
            top: i32,
            width: usize,
            height: usize,
            coverage: Vec<u8>,
        }

        let mut pen = 0.0f32;
        let mut previous = None;
        let mut glyphs = Vec::new();

        for character in text.chars() {
            pen += self.kerning(previous, character);
            let (metrics, coverage) = self.font.rasterize(character, self.size);
            if metrics.width > 0 && metrics.height > 0 {
                glyphs.push(Placed {
                    left: (pen + metrics.xmin as f32).round() as i32,
                    top: -(metrics.ymin + metrics.height as i32),
                    width: metrics.width,
                    height: metrics.height,
                    coverage,
                });
            }
            pen += metrics.advance_width;
            previous = Some(character);
        }

        if glyphs.is_empty() {
            return TextBitmap {
                advance: pen,
                ..TextBitmap::default()
            };
        }

        let left = glyphs.iter().map(|glyph| glyph.left).min().unwrap_or(0);
        let top = glyphs.iter().map(|glyph| glyph.top).min().unwrap_or(0);
        let right = glyphs
            .iter()
            .map(|glyph| glyph.left + glyph.width as i32)
            .max()
            .unwrap_or(left);
        let bottom = glyphs
            .iter()
            .map(|glyph| glyph.top + glyph.height as i32)
            .max()
            .unwrap_or(top);

        let width = (right - left) as u32;
        let height = (bottom - top) as u32;
        let mut mask = vec![0u8; width as usize * height as usize];

        for glyph in &glyphs {
            let offset_x = (glyph.left - left) as usize;
            let offset_y = (glyph.top - top) as usize;
            for row in 0..glyph.height {
                for column in 0..glyph.width {
                    let value = glyph.coverage[row * glyph.width + column];
                    let index = (offset_y + row) * width as usize + offset_x + column;
                    mask[index] = mask[index].max(value);
                }
            }
        }

        TextBitmap {
            left,
            top,
            width,
            height,
            coverage: mask,
            advance: pen,
        }
    }
}

/// Loads fonts from a directory, with system fallbacks.
///
/// Parsed fonts are cached by path, so asking for the same file at several
/// sizes parses it once.
///
/// # Example
///
/// ```no_run
/// use episnap::{FontDirectory, FontProvider};
///
/// let fonts = FontDirectory::new("./fonts");
/// let face = fonts.load("Roboto-Bold.ttf", 108.0)?;
/// println!("{:?}", face.measure("Pilot"));
/// # Ok::<(), episnap::EpisnapError>(())
/// ```
pub struct FontDirectory {
    directory: PathBuf,
    fallbacks: Vec<PathBuf>,
    cache: RefCell<HashMap<PathBuf, Font>>,
}

impl FontDirectory {
    /// Create a provider reading from `directory`.
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        Self {
            directory: directory.into(),
            fallbacks: SYSTEM_FALLBACK_FONTS.iter().map(PathBuf::from).collect(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Try `path` before the built-in system fallback list.
    #[must_use]
    pub fn with_fallback<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.fallbacks.insert(0, path.into());
        self
    }

    /// Directory fonts are read from.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn parse(&self, path: &Path) -> Result<Font, String> {
        if let Some(font) = self.cache.borrow().get(path) {
            return Ok(font.clone());
        }
        let bytes = fs::read(path).map_err(|error| format!("{}: {error}", path.display()))?;
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|error| format!("{}: {error}", path.display()))?;
        self.cache
            .borrow_mut()
            .insert(path.to_path_buf(), font.clone());
        Ok(font)
    }
}

impl FontProvider for FontDirectory {
    fn load(&self, name: &str, size: f32) -> Result<Box<dyn FontFace>, EpisnapError> {
        let requested = self.directory.join(name);
        let error = match self.parse(&requested) {
            Ok(font) => return Ok(Box::new(FontdueFace::new(font, size))),
            Err(error) => error,
        };

        log::warn!("Font '{name}' not found ({error}). Using default font.");
        for fallback in &self.fallbacks {
            if let Ok(font) = self.parse(fallback) {
                log::debug!("Using fallback font {}", fallback.display());
                return Ok(Box::new(FontdueFace::new(font, size)));
            }
        }

        Err(EpisnapError::FontUnavailable {
            name: name.to_string(),
            reason: format!("{error}; no fallback font could be loaded"),
        })
    }
}

/// List the `.ttf` and `.otf` files in `directory`, sorted by name.
///
/// # Errors
///
/// Returns [`EpisnapError::IoError`] if the directory cannot be read.
pub fn list_fonts(directory: &Path) -> Result<Vec<String>, EpisnapError> {
    let mut fonts = Vec::new();
    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        let is_font = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| {
                extension.eq_ignore_ascii_case("ttf") || extension.eq_ignore_ascii_case("otf")
            });
        if is_font {
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                fonts.push(name.to_string());
            }
        }
    }
    fonts.sort();

    if fonts.is_empty() {
        log::warn!("No fonts found in {}", directory.display());
    } else {
        log::debug!("Loaded fonts: {fonts:?}");
    }
    Ok(fonts)
}
