//! Font provider for the image composer.
//!
//! The composer only ever asks for "a font at size S, weight W" and draws
//! with whatever comes back. [`SystemFontProvider`] looks for TTF/OTF files
//! on disk (CJK-capable families first) and renders them anti-aliased with
//! ab_glyph. When nothing usable is found it hands out the embedded Spleen
//! 12x24 bitmap font, scaled to the requested size, so it never fails.

use ab_glyph::{Font, FontArc, FontVec, PxScale, ScaleFont, VariableFont};
use spleen_font::{FONT_12X24, PSF2Font};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tracing::{debug, warn};

use super::canvas::Canvas;
use crate::config::FontOptions;

const SPLEEN_W: usize = 12;
const SPLEEN_H: usize = 24;

/// Default weight for variable fonts (SemiBold).
pub const DEFAULT_WEIGHT: u16 = 600;

const PRIORITY_KEYWORDS: &[&str] = &["sourcehansanssc", "sourcehansc", "notosanscjk", "noto"];
const CJK_KEYWORDS: &[&str] = &[
    "pingfang", "hiragino", "heiti", "song", "kai", "wqy", "microhei", "zenhei", "msyh",
    "yahei", "simsun", "simhei",
];
const LATIN_KEYWORDS: &[&str] = &["helvetica", "arial", "dejavu", "liberation"];

/// Gives out fonts by family, pixel size and weight.
pub trait FontProvider: Send + Sync {
    /// Never fails: falls back to a built-in font.
    fn font(&self, family: Option<&str>, size: f32, weight: Option<u16>) -> FontHandle;
}

/// A font at a fixed pixel size.
#[derive(Clone)]
pub enum FontHandle {
    /// Scalable outline font.
    Outline { font: FontArc, size: f32 },
    /// Spleen 12x24 bitmap font, nearest-neighbour scaled.
    Bitmap { size: f32 },
}

impl std::fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FontHandle::Outline { size, .. } => write!(f, "Outline({})", size),
            FontHandle::Bitmap { size } => write!(f, "Bitmap({})", size),
        }
    }
}

impl FontHandle {
    pub fn size(&self) -> f32 {
        match self {
            FontHandle::Outline { size, .. } | FontHandle::Bitmap { size } => *size,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, FontHandle::Bitmap { .. })
    }

    fn bitmap_cell(size: f32) -> (usize, usize) {
        let scale = size / SPLEEN_H as f32;
        let w = ((SPLEEN_W as f32 * scale).round() as usize).max(1);
        let h = (size.round() as usize).max(1);
        (w, h)
    }

    /// Height of one line of text (ascent to descent).
    pub fn line_height(&self) -> usize {
        match self {
            FontHandle::Outline { font, size } => {
                let scaled = font.as_scaled(PxScale::from(*size));
                (scaled.ascent() - scaled.descent()).ceil().max(1.0) as usize
            }
            FontHandle::Bitmap { size } => Self::bitmap_cell(*size).1,
        }
    }

    /// Advance width of a string in pixels.
    pub fn text_width(&self, text: &str) -> usize {
        match self {
            FontHandle::Outline { font, size } => {
                let scaled = font.as_scaled(PxScale::from(*size));
                let mut width = 0.0f32;
                let mut prev = None;
                for ch in text.chars() {
                    let id = font.glyph_id(ch);
                    if let Some(p) = prev {
                        width += scaled.kern(p, id);
                    }
                    width += scaled.h_advance(id);
                    prev = Some(id);
                }
                width.ceil() as usize
            }
            FontHandle::Bitmap { size } => Self::bitmap_cell(*size).0 * text.chars().count(),
        }
    }

    /// Draw a single line with its top-left corner at (x, y).
    pub fn draw(&self, canvas: &mut Canvas, x: i32, y: i32, text: &str, ink: u8) {
        match self {
            FontHandle::Outline { font, size } => draw_outline(canvas, font, *size, x, y, text, ink),
            FontHandle::Bitmap { size } => draw_bitmap(canvas, *size, x, y, text, ink),
        }
    }
}

fn draw_outline(canvas: &mut Canvas, font: &FontArc, size: f32, x: i32, y: i32, text: &str, ink: u8) {
    let scale = PxScale::from(size);
    let scaled = font.as_scaled(scale);
    let baseline = y as f32 + scaled.ascent();
    let mut caret = x as f32;
    let mut prev = None;

    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(p) = prev {
            caret += scaled.kern(p, id);
        }
        let glyph = id.with_scale_and_position(scale, ab_glyph::point(caret, baseline));
        caret += scaled.h_advance(id);
        prev = Some(id);

        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                canvas.blend(
                    px as i32 + bounds.min.x as i32,
                    py as i32 + bounds.min.y as i32,
                    ink,
                    coverage,
                );
            });
        }
    }
}

fn draw_bitmap(canvas: &mut Canvas, size: f32, x: i32, y: i32, text: &str, ink: u8) {
    let Ok(mut spleen) = PSF2Font::new(FONT_12X24) else {
        return;
    };
    let (cw, ch) = FontHandle::bitmap_cell(size);

    for (i, c) in text.chars().enumerate() {
        let mut cell = [false; SPLEEN_W * SPLEEN_H];
        let utf8 = c.to_string();
        if let Some(glyph) = spleen.glyph_for_utf8(utf8.as_bytes()) {
            for (row_y, row) in glyph.enumerate() {
                for (col_x, on) in row.enumerate() {
                    if row_y < SPLEEN_H && col_x < SPLEEN_W {
                        cell[row_y * SPLEEN_W + col_x] = on;
                    }
                }
            }
        } else if !c.is_whitespace() {
            // Box for glyphs Spleen does not cover (CJK and friends)
            for col in 1..SPLEEN_W - 1 {
                cell[2 * SPLEEN_W + col] = true;
                cell[(SPLEEN_H - 3) * SPLEEN_W + col] = true;
            }
            for row in 2..SPLEEN_H - 2 {
                cell[row * SPLEEN_W + 1] = true;
                cell[row * SPLEEN_W + SPLEEN_W - 2] = true;
            }
        }

        let ox = x + (i * cw) as i32;
        for dy in 0..ch {
            for dx in 0..cw {
                let sx = dx * SPLEEN_W / cw;
                let sy = dy * SPLEEN_H / ch;
                if cell[sy * SPLEEN_W + sx] {
                    canvas.blend(ox + dx as i32, y + dy as i32, ink, 1.0);
                }
            }
        }
    }
}

/// Always hands out the embedded bitmap font.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinFontProvider;

impl FontProvider for BuiltinFontProvider {
    fn font(&self, _family: Option<&str>, size: f32, _weight: Option<u16>) -> FontHandle {
        FontHandle::Bitmap { size }
    }
}

/// Discovers fonts in configured and platform font directories.
pub struct SystemFontProvider {
    options: FontOptions,
    files: OnceLock<Vec<PathBuf>>,
    loaded: Mutex<HashMap<(String, u16), Option<FontArc>>>,
}

impl SystemFontProvider {
    pub fn new(options: FontOptions) -> Self {
        Self {
            options,
            files: OnceLock::new(),
            loaded: Mutex::new(HashMap::new()),
        }
    }

    fn search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = self.options.dirs.clone();
        let home = std::env::var_os("HOME").map(PathBuf::from);

        if cfg!(target_os = "macos") {
            dirs.push("/System/Library/Fonts".into());
            dirs.push("/Library/Fonts".into());
            dirs.push("/System/Library/Fonts/Supplemental".into());
            if let Some(h) = &home {
                dirs.push(h.join("Library/Fonts"));
            }
        } else if cfg!(target_os = "windows") {
            dirs.push("C:/Windows/Fonts".into());
        } else {
            dirs.push("/usr/share/fonts".into());
            dirs.push("/usr/local/share/fonts".into());
            if let Some(h) = &home {
                dirs.push(h.join(".fonts"));
                dirs.push(h.join(".local/share/fonts"));
            }
        }
        dirs
    }

    fn font_files(&self) -> &[PathBuf] {
        self.files.get_or_init(|| {
            let mut files = Vec::new();
            for dir in self.search_dirs() {
                collect_font_files(&dir, &mut files);
            }
            debug!(count = files.len(), "discovered font files");
            files
        })
    }

    /// Font files in preference order for a family.
    fn candidates(&self, family: Option<&str>) -> Vec<&Path> {
        let wanted = family.map(normalize);
        let mut ranked: Vec<(u8, &Path)> = self
            .font_files()
            .iter()
            .filter_map(|path| {
                let stem = normalize(&path.file_name()?.to_string_lossy());
                let rank = if wanted.as_deref().is_some_and(|w| !w.is_empty() && stem.contains(w)) {
                    0
                } else if PRIORITY_KEYWORDS.iter().any(|k| stem.contains(k)) {
                    1
                } else if CJK_KEYWORDS.iter().any(|k| stem.contains(k)) {
                    2
                } else if LATIN_KEYWORDS.iter().any(|k| stem.contains(k)) {
                    3
                } else {
                    return None;
                };
                Some((rank, path.as_path()))
            })
            .collect();
        ranked.sort_by_key(|(rank, _)| *rank);
        ranked.into_iter().map(|(_, p)| p).collect()
    }

    fn load(&self, family: Option<&str>, weight: u16) -> Option<FontArc> {
        for path in self.candidates(family) {
            match load_font_file(path, weight) {
                Some(font) => {
                    debug!(path = %path.display(), weight, "loaded font");
                    return Some(font);
                }
                None => warn!(path = %path.display(), "skipping unreadable font"),
            }
        }
        None
    }
}

impl FontProvider for SystemFontProvider {
    fn font(&self, family: Option<&str>, size: f32, weight: Option<u16>) -> FontHandle {
        let family = family.or(self.options.family.as_deref());
        let weight = weight.or(self.options.weight).unwrap_or(DEFAULT_WEIGHT);
        let key = (family.unwrap_or_default().to_string(), weight);

        let font = {
            let Ok(mut loaded) = self.loaded.lock() else {
                return FontHandle::Bitmap { size };
            };
            loaded
                .entry(key)
                .or_insert_with(|| self.load(family, weight))
                .clone()
        };

        match font {
            Some(font) => FontHandle::Outline { font, size },
            None => FontHandle::Bitmap { size },
        }
    }
}

fn normalize(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

fn collect_font_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_font_files(&path, out);
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| matches!(e.to_lowercase().as_str(), "ttf" | "otf" | "ttc"))
        {
            out.push(path);
        }
    }
}

fn load_font_file(path: &Path, weight: u16) -> Option<FontArc> {
    let data = std::fs::read(path).ok()?;
    let mut font = FontVec::try_from_vec_and_index(data, 0).ok()?;
    // Only variable fonts with a wght axis react; static faces ignore it
    font.set_variation(b"wght", weight as f32);
    Some(FontArc::new(font))
}
