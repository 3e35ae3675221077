//! # Image Composer
//!
//! Lays text and simple graphics out on the 296×152 screen canvas, then
//! hands the result to the dithering engine.
//!
//! ## Wrapping
//!
//! CJK text may break between any two characters; Latin text breaks at
//! whitespace. Mixed strings are tokenized so each script follows its own
//! rule:
//!
//! ```text
//! "Hello 世界 again"  →  [Hello] [世] [界] [again]
//! ```
//!
//! A single token wider than the line is placed on its own line anyway.
//!
//! ## Auto-fit
//!
//! Font size steps down one pixel at a time from an initial size until the
//! wrapped block fits the box, stopping at a minimum size.

use std::sync::Arc;

use super::canvas::{BLACK, Canvas, WHITE};
use super::dither::Dither;
use super::font::{FontHandle, FontProvider};
use crate::payload::{Bitmap, SCREEN_HEIGHT, SCREEN_WIDTH};

/// Smallest size auto-fit will go down to.
pub const MIN_FONT_SIZE: u32 = 16;

/// Width of the screen-edge border stroke.
const BORDER_THICKNESS: usize = 3;

/// Gap between the main title block and the subtitle block.
const TITLE_BLOCK_GAP: usize = 15;

/// Top padding a centered block never goes above.
const MIN_TOP_PADDING: usize = 10;

/// Whether a character wraps per character (CJK scripts).
pub fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x3000..=0x303F   // CJK symbols and punctuation
        | 0x3040..=0x30FF // Hiragana, Katakana
        | 0x3400..=0x4DBF // CJK extension A
        | 0x4E00..=0x9FFF // CJK unified ideographs
        | 0xAC00..=0xD7AF // Hangul syllables
        | 0xF900..=0xFAFF // CJK compatibility ideographs
        | 0xFF00..=0xFFEF // Half/full-width forms
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    text: String,
    space_before: bool,
}

fn tokenize(paragraph: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut pending_space = false;

    let flush = |word: &mut String, tokens: &mut Vec<Token>, space: &mut bool| {
        if !word.is_empty() {
            tokens.push(Token {
                text: std::mem::take(word),
                space_before: *space,
            });
            *space = false;
        }
    };

    for c in paragraph.chars() {
        if c.is_whitespace() {
            flush(&mut word, &mut tokens, &mut pending_space);
            pending_space = !tokens.is_empty();
        } else if is_cjk(c) {
            flush(&mut word, &mut tokens, &mut pending_space);
            tokens.push(Token {
                text: c.to_string(),
                space_before: pending_space,
            });
            pending_space = false;
        } else {
            word.push(c);
        }
    }
    flush(&mut word, &mut tokens, &mut pending_space);
    tokens
}

/// Wrap text into lines no wider than `max_width` (explicit newlines kept).
pub fn wrap_text(text: &str, font: &FontHandle, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for token in tokenize(paragraph) {
            let candidate = if current.is_empty() {
                token.text.clone()
            } else if token.space_before {
                format!("{} {}", current, token.text)
            } else {
                format!("{}{}", current, token.text)
            };

            if current.is_empty() || font.text_width(&candidate) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::take(&mut current));
                current = token.text;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

/// Font family and weight requested from the font provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextStyle {
    pub family: Option<String>,
    pub weight: Option<u16>,
}

/// A block of wrapped text at a chosen size.
#[derive(Debug, Clone)]
pub struct TextBlock {
    pub font: FontHandle,
    pub lines: Vec<String>,
}

impl TextBlock {
    pub fn height(&self) -> usize {
        self.lines.len() * self.font.line_height()
    }

    pub fn width(&self) -> usize {
        self.lines
            .iter()
            .map(|l| self.font.text_width(l))
            .max()
            .unwrap_or(0)
    }
}

/// Lays out text and overlays on the screen canvas.
#[derive(Clone)]
pub struct Composer {
    fonts: Arc<dyn FontProvider>,
    style: TextStyle,
}

impl Composer {
    pub fn new(fonts: Arc<dyn FontProvider>, style: TextStyle) -> Self {
        Self { fonts, style }
    }

    /// Override the style (e.g. a monospace family for stats screens).
    pub fn with_style(&self, style: TextStyle) -> Self {
        Self {
            fonts: self.fonts.clone(),
            style,
        }
    }

    pub fn font(&self, size: u32) -> FontHandle {
        self.fonts
            .font(self.style.family.as_deref(), size as f32, self.style.weight)
    }

    /// Pick the largest size in `[MIN_FONT_SIZE, initial]` whose wrapped
    /// text fits the box.
    pub fn fit(&self, text: &str, max_width: usize, max_height: usize, initial: u32) -> TextBlock {
        let mut size = initial.max(MIN_FONT_SIZE);
        loop {
            let font = self.font(size);
            let lines = wrap_text(text, &font, max_width);
            let block = TextBlock { font, lines };
            if size <= MIN_FONT_SIZE || (block.width() <= max_width && block.height() <= max_height)
            {
                return block;
            }
            size -= 1;
        }
    }

    /// Draw every line of a block horizontally centered in `[x0, x0 + width)`.
    /// Returns the y coordinate below the block.
    pub fn draw_block_centered(
        &self,
        canvas: &mut Canvas,
        block: &TextBlock,
        x0: i32,
        width: usize,
        y: i32,
    ) -> i32 {
        let step = block.font.line_height() as i32;
        let mut cy = y;
        for line in &block.lines {
            self.draw_centered(canvas, &block.font, line, x0, width, cy);
            cy += step;
        }
        cy
    }

    /// Draw one left-aligned line at the given size.
    pub fn draw_text(&self, canvas: &mut Canvas, size: u32, text: &str, x: i32, y: i32) {
        self.font(size).draw(canvas, x, y, text, BLACK);
    }

    /// Draw one line horizontally centered in `[x0, x0 + width)`.
    pub fn draw_centered(
        &self,
        canvas: &mut Canvas,
        font: &FontHandle,
        text: &str,
        x0: i32,
        width: usize,
        y: i32,
    ) {
        let tw = font.text_width(text) as i32;
        let x = x0 + (width as i32 - tw) / 2;
        font.draw(canvas, x, y, text, BLACK);
    }

    /// Main title with optional subtitle, centered as one block.
    ///
    /// Titles may use two thirds of the screen width. With a subtitle the
    /// main title gets 60% of the usable height and the subtitle 40%.
    pub fn title_card(&self, main_title: &str, sub_title: Option<&str>) -> Canvas {
        let mut canvas = Canvas::screen();
        let max_width = SCREEN_WIDTH * 2 / 3;
        let available = SCREEN_HEIGHT - 2 * MIN_TOP_PADDING;

        let sub_title = sub_title.filter(|s| !s.trim().is_empty());
        let (main, sub) = match sub_title {
            Some(sub) => {
                let main_alloc = available * 6 / 10;
                let sub_alloc = available * 4 / 10;
                (
                    self.fit(main_title, max_width, main_alloc, 42),
                    Some(self.fit(sub, max_width, sub_alloc, 32)),
                )
            }
            None => (self.fit(main_title, max_width, available, 48), None),
        };

        let total = main.height() + sub.as_ref().map_or(0, |s| s.height() + TITLE_BLOCK_GAP);
        let start_y = (SCREEN_HEIGHT.saturating_sub(total) / 2).max(MIN_TOP_PADDING);

        let mut y = self.draw_block_centered(&mut canvas, &main, 0, SCREEN_WIDTH, start_y as i32);
        if let Some(sub) = sub {
            y += TITLE_BLOCK_GAP as i32;
            self.draw_block_centered(&mut canvas, &sub, 0, SCREEN_WIDTH, y);
        }
        canvas
    }

    /// Apply overlays, quantize and wrap as a device bitmap.
    pub fn finish(
        &self,
        mut canvas: Canvas,
        dither: Dither,
        border: Option<u8>,
        link: Option<&str>,
    ) -> Bitmap {
        if let Some(color) = border {
            draw_border(&mut canvas, color);
        }
        if link.is_some() {
            draw_link_glyph(&mut canvas);
        }

        let mut bitmap = canvas.dither(dither);
        bitmap.border = border;
        bitmap.link = link.map(str::to_string);
        bitmap
    }
}

/// Stroke the screen edge. Colour index 0 is white, anything else black.
pub fn draw_border(canvas: &mut Canvas, color: u8) {
    let value = if color == 0 { WHITE } else { BLACK };
    let (w, h) = (canvas.width(), canvas.height());
    canvas.stroke_rect(0, 0, w, h, BORDER_THICKNESS, value);
}

/// Two interlocked chain links in the bottom-right corner.
pub fn draw_link_glyph(canvas: &mut Canvas) {
    let x = canvas.width() as i32 - 22;
    let y = canvas.height() as i32 - 14;
    canvas.fill_rect(x - 1, y - 1, 18, 9, WHITE);
    canvas.stroke_rect(x, y, 10, 7, 2, BLACK);
    canvas.stroke_rect(x + 6, y, 10, 7, 2, BLACK);
}
