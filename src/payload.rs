//! # Rendered Payloads
//!
//! What a renderer hands to the device transport: either a short text card
//! or a packed 1-bit bitmap covering the whole screen.

use std::io::Cursor;

use image::{GrayImage, Luma};
use serde::Serialize;

use crate::error::DotmateError;
use crate::render::dither::pack_row;

/// Device screen width in pixels.
pub const SCREEN_WIDTH: usize = 296;

/// Device screen height in pixels.
pub const SCREEN_HEIGHT: usize = 152;

/// Output of one renderer invocation, delivered exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedPayload {
    Text(TextPayload),
    Bitmap(Bitmap),
}

impl RenderedPayload {
    /// Short label for logs.
    pub fn shape(&self) -> &'static str {
        match self {
            RenderedPayload::Text(_) => "text",
            RenderedPayload::Bitmap(_) => "bitmap",
        }
    }
}

/// Text card shown by the device's own text layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextPayload {
    pub title: Option<String>,
    pub body: String,
    pub signature: Option<String>,
    /// Base64-encoded PNG icon.
    pub icon: Option<String>,
    pub link: Option<String>,
}

/// # 1-bit Bitmap
///
/// Rows are packed MSB-first, `ceil(width / 8)` bytes per row.
/// A set bit is a white pixel, a clear bit is black.
///
/// ```text
/// 296 × 152 → 37 bytes per row × 152 rows = 5624 bytes
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
    pub link: Option<String>,
    /// Screen edge colour index (0 = white, 1 = black).
    pub border: Option<u8>,
}

impl Bitmap {
    pub const BIT_DEPTH: u8 = 1;

    /// Bytes per packed row.
    pub fn row_bytes(width: usize) -> usize {
        width.div_ceil(8)
    }

    /// Pack quantized levels (each 0 or 255, row-major) into a bitmap.
    ///
    /// Any level at or above 128 becomes a white bit.
    pub fn from_levels(width: usize, height: usize, levels: &[u8]) -> Self {
        assert_eq!(levels.len(), width * height, "level buffer size mismatch");

        let mut data = Vec::with_capacity(Self::row_bytes(width) * height);
        for row in levels.chunks(width) {
            let bits: Vec<bool> = row.iter().map(|&v| v >= 128).collect();
            data.extend(pack_row(&bits));
        }

        Self {
            width,
            height,
            data,
            link: None,
            border: None,
        }
    }

    /// Whether the pixel at (x, y) is white.
    pub fn is_white(&self, x: usize, y: usize) -> bool {
        let idx = y * Self::row_bytes(self.width) + x / 8;
        (self.data[idx] >> (7 - (x % 8))) & 1 == 1
    }

    /// Encode as a grayscale PNG (white = 255, black = 0).
    pub fn to_png(&self) -> Result<Vec<u8>, DotmateError> {
        let mut img = GrayImage::new(self.width as u32, self.height as u32);
        for y in 0..self.height {
            for x in 0..self.width {
                let v = if self.is_white(x, y) { 255u8 } else { 0u8 };
                img.put_pixel(x as u32, y as u32, Luma([v]));
            }
        }

        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| DotmateError::Image(format!("PNG encoding failed: {}", e)))?;
        Ok(png)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_length_matches_screen() {
        let levels = vec![255u8; SCREEN_WIDTH * SCREEN_HEIGHT];
        let bitmap = Bitmap::from_levels(SCREEN_WIDTH, SCREEN_HEIGHT, &levels);
        assert_eq!(bitmap.data.len(), 5624);
        assert!(bitmap.data.iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_padding_row() {
        // 10 pixels → 2 bytes per row, last 6 bits padded with 0
        let levels = vec![255u8; 10];
        let bitmap = Bitmap::from_levels(10, 1, &levels);
        assert_eq!(bitmap.data, vec![0xFF, 0xC0]);
    }

    #[test]
    fn test_is_white() {
        let bitmap = Bitmap::from_levels(2, 1, &[0, 255]);
        assert!(!bitmap.is_white(0, 0));
        assert!(bitmap.is_white(1, 0));
    }

    #[test]
    fn test_png_round_trip_decodes() {
        let bitmap = Bitmap::from_levels(8, 2, &[0, 255, 0, 255, 0, 255, 0, 255, 255, 255, 255, 255, 0, 0, 0, 0]);
        let png = bitmap.to_png().unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_luma8();
        assert_eq!(decoded.dimensions(), (8, 2));
        assert_eq!(decoded.get_pixel(1, 0)[0], 255);
        assert_eq!(decoded.get_pixel(0, 1)[0], 255);
        assert_eq!(decoded.get_pixel(7, 1)[0], 0);
    }
}
