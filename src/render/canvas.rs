//! Continuous-tone drawing surface.
//!
//! A `Canvas` is a luminance buffer (0 = black, 255 = white) that the image
//! composer draws on before the dithering engine quantizes it.

use image::{DynamicImage, GrayImage, Luma, imageops::FilterType};

use super::dither::{self, Dither};
use crate::payload::{Bitmap, SCREEN_HEIGHT, SCREEN_WIDTH};

pub const WHITE: u8 = 255;
pub const BLACK: u8 = 0;

/// Grayscale luminance buffer for image composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::screen()
    }
}

impl Canvas {
    /// A blank (white) canvas.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![WHITE; width * height],
        }
    }

    /// A blank canvas the size of the device screen.
    pub fn screen() -> Self {
        Self::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }

    /// Fit an arbitrary image onto a blank screen canvas.
    ///
    /// Colour images are reduced to luminance. The source is scaled to fit
    /// (aspect preserved, never upscaled past the screen) and centered.
    pub fn from_image(source: &DynamicImage) -> Self {
        let mut canvas = Self::screen();
        let (sw, sh) = (source.width() as usize, source.height() as usize);
        if sw == 0 || sh == 0 {
            return canvas;
        }

        let gray = if sw == SCREEN_WIDTH && sh == SCREEN_HEIGHT {
            source.to_luma8()
        } else {
            source
                .resize(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32, FilterType::Lanczos3)
                .to_luma8()
        };

        let (gw, gh) = (gray.width() as usize, gray.height() as usize);
        let ox = (SCREEN_WIDTH - gw.min(SCREEN_WIDTH)) / 2;
        let oy = (SCREEN_HEIGHT - gh.min(SCREEN_HEIGHT)) / 2;
        for (x, y, px) in gray.enumerate_pixels() {
            canvas.set(ox + x as usize, oy + y as usize, px[0]);
        }
        canvas
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.width + x]
    }

    /// Set a pixel; out-of-bounds writes are ignored.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = value;
        }
    }

    /// Mix `ink` into a pixel with the given coverage (0.0-1.0).
    #[inline]
    pub fn blend(&mut self, x: i32, y: i32, ink: u8, coverage: f32) {
        if !self.in_bounds(x, y) || coverage <= 0.0 {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        let c = coverage.min(1.0);
        let mixed = self.pixels[idx] as f32 * (1.0 - c) + ink as f32 * c;
        self.pixels[idx] = mixed.round().clamp(0.0, 255.0) as u8;
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: usize, h: usize, value: u8) {
        for py in y..y + h as i32 {
            for px in x..x + w as i32 {
                if self.in_bounds(px, py) {
                    self.pixels[py as usize * self.width + px as usize] = value;
                }
            }
        }
    }

    /// Outline a rectangle, strokes growing inwards.
    pub fn stroke_rect(&mut self, x: i32, y: i32, w: usize, h: usize, thickness: usize, value: u8) {
        let t = thickness.min(w / 2).min(h / 2).max(1);
        self.fill_rect(x, y, w, t, value);
        self.fill_rect(x, y + (h - t) as i32, w, t, value);
        self.fill_rect(x, y, t, h, value);
        self.fill_rect(x + (w - t) as i32, y, t, h, value);
    }

    pub fn hline(&mut self, x1: i32, x2: i32, y: i32, value: u8) {
        for x in x1.min(x2)..=x1.max(x2) {
            if self.in_bounds(x, y) {
                self.pixels[y as usize * self.width + x as usize] = value;
            }
        }
    }

    /// Quantize through the dithering engine into a packed bitmap.
    pub fn dither(&self, method: Dither) -> Bitmap {
        let levels = dither::dither(&self.pixels, self.width, self.height, method);
        Bitmap::from_levels(self.width, self.height, &levels)
    }

    pub fn to_gray_image(&self) -> GrayImage {
        let mut img = GrayImage::new(self.width as u32, self.height as u32);
        for (i, &v) in self.pixels.iter().enumerate() {
            img.put_pixel((i % self.width) as u32, (i / self.width) as u32, Luma([v]));
        }
        img
    }
}
