//! # Dithering Engine
//!
//! Converts a continuous-tone luminance image (0 = black, 255 = white) into
//! the two levels an e-ink panel can show.
//!
//! ## Methods
//!
//! | Type | Behaviour |
//! |------|-----------|
//! | `NONE` | Midpoint threshold: `out = 255 if pixel >= 128 else 0` |
//! | `DIFFUSION` | Quantize, then push the error onto unvisited neighbours |
//! | `ORDERED` | Compare against a tiled Bayer 8x8 threshold matrix |
//!
//! ## Error Diffusion
//!
//! Pixels are visited in strict raster order (left to right, top to bottom,
//! no serpentine). For each pixel:
//!
//! 1. Quantize the accumulated value to the nearer of {0, 255}
//! 2. `error = accumulated - quantized`
//! 3. For every kernel tap `(dx, dy, w)` inside the image:
//!    `buf[y+dy][x+dx] = clamp(buf[y+dy][x+dx] + error * w / divisor, 0, 255)`
//!
//! Taps only ever point right of the current pixel or into later rows, so
//! an already visited pixel is never touched.
//!
//! ```text
//! Floyd-Steinberg (/16)      Atkinson (/8)
//!        *   7                      *   1   1
//!    3   5   1                  1   1   1
//!                                   1
//! ```
//!
//! ## Usage Example
//!
//! ```
//! use dotmate::render::dither::{self, Dither, DiffusionKernel};
//!
//! let levels = dither::dither(&[0, 255], 2, 1, Dither::Diffusion(DiffusionKernel::FloydSteinberg));
//! assert_eq!(levels, vec![0, 255]);
//!
//! let row: Vec<bool> = vec![true, true, false, false, true, false, true, false];
//! assert_eq!(dither::pack_row(&row), vec![0b11001010]);
//! ```

use serde::{Deserialize, Serialize};

/// Midpoint between black and white.
pub const THRESHOLD: u8 = 128;

/// Bayer 8x8 dithering matrix
///
/// Values range from 0-63. The pattern creates a pleasing halftone screen
/// when used as thresholds for binary conversion.
pub const BAYER8: [[u8; 8]; 8] = [
    [0, 32, 8, 40, 2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44, 4, 36, 14, 46, 6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [3, 35, 11, 43, 1, 33, 9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47, 7, 39, 13, 45, 5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

/// Dither type as named in schedule parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DitherType {
    Diffusion,
    Ordered,
    #[default]
    None,
}

impl DitherType {
    pub const ALL: &'static [DitherType] =
        &[DitherType::Diffusion, DitherType::Ordered, DitherType::None];

    pub fn name(self) -> &'static str {
        match self {
            DitherType::Diffusion => "DIFFUSION",
            DitherType::Ordered => "ORDERED",
            DitherType::None => "NONE",
        }
    }
}

/// Named error-diffusion kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiffusionKernel {
    #[serde(rename = "THRESHOLD")]
    Threshold,
    #[serde(rename = "ATKINSON")]
    Atkinson,
    #[serde(rename = "BURKES")]
    Burkes,
    #[serde(rename = "FLOYD_STEINBERG")]
    FloydSteinberg,
    #[serde(rename = "SIERRA2")]
    Sierra2,
    #[serde(rename = "STUCKI")]
    Stucki,
    #[serde(rename = "JARVIS_JUDICE_NINKE")]
    JarvisJudiceNinke,
    #[serde(rename = "DIFFUSION_ROW")]
    DiffusionRow,
    #[serde(rename = "DIFFUSION_COLUMN")]
    DiffusionColumn,
    #[serde(rename = "DIFFUSION2_D")]
    Diffusion2D,
}

/// Error-diffusion coefficient table.
///
/// Each tap is `(dx, dy, weight)`; the pushed share is `weight / divisor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffusionMatrix {
    pub divisor: u8,
    pub taps: &'static [(i32, i32, u8)],
}

const THRESHOLD_ONLY: DiffusionMatrix = DiffusionMatrix { divisor: 1, taps: &[] };

const FLOYD_STEINBERG: DiffusionMatrix = DiffusionMatrix {
    divisor: 16,
    taps: &[(1, 0, 7), (-1, 1, 3), (0, 1, 5), (1, 1, 1)],
};

// Only 6/8 of the error is propagated.
const ATKINSON: DiffusionMatrix = DiffusionMatrix {
    divisor: 8,
    taps: &[(1, 0, 1), (2, 0, 1), (-1, 1, 1), (0, 1, 1), (1, 1, 1), (0, 2, 1)],
};

const BURKES: DiffusionMatrix = DiffusionMatrix {
    divisor: 32,
    taps: &[
        (1, 0, 8),
        (2, 0, 4),
        (-2, 1, 2),
        (-1, 1, 4),
        (0, 1, 8),
        (1, 1, 4),
        (2, 1, 2),
    ],
};

const SIERRA2: DiffusionMatrix = DiffusionMatrix {
    divisor: 16,
    taps: &[
        (1, 0, 4),
        (2, 0, 3),
        (-2, 1, 1),
        (-1, 1, 2),
        (0, 1, 3),
        (1, 1, 2),
        (2, 1, 1),
    ],
};

const STUCKI: DiffusionMatrix = DiffusionMatrix {
    divisor: 42,
    taps: &[
        (1, 0, 8),
        (2, 0, 4),
        (-2, 1, 2),
        (-1, 1, 4),
        (0, 1, 8),
        (1, 1, 4),
        (2, 1, 2),
        (-2, 2, 1),
        (-1, 2, 2),
        (0, 2, 4),
        (1, 2, 2),
        (2, 2, 1),
    ],
};

const JARVIS_JUDICE_NINKE: DiffusionMatrix = DiffusionMatrix {
    divisor: 48,
    taps: &[
        (1, 0, 7),
        (2, 0, 5),
        (-2, 1, 3),
        (-1, 1, 5),
        (0, 1, 7),
        (1, 1, 5),
        (2, 1, 3),
        (-2, 2, 1),
        (-1, 2, 3),
        (0, 2, 5),
        (1, 2, 3),
        (2, 2, 1),
    ],
};

const DIFFUSION_ROW: DiffusionMatrix = DiffusionMatrix { divisor: 1, taps: &[(1, 0, 1)] };

const DIFFUSION_COLUMN: DiffusionMatrix = DiffusionMatrix { divisor: 1, taps: &[(0, 1, 1)] };

const DIFFUSION_2D: DiffusionMatrix = DiffusionMatrix {
    divisor: 2,
    taps: &[(1, 0, 1), (0, 1, 1)],
};

impl DiffusionKernel {
    pub const ALL: &'static [DiffusionKernel] = &[
        DiffusionKernel::Threshold,
        DiffusionKernel::Atkinson,
        DiffusionKernel::Burkes,
        DiffusionKernel::FloydSteinberg,
        DiffusionKernel::Sierra2,
        DiffusionKernel::Stucki,
        DiffusionKernel::JarvisJudiceNinke,
        DiffusionKernel::DiffusionRow,
        DiffusionKernel::DiffusionColumn,
        DiffusionKernel::Diffusion2D,
    ];

    /// Parameter name, e.g. `FLOYD_STEINBERG`.
    pub fn name(self) -> &'static str {
        match self {
            DiffusionKernel::Threshold => "THRESHOLD",
            DiffusionKernel::Atkinson => "ATKINSON",
            DiffusionKernel::Burkes => "BURKES",
            DiffusionKernel::FloydSteinberg => "FLOYD_STEINBERG",
            DiffusionKernel::Sierra2 => "SIERRA2",
            DiffusionKernel::Stucki => "STUCKI",
            DiffusionKernel::JarvisJudiceNinke => "JARVIS_JUDICE_NINKE",
            DiffusionKernel::DiffusionRow => "DIFFUSION_ROW",
            DiffusionKernel::DiffusionColumn => "DIFFUSION_COLUMN",
            DiffusionKernel::Diffusion2D => "DIFFUSION2_D",
        }
    }

    pub fn matrix(self) -> &'static DiffusionMatrix {
        match self {
            DiffusionKernel::Threshold => &THRESHOLD_ONLY,
            DiffusionKernel::Atkinson => &ATKINSON,
            DiffusionKernel::Burkes => &BURKES,
            DiffusionKernel::FloydSteinberg => &FLOYD_STEINBERG,
            DiffusionKernel::Sierra2 => &SIERRA2,
            DiffusionKernel::Stucki => &STUCKI,
            DiffusionKernel::JarvisJudiceNinke => &JARVIS_JUDICE_NINKE,
            DiffusionKernel::DiffusionRow => &DIFFUSION_ROW,
            DiffusionKernel::DiffusionColumn => &DIFFUSION_COLUMN,
            DiffusionKernel::Diffusion2D => &DIFFUSION_2D,
        }
    }
}

/// A resolved dithering method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dither {
    /// Straight midpoint threshold.
    None,
    Diffusion(DiffusionKernel),
    /// Bayer 8x8 ordered dithering.
    Ordered,
}

impl Dither {
    /// Resolve a type/kernel pair from renderer parameters.
    ///
    /// The kernel only matters for `DIFFUSION`, where it defaults to
    /// Floyd-Steinberg.
    pub fn select(dither_type: DitherType, kernel: Option<DiffusionKernel>) -> Self {
        match dither_type {
            DitherType::None => Dither::None,
            DitherType::Ordered => Dither::Ordered,
            DitherType::Diffusion => {
                Dither::Diffusion(kernel.unwrap_or(DiffusionKernel::FloydSteinberg))
            }
        }
    }
}

/// Ordered-dither threshold at a pixel position, on the 0-255 scale.
///
/// `BAYER8` values are centred in their bucket: `t = v * 4 + 2`, so the
/// thresholds run from 2 to 254 and pure black/white are never flipped.
#[inline]
pub fn ordered_threshold(x: usize, y: usize) -> u8 {
    BAYER8[y & 7][x & 7] * 4 + 2
}

/// Quantize a luminance image to levels 0 / 255.
///
/// `pixels` is row-major, `width * height` long. The same input always
/// produces the same output.
pub fn dither(pixels: &[u8], width: usize, height: usize, method: Dither) -> Vec<u8> {
    debug_assert_eq!(pixels.len(), width * height);

    match method {
        Dither::None => pixels
            .iter()
            .map(|&p| if p >= THRESHOLD { 255 } else { 0 })
            .collect(),
        Dither::Ordered => {
            let mut out = Vec::with_capacity(pixels.len());
            for y in 0..height {
                for x in 0..width {
                    let p = pixels[y * width + x];
                    out.push(if p >= ordered_threshold(x, y) { 255 } else { 0 });
                }
            }
            out
        }
        Dither::Diffusion(kernel) => diffuse(pixels, width, height, kernel.matrix()),
    }
}

fn diffuse(pixels: &[u8], width: usize, height: usize, matrix: &DiffusionMatrix) -> Vec<u8> {
    let mut buf: Vec<f32> = pixels.iter().map(|&p| p as f32).collect();
    let mut out = vec![0u8; pixels.len()];
    let divisor = matrix.divisor as f32;

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            let old = buf[idx];
            let new = if old >= THRESHOLD as f32 { 255.0 } else { 0.0 };
            out[idx] = new as u8;

            let error = old - new;
            if error == 0.0 {
                continue;
            }

            for &(dx, dy, weight) in matrix.taps {
                let nx = x as i64 + dx as i64;
                let ny = y as i64 + dy as i64;
                if nx < 0 || nx >= width as i64 || ny >= height as i64 {
                    continue;
                }
                let n = ny as usize * width + nx as usize;
                buf[n] = (buf[n] + error * weight as f32 / divisor).clamp(0.0, 255.0);
            }
        }
    }

    out
}

/// Pack a row of boolean pixel values into bytes.
///
/// ## Bit Packing
///
/// - Bit 7 (MSB) = leftmost pixel
/// - Bit 0 (LSB) = rightmost pixel
///
/// If the row length is not a multiple of 8, the last byte is padded
/// with zeros on the right.
///
/// ```
/// use dotmate::render::dither::pack_row;
///
/// let row = vec![true; 12];
/// assert_eq!(pack_row(&row), vec![0xFF, 0xF0]);
/// ```
pub fn pack_row(pixels: &[bool]) -> Vec<u8> {
    let num_bytes = pixels.len().div_ceil(8);
    let mut bytes = vec![0u8; num_bytes];

    for (i, &pixel) in pixels.iter().enumerate() {
        if pixel {
            let byte_idx = i / 8;
            let bit_idx = 7 - (i % 8); // MSB first
            bytes[byte_idx] |= 1 << bit_idx;
        }
    }

    bytes
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn all_methods() -> Vec<Dither> {
        let mut methods = vec![Dither::None, Dither::Ordered];
        methods.extend(DiffusionKernel::ALL.iter().map(|&k| Dither::Diffusion(k)));
        methods
    }

    fn gradient(width: usize, height: usize) -> Vec<u8> {
        (0..height)
            .flat_map(|y| (0..width).map(move |x| ((x * 255) / (width - 1)) as u8 ^ (y as u8 & 7)))
            .collect()
    }

    #[test]
    fn test_bayer_matrix_values() {
        let mut seen = [false; 64];
        for row in &BAYER8 {
            for &val in row {
                assert!(val < 64, "Matrix value {} out of range", val);
                assert!(!seen[val as usize], "Duplicate value {}", val);
                seen[val as usize] = true;
            }
        }
        assert!(seen.iter().all(|&s| s), "Not all values 0-63 present");
    }

    #[test]
    fn test_kernel_weights_sum_to_divisor() {
        for &kernel in DiffusionKernel::ALL {
            let m = kernel.matrix();
            let sum: u32 = m.taps.iter().map(|&(_, _, w)| w as u32).sum();
            match kernel {
                DiffusionKernel::Threshold => assert_eq!(sum, 0),
                DiffusionKernel::Atkinson => assert_eq!(sum, 6),
                _ => assert_eq!(sum, m.divisor as u32, "{}", kernel.name()),
            }
        }
    }

    #[test]
    fn test_taps_only_reach_unvisited_pixels() {
        for &kernel in DiffusionKernel::ALL {
            for &(dx, dy, _) in kernel.matrix().taps {
                assert!(dy > 0 || (dy == 0 && dx > 0), "{} tap ({}, {})", kernel.name(), dx, dy);
            }
        }
    }

    #[test]
    fn test_axis_restricted_kernels() {
        assert!(DiffusionKernel::DiffusionRow.matrix().taps.iter().all(|&(_, dy, _)| dy == 0));
        assert!(DiffusionKernel::DiffusionColumn.matrix().taps.iter().all(|&(dx, _, _)| dx == 0));
    }

    #[test]
    fn test_threshold_midpoint() {
        let out = dither(&[0, 127, 128, 255], 4, 1, Dither::None);
        assert_eq!(out, vec![0, 0, 255, 255]);
    }

    #[test]
    fn test_floyd_steinberg_extremes() {
        let out = dither(&[0, 255], 2, 1, Dither::Diffusion(DiffusionKernel::FloydSteinberg));
        assert_eq!(out, vec![0, 255]);
    }

    #[test]
    fn test_floyd_steinberg_error_goes_right() {
        // 100 → 0, error 100 * 7/16 = 43.75 lands on the next pixel: 100 + 43.75 ≥ 128
        let out = dither(&[100, 100], 2, 1, Dither::Diffusion(DiffusionKernel::FloydSteinberg));
        assert_eq!(out, vec![0, 255]);
    }

    #[test]
    fn test_row_diffusion_carries_full_error() {
        // 64 → 0 (err 64), 64+64=128 → 255 (err -127), 64-127 clamps to 0 → 0
        let out = dither(&[64, 64, 64], 3, 1, Dither::Diffusion(DiffusionKernel::DiffusionRow));
        assert_eq!(out, vec![0, 255, 0]);
    }

    #[test]
    fn test_column_diffusion_does_not_spread_sideways() {
        let out = dither(&[100, 100], 2, 1, Dither::Diffusion(DiffusionKernel::DiffusionColumn));
        assert_eq!(out, vec![0, 0]);
    }

    #[test]
    fn test_all_white_stays_white() {
        let img = vec![255u8; 40 * 30];
        for method in all_methods() {
            let out = dither(&img, 40, 30, method);
            assert!(out.iter().all(|&v| v == 255), "{:?}", method);
        }
    }

    #[test]
    fn test_all_black_stays_black() {
        let img = vec![0u8; 40 * 30];
        for method in all_methods() {
            let out = dither(&img, 40, 30, method);
            assert!(out.iter().all(|&v| v == 0), "{:?}", method);
        }
    }

    #[test]
    fn test_deterministic() {
        let img = gradient(64, 16);
        for method in all_methods() {
            assert_eq!(dither(&img, 64, 16, method), dither(&img, 64, 16, method));
        }
    }

    #[test]
    fn test_ordered_half_gray() {
        let img = vec![128u8; 64];
        let out = dither(&img, 8, 8, Dither::Ordered);
        let white = out.iter().filter(|&&v| v == 255).count();
        assert_eq!(white, 32);
    }

    #[test]
    fn test_diffusion_mid_gray_density() {
        let img = vec![128u8; 32 * 32];
        for &kernel in &[
            DiffusionKernel::FloydSteinberg,
            DiffusionKernel::Burkes,
            DiffusionKernel::Stucki,
            DiffusionKernel::JarvisJudiceNinke,
            DiffusionKernel::Sierra2,
        ] {
            let out = dither(&img, 32, 32, Dither::Diffusion(kernel));
            let white = out.iter().filter(|&&v| v == 255).count();
            assert!(white > 400 && white < 624, "{} produced {} white", kernel.name(), white);
        }
    }

    #[test]
    fn test_select() {
        assert_eq!(Dither::select(DitherType::None, Some(DiffusionKernel::Atkinson)), Dither::None);
        assert_eq!(Dither::select(DitherType::Ordered, None), Dither::Ordered);
        assert_eq!(
            Dither::select(DitherType::Diffusion, None),
            Dither::Diffusion(DiffusionKernel::FloydSteinberg)
        );
        assert_eq!(
            Dither::select(DitherType::Diffusion, Some(DiffusionKernel::Stucki)),
            Dither::Diffusion(DiffusionKernel::Stucki)
        );
    }

    #[test]
    fn test_ten_distinct_diffusion_kernels() {
        let names: std::collections::HashSet<_> = DiffusionKernel::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(DiffusionKernel::ALL.len(), 10);
        assert_eq!(names.len(), 10);
    }

    #[test]
    fn test_kernel_names_match_serde() {
        for &kernel in DiffusionKernel::ALL {
            let json = serde_json::to_string(&kernel).unwrap();
            assert_eq!(json, format!("\"{}\"", kernel.name()));
        }
        for &t in DitherType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.name()));
        }
    }

    #[test]
    fn test_pack_row_padding() {
        assert_eq!(pack_row(&[true, true, true, true]), vec![0xF0]);
        let packed = pack_row(&[true; 9]);
        assert_eq!(packed, vec![0xFF, 0x80]);
        assert_eq!(pack_row(&[]), Vec::<u8>::new());
    }
}
