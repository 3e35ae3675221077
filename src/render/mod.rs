//! # Rendering Module
//!
//! Turns text and images into 1-bit bitmaps for 296×152 e-ink panels.
//!
//! ## Modules
//!
//! - [`canvas`]: 8-bit luminance buffer with drawing primitives
//! - [`font`]: system TrueType lookup with a built-in bitmap fallback
//! - [`composer`]: text wrapping, auto-fit and title layouts
//! - [`dither`]: error-diffusion and ordered dithering, row packing
//!
//! ## Usage Example
//!
//! ```
//! use std::sync::Arc;
//! use dotmate::render::{
//!     canvas::Canvas,
//!     composer::{Composer, TextStyle},
//!     dither::{Dither, DiffusionKernel},
//!     font::BuiltinFontProvider,
//! };
//!
//! let composer = Composer::new(Arc::new(BuiltinFontProvider), TextStyle::default());
//! let canvas = composer.title_card("Lunch", Some("12:00"));
//! let bitmap = composer.finish(canvas, Dither::Diffusion(DiffusionKernel::FloydSteinberg), None, None);
//!
//! assert_eq!(bitmap.width, 296);
//! ```

pub mod canvas;
pub mod composer;
pub mod dither;
pub mod font;
