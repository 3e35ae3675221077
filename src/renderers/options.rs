//! Display options shared by every bitmap renderer.

use serde::Deserialize;

use super::RenderContext;
use crate::payload::RenderedPayload;
use crate::registry::ParamSpec;
use crate::render::canvas::Canvas;
use crate::render::dither::{DiffusionKernel, Dither, DitherType};

/// `link`, `border`, `dither_type`, `dither_kernel`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImageOptions {
    #[serde(default)]
    pub link: Option<String>,
    /// 0 = white, 1 = black.
    #[serde(default)]
    pub border: Option<u8>,
    #[serde(default)]
    pub dither_type: Option<DitherType>,
    #[serde(default)]
    pub dither_kernel: Option<DiffusionKernel>,
}

impl ImageOptions {
    pub fn params() -> Vec<ParamSpec> {
        vec![
            ParamSpec::string("link").with_description("URL opened when the device is tapped"),
            ParamSpec::integer("border").with_description("Screen edge colour: 0 white, 1 black"),
            ParamSpec::one_of("dither_type", DitherType::ALL.iter().map(|d| d.name())),
            ParamSpec::one_of("dither_kernel", DiffusionKernel::ALL.iter().map(|k| k.name())),
        ]
    }

    pub fn dither(&self) -> Dither {
        Dither::select(self.dither_type.unwrap_or_default(), self.dither_kernel)
    }

    /// Overlay, quantize and wrap a finished canvas.
    pub fn finish(&self, ctx: &RenderContext, canvas: Canvas) -> RenderedPayload {
        RenderedPayload::Bitmap(ctx.composer.finish(
            canvas,
            self.dither(),
            self.border,
            self.link.as_deref(),
        ))
    }
}
