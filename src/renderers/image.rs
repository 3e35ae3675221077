//! Arbitrary picture, fitted to the screen and dithered.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::options::ImageOptions;
use super::{RenderContext, RenderRequest, Renderer};
use crate::error::DotmateError;
use crate::payload::RenderedPayload;
use crate::providers::{ProviderError, fetch_bytes};
use crate::registry::{ParamContract, ParamSpec};
use crate::render::canvas::Canvas;

#[derive(Debug, Deserialize)]
struct ImageParams {
    #[serde(default)]
    image_path: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(flatten)]
    options: ImageOptions,
}

/// Loads `image_path` (local file) or `image_url` (HTTP).
pub struct ImageRenderer;

impl ImageRenderer {
    async fn load(&self, ctx: &RenderContext, params: &ImageParams) -> Result<Vec<u8>, DotmateError> {
        match (&params.image_path, &params.image_url) {
            (Some(path), _) => {
                debug!(path = %path, "Reading image file");
                Ok(tokio::fs::read(path).await?)
            }
            (None, Some(url)) => {
                debug!(url = %url, "Downloading image");
                fetch_bytes(ctx.http_client.get(url))
                    .await
                    .map_err(|source: ProviderError| DotmateError::ExternalDataUnavailable {
                        provider: "image",
                        source,
                    })
            }
            (None, None) => Err(DotmateError::invalid_params(
                self.kind(),
                "one of 'image_path' or 'image_url' is required",
            )),
        }
    }
}

#[async_trait]
impl Renderer for ImageRenderer {
    fn kind(&self) -> &'static str {
        "image"
    }

    fn contract(&self) -> ParamContract {
        ParamContract::new(vec![
            ParamSpec::string("image_path").with_description("Local file; takes precedence over image_url"),
            ParamSpec::string("image_url"),
        ])
        .extend(ImageOptions::params())
    }

    async fn produce(
        &self,
        ctx: &RenderContext,
        request: &RenderRequest,
    ) -> Result<RenderedPayload, DotmateError> {
        let params: ImageParams = self.contract().parse(self.kind(), &request.params)?;
        let bytes = self.load(ctx, &params).await?;
        let source = image::load_from_memory(&bytes)
            .map_err(|e| DotmateError::Image(format!("Cannot decode image: {}", e)))?;
        Ok(params.options.finish(ctx, Canvas::from_image(&source)))
    }
}
