//! Centered main title with an optional subtitle.

use async_trait::async_trait;
use serde::Deserialize;

use super::options::ImageOptions;
use super::{RenderContext, RenderRequest, Renderer};
use crate::error::DotmateError;
use crate::payload::RenderedPayload;
use crate::registry::{ParamContract, ParamSpec};

#[derive(Debug, Deserialize)]
struct TitleImageParams {
    main_title: String,
    #[serde(default)]
    sub_title: Option<String>,
    #[serde(flatten)]
    options: ImageOptions,
}

pub struct TitleImageRenderer;

#[async_trait]
impl Renderer for TitleImageRenderer {
    fn kind(&self) -> &'static str {
        "title_image"
    }

    fn contract(&self) -> ParamContract {
        ParamContract::new(vec![
            ParamSpec::string("main_title").required(),
            ParamSpec::string("sub_title"),
        ])
        .extend(ImageOptions::params())
    }

    async fn produce(
        &self,
        ctx: &RenderContext,
        request: &RenderRequest,
    ) -> Result<RenderedPayload, DotmateError> {
        let params: TitleImageParams = self.contract().parse(self.kind(), &request.params)?;
        let canvas = ctx
            .composer
            .title_card(&params.main_title, params.sub_title.as_deref());
        Ok(params.options.finish(ctx, canvas))
    }
}
