//! Plain text card.

use async_trait::async_trait;
use serde::Deserialize;

use super::{RenderContext, RenderRequest, Renderer};
use crate::error::DotmateError;
use crate::payload::{RenderedPayload, TextPayload};
use crate::registry::{ParamContract, ParamSpec};

#[derive(Debug, Deserialize)]
struct TextParams {
    message: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
}

/// Sends `message` (and optional `title`) signed with the current time.
pub struct TextRenderer;

#[async_trait]
impl Renderer for TextRenderer {
    fn kind(&self) -> &'static str {
        "text"
    }

    fn contract(&self) -> ParamContract {
        ParamContract::new(vec![
            ParamSpec::string("message").required(),
            ParamSpec::string("title"),
            ParamSpec::string("link"),
        ])
    }

    async fn produce(
        &self,
        ctx: &RenderContext,
        request: &RenderRequest,
    ) -> Result<RenderedPayload, DotmateError> {
        let params: TextParams = self.contract().parse(self.kind(), &request.params)?;
        Ok(RenderedPayload::Text(TextPayload {
            title: params.title,
            body: params.message,
            signature: Some(ctx.signature()),
            icon: None,
            link: params.link,
        }))
    }
}
