//! Today's coding time from WakaTime, with the top languages.

use async_trait::async_trait;
use serde::Deserialize;

use super::options::ImageOptions;
use super::stats::format_duration;
use super::{RenderContext, RenderRequest, Renderer};
use crate::error::DotmateError;
use crate::payload::{RenderedPayload, SCREEN_WIDTH};
use crate::providers::wakatime::{self, CodingSummary};
use crate::registry::{ParamContract, ParamSpec};
use crate::render::canvas::{BLACK, Canvas};
use crate::render::composer::{Composer, TextStyle};

const MAX_LANGUAGES: usize = 3;
const SEPARATOR_Y: i32 = 80;

#[derive(Debug, Deserialize)]
struct CodeStatusParams {
    wakatime_api_key: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(flatten)]
    options: ImageOptions,
}

/// Lay out the coding summary: heading, total, then one line per language.
pub fn draw_summary(composer: &Composer, summary: &CodingSummary, title: Option<&str>) -> Canvas {
    let mut canvas = Canvas::screen();

    let heading = title.unwrap_or("Code Status");
    composer.draw_centered(&mut canvas, &composer.font(18), heading, 0, SCREEN_WIDTH, 8);

    let total = format_duration(summary.grand_total.total_seconds as i64);
    composer.draw_centered(&mut canvas, &composer.font(36), &total, 0, SCREEN_WIDTH, 32);

    canvas.hline(10, SCREEN_WIDTH as i32 - 11, SEPARATOR_Y, BLACK);

    let font = composer.font(14);
    let mut y = SEPARATOR_Y + 8;
    for language in summary.languages.iter().take(MAX_LANGUAGES) {
        let line = format!(
            "{}  {}  {:.0}%",
            language.name,
            format_duration(language.total_seconds as i64),
            language.percent
        );
        composer.draw_centered(&mut canvas, &font, &line, 0, SCREEN_WIDTH, y);
        y += font.line_height() as i32;
    }
    canvas
}

pub struct CodeStatusRenderer;

#[async_trait]
impl Renderer for CodeStatusRenderer {
    fn kind(&self) -> &'static str {
        "code_status"
    }

    fn contract(&self) -> ParamContract {
        ParamContract::new(vec![
            ParamSpec::string("wakatime_api_key").required(),
            ParamSpec::string("title"),
        ])
        .extend(ImageOptions::params())
    }

    async fn produce(
        &self,
        ctx: &RenderContext,
        request: &RenderRequest,
    ) -> Result<RenderedPayload, DotmateError> {
        let params: CodeStatusParams = self.contract().parse(self.kind(), &request.params)?;
        let summary = wakatime::fetch_today(&ctx.http_client, &ctx.endpoints.wakatime, &params.wakatime_api_key)
            .await
            .map_err(|source| DotmateError::ExternalDataUnavailable {
                provider: "wakatime",
                source,
            })?;

        let composer = ctx.composer.with_style(TextStyle {
            family: Some("Hack".to_string()),
            weight: Some(700),
        });
        let canvas = draw_summary(&composer, &summary, params.title.as_deref());
        Ok(params.options.finish(ctx, canvas))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::wakatime::{GrandTotal, LanguageTime};
    use crate::renderers::Endpoints;
    use serde_json::json;

    #[test]
    fn test_summary_lists_languages_below_separator() {
        let summary = CodingSummary {
            grand_total: GrandTotal { total_seconds: 5400.0 },
            languages: vec![
                LanguageTime { name: "Rust".into(), total_seconds: 4000.0, percent: 74.0 },
                LanguageTime { name: "YAML".into(), total_seconds: 1400.0, percent: 26.0 },
            ],
        };
        let canvas = draw_summary(&RenderContext::offline().composer, &summary, None);
        assert_eq!(canvas.get(SCREEN_WIDTH / 2, SEPARATOR_Y as usize), BLACK);
        let below = (SEPARATOR_Y as usize + 2..152).any(|y| (0..SCREEN_WIDTH).any(|x| canvas.get(x, y) < 128));
        assert!(below);
    }

    #[tokio::test]
    async fn test_provider_failure_is_external_data_unavailable() {
        let ctx = RenderContext::offline().with_endpoints(Endpoints {
            wakatime: "http://127.0.0.1:1/api/v1".into(),
            ..Endpoints::default()
        });
        let params = json!({"wakatime_api_key": "waka_key"}).as_object().cloned().unwrap();
        let err = CodeStatusRenderer
            .produce(&ctx, &RenderRequest::new("dev", params))
            .await
            .unwrap_err();
        assert!(matches!(err, DotmateError::ExternalDataUnavailable { provider: "wakatime", .. }));
    }
}
