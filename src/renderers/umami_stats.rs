//! Website analytics from an Umami instance.
//!
//! ```text
//!            Blog (24h)
//!      PV               UV
//!     1.2K              345
//!     ▲20%              ▼5%
//!   Visits   Bounces    Time
//!    400       120     2h 5m
//!    ▲3%       0%       ▲1%
//! ```

use async_trait::async_trait;
use serde::Deserialize;

use super::options::ImageOptions;
use super::stats::{StatColumn, format_change, format_count, format_duration};
use super::{RenderContext, RenderRequest, Renderer};
use crate::error::DotmateError;
use crate::payload::{RenderedPayload, SCREEN_WIDTH};
use crate::providers::umami::{self, WebsiteStats};
use crate::registry::{ParamContract, ParamSpec};
use crate::render::canvas::Canvas;
use crate::render::composer::{Composer, TextStyle};

const TITLE_Y: i32 = 8;
const ROW1_Y: i32 = 32;
const ROW2_Y: i32 = 90;

fn default_range() -> String {
    "24h".to_string()
}

#[derive(Debug, Deserialize)]
struct UmamiParams {
    umami_host: String,
    umami_website_id: String,
    umami_api_key: String,
    #[serde(default = "default_range")]
    umami_time_range: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(flatten)]
    options: ImageOptions,
}

/// Lay out the stats screen.
pub fn draw_stats(composer: &Composer, stats: &WebsiteStats, range: &str, title: Option<&str>) -> Canvas {
    let mut canvas = Canvas::screen();
    let heading = format!("{} ({})", title.unwrap_or("Umami Stats"), range);
    composer.draw_centered(&mut canvas, &composer.font(18), &heading, 0, SCREEN_WIDTH, TITLE_Y);

    let column = |label, value, metric: umami::Metric| StatColumn {
        label,
        value,
        change: Some(format_change(metric.value, metric.prev)),
    };

    let row1 = [
        column("PV", format_count(stats.pageviews.value), stats.pageviews),
        column("UV", format_count(stats.visitors.value), stats.visitors),
    ];
    let row2 = [
        column("Visits", format_count(stats.visits.value), stats.visits),
        column("Bounces", format_count(stats.bounces.value), stats.bounces),
        column("Time", format_duration(stats.totaltime.value), stats.totaltime),
    ];

    for (row, y) in [(&row1[..], ROW1_Y), (&row2[..], ROW2_Y)] {
        let width = SCREEN_WIDTH / row.len();
        for (i, col) in row.iter().enumerate() {
            col.draw(composer, &mut canvas, (i * width) as i32, width, y);
        }
    }
    canvas
}

pub struct UmamiStatsRenderer;

#[async_trait]
impl Renderer for UmamiStatsRenderer {
    fn kind(&self) -> &'static str {
        "umami_stats"
    }

    fn contract(&self) -> ParamContract {
        ParamContract::new(vec![
            ParamSpec::string("umami_host").required(),
            ParamSpec::string("umami_website_id").required(),
            ParamSpec::string("umami_api_key").required(),
            ParamSpec::string("umami_time_range").with_description("e.g. 24h, 7d, 2w (default 24h)"),
            ParamSpec::string("title"),
        ])
        .extend(ImageOptions::params())
    }

    async fn produce(
        &self,
        ctx: &RenderContext,
        request: &RenderRequest,
    ) -> Result<RenderedPayload, DotmateError> {
        let params: UmamiParams = self.contract().parse(self.kind(), &request.params)?;
        let stats = umami::fetch_stats(
            &ctx.http_client,
            &params.umami_host,
            &params.umami_website_id,
            &params.umami_api_key,
            &params.umami_time_range,
            ctx.now(),
        )
        .await
        .map_err(|source| DotmateError::ExternalDataUnavailable {
            provider: "umami",
            source,
        })?;

        let composer = ctx.composer.with_style(TextStyle {
            family: Some("Hack".to_string()),
            weight: Some(700),
        });
        let canvas = draw_stats(&composer, &stats, &params.umami_time_range, params.title.as_deref());
        Ok(params.options.finish(ctx, canvas))
    }
}
