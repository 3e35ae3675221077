//! Countdown to the end of the working day.
//!
//! ```text
//! before clock-in / after clock-out   已经下班啦
//! less than an hour left              距下班 25 分钟
//! otherwise                           距下班 3 小时 25 分钟
//! ```

use async_trait::async_trait;
use chrono::{NaiveTime, Timelike};
use serde::Deserialize;

use super::options::ImageOptions;
use super::{RenderContext, RenderRequest, Renderer};
use crate::error::DotmateError;
use crate::payload::{RenderedPayload, TextPayload};
use crate::registry::{ParamContract, ParamSpec};

pub const WORK_TITLE: &str = "还有多久下班";
pub const OFF_WORK: &str = "已经下班啦";

#[derive(Debug, Deserialize)]
struct WorkParams {
    clock_in: String,
    clock_out: String,
    #[serde(flatten)]
    options: ImageOptions,
}

fn work_params() -> Vec<ParamSpec> {
    vec![
        ParamSpec::string("clock_in").required().with_description("HH:MM"),
        ParamSpec::string("clock_out").required().with_description("HH:MM"),
    ]
}

fn parse_time(kind: &str, field: &str, value: &str) -> Result<NaiveTime, DotmateError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value.trim(), "%H:%M:%S"))
        .map_err(|_| DotmateError::invalid_params(kind, format!("{} must be HH:MM, got '{}'", field, value)))
}

/// Countdown text for `now`, minutes rounded down.
pub fn work_status(clock_in: NaiveTime, clock_out: NaiveTime, now: NaiveTime) -> String {
    if now < clock_in || now >= clock_out {
        return OFF_WORK.to_string();
    }
    let total_minutes = (clock_out - now).num_seconds() / 60;
    let (hours, minutes) = (total_minutes / 60, total_minutes % 60);
    if hours > 0 {
        format!("距下班 {} 小时 {} 分钟", hours, minutes)
    } else {
        format!("距下班 {} 分钟", minutes)
    }
}

fn status_for(kind: &str, ctx: &RenderContext, params: &WorkParams) -> Result<String, DotmateError> {
    let clock_in = parse_time(kind, "clock_in", &params.clock_in)?;
    let clock_out = parse_time(kind, "clock_out", &params.clock_out)?;
    let now = ctx.now().time();
    let now = now.with_nanosecond(0).unwrap_or(now);
    Ok(work_status(clock_in, clock_out, now))
}

/// Countdown as a text card.
pub struct WorkRenderer;

#[async_trait]
impl Renderer for WorkRenderer {
    fn kind(&self) -> &'static str {
        "work"
    }

    fn contract(&self) -> ParamContract {
        ParamContract::new(work_params())
    }

    async fn produce(
        &self,
        ctx: &RenderContext,
        request: &RenderRequest,
    ) -> Result<RenderedPayload, DotmateError> {
        let params: WorkParams = self.contract().parse(self.kind(), &request.params)?;
        let body = status_for(self.kind(), ctx, &params)?;
        Ok(RenderedPayload::Text(TextPayload {
            title: Some(WORK_TITLE.to_string()),
            body,
            signature: Some(ctx.signature()),
            icon: None,
            link: None,
        }))
    }
}

/// Countdown composed as a title card.
pub struct WorkImageRenderer;

#[async_trait]
impl Renderer for WorkImageRenderer {
    fn kind(&self) -> &'static str {
        "work_image"
    }

    fn contract(&self) -> ParamContract {
        ParamContract::new(work_params()).extend(ImageOptions::params())
    }

    async fn produce(
        &self,
        ctx: &RenderContext,
        request: &RenderRequest,
    ) -> Result<RenderedPayload, DotmateError> {
        let params: WorkParams = self.contract().parse(self.kind(), &request.params)?;
        let status = status_for(self.kind(), ctx, &params)?;
        let canvas = ctx.composer.title_card(&status, Some(WORK_TITLE));
        Ok(params.options.finish(ctx, canvas))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::clock::ManualClock;
    use chrono::{Local, TimeZone};
    use serde_json::json;
    use std::sync::Arc;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_work_status() {
        assert_eq!(work_status(t(9, 0), t(18, 0), t(8, 59)), OFF_WORK);
        assert_eq!(work_status(t(9, 0), t(18, 0), t(18, 0)), OFF_WORK);
        assert_eq!(work_status(t(9, 0), t(18, 0), t(9, 0)), "距下班 9 小时 0 分钟");
        assert_eq!(work_status(t(9, 0), t(18, 0), t(14, 35)), "距下班 3 小时 25 分钟");
        assert_eq!(work_status(t(9, 0), t(18, 0), t(17, 35)), "距下班 25 分钟");
    }

    #[test]
    fn test_minutes_round_down() {
        let now = NaiveTime::from_hms_opt(17, 35, 30).unwrap();
        assert_eq!(work_status(t(9, 0), t(18, 0), now), "距下班 24 分钟");
    }

    fn ctx_at(h: u32, m: u32) -> RenderContext {
        let now = Local.with_ymd_and_hms(2024, 1, 2, h, m, 0).unwrap();
        RenderContext::offline().with_clock(Arc::new(ManualClock::new(now)))
    }

    #[tokio::test]
    async fn test_text_card() {
        let params = json!({"clock_in": "09:00", "clock_out": "18:00"}).as_object().cloned().unwrap();
        let payload = WorkRenderer
            .produce(&ctx_at(17, 0), &RenderRequest::new("dev", params))
            .await
            .unwrap();
        match payload {
            RenderedPayload::Text(text) => {
                assert_eq!(text.title.as_deref(), Some(WORK_TITLE));
                assert_eq!(text.body, "距下班 1 小时 0 分钟");
                assert_eq!(text.signature.as_deref(), Some("17:00"));
            }
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bad_time_is_validation_error() {
        let params = json!({"clock_in": "9am", "clock_out": "18:00"}).as_object().cloned().unwrap();
        let err = WorkRenderer
            .produce(&ctx_at(10, 0), &RenderRequest::new("dev", params))
            .await
            .unwrap_err();
        assert!(matches!(err, DotmateError::ParameterValidationFailed { .. }));
        assert!(err.to_string().contains("clock_in"));
    }

    #[tokio::test]
    async fn test_image_variant_is_bitmap() {
        let params = json!({"clock_in": "09:00", "clock_out": "18:00", "border": 1})
            .as_object()
            .cloned()
            .unwrap();
        let payload = WorkImageRenderer
            .produce(&ctx_at(12, 0), &RenderRequest::new("dev", params))
            .await
            .unwrap();
        match payload {
            RenderedPayload::Bitmap(bitmap) => {
                assert_eq!(bitmap.data.len(), 5624);
                assert_eq!(bitmap.border, Some(1));
                assert!(!bitmap.is_white(0, 0));
            }
            other => panic!("expected bitmap, got {:?}", other),
        }
    }
}
