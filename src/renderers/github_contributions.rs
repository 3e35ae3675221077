//! GitHub profile header above the recent contribution calendar.

use async_trait::async_trait;
use serde::Deserialize;

use super::options::ImageOptions;
use super::stats::{contribution_level, draw_contribution_cell, format_count};
use super::{RenderContext, RenderRequest, Renderer};
use crate::error::DotmateError;
use crate::payload::{RenderedPayload, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::providers::github::{self, GithubUser};
use crate::registry::{ParamContract, ParamSpec};
use crate::render::canvas::{BLACK, Canvas};
use crate::render::composer::{Composer, TextStyle};

const HEADER_HEIGHT: i32 = 60;
const CELL_GAP: usize = 2;
const MIN_CELL: usize = 4;

#[derive(Debug, Deserialize)]
struct GithubParams {
    github_username: String,
    github_token: String,
    #[serde(flatten)]
    options: ImageOptions,
}

/// Grid geometry: cell size and how many weeks fit.
pub fn grid_geometry(weeks_available: usize) -> (usize, usize) {
    let top = HEADER_HEIGHT as usize + 8;
    let available_height = SCREEN_HEIGHT - 5 - top;
    let available_width = SCREEN_WIDTH - 10;
    let cell = ((available_height - 6 * CELL_GAP) / 7).max(MIN_CELL);
    let max_weeks = (available_width + CELL_GAP) / (cell + CELL_GAP);
    (cell, max_weeks.min(weeks_available))
}

pub fn draw_profile(composer: &Composer, user: &GithubUser) -> Canvas {
    let mut canvas = Canvas::screen();

    composer.draw_text(&mut canvas, 16, &user.login, 10, 8);
    let followers = format!("Followers: {}", format_count(user.followers.total_count));
    let stars = format!("Stars: {}", format_count(user.total_stars()));
    composer.draw_text(&mut canvas, 12, &followers, 10, 28);
    composer.draw_text(&mut canvas, 12, &stars, 10, 44);

    canvas.hline(0, SCREEN_WIDTH as i32 - 1, HEADER_HEIGHT, BLACK);

    let weeks = user.weeks();
    let (cell, count) = grid_geometry(weeks.len());
    if count == 0 {
        return canvas;
    }
    let grid_width = count * (cell + CELL_GAP) - CELL_GAP;
    let left = ((SCREEN_WIDTH - grid_width) / 2) as i32;
    let top = HEADER_HEIGHT + 8;
    let step = (cell + CELL_GAP) as i32;

    for (wi, week) in weeks[weeks.len() - count..].iter().enumerate() {
        for (di, day) in week.contribution_days.iter().take(7).enumerate() {
            let level = contribution_level(day.contribution_count);
            draw_contribution_cell(&mut canvas, left + wi as i32 * step, top + di as i32 * step, cell, level);
        }
    }
    canvas
}

pub struct GithubContributionsRenderer;

#[async_trait]
impl Renderer for GithubContributionsRenderer {
    fn kind(&self) -> &'static str {
        "github_contributions"
    }

    fn contract(&self) -> ParamContract {
        ParamContract::new(vec![
            ParamSpec::string("github_username").required(),
            ParamSpec::string("github_token").required(),
        ])
        .extend(ImageOptions::params())
    }

    async fn produce(
        &self,
        ctx: &RenderContext,
        request: &RenderRequest,
    ) -> Result<RenderedPayload, DotmateError> {
        let params: GithubParams = self.contract().parse(self.kind(), &request.params)?;
        let user = github::fetch_user(
            &ctx.http_client,
            &ctx.endpoints.github_graphql,
            &params.github_username,
            &params.github_token,
        )
        .await
        .map_err(|source| DotmateError::ExternalDataUnavailable {
            provider: "github",
            source,
        })?;

        let composer = ctx.composer.with_style(TextStyle {
            family: Some("Hack".to_string()),
            weight: Some(700),
        });
        let canvas = draw_profile(&composer, &user);
        Ok(params.options.finish(ctx, canvas))
    }
}
