//! Umami website analytics.

use chrono::{DateTime, Duration, TimeZone};
use serde::Deserialize;

use super::{ProviderError, fetch_json};

/// One metric with its value for the previous period of equal length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Metric {
    #[serde(default)]
    pub value: i64,
    #[serde(default)]
    pub prev: i64,
}

/// `GET /api/websites/{id}/stats` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WebsiteStats {
    pub pageviews: Metric,
    pub visitors: Metric,
    pub visits: Metric,
    pub bounces: Metric,
    /// Seconds.
    pub totaltime: Metric,
}

/// Length of a range like `24h`, `7d` or `2w`.
///
/// `0d` is an empty window. Anything unparseable or negative means 24 hours.
pub fn parse_time_range(range: &str) -> Duration {
    let range = range.trim();
    let fallback = Duration::hours(24);
    let Some(unit) = range.chars().last() else {
        return fallback;
    };
    let Ok(n) = range[..range.len() - unit.len_utf8()].parse::<i64>() else {
        return fallback;
    };
    let parsed = match unit {
        'h' => Duration::try_hours(n),
        'd' => Duration::try_days(n),
        'w' => Duration::try_weeks(n),
        _ => None,
    };
    parsed.filter(|d| *d >= Duration::zero()).unwrap_or(fallback)
}

/// Fetch stats for the window ending at `now`.
pub async fn fetch_stats<Tz: TimeZone>(
    client: &reqwest::Client,
    host: &str,
    website_id: &str,
    api_key: &str,
    range: &str,
    now: DateTime<Tz>,
) -> Result<WebsiteStats, ProviderError> {
    let start = now.clone() - parse_time_range(range);
    let url = format!("{}/api/websites/{}/stats", host.trim_end_matches('/'), website_id);
    let request = client.get(url).bearer_auth(api_key).query(&[
        ("startAt", start.timestamp_millis()),
        ("endAt", now.timestamp_millis()),
    ]);
    fetch_json(request).await
}
