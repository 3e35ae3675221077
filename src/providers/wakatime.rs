//! WakaTime coding-time stats.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;

use super::{ProviderError, fetch_json};

pub const DEFAULT_BASE: &str = "https://wakatime.com/api/v1";

/// Today's totals from the status bar endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CodingSummary {
    pub grand_total: GrandTotal,
    #[serde(default)]
    pub languages: Vec<LanguageTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GrandTotal {
    #[serde(default)]
    pub total_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LanguageTime {
    pub name: String,
    #[serde(default)]
    pub total_seconds: f64,
    #[serde(default)]
    pub percent: f64,
}

#[derive(Deserialize)]
struct Envelope {
    data: CodingSummary,
}

/// Fetch today's coding summary for the key's owner.
///
/// WakaTime expects HTTP Basic auth with the base64 API key and no password.
pub async fn fetch_today(
    client: &reqwest::Client,
    base: &str,
    api_key: &str,
) -> Result<CodingSummary, ProviderError> {
    let url = format!("{}/users/current/status_bar/today", base.trim_end_matches('/'));
    let request = client
        .get(url)
        .header("Authorization", format!("Basic {}", BASE64.encode(api_key)));
    let envelope: Envelope = fetch_json(request).await?;
    Ok(envelope.data)
}
