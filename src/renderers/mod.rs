//! # Renderer Variants
//!
//! Named content producers. Each renderer declares a [`ParamContract`] and
//! turns a [`RenderRequest`] into exactly one [`RenderedPayload`]; the
//! caller (schedule engine, CLI, preview server) delivers it.
//!
//! | Type                   | Payload | Source                        |
//! |------------------------|---------|-------------------------------|
//! | `text`                 | Text    | parameters                    |
//! | `work`                 | Text    | clock-in/out and current time |
//! | `work_image`           | Bitmap  | same, as a title card         |
//! | `image`                | Bitmap  | local file or URL             |
//! | `title_image`          | Bitmap  | parameters                    |
//! | `code_status`          | Bitmap  | WakaTime                      |
//! | `umami_stats`          | Bitmap  | Umami                         |
//! | `github_contributions` | Bitmap  | GitHub GraphQL                |
//!
//! ## Adding a New Renderer
//!
//! 1. Create `src/renderers/myrenderer.rs` with a struct implementing [`Renderer`]
//! 2. Add `pub mod myrenderer;` below
//! 3. Register it in [`default_registry`]

pub mod code_status;
pub mod github_contributions;
pub mod image;
pub mod options;
pub mod stats;
pub mod text;
pub mod title_image;
pub mod umami_stats;
pub mod work;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};

use crate::config::Config;
use crate::error::DotmateError;
use crate::payload::RenderedPayload;
use crate::providers::{github, wakatime};
use crate::registry::{ParamContract, Params, RendererRegistry};
use crate::render::composer::{Composer, TextStyle};
use crate::render::font::{BuiltinFontProvider, SystemFontProvider};
use crate::schedule::clock::{Clock, SystemClock};

/// A named, pluggable content producer.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Type name used in configuration (e.g. `"title_image"`).
    fn kind(&self) -> &'static str;

    /// Declared parameters, checked before `produce` does any work.
    fn contract(&self) -> ParamContract;

    /// Build one payload. Never delivers anything itself.
    async fn produce(
        &self,
        ctx: &RenderContext,
        request: &RenderRequest,
    ) -> Result<RenderedPayload, DotmateError>;
}

/// One firing's input: the target device and its raw parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub device_id: String,
    pub params: Params,
}

impl RenderRequest {
    pub fn new(device_id: impl Into<String>, params: Params) -> Self {
        Self {
            device_id: device_id.into(),
            params,
        }
    }
}

/// Provider endpoints, overridable so tests can point them elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub wakatime: String,
    pub github_graphql: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            wakatime: wakatime::DEFAULT_BASE.to_string(),
            github_graphql: github::GRAPHQL_URL.to_string(),
        }
    }
}

/// Shared resources available to renderers.
///
/// Constructed once and passed to every `produce` call. Text renderers only
/// read the clock; image renderers use the composer; data renderers also
/// reach for the HTTP client.
#[derive(Clone)]
pub struct RenderContext {
    /// HTTP client for providers and remote images.
    pub http_client: reqwest::Client,
    pub composer: Composer,
    pub clock: Arc<dyn Clock>,
    pub endpoints: Endpoints,
}

impl RenderContext {
    pub fn new(http_client: reqwest::Client, composer: Composer, clock: Arc<dyn Clock>) -> Self {
        Self {
            http_client,
            composer,
            clock,
            endpoints: Endpoints::default(),
        }
    }

    /// System fonts, the real clock and an HTTP client with the configured timeout.
    pub fn from_config(config: &Config) -> Result<Self, DotmateError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("dotmate/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| DotmateError::Config(format!("Cannot build HTTP client: {}", e)))?;
        let style = TextStyle {
            family: config.font.family.clone(),
            weight: config.font.weight,
        };
        let fonts = Arc::new(SystemFontProvider::new(config.font.clone()));
        Ok(Self::new(
            http_client,
            Composer::new(fonts, style),
            Arc::new(SystemClock),
        ))
    }

    /// Built-in bitmap font and the real clock; no configuration needed.
    pub fn offline() -> Self {
        Self::new(
            reqwest::Client::new(),
            Composer::new(Arc::new(BuiltinFontProvider), TextStyle::default()),
            Arc::new(SystemClock),
        )
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn now(&self) -> DateTime<Local> {
        self.clock.now()
    }

    /// Current time as a text-card signature.
    pub fn signature(&self) -> String {
        self.now().format("%H:%M").to_string()
    }
}

/// A registry with every built-in renderer.
pub fn default_registry() -> RendererRegistry {
    let renderers: Vec<Arc<dyn Renderer>> = vec![
        Arc::new(text::TextRenderer),
        Arc::new(work::WorkRenderer),
        Arc::new(work::WorkImageRenderer),
        Arc::new(image::ImageRenderer),
        Arc::new(title_image::TitleImageRenderer),
        Arc::new(code_status::CodeStatusRenderer),
        Arc::new(umami_stats::UmamiStatsRenderer),
        Arc::new(github_contributions::GithubContributionsRenderer),
    ];

    let mut registry = RendererRegistry::new();
    for renderer in renderers {
        registry.register(renderer.kind(), renderer);
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_registry_types() {
        let types: Vec<String> = default_registry()
            .list_types()
            .into_iter()
            .map(|t| t.kind)
            .collect();
        assert_eq!(
            types,
            vec![
                "code_status",
                "github_contributions",
                "image",
                "text",
                "title_image",
                "umami_stats",
                "work",
                "work_image",
            ]
        );
    }

    #[test]
    fn test_image_renderers_share_options() {
        let registry = default_registry();
        for kind in ["image", "title_image", "work_image", "code_status", "umami_stats", "github_contributions"] {
            let contract = &registry.resolve(kind).unwrap().contract;
            for field in ["link", "border", "dither_type", "dither_kernel"] {
                assert!(contract.field(field).is_some(), "{} lacks {}", kind, field);
            }
        }
    }
}
