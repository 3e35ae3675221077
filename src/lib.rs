//! # Dotmate - Scheduled Content for Dot. E-ink Displays
//!
//! Dotmate renders small pieces of content (text cards, work countdowns,
//! statistics, images) and pushes them to Dot. display devices on
//! per-device cron schedules. It provides:
//!
//! - **Schedule engine**: 5-field cron parsing and a cooperative trigger loop
//! - **Renderer registry**: named renderers with typed parameter contracts
//! - **Dithering**: ten error-diffusion kernels plus Bayer ordered dithering
//! - **Transport**: the Dot. cloud HTTP API
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use dotmate::{
//!     config::Config,
//!     renderers::{self, RenderContext},
//!     schedule::ScheduleEngine,
//!     transport::DotClient,
//! };
//!
//! # async fn example() -> Result<(), dotmate::DotmateError> {
//! let config = Config::load("config.yaml")?;
//! let registry = Arc::new(renderers::default_registry());
//! let transport = Arc::new(DotClient::from_config(&config)?);
//! let engine = ScheduleEngine::new(registry, transport, RenderContext::from_config(&config)?);
//!
//! // Push a text card right away
//! let params = serde_json::json!({ "message": "Standup in 5" });
//! let params = params.as_object().cloned().unwrap_or_default();
//! engine.fire_now("ABCD1234", "text", params).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`schedule`] | Cron expressions, clocks, the schedule engine |
//! | [`registry`] | Renderer registry and parameter contracts |
//! | [`renderers`] | Built-in renderer types |
//! | [`render`] | Canvas, fonts, composition and dithering |
//! | [`providers`] | WakaTime, Umami and GitHub data sources |
//! | [`transport`] | Device delivery backends |
//! | [`server`] | Preview and administration HTTP API |
//! | [`config`] | YAML configuration |
//! | [`error`] | Error types |

pub mod config;
pub mod error;
pub mod payload;
pub mod providers;
pub mod registry;
pub mod render;
pub mod renderers;
pub mod schedule;
pub mod server;
pub mod transport;

// Re-exports for convenience
pub use config::Config;
pub use error::DotmateError;
pub use payload::{Bitmap, RenderedPayload, TextPayload};
pub use schedule::ScheduleEngine;
pub use transport::DotClient;
