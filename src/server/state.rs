//! Server state and configuration.

use std::sync::Arc;

use crate::config::Device;
use crate::error::DotmateError;
use crate::registry::RendererRegistry;
use crate::renderers::RenderContext;
use crate::schedule::ScheduleEngine;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "127.0.0.1:8080")
    pub listen_addr: String,
}

/// Application state shared across handlers.
pub struct AppState {
    pub registry: Arc<RendererRegistry>,
    pub context: RenderContext,
    pub engine: Arc<ScheduleEngine>,
    /// Configured devices, for resolving names in push requests.
    pub devices: Vec<Device>,
}

impl AppState {
    pub fn new(
        registry: Arc<RendererRegistry>,
        context: RenderContext,
        engine: Arc<ScheduleEngine>,
        devices: Vec<Device>,
    ) -> Self {
        Self {
            registry,
            context,
            engine,
            devices,
        }
    }

    /// Load the devices' schedules into `engine` and share its render
    /// context, so `/api/schedules` shows what the daemon would run.
    pub fn load(
        registry: Arc<RendererRegistry>,
        engine: Arc<ScheduleEngine>,
        devices: Vec<Device>,
    ) -> Result<Self, DotmateError> {
        engine.load(&devices)?;
        let context = engine.context().clone();
        Ok(Self::new(registry, context, engine, devices))
    }

    /// Device by name or identifier; the last match wins.
    pub fn device(&self, name_or_id: &str) -> Option<&Device> {
        self.devices
            .iter()
            .rev()
            .find(|d| d.name == name_or_id || d.device_id == name_or_id)
    }
}
