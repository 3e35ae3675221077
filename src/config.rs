//! # Configuration
//!
//! YAML configuration: device cloud credentials, font options and the
//! devices with their schedules.
//!
//! ```yaml
//! api_key: "dot-api-key"
//! devices:
//!   - name: "Desk"
//!     device_id: "ABCD1234"
//!     schedules:
//!       - cron: "0 12 * * *"
//!         type: "title_image"
//!         params: { main_title: "Lunch" }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

use crate::error::DotmateError;
use crate::registry::Params;

/// Default device cloud endpoint.
pub const DEFAULT_API_BASE: &str = "https://dot.mindreset.tech/api/open";

/// Default config file path.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_timeout() -> u64 {
    10
}

/// An empty YAML value (`schedules:`) reads as null; treat it like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Bearer token for the device cloud.
    pub api_key: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Timeout for every outgoing HTTP request (transport and providers).
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub font: FontOptions,
    #[serde(default, deserialize_with = "null_as_default")]
    pub devices: Vec<Device>,
}

/// Font preferences handed to the font provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FontOptions {
    pub family: Option<String>,
    /// Variable-font weight, 100-900.
    pub weight: Option<u16>,
    /// Extra directories searched before the platform font directories.
    #[serde(default)]
    pub dirs: Vec<PathBuf>,
}

/// A display device and its schedules.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Device {
    pub name: String,
    pub device_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub schedules: Vec<ScheduleSpec>,
}

/// One device + cron + renderer + parameters binding.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScheduleSpec {
    /// 5-field cron expression; `None` means manual pushes only.
    #[serde(default)]
    pub cron: Option<String>,
    /// Renderer type name.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub params: Params,
}

impl Config {
    /// Read and parse a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DotmateError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            DotmateError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, DotmateError> {
        let config: Config = serde_yaml::from_str(text)
            .map_err(|e| DotmateError::Config(format!("Invalid config: {}", e)))?;
        if config.api_key.trim().is_empty() {
            return Err(DotmateError::Config("api_key must not be empty".to_string()));
        }
        if let Some(w) = config.font.weight
            && !(100..=900).contains(&w)
        {
            return Err(DotmateError::Config(format!(
                "font.weight must be within 100-900, got {}",
                w
            )));
        }
        Ok(config)
    }

    /// Find a device by display name or identifier.
    ///
    /// Identifiers are not checked for uniqueness; the last match wins.
    pub fn device(&self, name_or_id: &str) -> Option<&Device> {
        self.devices
            .iter()
            .rev()
            .find(|d| d.name == name_or_id || d.device_id == name_or_id)
    }
}

impl Device {
    /// Params of the first schedule of the given renderer type.
    pub fn params_for(&self, kind: &str) -> Option<&Params> {
        self.schedules.iter().find(|s| s.kind == kind).map(|s| &s.params)
    }
}
