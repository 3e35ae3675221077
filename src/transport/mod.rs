//! # Device Transport Layer
//!
//! Delivers rendered payloads to display devices.
//!
//! ## Available Transports
//!
//! - [`dot`]: the Dot. device cloud HTTP API
//!
//! Tests substitute their own [`DeviceTransport`] to record deliveries.

pub mod dot;

pub use dot::DotClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::payload::{Bitmap, RenderedPayload, TextPayload};

/// Delivery failure. Never retried; the next scheduled tick is the retry.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection or protocol failure before a response arrived
    #[error("network error: {0}")]
    Network(String),

    /// The device cloud answered with a non-success status
    #[error("server rejected request ({status}): {message}")]
    ServerRejected { status: u16, message: String },

    /// No response within the configured timeout
    #[error("request timed out")]
    Timeout,
}

/// A channel to the physical displays.
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    async fn deliver_text(&self, device_id: &str, text: &TextPayload) -> Result<(), TransportError>;

    async fn deliver_bitmap(&self, device_id: &str, bitmap: &Bitmap) -> Result<(), TransportError>;

    /// Deliver either payload shape.
    async fn deliver(&self, device_id: &str, payload: &RenderedPayload) -> Result<(), TransportError> {
        match payload {
            RenderedPayload::Text(text) => self.deliver_text(device_id, text).await,
            RenderedPayload::Bitmap(bitmap) => self.deliver_bitmap(device_id, bitmap).await,
        }
    }
}
