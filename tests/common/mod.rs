//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use serde_json::Value;

use dotmate::config::{Device, ScheduleSpec};
use dotmate::payload::{Bitmap, RenderedPayload, TextPayload};
use dotmate::registry::Params;
use dotmate::transport::{DeviceTransport, TransportError};

/// Records every delivery; can be switched to reject everything.
#[derive(Default)]
pub struct RecordingTransport {
    deliveries: Mutex<Vec<(String, RenderedPayload)>>,
    failing: AtomicBool,
}

impl RecordingTransport {
    pub fn failing() -> Self {
        let transport = Self::default();
        transport.failing.store(true, Ordering::SeqCst);
        transport
    }

    pub fn deliveries(&self) -> Vec<(String, RenderedPayload)> {
        self.deliveries.lock().unwrap().clone()
    }

    pub fn device_ids(&self) -> Vec<String> {
        self.deliveries().into_iter().map(|(id, _)| id).collect()
    }

    pub fn count(&self) -> usize {
        self.deliveries.lock().unwrap().len()
    }

    fn record(&self, device_id: &str, payload: RenderedPayload) -> Result<(), TransportError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::ServerRejected {
                status: 500,
                message: "device offline".to_string(),
            });
        }
        self.deliveries
            .lock()
            .unwrap()
            .push((device_id.to_string(), payload));
        Ok(())
    }
}

#[async_trait]
impl DeviceTransport for RecordingTransport {
    async fn deliver_text(&self, device_id: &str, text: &TextPayload) -> Result<(), TransportError> {
        self.record(device_id, RenderedPayload::Text(text.clone()))
    }

    async fn deliver_bitmap(&self, device_id: &str, bitmap: &Bitmap) -> Result<(), TransportError> {
        self.record(device_id, RenderedPayload::Bitmap(bitmap.clone()))
    }
}

pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

pub fn params(value: Value) -> Params {
    value.as_object().cloned().unwrap_or_default()
}

pub fn schedule(cron: Option<&str>, kind: &str, p: Value) -> ScheduleSpec {
    ScheduleSpec {
        cron: cron.map(str::to_string),
        kind: kind.to_string(),
        params: params(p),
    }
}

pub fn device(name: &str, device_id: &str, schedules: Vec<ScheduleSpec>) -> Device {
    Device {
        name: name.to_string(),
        device_id: device_id.to_string(),
        schedules,
    }
}

pub fn text_body(payload: &RenderedPayload) -> Option<&str> {
    match payload {
        RenderedPayload::Text(text) => Some(&text.body),
        RenderedPayload::Bitmap(_) => None,
    }
}
