//! # Schedule Engine
//!
//! Turns configured devices into recurring jobs and fires them.
//!
//! ## Entry Lifecycle
//!
//! ```text
//! Pending ──load──► Scheduled ──due──► Firing ──done──► Scheduled ...
//!    │                                                      │
//!    └── no cron: stays Pending (manual pushes only)        └──stop──► Cancelled
//! ```
//!
//! ## Trigger Loop
//!
//! One task sleeps until the nearest deadline, then fires every due entry
//! in deadline order (ties in load order), one at a time. After a firing
//! the next deadline is computed from the completion time, so ticks missed
//! while a renderer was slow collapse into one.
//!
//! Failures inside a firing are logged and never stop the loop. Manual
//! pushes ([`ScheduleEngine::fire_now`]) go through the same path but hand
//! the error back to the caller.

pub mod clock;
pub mod cron;

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use self::clock::Clock;
use self::cron::CronExpr;
use crate::config::Device;
use crate::error::DotmateError;
use crate::payload::RenderedPayload;
use crate::registry::{Params, RendererRegistry};
use crate::renderers::{RenderContext, RenderRequest};
use crate::transport::DeviceTransport;

/// Lifecycle state of one schedule entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    Pending,
    Scheduled,
    Firing,
    Cancelled,
}

/// Read-only view of an entry for listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrySnapshot {
    pub device_name: String,
    pub device_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub cron: Option<String>,
    pub state: EntryState,
    pub next_fire: Option<DateTime<Local>>,
}

#[derive(Debug)]
struct Entry {
    device_name: String,
    device_id: String,
    kind: String,
    params: Params,
    cron: Option<CronExpr>,
    state: EntryState,
    next_fire: Option<DateTime<Local>>,
}

impl Entry {
    fn snapshot(&self) -> EntrySnapshot {
        EntrySnapshot {
            device_name: self.device_name.clone(),
            device_id: self.device_id.clone(),
            kind: self.kind.clone(),
            cron: self.cron.as_ref().map(|c| c.to_string()),
            state: self.state,
            next_fire: self.next_fire,
        }
    }
}

/// Cron-driven dispatcher from schedules to renderers to the transport.
pub struct ScheduleEngine {
    registry: Arc<RendererRegistry>,
    transport: Arc<dyn DeviceTransport>,
    context: RenderContext,
    entries: Mutex<Vec<Entry>>,
}

impl ScheduleEngine {
    /// The engine reads time from `context.clock`.
    pub fn new(
        registry: Arc<RendererRegistry>,
        transport: Arc<dyn DeviceTransport>,
        context: RenderContext,
    ) -> Self {
        Self {
            registry,
            transport,
            context,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// The context every firing renders with.
    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    fn clock(&self) -> &dyn Clock {
        self.context.clock.as_ref()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Load schedules relative to the clock's current time.
    pub fn load(&self, devices: &[Device]) -> Result<usize, DotmateError> {
        self.load_at(devices, self.clock().now())
    }

    /// Replace all entries with the given devices' schedules.
    ///
    /// Any unparseable cron expression fails the whole load and leaves the
    /// previous entries untouched. Schedules naming an unknown renderer are
    /// skipped with a warning. Returns the number of timed entries.
    pub fn load_at(&self, devices: &[Device], now: DateTime<Local>) -> Result<usize, DotmateError> {
        let mut entries = Vec::new();

        for device in devices {
            for spec in &device.schedules {
                let cron = spec.cron.as_deref().map(CronExpr::parse).transpose()?;

                if !self.registry.contains(&spec.kind) {
                    warn!(
                        device_id = %device.device_id,
                        kind = %spec.kind,
                        "Skipping schedule with unknown renderer kind"
                    );
                    continue;
                }

                let (state, next_fire) = match &cron {
                    Some(expr) => {
                        let next = expr.next_after(&now).ok_or_else(|| {
                            DotmateError::InvalidCronExpression {
                                spec: expr.to_string(),
                                reason: "no upcoming fire time".to_string(),
                            }
                        })?;
                        (EntryState::Scheduled, Some(next))
                    }
                    None => (EntryState::Pending, None),
                };

                entries.push(Entry {
                    device_name: device.name.clone(),
                    device_id: device.device_id.clone(),
                    kind: spec.kind.clone(),
                    params: spec.params.clone(),
                    cron,
                    state,
                    next_fire,
                });
            }
        }

        let scheduled = entries.iter().filter(|e| e.state == EntryState::Scheduled).count();
        for entry in &entries {
            match entry.next_fire {
                Some(next) => info!(
                    device = %entry.device_name,
                    device_id = %entry.device_id,
                    kind = %entry.kind,
                    cron = ?entry.cron.as_ref().map(|c| c.as_str()),
                    next_fire = %next.format("%Y-%m-%d %H:%M"),
                    "Scheduled"
                ),
                None => debug!(device_id = %entry.device_id, kind = %entry.kind, "Manual-only schedule"),
            }
        }

        *self.lock() = entries;
        Ok(scheduled)
    }

    pub fn entries(&self) -> Vec<EntrySnapshot> {
        self.lock().iter().map(Entry::snapshot).collect()
    }

    /// Earliest deadline among scheduled entries.
    pub fn next_deadline(&self) -> Option<DateTime<Local>> {
        self.lock()
            .iter()
            .filter(|e| e.state == EntryState::Scheduled)
            .filter_map(|e| e.next_fire)
            .min()
    }

    /// Fire every entry that is due at the clock's current time.
    ///
    /// Returns how many entries fired (successfully or not).
    pub async fn tick(&self) -> usize {
        let now = self.clock().now();
        let mut due: Vec<(DateTime<Local>, usize)> = self
            .lock()
            .iter()
            .enumerate()
            .filter(|(_, e)| e.state == EntryState::Scheduled)
            .filter_map(|(i, e)| e.next_fire.filter(|t| *t <= now).map(|t| (t, i)))
            .collect();
        due.sort();

        for &(_, index) in &due {
            let Some((device_id, kind, params)) = self.begin_firing(index) else {
                continue;
            };

            match self.execute(&device_id, &kind, params).await {
                Ok(payload) => info!(
                    device_id = %device_id,
                    kind = %kind,
                    payload = payload.shape(),
                    "Delivered"
                ),
                Err(e) => error!(device_id = %device_id, kind = %kind, error = %e, "Firing failed"),
            }

            self.finish_firing(index);
        }
        due.len()
    }

    fn begin_firing(&self, index: usize) -> Option<(String, String, Params)> {
        let mut entries = self.lock();
        let entry = entries.get_mut(index)?;
        if entry.state != EntryState::Scheduled {
            return None;
        }
        entry.state = EntryState::Firing;
        Some((entry.device_id.clone(), entry.kind.clone(), entry.params.clone()))
    }

    fn finish_firing(&self, index: usize) {
        let completed = self.clock().now();
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(index) else {
            return;
        };
        if entry.state != EntryState::Firing {
            return;
        }
        entry.next_fire = entry.cron.as_ref().and_then(|c| c.next_after(&completed));
        entry.state = if entry.next_fire.is_some() {
            EntryState::Scheduled
        } else {
            EntryState::Cancelled
        };
    }

    /// Run the trigger loop until `shutdown` becomes `true` (or its sender
    /// is dropped). An in-flight firing completes before this returns.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(entries = self.lock().len(), "Schedule engine started");
        loop {
            if *shutdown.borrow() {
                break;
            }

            let Some(deadline) = self.next_deadline() else {
                debug!("Nothing scheduled; waiting for shutdown");
                let _ = shutdown.wait_for(|stop| *stop).await;
                break;
            };

            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = self.clock().sleep_until(deadline) => {
                    self.tick().await;
                }
            }
        }

        for entry in self.lock().iter_mut() {
            entry.state = EntryState::Cancelled;
        }
        info!("Schedule engine stopped");
    }

    /// One-shot push bypassing the timer. Errors go to the caller.
    pub async fn fire_now(
        &self,
        device_id: &str,
        kind: &str,
        params: Params,
    ) -> Result<RenderedPayload, DotmateError> {
        let payload = self.execute(device_id, kind, params).await?;
        info!(device_id = %device_id, kind = %kind, payload = payload.shape(), "Pushed");
        Ok(payload)
    }

    /// Resolve, validate, render, deliver once.
    async fn execute(
        &self,
        device_id: &str,
        kind: &str,
        params: Params,
    ) -> Result<RenderedPayload, DotmateError> {
        let entry = self.registry.resolve(kind)?;
        entry.contract.validate(kind, &params)?;

        let request = RenderRequest::new(device_id, params);
        let payload = entry.renderer.produce(&self.context, &request).await?;
        self.transport.deliver(&request.device_id, &payload).await?;
        Ok(payload)
    }
}
