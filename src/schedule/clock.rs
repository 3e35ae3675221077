//! Wall-clock abstraction for the scheduler and time-aware renderers.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Local};

/// Source of "now" and a way to wait for a deadline.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    /// Resolve once `now() >= deadline`.
    async fn sleep_until(&self, deadline: DateTime<Local>);
}

/// Real local time backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    async fn sleep_until(&self, deadline: DateTime<Local>) {
        // Re-check after waking: the timer is monotonic, the wall clock is not.
        loop {
            let remaining = deadline - Local::now();
            match remaining.to_std() {
                Ok(d) if !d.is_zero() => tokio::time::sleep(d).await,
                _ => return,
            }
        }
    }
}

/// Virtual time. Sleeping jumps the clock straight to the deadline.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, t: DateTime<Local>) {
        *self.lock() = t;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.lock();
        *now += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Local>> {
        self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.lock()
    }

    async fn sleep_until(&self, deadline: DateTime<Local>) {
        {
            let mut now = self.lock();
            if *now < deadline {
                *now = deadline;
            }
        }
        tokio::task::yield_now().await;
    }
}
