//! Reward-earned ad suppression window.
//!
//! The window is a single deadline. Whether it is active is always computed
//! against the clock (`active_until > now`), so a reader never sees a stale
//! "suppressed" after the deadline even if the expiry task has not run yet.
//!
//! Every change of the deadline cancels and re-arms one scheduled task. The
//! task republishes the remaining time on a heartbeat and fires exactly at the
//! deadline, clearing the persisted value and notifying subscribers.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use vesper_core::effects::PhysicalTimeEffects;
use vesper_core::{PhysicalTime, VesperError};

use crate::clock;
use crate::store::PolicyStore;

/// Reactive view of the suppression window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SuppressionStatus {
    /// End of the window, `None` when inactive
    pub active_until: Option<PhysicalTime>,
    /// Time left as of the last publication
    pub remaining: Duration,
}

impl SuppressionStatus {
    /// Status with no active window.
    pub fn inactive() -> Self {
        Self::default()
    }

    /// Whether a window is currently published.
    pub fn is_active(&self) -> bool {
        self.active_until.is_some()
    }

    /// Remaining time in whole minutes, rounded up for display.
    pub fn remaining_minutes(&self) -> u64 {
        let ms = u64::try_from(self.remaining.as_millis()).unwrap_or(u64::MAX);
        ms.div_ceil(60_000)
    }
}

/// Reward-granted window during which no ads are requested.
pub struct SuppressionWindow {
    time: Arc<dyn PhysicalTimeEffects>,
    store: PolicyStore,
    heartbeat: Duration,
    status: watch::Sender<SuppressionStatus>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for SuppressionWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuppressionWindow")
            .field("status", &*self.status.borrow())
            .field("heartbeat", &self.heartbeat)
            .finish_non_exhaustive()
    }
}

impl SuppressionWindow {
    /// Window publishing its status every `heartbeat` while active.
    pub fn new(
        time: Arc<dyn PhysicalTimeEffects>,
        store: PolicyStore,
        heartbeat: Duration,
    ) -> Arc<Self> {
        let (status, _) = watch::channel(SuppressionStatus::inactive());
        Arc::new(Self {
            time,
            store,
            heartbeat,
            status,
            timer: Mutex::new(None),
        })
    }

    /// Load the persisted deadline. A deadline that elapsed while the process
    /// was not running is cleared.
    pub async fn restore(self: &Arc<Self>) {
        let Some(until) = self.store.load_suppression().await else {
            return;
        };
        let Some(now) = clock::now(&*self.time).await else {
            self.activate(until, until);
            return;
        };

        if until > now {
            tracing::info!(%until, remaining_ms = until.ts_ms - now.ts_ms, "restored ad suppression");
            self.activate(until, now);
        } else {
            tracing::debug!(%until, "suppression elapsed while stopped");
            if let Err(error) = self.store.save_suppression(None).await {
                tracing::warn!(%error, "failed to clear elapsed suppression");
            }
        }
    }

    /// Deadline of the published window.
    pub fn active_until(&self) -> Option<PhysicalTime> {
        self.status.borrow().active_until
    }

    /// True while `until > now`. An unreadable clock keeps an existing window active.
    pub async fn is_suppressed(&self) -> bool {
        let Some(until) = self.active_until() else {
            return false;
        };
        match clock::now(&*self.time).await {
            Some(now) => until > now,
            None => true,
        }
    }

    /// Time left in the window, zero when inactive.
    pub async fn remaining(&self) -> Duration {
        let Some(until) = self.active_until() else {
            return Duration::ZERO;
        };
        match clock::now(&*self.time).await {
            Some(now) => until.saturating_since(now),
            None => Duration::ZERO,
        }
    }

    /// Suppress ads for `duration` from now. Replaces any active window.
    pub async fn grant(self: &Arc<Self>, duration: Duration) -> Result<PhysicalTime, VesperError> {
        let now = self.time.physical_time().await?;
        let until = now.saturating_add(duration);
        self.activate(until, now);

        if let Err(error) = self.store.save_suppression(Some(until)).await {
            tracing::warn!(%error, "failed to persist suppression; active for this run only");
        }
        tracing::info!(%until, duration_ms = duration.as_millis() as u64, "ad suppression granted");
        Ok(until)
    }

    /// Status updates: grant, heartbeat and expiry.
    pub fn subscribe(&self) -> watch::Receiver<SuppressionStatus> {
        self.status.subscribe()
    }

    /// Latest published status.
    pub fn status(&self) -> SuppressionStatus {
        *self.status.borrow()
    }

    /// Cancel the expiry task. The deadline stays readable.
    pub fn shutdown(&self) {
        if let Some(timer) = self.timer.lock().take() {
            timer.abort();
        }
    }

    fn activate(self: &Arc<Self>, until: PhysicalTime, now: PhysicalTime) {
        self.status.send_replace(SuppressionStatus {
            active_until: Some(until),
            remaining: until.saturating_since(now),
        });
        self.arm(until);
    }

    fn arm(self: &Arc<Self>, deadline: PhysicalTime) {
        let window = Arc::downgrade(self);
        let time = self.time.clone();
        let heartbeat = self.heartbeat;
        let handle = tokio::spawn(run_expiry(window, time, heartbeat, deadline));
        if let Some(previous) = self.timer.lock().replace(handle) {
            previous.abort();
        }
    }

    fn publish_remaining(&self, deadline: PhysicalTime, now: PhysicalTime) {
        self.status.send_if_modified(|status| {
            if status.active_until != Some(deadline) {
                return false;
            }
            status.remaining = deadline.saturating_since(now);
            true
        });
    }

    async fn expire(&self, deadline: PhysicalTime) {
        if self.active_until() != Some(deadline) {
            return;
        }
        if let Err(error) = self.store.save_suppression(None).await {
            tracing::warn!(%error, "failed to clear persisted suppression");
        }
        let cleared = self.status.send_if_modified(|status| {
            if status.active_until != Some(deadline) {
                return false;
            }
            *status = SuppressionStatus::inactive();
            true
        });
        if cleared {
            tracing::info!(%deadline, "ad suppression expired");
        }
    }
}

impl Drop for SuppressionWindow {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.get_mut().take() {
            timer.abort();
        }
    }
}

async fn run_expiry(
    window: Weak<SuppressionWindow>,
    time: Arc<dyn PhysicalTimeEffects>,
    heartbeat: Duration,
    deadline: PhysicalTime,
) {
    loop {
        let now = match time.physical_time().await {
            Ok(now) => now,
            Err(error) => {
                tracing::warn!(%error, "suppression timer lost its clock; retrying");
                if window.strong_count() == 0 {
                    return;
                }
                let retry_ms = u64::try_from(heartbeat.as_millis()).unwrap_or(u64::MAX);
                if let Err(error) = time.sleep_ms(retry_ms).await {
                    tracing::warn!(%error, "suppression timer sleep failed");
                    return;
                }
                continue;
            }
        };
        let Some(window) = window.upgrade() else {
            return;
        };
        if now >= deadline {
            window.expire(deadline).await;
            return;
        }
        window.publish_remaining(deadline, now);
        drop(window);

        let wake = now.saturating_add(heartbeat).min(deadline);
        if let Err(error) = time.sleep_until(wake).await {
            tracing::warn!(%error, "suppression timer sleep failed");
            return;
        }
    }
}
