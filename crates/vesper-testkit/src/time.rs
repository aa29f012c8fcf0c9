//! Simulated clock.
//!
//! Time only moves when a test moves it. Sleepers wake as soon as the clock
//! reaches their target, so a scheduled task fires at the exact instant the
//! test advances to, never before.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use vesper_core::effects::{PhysicalTimeEffects, TimeError};
use vesper_core::PhysicalTime;

/// Manually advanced clock. Clones share the same time.
#[derive(Debug, Clone)]
pub struct SimulatedClock {
    now: Arc<watch::Sender<u64>>,
    unavailable: Arc<AtomicBool>,
}

impl SimulatedClock {
    /// Clock reading `ms` since the epoch.
    pub fn at_millis(ms: u64) -> Self {
        let (now, _) = watch::channel(ms);
        Self {
            now: Arc::new(now),
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Current reading in milliseconds.
    pub fn now_millis(&self) -> u64 {
        *self.now.borrow()
    }

    /// Current reading.
    pub fn now(&self) -> PhysicalTime {
        PhysicalTime::from_millis(self.now_millis())
    }

    /// Move the clock forward and wake every sleeper whose target passed.
    pub fn advance(&self, by: Duration) {
        let ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.now.send_modify(|now| *now = now.saturating_add(ms));
    }

    /// Set the clock. Moving it backwards does not wake anyone.
    pub fn set_millis(&self, ms: u64) {
        self.now.send_replace(ms);
    }

    /// Make `physical_time` fail until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    async fn wait_until(&self, target: u64) -> Result<(), TimeError> {
        let mut rx = self.now.subscribe();
        rx.wait_for(|now| *now >= target)
            .await
            .map(|_| ())
            .map_err(|_| TimeError::ServiceUnavailable)
    }
}

impl Default for SimulatedClock {
    fn default() -> Self {
        Self::at_millis(0)
    }
}

#[async_trait]
impl PhysicalTimeEffects for SimulatedClock {
    async fn physical_time(&self) -> Result<PhysicalTime, TimeError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(TimeError::ServiceUnavailable);
        }
        Ok(self.now())
    }

    async fn sleep_ms(&self, ms: u64) -> Result<(), TimeError> {
        let target = self.now_millis().saturating_add(ms);
        self.wait_until(target).await
    }

    async fn sleep_until(&self, deadline: PhysicalTime) -> Result<(), TimeError> {
        self.wait_until(deadline.ts_ms).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    #[tokio::test]
    async fn sleeper_wakes_at_target() {
        let clock = SimulatedClock::at_millis(1_000);
        let woke_at = Arc::new(AtomicU64::new(0));

        let sleeper = {
            let clock = clock.clone();
            let woke_at = woke_at.clone();
            tokio::spawn(async move {
                clock.sleep_until(PhysicalTime::from_millis(5_000)).await.unwrap();
                woke_at.store(clock.now_millis(), Ordering::SeqCst);
            })
        };

        tokio::task::yield_now().await;
        clock.advance(Duration::from_millis(3_999));
        tokio::task::yield_now().await;
        assert_eq!(woke_at.load(Ordering::SeqCst), 0);

        clock.advance(Duration::from_millis(1));
        sleeper.await.unwrap();
        assert_eq!(woke_at.load(Ordering::SeqCst), 5_000);
    }

    #[tokio::test]
    async fn unavailable_clock_errors() {
        let clock = SimulatedClock::at_millis(7);
        clock.set_unavailable(true);
        assert_eq!(
            clock.physical_time().await,
            Err(TimeError::ServiceUnavailable)
        );
        clock.set_unavailable(false);
        assert_eq!(clock.physical_time().await.unwrap().ts_ms, 7);
    }
}
