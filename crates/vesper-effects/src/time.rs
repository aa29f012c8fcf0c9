//! Real time effect handler for production use

use async_trait::async_trait;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time;
use vesper_core::effects::{PhysicalTimeEffects, TimeError};
use vesper_core::PhysicalTime;

/// Wall-clock handler backed by `SystemTime` and tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealTimeHandler;

impl RealTimeHandler {
    /// Create a new real time handler
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PhysicalTimeEffects for RealTimeHandler {
    async fn physical_time(&self) -> Result<PhysicalTime, TimeError> {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| TimeError::OperationFailed {
                reason: format!("system clock before epoch: {e}"),
            })?;
        let ts_ms = u64::try_from(since_epoch.as_millis()).unwrap_or(u64::MAX);
        Ok(PhysicalTime::from_millis(ts_ms))
    }

    async fn sleep_ms(&self, ms: u64) -> Result<(), TimeError> {
        time::sleep(Duration::from_millis(ms)).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clock_reads_after_2020() {
        let handler = RealTimeHandler::new();
        let now = handler.physical_time().await.unwrap();
        assert!(now.ts_ms > 1_577_836_800_000);
    }

    #[tokio::test]
    async fn sleep_until_past_deadline_returns_immediately() {
        let handler = RealTimeHandler::new();
        handler
            .sleep_until(PhysicalTime::from_millis(1_000))
            .await
            .unwrap();
    }
}
