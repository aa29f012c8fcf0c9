use vesper_core::effects::PhysicalTimeEffects;
use vesper_core::PhysicalTime;

/// Read the clock, logging and returning `None` when it is unavailable.
pub(crate) async fn now(time: &dyn PhysicalTimeEffects) -> Option<PhysicalTime> {
    match time.physical_time().await {
        Ok(now) => Some(now),
        Err(error) => {
            tracing::warn!(%error, "clock unavailable; skipping ad decision");
            None
        }
    }
}
