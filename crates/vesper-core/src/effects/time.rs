//! Physical time effects.
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Implementation**: `vesper-effects` (real clock), `vesper-testkit` (simulated clock)
//! - **Usage**: cooldowns, launch gate, suppression deadlines and their timers

use crate::time::PhysicalTime;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error type for time operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum TimeError {
    #[error("Time service unavailable")]
    ServiceUnavailable,
    #[error("Operation failed: {reason}")]
    OperationFailed { reason: String },
}

/// Wall-clock time and sleeping.
#[async_trait]
pub trait PhysicalTimeEffects: Send + Sync {
    /// Current wall-clock time.
    async fn physical_time(&self) -> Result<PhysicalTime, TimeError>;

    /// Suspend the caller for `ms` milliseconds of this clock's time.
    async fn sleep_ms(&self, ms: u64) -> Result<(), TimeError>;

    /// Suspend the caller until this clock reads at least `deadline`.
    async fn sleep_until(&self, deadline: PhysicalTime) -> Result<(), TimeError> {
        let now = self.physical_time().await?;
        if deadline > now {
            self.sleep_ms(deadline.ts_ms - now.ts_ms).await?;
        }
        Ok(())
    }
}

/// Blanket implementation for Arc<T> where T: PhysicalTimeEffects
#[async_trait]
impl<T: PhysicalTimeEffects + ?Sized> PhysicalTimeEffects for std::sync::Arc<T> {
    async fn physical_time(&self) -> Result<PhysicalTime, TimeError> {
        (**self).physical_time().await
    }

    async fn sleep_ms(&self, ms: u64) -> Result<(), TimeError> {
        (**self).sleep_ms(ms).await
    }

    async fn sleep_until(&self, deadline: PhysicalTime) -> Result<(), TimeError> {
        (**self).sleep_until(deadline).await
    }
}
