//! Physical time values.
//!
//! All policy decisions compare wall-clock milliseconds since the Unix epoch.
//! Arithmetic saturates so a clock that reads earlier than a persisted value
//! never underflows.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Wall-clock timestamp in milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct PhysicalTime {
    /// Milliseconds since the Unix epoch
    pub ts_ms: u64,
}

impl PhysicalTime {
    /// The epoch itself.
    pub const EPOCH: PhysicalTime = PhysicalTime { ts_ms: 0 };

    /// Construct from milliseconds since the epoch.
    pub const fn from_millis(ts_ms: u64) -> Self {
        Self { ts_ms }
    }

    /// Milliseconds since the epoch.
    pub const fn as_millis(self) -> u64 {
        self.ts_ms
    }

    /// Time elapsed from `earlier` to `self`, zero if `earlier` is in the future.
    pub fn saturating_since(self, earlier: PhysicalTime) -> Duration {
        Duration::from_millis(self.ts_ms.saturating_sub(earlier.ts_ms))
    }

    /// `self + delta`, saturating at `u64::MAX` milliseconds.
    pub fn saturating_add(self, delta: Duration) -> Self {
        let delta_ms = u64::try_from(delta.as_millis()).unwrap_or(u64::MAX);
        Self {
            ts_ms: self.ts_ms.saturating_add(delta_ms),
        }
    }
}

impl fmt::Display for PhysicalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.ts_ms)
    }
}
