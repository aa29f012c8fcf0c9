//! Ad unit domain types.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The four ad unit kinds the policy manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdUnitKind {
    /// Persistent bottom banner
    Banner,
    /// Full-screen ad triggered by the interaction counter
    Interstitial,
    /// Full-screen ad shown once near process start
    AppLaunch,
    /// User-initiated ad that grants ad suppression
    Rewarded,
}

impl AdUnitKind {
    /// Every kind, in a stable order.
    pub const ALL: [AdUnitKind; 4] = [
        AdUnitKind::Banner,
        AdUnitKind::Interstitial,
        AdUnitKind::AppLaunch,
        AdUnitKind::Rewarded,
    ];

    /// Banners have no discrete show step and stay on screen until unmounted.
    pub fn is_continuous(self) -> bool {
        matches!(self, AdUnitKind::Banner)
    }

    /// Stable lowercase name for logs and keys.
    pub fn as_str(self) -> &'static str {
        match self {
            AdUnitKind::Banner => "banner",
            AdUnitKind::Interstitial => "interstitial",
            AdUnitKind::AppLaunch => "app_launch",
            AdUnitKind::Rewarded => "rewarded",
        }
    }
}

impl fmt::Display for AdUnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ad network unit identifier (opaque string issued by the network).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdUnitId(pub String);

impl AdUnitId {
    /// Wrap a unit id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AdUnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one ad request handed out by the ad network adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdRequestId(pub Uuid);

impl AdRequestId {
    /// Fresh random request id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AdRequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AdRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Events the ad network delivers for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdEvent {
    /// Creative finished loading and can be shown
    Loaded,
    /// User dismissed the ad
    Closed,
    /// Load or presentation failed
    Error(String),
    /// Rewarded ad: the user earned the reward
    RewardEarned,
}

impl AdEvent {
    /// Whether this event ends the presentation of its request.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AdEvent::Closed | AdEvent::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_close_and_error_end_a_presentation() {
        assert!(AdEvent::Closed.is_terminal());
        assert!(AdEvent::Error("no fill".into()).is_terminal());
        assert!(!AdEvent::Loaded.is_terminal());
        assert!(!AdEvent::RewardEarned.is_terminal());
    }
}
