//! Policy configuration.
//!
//! Every tunable lives here as a named field with the production default.
//! Durations are stored as milliseconds so the TOML form stays flat.

use crate::ads::{AdUnitId, AdUnitKind};
use crate::errors::{Result, VesperError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Minimum spacing between two counted interactions.
pub const DEFAULT_INTERACTION_COOLDOWN_MS: u64 = 20_000;
/// Counted interactions per interstitial.
pub const DEFAULT_INTERSTITIAL_THRESHOLD: u32 = 10;
/// Minimum spacing between two displayed launch ads.
pub const DEFAULT_LAUNCH_COOLDOWN_MS: u64 = 12 * 60 * 60 * 1000;
/// Length of the ad-free window granted by a reward.
pub const DEFAULT_SUPPRESSION_DURATION_MS: u64 = 60 * 60 * 1000;
/// Refresh interval of the published remaining-suppression value.
pub const DEFAULT_STATUS_HEARTBEAT_MS: u64 = 30_000;
/// Adaptive banners are 50-100px tall; reserve the upper bound.
pub const DEFAULT_BANNER_ESTIMATED_HEIGHT_PX: u32 = 100;

/// Gating policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdPolicyConfig {
    /// Interactions closer together than this are not counted
    pub interaction_cooldown_ms: u64,
    /// Counted interactions that trigger one interstitial
    pub interstitial_threshold: u32,
    /// Cooldown between launch ads, persisted across restarts
    pub launch_cooldown_ms: u64,
    /// Duration of the suppression window granted by a reward
    pub suppression_duration_ms: u64,
    /// How often the remaining-suppression value is republished
    pub status_heartbeat_ms: u64,
    /// Banner footprint reserved above the bottom safe-area inset
    pub banner_estimated_height_px: u32,
    /// Network unit ids per ad kind
    pub units: AdUnitIds,
}

impl Default for AdPolicyConfig {
    fn default() -> Self {
        Self {
            interaction_cooldown_ms: DEFAULT_INTERACTION_COOLDOWN_MS,
            interstitial_threshold: DEFAULT_INTERSTITIAL_THRESHOLD,
            launch_cooldown_ms: DEFAULT_LAUNCH_COOLDOWN_MS,
            suppression_duration_ms: DEFAULT_SUPPRESSION_DURATION_MS,
            status_heartbeat_ms: DEFAULT_STATUS_HEARTBEAT_MS,
            banner_estimated_height_px: DEFAULT_BANNER_ESTIMATED_HEIGHT_PX,
            units: AdUnitIds::default(),
        }
    }
}

impl AdPolicyConfig {
    /// Parse from TOML; missing fields take their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the policy cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.interstitial_threshold == 0 {
            return Err(VesperError::invalid(
                "interstitial_threshold must be at least 1",
            ));
        }
        if self.suppression_duration_ms == 0 {
            return Err(VesperError::invalid(
                "suppression_duration_ms must be positive",
            ));
        }
        if self.status_heartbeat_ms == 0 {
            return Err(VesperError::invalid("status_heartbeat_ms must be positive"));
        }
        Ok(())
    }

    /// Interaction cooldown as a duration.
    pub fn interaction_cooldown(&self) -> Duration {
        Duration::from_millis(self.interaction_cooldown_ms)
    }

    /// Launch ad cooldown as a duration.
    pub fn launch_cooldown(&self) -> Duration {
        Duration::from_millis(self.launch_cooldown_ms)
    }

    /// Reward grant duration.
    pub fn suppression_duration(&self) -> Duration {
        Duration::from_millis(self.suppression_duration_ms)
    }

    /// Remaining-time heartbeat.
    pub fn status_heartbeat(&self) -> Duration {
        Duration::from_millis(self.status_heartbeat_ms)
    }
}

/// Unit ids per ad kind. Defaults are the network's public test units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdUnitIds {
    /// Banner unit
    pub banner: AdUnitId,
    /// Interstitial unit
    pub interstitial: AdUnitId,
    /// App-launch unit
    pub app_launch: AdUnitId,
    /// Rewarded unit
    pub rewarded: AdUnitId,
}

impl Default for AdUnitIds {
    fn default() -> Self {
        Self {
            banner: AdUnitId::new("ca-app-pub-3940256099942544/6300978111"),
            interstitial: AdUnitId::new("ca-app-pub-3940256099942544/1033173712"),
            app_launch: AdUnitId::new("ca-app-pub-3940256099942544/9257395921"),
            rewarded: AdUnitId::new("ca-app-pub-3940256099942544/5224354917"),
        }
    }
}

impl AdUnitIds {
    /// Unit id for the given kind.
    pub fn for_kind(&self, kind: AdUnitKind) -> &AdUnitId {
        match kind {
            AdUnitKind::Banner => &self.banner,
            AdUnitKind::Interstitial => &self.interstitial,
            AdUnitKind::AppLaunch => &self.app_launch,
            AdUnitKind::Rewarded => &self.rewarded,
        }
    }
}

/// Host platform, used by the review prompt fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Android
    Android,
    /// iOS
    Ios,
    /// Web or any other runtime
    #[default]
    Other,
}

/// Store review prompt configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Host platform
    pub platform: Platform,
    /// Android application package, used to build Play Store links
    pub android_package: Option<String>,
    /// Store listing URL; overrides the one reported by the review handler
    pub store_url: Option<String>,
}

impl ReviewConfig {
    /// Parse from TOML.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn defaults_match_production_policy() {
        let config = AdPolicyConfig::default();
        assert_eq!(config.interaction_cooldown(), Duration::from_secs(20));
        assert_eq!(config.interstitial_threshold, 10);
        assert_eq!(config.launch_cooldown(), Duration::from_secs(12 * 3600));
        assert_eq!(config.suppression_duration(), Duration::from_secs(3600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = AdPolicyConfig::from_toml_str(
            r#"
            interstitial_threshold = 3

            [units]
            rewarded = "unit/rewarded"
            "#,
        )
        .unwrap();
        assert_eq!(config.interstitial_threshold, 3);
        assert_eq!(config.interaction_cooldown_ms, DEFAULT_INTERACTION_COOLDOWN_MS);
        assert_eq!(config.units.for_kind(AdUnitKind::Rewarded).as_str(), "unit/rewarded");
        assert_eq!(config.units.banner, AdUnitIds::default().banner);
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let err = AdPolicyConfig::from_toml_str("interstitial_threshold = 0").unwrap_err();
        assert_matches!(err, VesperError::Invalid { .. });
    }

    #[test]
    fn malformed_toml_is_a_serialization_error() {
        let err = AdPolicyConfig::from_toml_str("interstitial_threshold = \"ten\"").unwrap_err();
        assert_matches!(err, VesperError::Serialization { .. });
    }

    #[test]
    fn review_config_parses_platform() {
        let config = ReviewConfig::from_toml_str(
            r#"
            platform = "android"
            android_package = "org.example.vesper"
            "#,
        )
        .unwrap();
        assert_eq!(config.platform, Platform::Android);
        assert_eq!(config.android_package.as_deref(), Some("org.example.vesper"));
    }
}
