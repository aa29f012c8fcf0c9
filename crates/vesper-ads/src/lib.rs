//! # Vesper Ads - Ad Presentation Gating Policy
//!
//! Decides when an ad may be shown to a reader:
//!
//! - an interstitial after every N spaced-out interactions
//! - at most one app-launch ad per run and per launch cooldown
//! - an ad-free window earned by watching a rewarded ad
//! - a persistent banner whose footprint floating controls can follow
//!
//! All state survives restarts through [`vesper_core::effects::StorageEffects`].
//! When the runtime has no ad capability the policy runs against
//! [`vesper_effects::NullAdNetwork`] and degrades to "no ad shown" while the
//! counters keep their normal behavior.
//!
//! ```text
//! UI events ─▶ AdPolicy ─▶ InteractionCounter ─┐
//!                 │  └───▶ LaunchGate ─────────┼─▶ AdUnitLifecycle ─▶ AdNetworkEffects
//!                 │  └───▶ RewardFlow ─────────┤
//!                 │  └───▶ BannerController ───┘
//!                 └──────▶ SuppressionWindow ──▶ StorageEffects
//! ```

#![forbid(unsafe_code)]

pub mod banner;
mod clock;
pub mod counter;
pub mod launch;
pub mod lifecycle;
pub mod policy;
pub mod review;
pub mod reward;
pub mod store;
pub mod suppression;
pub mod task_registry;

pub use banner::{BannerFootprint, BannerMount, BannerOffsetPublisher};
pub use counter::InteractionOutcome;
pub use launch::LaunchDecision;
pub use lifecycle::{AdUnitHandle, AdUnitState, LifecycleSnapshot, PresentationEvent};
pub use policy::{AdPolicy, PolicyEffects};
pub use review::{ReviewPromptGate, ReviewPromptResult};
pub use reward::RewardFlow;
pub use store::{keys, InteractionCounterState, LaunchGateState, PolicyStore};
pub use suppression::SuppressionStatus;
pub use task_registry::TaskRegistry;
