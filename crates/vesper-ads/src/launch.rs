//! App-launch ad gate.
//!
//! Fires at most once per process run and at most once per launch cooldown
//! across runs. The cooldown is measured from the last launch ad that was
//! actually displayed, not merely loaded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use vesper_core::effects::{AdError, PhysicalTimeEffects};
use vesper_core::{AdPolicyConfig, AdUnitKind};

use crate::clock;
use crate::lifecycle::{AdUnitLifecycle, PresentationEvent};
use crate::store::{LaunchGateState, PolicyStore};
use crate::suppression::SuppressionWindow;
use crate::task_registry::TaskRegistry;

/// Result of the once-per-run launch check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LaunchDecision {
    /// This run already made its attempt
    AlreadyAttempted,
    /// Ads are suppressed by a reward
    Suppressed,
    /// A launch ad was displayed too recently
    CoolingDown { remaining: Duration },
    /// No ad capability, or the network refused the request
    Unavailable,
    /// Load requested; the ad shows as soon as it loads
    Requested,
}

/// Once-per-run launch ad check with a cooldown across runs.
pub struct LaunchGate {
    time: Arc<dyn PhysicalTimeEffects>,
    store: PolicyStore,
    suppression: Arc<SuppressionWindow>,
    lifecycle: Arc<AdUnitLifecycle>,
    tasks: Arc<TaskRegistry>,
    cooldown: Duration,
    attempted: AtomicBool,
}

impl std::fmt::Debug for LaunchGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchGate")
            .field("cooldown", &self.cooldown)
            .field("attempted", &self.attempted.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl LaunchGate {
    /// Gate using `config.launch_cooldown()`.
    pub fn new(
        config: &AdPolicyConfig,
        time: Arc<dyn PhysicalTimeEffects>,
        store: PolicyStore,
        suppression: Arc<SuppressionWindow>,
        lifecycle: Arc<AdUnitLifecycle>,
        tasks: Arc<TaskRegistry>,
    ) -> Self {
        Self {
            time,
            store,
            suppression,
            lifecycle,
            tasks,
            cooldown: config.launch_cooldown(),
            attempted: AtomicBool::new(false),
        }
    }

    /// Whether this run has already made its launch attempt.
    pub fn attempted(&self) -> bool {
        self.attempted.load(Ordering::SeqCst)
    }

    /// Request the launch ad unless this run already tried or the gate is closed.
    pub async fn maybe_show(&self) -> LaunchDecision {
        if self.attempted.swap(true, Ordering::SeqCst) {
            return LaunchDecision::AlreadyAttempted;
        }
        let decision = self.decide().await;
        tracing::debug!(?decision, "launch ad gate");
        decision
    }

    async fn decide(&self) -> LaunchDecision {
        if self.suppression.is_suppressed().await {
            return LaunchDecision::Suppressed;
        }
        let Some(now) = clock::now(&*self.time).await else {
            return LaunchDecision::Unavailable;
        };

        if let Some(last) = self.store.load_launch().await.last_shown_at {
            let since = now.saturating_since(last);
            if since < self.cooldown {
                return LaunchDecision::CoolingDown {
                    remaining: self.cooldown - since,
                };
            }
        }

        let mut presentation = match self.lifecycle.present(AdUnitKind::AppLaunch).await {
            Ok(presentation) => presentation,
            Err(AdError::Suppressed) => return LaunchDecision::Suppressed,
            Err(error) => {
                tracing::debug!(%error, "launch ad not requested");
                return LaunchDecision::Unavailable;
            }
        };

        let time = self.time.clone();
        let store = self.store.clone();
        self.tasks.spawn(async move {
            while let Some(event) = presentation.next_event().await {
                match event {
                    PresentationEvent::Shown => {
                        let Some(shown_at) = clock::now(&*time).await else {
                            continue;
                        };
                        let state = LaunchGateState {
                            last_shown_at: Some(shown_at),
                        };
                        if let Err(error) = store.save_launch(&state).await {
                            tracing::warn!(%error, "failed to persist launch ad timestamp");
                        }
                        tracing::info!(%shown_at, "launch ad shown");
                    }
                    PresentationEvent::Closed | PresentationEvent::Failed(_) => break,
                    PresentationEvent::RewardEarned => {}
                }
            }
        });

        LaunchDecision::Requested
    }
}
