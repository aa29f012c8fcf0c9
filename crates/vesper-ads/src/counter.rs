//! Interaction counter driving interstitial frequency.
//!
//! A qualifying interaction is counted at most once per cooldown, measured
//! from the last *counted* interaction. Reaching the threshold presents one
//! interstitial and resets the count in the same critical section, so no two
//! triggers can happen between resets.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use vesper_core::effects::{AdError, PhysicalTimeEffects};
use vesper_core::{AdPolicyConfig, AdUnitKind};

use crate::clock;
use crate::lifecycle::AdUnitLifecycle;
use crate::store::{InteractionCounterState, PolicyStore};
use crate::suppression::SuppressionWindow;

/// What a recorded interaction did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InteractionOutcome {
    /// Ads are suppressed; nothing was counted or written
    Suppressed,
    /// Within the cooldown of the last counted interaction
    Debounced { since_last: Duration },
    /// Counted, threshold not reached
    Counted { count: u32 },
    /// Threshold reached and the counter reset. `presented` is false when the
    /// ad network refused the interstitial.
    Triggered { presented: bool },
    /// The clock could not be read
    ClockUnavailable,
}

/// Debounced interaction counter that triggers an interstitial at the threshold.
pub struct InteractionCounter {
    time: Arc<dyn PhysicalTimeEffects>,
    store: PolicyStore,
    suppression: Arc<SuppressionWindow>,
    lifecycle: Arc<AdUnitLifecycle>,
    cooldown: Duration,
    threshold: u32,
    gate: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for InteractionCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionCounter")
            .field("cooldown", &self.cooldown)
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

impl InteractionCounter {
    /// Counter built from the configured threshold and debounce interval.
    pub fn new(
        config: &AdPolicyConfig,
        time: Arc<dyn PhysicalTimeEffects>,
        store: PolicyStore,
        suppression: Arc<SuppressionWindow>,
        lifecycle: Arc<AdUnitLifecycle>,
    ) -> Self {
        Self {
            time,
            store,
            suppression,
            lifecycle,
            cooldown: config.interaction_cooldown(),
            threshold: config.interstitial_threshold.max(1),
            gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Record one qualifying interaction.
    pub async fn record(&self) -> InteractionOutcome {
        let _flight = self.gate.lock().await;

        if self.suppression.is_suppressed().await {
            tracing::trace!("interaction ignored while suppressed");
            return InteractionOutcome::Suppressed;
        }

        let state = self.store.load_counter().await;
        let Some(now) = clock::now(&*self.time).await else {
            return InteractionOutcome::ClockUnavailable;
        };

        if let Some(last) = state.last_counted_at {
            let since_last = now.saturating_since(last);
            if since_last < self.cooldown {
                tracing::trace!(since_last_ms = since_last.as_millis() as u64, "interaction debounced");
                return InteractionOutcome::Debounced { since_last };
            }
        }

        let count = state.count.saturating_add(1);
        let (next, outcome) = if count >= self.threshold {
            let presented = match self.lifecycle.present(AdUnitKind::Interstitial).await {
                Ok(presentation) => {
                    tracing::info!(request = %presentation.handle().request, "interstitial triggered");
                    true
                }
                Err(AdError::Unavailable) => {
                    tracing::debug!("interstitial threshold reached without ad capability");
                    false
                }
                Err(error) => {
                    tracing::debug!(%error, "interstitial threshold reached but not presented");
                    false
                }
            };
            (
                InteractionCounterState {
                    count: 0,
                    last_counted_at: Some(now),
                },
                InteractionOutcome::Triggered { presented },
            )
        } else {
            tracing::debug!(count, threshold = self.threshold, "interaction counted");
            (
                InteractionCounterState {
                    count,
                    last_counted_at: Some(now),
                },
                InteractionOutcome::Counted { count },
            )
        };

        if let Err(error) = self.store.save_counter(&next).await {
            tracing::warn!(%error, "failed to persist interaction counter");
        }
        outcome
    }

    /// Persisted counter state, as the next decision would see it.
    pub async fn snapshot(&self) -> InteractionCounterState {
        self.store.load_counter().await
    }
}
