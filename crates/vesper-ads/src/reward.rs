//! Reward flow: earn a suppression window by watching a rewarded ad.
//!
//! The outcome is a single-resolution future. The first terminal event wins:
//! reward earned resolves `true`, a close without reward, an error or a
//! failed show resolves `false`. Later events for the same handle never reach
//! the caller. The flow runs on its own task, so a granted reward is applied
//! even when the caller has stopped waiting.
//!
//! Without ad capability the flow never grants, even while a restored
//! suppression window is still active.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::oneshot;
use vesper_core::AdUnitKind;

use crate::lifecycle::{AdUnitLifecycle, PresentationEvent};
use crate::suppression::SuppressionWindow;
use crate::task_registry::TaskRegistry;

/// Pending outcome of [`crate::AdPolicy::start_reward_flow`]. Resolves to
/// whether the reward was granted.
#[must_use = "the reward outcome is only observable by awaiting the flow"]
#[derive(Debug)]
pub struct RewardFlow {
    outcome: oneshot::Receiver<bool>,
}

impl Future for RewardFlow {
    type Output = bool;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<bool> {
        Pin::new(&mut self.outcome)
            .poll(cx)
            .map(|outcome| outcome.unwrap_or(false))
    }
}

pub(crate) fn start(
    ad_capable: bool,
    suppression: Arc<SuppressionWindow>,
    lifecycle: Arc<AdUnitLifecycle>,
    grant: Duration,
    tasks: &TaskRegistry,
) -> RewardFlow {
    let (tx, rx) = oneshot::channel();
    tasks.spawn(async move {
        let granted = ad_capable && run(&suppression, &lifecycle, grant).await;
        let _ = tx.send(granted);
    });
    RewardFlow { outcome: rx }
}

async fn run(
    suppression: &Arc<SuppressionWindow>,
    lifecycle: &Arc<AdUnitLifecycle>,
    grant: Duration,
) -> bool {
    if suppression.is_suppressed().await {
        return true;
    }

    let mut presentation = match lifecycle.present(AdUnitKind::Rewarded).await {
        Ok(presentation) => presentation,
        Err(error) => {
            tracing::debug!(%error, "rewarded ad not available");
            return false;
        }
    };

    while let Some(event) = presentation.next_event().await {
        match event {
            PresentationEvent::Shown => {}
            PresentationEvent::RewardEarned => {
                return match suppression.grant(grant).await {
                    Ok(_) => true,
                    Err(error) => {
                        tracing::warn!(%error, "reward earned but suppression not granted");
                        false
                    }
                };
            }
            PresentationEvent::Closed => {
                tracing::debug!("rewarded ad closed without reward");
                return false;
            }
            PresentationEvent::Failed(reason) => {
                tracing::debug!(%reason, "rewarded ad failed");
                return false;
            }
        }
    }
    false
}
