//! Persistent banner and its published footprint.
//!
//! Floating controls offset themselves by the banner's vertical footprint.
//! The footprint is last-write-wins, process-local and forced to zero
//! whenever no banner is on screen: before load, after a failed load, after
//! unmount and for the whole suppression window.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use vesper_core::effects::AdError;
use vesper_core::{AdPolicyConfig, AdUnitKind};

use crate::lifecycle::{AdUnitLifecycle, AdUnitState, PresentationEvent};
use crate::suppression::SuppressionWindow;
use crate::task_registry::TaskRegistry;

/// Vertical space occupied by the banner, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BannerFootprint {
    /// Zero when no banner is on screen
    pub height_px: u32,
}

/// Last-write-wins publisher of the [`BannerFootprint`].
#[derive(Debug)]
pub struct BannerOffsetPublisher {
    footprint: watch::Sender<BannerFootprint>,
}

impl BannerOffsetPublisher {
    /// Publisher starting at a zero footprint.
    pub fn new() -> Self {
        let (footprint, _) = watch::channel(BannerFootprint::default());
        Self { footprint }
    }

    /// Publish a new height.
    pub fn set_footprint(&self, height_px: u32) {
        self.footprint.send_replace(BannerFootprint { height_px });
    }

    /// Publish a zero footprint.
    pub fn reset(&self) {
        self.set_footprint(0);
    }

    /// Most recently published footprint.
    pub fn current_footprint(&self) -> BannerFootprint {
        *self.footprint.borrow()
    }

    /// Receiver notified on every publish.
    pub fn subscribe(&self) -> watch::Receiver<BannerFootprint> {
        self.footprint.subscribe()
    }
}

impl Default for BannerOffsetPublisher {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a mount request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BannerMount {
    /// Banner requested; the footprint updates once it loads
    Mounted,
    /// A banner handle is already live
    AlreadyMounted,
    /// Suppression is active; the footprint stays zero
    Suppressed,
    /// No ad capability, or the request could not be created
    Unavailable,
}

/// Mounts and unmounts the banner unit and keeps the footprint in sync.
#[derive(Debug)]
pub struct BannerController {
    lifecycle: Arc<AdUnitLifecycle>,
    suppression: Arc<SuppressionWindow>,
    publisher: Arc<BannerOffsetPublisher>,
    tasks: Arc<TaskRegistry>,
    estimated_height_px: u32,
}

impl BannerController {
    /// Controller sized from `config.banner_estimated_height_px`.
    pub fn new(
        config: &AdPolicyConfig,
        lifecycle: Arc<AdUnitLifecycle>,
        suppression: Arc<SuppressionWindow>,
        publisher: Arc<BannerOffsetPublisher>,
        tasks: Arc<TaskRegistry>,
    ) -> Self {
        Self {
            lifecycle,
            suppression,
            publisher,
            tasks,
            estimated_height_px: config.banner_estimated_height_px,
        }
    }

    /// Mount the banner above a bottom safe-area inset of `safe_area_bottom_px`.
    pub async fn mount(&self, safe_area_bottom_px: u32) -> BannerMount {
        if self.suppression.is_suppressed().await {
            self.publisher.reset();
            return BannerMount::Suppressed;
        }

        let mut presentation = match self.lifecycle.present(AdUnitKind::Banner).await {
            Ok(presentation) => presentation,
            Err(AdError::InFlight(_)) => return BannerMount::AlreadyMounted,
            Err(AdError::Suppressed) => {
                self.publisher.reset();
                return BannerMount::Suppressed;
            }
            Err(error) => {
                tracing::debug!(%error, "banner not mounted");
                self.publisher.reset();
                return BannerMount::Unavailable;
            }
        };

        let height_px = self.estimated_height_px.saturating_add(safe_area_bottom_px);
        let request = presentation.handle().request;
        let lifecycle = self.lifecycle.clone();
        let publisher = self.publisher.clone();
        self.tasks.spawn(async move {
            while let Some(event) = presentation.next_event().await {
                match event {
                    PresentationEvent::Shown => {
                        let showing = lifecycle
                            .handle(AdUnitKind::Banner)
                            .is_some_and(|h| h.request == request && h.state == AdUnitState::Showing);
                        if showing {
                            publisher.set_footprint(height_px);
                        }
                    }
                    PresentationEvent::Closed | PresentationEvent::Failed(_) => break,
                    PresentationEvent::RewardEarned => {}
                }
            }
            // A remount may already own the footprint.
            let superseded = lifecycle
                .handle(AdUnitKind::Banner)
                .is_some_and(|h| h.request != request);
            if !superseded {
                publisher.reset();
            }
        });

        BannerMount::Mounted
    }

    /// Release the banner handle and zero the footprint.
    pub async fn unmount(&self) {
        self.lifecycle.release(AdUnitKind::Banner).await;
        self.publisher.reset();
    }

    /// Unmount the banner whenever suppression becomes active.
    pub fn watch_suppression(self: &Arc<Self>) {
        let mut status = self.suppression.subscribe();
        let controller = Arc::downgrade(self);
        self.tasks.spawn(async move {
            while status.changed().await.is_ok() {
                let active = status.borrow_and_update().is_active();
                if !active {
                    continue;
                }
                let Some(controller) = controller.upgrade() else {
                    return;
                };
                if controller.lifecycle.state(AdUnitKind::Banner) != AdUnitState::Idle
                    || controller.publisher.current_footprint().height_px != 0
                {
                    tracing::debug!("suppression active; unmounting banner");
                    controller.unmount().await;
                }
            }
        });
    }
}
