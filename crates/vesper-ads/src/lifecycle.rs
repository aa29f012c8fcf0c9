//! Ad unit lifecycle manager.
//!
//! Owns at most one live handle per [`AdUnitKind`] and drives it through
//!
//! ```text
//! Idle ─load─▶ Loading ─loaded─▶ Loaded ─show─▶ Showing ─closed─▶ Closed ─release─▶ Idle
//!                 └──────────────── any error ─────────────▶ Failed ─release─▶ Idle
//! ```
//!
//! Banners skip the show call: once loaded they stay `Showing` until released.
//! Interstitial, launch and rewarded handles are single-use and discarded
//! after their terminal event, so a fired handle can never deliver a second
//! terminal event to a new presentation.
//!
//! No request of any kind is issued while suppression is active.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use vesper_core::effects::{AdError, AdEventStream, AdNetworkEffects};
use vesper_core::{AdEvent, AdRequestId, AdUnitIds, AdUnitKind};

use crate::suppression::SuppressionWindow;
use crate::task_registry::TaskRegistry;

/// Lifecycle state of one ad unit handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum AdUnitState {
    /// No handle, or a handle created but not yet loading
    #[default]
    Idle,
    /// Load requested
    Loading,
    /// Ready; single-use units are shown right away
    Loaded,
    /// On screen; banners stay here until released
    Showing,
    /// Dismissed by the user
    Closed,
    /// Load or show failed, or dropped while suppressed
    Failed,
}

impl AdUnitState {
    /// Whether a handle in this state blocks creating a new one.
    pub fn is_live(self) -> bool {
        !matches!(self, AdUnitState::Closed | AdUnitState::Failed)
    }

    /// Whether `self -> next` is an edge of the state machine.
    pub fn can_transition_to(self, next: AdUnitState) -> bool {
        use AdUnitState::*;
        match (self, next) {
            (_, Failed) => self.is_live(),
            (Idle, Loading) | (Loading, Loaded) | (Loaded, Showing) | (Showing, Closed) => true,
            _ => false,
        }
    }
}

/// Snapshot of one live handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdUnitHandle {
    /// Ad kind the handle serves
    pub kind: AdUnitKind,
    /// Network request backing this handle
    pub request: AdRequestId,
    /// State at the time the handle was copied
    pub state: AdUnitState,
}

/// States of every kind; kinds without a handle are `Idle`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LifecycleSnapshot {
    states: BTreeMap<AdUnitKind, AdUnitState>,
}

impl LifecycleSnapshot {
    /// State of `kind`, `Idle` when it has no handle.
    pub fn state(&self, kind: AdUnitKind) -> AdUnitState {
        self.states.get(&kind).copied().unwrap_or_default()
    }

    /// True when no kind holds a handle past `Idle`.
    pub fn all_idle(&self) -> bool {
        self.states.values().all(|state| *state == AdUnitState::Idle)
    }
}

/// Presentation progress reported to whoever requested the ad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentationEvent {
    /// The creative is on screen
    Shown,
    /// Rewarded units: the user earned the reward
    RewardEarned,
    /// The user dismissed the ad
    Closed,
    /// Load or show failed, or the network dropped the request
    Failed(String),
}

/// Receiver for one presentation's progress. Dropping it does not cancel
/// the presentation; the manager keeps driving the handle to completion.
#[derive(Debug)]
pub struct Presentation {
    handle: AdUnitHandle,
    events: mpsc::UnboundedReceiver<PresentationEvent>,
}

impl Presentation {
    /// Handle as it was when the presentation started.
    pub fn handle(&self) -> AdUnitHandle {
        self.handle
    }

    /// Next progress event; `None` once the driver has finished.
    pub async fn next_event(&mut self) -> Option<PresentationEvent> {
        self.events.recv().await
    }
}

/// Owns the live ad handles and drives each presentation.
pub struct AdUnitLifecycle {
    network: Arc<dyn AdNetworkEffects>,
    units: AdUnitIds,
    suppression: Arc<SuppressionWindow>,
    tasks: Arc<TaskRegistry>,
    slots: Mutex<HashMap<AdUnitKind, AdUnitHandle>>,
    acquire_lock: tokio::sync::Mutex<()>,
    snapshot: watch::Sender<LifecycleSnapshot>,
}

impl std::fmt::Debug for AdUnitLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdUnitLifecycle")
            .field("slots", &*self.slots.lock())
            .finish_non_exhaustive()
    }
}

impl AdUnitLifecycle {
    /// Build a manager issuing requests on `network` for the given unit ids.
    pub fn new(
        network: Arc<dyn AdNetworkEffects>,
        units: AdUnitIds,
        suppression: Arc<SuppressionWindow>,
        tasks: Arc<TaskRegistry>,
    ) -> Arc<Self> {
        let (snapshot, _) = watch::channel(LifecycleSnapshot::default());
        Arc::new(Self {
            network,
            units,
            suppression,
            tasks,
            slots: Mutex::new(HashMap::new()),
            acquire_lock: tokio::sync::Mutex::new(()),
            snapshot,
        })
    }

    /// Current state of `kind`.
    pub fn state(&self, kind: AdUnitKind) -> AdUnitState {
        self.slots
            .lock()
            .get(&kind)
            .map_or(AdUnitState::Idle, |h| h.state)
    }

    /// Live handle of `kind`, if any.
    pub fn handle(&self, kind: AdUnitKind) -> Option<AdUnitHandle> {
        self.slots.lock().get(&kind).copied()
    }

    /// Snapshots published on every state change.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleSnapshot> {
        self.snapshot.subscribe()
    }

    /// Return the live handle for `kind`, creating one if there is none.
    ///
    /// The flag is `true` when the handle was created by this call.
    pub async fn acquire(&self, kind: AdUnitKind) -> Result<(AdUnitHandle, bool), AdError> {
        let _guard = self.acquire_lock.lock().await;

        let spent = {
            let mut slots = self.slots.lock();
            match slots.get(&kind).copied() {
                Some(handle) if handle.state.is_live() => return Ok((handle, false)),
                Some(_) => slots.remove(&kind),
                None => None,
            }
        };
        if let Some(spent) = spent {
            self.network.release(spent.request).await;
        }

        let request = self
            .network
            .create_request(kind, self.units.for_kind(kind))
            .await?;
        let handle = AdUnitHandle {
            kind,
            request,
            state: AdUnitState::Idle,
        };
        self.slots.lock().insert(kind, handle);
        self.publish();
        tracing::debug!(%kind, %request, "ad handle created");
        Ok((handle, true))
    }

    /// Discard the handle for `kind`, whatever its state.
    pub async fn release(&self, kind: AdUnitKind) {
        let removed = self.slots.lock().remove(&kind);
        if let Some(handle) = removed {
            self.publish();
            self.network.release(handle.request).await;
            tracing::debug!(%kind, request = %handle.request, state = ?handle.state, "ad handle released");
        }
    }

    /// Request, load and show one ad of `kind`.
    ///
    /// Returns once the handle exists; loading and showing continue in the
    /// background and progress arrives on the returned [`Presentation`].
    pub async fn present(self: &Arc<Self>, kind: AdUnitKind) -> Result<Presentation, AdError> {
        if self.suppression.is_suppressed().await {
            return Err(AdError::Suppressed);
        }

        let (handle, fresh) = self.acquire(kind).await?;
        if !fresh {
            return Err(AdError::InFlight(kind));
        }

        let stream = match self.network.subscribe(handle.request) {
            Ok(stream) => stream,
            Err(error) => {
                self.transition(kind, handle.request, AdUnitState::Failed);
                self.release_request(kind, handle.request).await;
                return Err(error);
            }
        };

        self.transition(kind, handle.request, AdUnitState::Loading);
        let (tx, rx) = mpsc::unbounded_channel();
        let manager = self.clone();
        self.tasks
            .spawn(async move { manager.drive(kind, handle.request, stream, tx).await });

        Ok(Presentation {
            handle: AdUnitHandle {
                state: AdUnitState::Loading,
                ..handle
            },
            events: rx,
        })
    }

    async fn drive(
        self: Arc<Self>,
        kind: AdUnitKind,
        request: AdRequestId,
        mut stream: AdEventStream,
        tx: mpsc::UnboundedSender<PresentationEvent>,
    ) {
        let report = |event: PresentationEvent| {
            let _ = tx.send(event);
        };

        if let Err(error) = self.network.load(request).await {
            tracing::debug!(%kind, %error, "ad load request failed");
            self.transition(kind, request, AdUnitState::Failed);
            report(PresentationEvent::Failed(error.to_string()));
            self.release_request(kind, request).await;
            return;
        }

        let mut finished = false;
        while let Some(event) = stream.recv().await {
            if !self.is_current(kind, request) {
                finished = true;
                break;
            }
            let terminal = event.is_terminal();
            match event {
                AdEvent::Loaded if kind.is_continuous() => {
                    if self.state(kind) == AdUnitState::Showing {
                        continue;
                    }
                    if self.suppression.is_suppressed().await {
                        self.abandon_suppressed(kind, request, &tx);
                        finished = true;
                        break;
                    }
                    self.transition(kind, request, AdUnitState::Loaded);
                    self.transition(kind, request, AdUnitState::Showing);
                    report(PresentationEvent::Shown);
                }
                AdEvent::Loaded => {
                    if !self.transition(kind, request, AdUnitState::Loaded) {
                        continue;
                    }
                    if self.suppression.is_suppressed().await {
                        self.abandon_suppressed(kind, request, &tx);
                        finished = true;
                        break;
                    }
                    match self.network.show(request).await {
                        Ok(()) => {
                            self.transition(kind, request, AdUnitState::Showing);
                            report(PresentationEvent::Shown);
                        }
                        Err(error) => {
                            tracing::debug!(%kind, %error, "ad show failed");
                            self.transition(kind, request, AdUnitState::Failed);
                            report(PresentationEvent::Failed(error.to_string()));
                            finished = true;
                            break;
                        }
                    }
                }
                AdEvent::RewardEarned => report(PresentationEvent::RewardEarned),
                AdEvent::Closed => {
                    self.transition(kind, request, AdUnitState::Closed);
                    report(PresentationEvent::Closed);
                }
                AdEvent::Error(reason) => {
                    tracing::debug!(%kind, %reason, "ad network reported error");
                    self.transition(kind, request, AdUnitState::Failed);
                    report(PresentationEvent::Failed(reason));
                }
            }
            if terminal {
                finished = true;
                break;
            }
        }

        if !finished {
            self.transition(kind, request, AdUnitState::Failed);
            report(PresentationEvent::Failed("ad event stream closed".into()));
        }
        self.release_request(kind, request).await;
    }

    /// A suppression window opened while the handle was loading.
    fn abandon_suppressed(
        &self,
        kind: AdUnitKind,
        request: AdRequestId,
        tx: &mpsc::UnboundedSender<PresentationEvent>,
    ) {
        tracing::debug!(%kind, %request, "loaded ad dropped while suppressed");
        self.transition(kind, request, AdUnitState::Failed);
        let _ = tx.send(PresentationEvent::Failed("suppressed".into()));
    }

    fn is_current(&self, kind: AdUnitKind, request: AdRequestId) -> bool {
        self.slots
            .lock()
            .get(&kind)
            .is_some_and(|h| h.request == request)
    }

    /// Apply a state change to the current handle of `kind`. Stale requests
    /// and invalid transitions are ignored.
    fn transition(&self, kind: AdUnitKind, request: AdRequestId, next: AdUnitState) -> bool {
        let applied = {
            let mut slots = self.slots.lock();
            match slots.get_mut(&kind) {
                Some(handle) if handle.request == request => {
                    if handle.state.can_transition_to(next) {
                        handle.state = next;
                        true
                    } else {
                        tracing::trace!(%kind, from = ?handle.state, to = ?next, "ignored ad state transition");
                        false
                    }
                }
                _ => false,
            }
        };
        if applied {
            self.publish();
        }
        applied
    }

    async fn release_request(&self, kind: AdUnitKind, request: AdRequestId) {
        let removed = {
            let mut slots = self.slots.lock();
            if slots.get(&kind).is_some_and(|h| h.request == request) {
                slots.remove(&kind)
            } else {
                None
            }
        };
        // An explicit `release` may already have returned the request.
        if removed.is_some() {
            self.publish();
            self.network.release(request).await;
        }
    }

    fn publish(&self) {
        let states = self
            .slots
            .lock()
            .iter()
            .map(|(kind, handle)| (*kind, handle.state))
            .collect();
        self.snapshot.send_replace(LifecycleSnapshot { states });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AdUnitState::*;

    #[test]
    fn happy_path_transitions() {
        assert!(Idle.can_transition_to(Loading));
        assert!(Loading.can_transition_to(Loaded));
        assert!(Loaded.can_transition_to(Showing));
        assert!(Showing.can_transition_to(Closed));
    }

    #[test]
    fn any_live_state_can_fail() {
        for state in [Idle, Loading, Loaded, Showing] {
            assert!(state.can_transition_to(Failed), "{state:?}");
        }
        assert!(!Closed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Failed));
    }

    #[test]
    fn terminal_states_do_not_restart() {
        assert!(!Closed.can_transition_to(Loading));
        assert!(!Failed.can_transition_to(Loading));
        assert!(!Showing.can_transition_to(Loaded));
        assert!(!Loading.can_transition_to(Showing));
    }

    #[test]
    fn snapshot_defaults_to_idle() {
        let snapshot = LifecycleSnapshot::default();
        assert!(snapshot.all_idle());
        assert_eq!(snapshot.state(AdUnitKind::Rewarded), Idle);
    }
}
