//! Scripted ad network.
//!
//! Each ad kind follows a script for what `load` and `show` do. Events are
//! queued on the request's stream synchronously inside the call, so a test
//! only has to let spawned tasks run to observe the whole presentation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use vesper_core::effects::{AdError, AdEventStream, AdNetworkEffects};
use vesper_core::{AdEvent, AdRequestId, AdUnitId, AdUnitKind};

/// What `load` does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadScript {
    /// Queue `Loaded`
    #[default]
    Succeed,
    /// Return `LoadFailed` from the call
    Fail,
    /// Accept the call, then queue an `Error` event
    ErrorEvent,
    /// Accept the call and never answer
    Hang,
}

/// What `show` does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShowScript {
    /// Queue `Closed`
    #[default]
    Close,
    /// Queue `RewardEarned` then `Closed`
    RewardThenClose,
    /// Close reported before the reward callback
    CloseThenReward,
    /// Return `ShowFailed` from the call
    Fail,
    /// Queue an `Error` event
    ErrorEvent,
    /// Stay on screen until the test emits an event
    Hold,
}

/// Calls observed for one ad kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CallCounts {
    /// `create_request` calls
    pub created: usize,
    /// `load` calls
    pub loads: usize,
    /// `show` calls
    pub shows: usize,
    /// Requests actually released
    pub released: usize,
}

#[derive(Debug)]
struct Request {
    kind: AdUnitKind,
    unit_id: AdUnitId,
    events: mpsc::UnboundedSender<AdEvent>,
    stream: Option<AdEventStream>,
}

#[derive(Debug, Default)]
struct NetworkState {
    load: HashMap<AdUnitKind, LoadScript>,
    show: HashMap<AdUnitKind, ShowScript>,
    requests: HashMap<AdRequestId, Request>,
    latest: HashMap<AdUnitKind, AdRequestId>,
    calls: HashMap<AdUnitKind, CallCounts>,
    stale_releases: usize,
    initialized: bool,
}

/// Deterministic [`AdNetworkEffects`]. Clones share state.
#[derive(Debug, Clone)]
pub struct ScriptedAdNetwork {
    available: bool,
    init_failure: Option<String>,
    state: Arc<Mutex<NetworkState>>,
}

impl ScriptedAdNetwork {
    /// Network that loads and shows every kind successfully.
    pub fn new() -> Self {
        Self {
            available: true,
            init_failure: None,
            state: Arc::default(),
        }
    }

    /// Network reporting no ad capability.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Network whose `initialize` fails.
    pub fn failing_init(reason: impl Into<String>) -> Self {
        Self {
            init_failure: Some(reason.into()),
            ..Self::new()
        }
    }

    /// Builder form of [`Self::set_load`].
    pub fn with_load(self, kind: AdUnitKind, script: LoadScript) -> Self {
        self.set_load(kind, script);
        self
    }

    /// Builder form of [`Self::set_show`].
    pub fn with_show(self, kind: AdUnitKind, script: ShowScript) -> Self {
        self.set_show(kind, script);
        self
    }

    /// Script `load` for `kind`.
    pub fn set_load(&self, kind: AdUnitKind, script: LoadScript) {
        self.state.lock().load.insert(kind, script);
    }

    /// Script `show` for `kind`.
    pub fn set_show(&self, kind: AdUnitKind, script: ShowScript) {
        self.state.lock().show.insert(kind, script);
    }

    /// Calls observed for `kind`.
    pub fn calls(&self, kind: AdUnitKind) -> CallCounts {
        self.state.lock().calls.get(&kind).copied().unwrap_or_default()
    }

    /// Total requests created across every kind.
    pub fn total_requests(&self) -> usize {
        self.state.lock().calls.values().map(|c| c.created).sum()
    }

    /// `release` calls for requests that were already released.
    pub fn stale_releases(&self) -> usize {
        self.state.lock().stale_releases
    }

    /// Whether `initialize` succeeded.
    pub fn is_initialized(&self) -> bool {
        self.state.lock().initialized
    }

    /// Most recent request created for `kind`, if it has not been released.
    pub fn live_request(&self, kind: AdUnitKind) -> Option<AdRequestId> {
        let state = self.state.lock();
        let request = *state.latest.get(&kind)?;
        state.requests.contains_key(&request).then_some(request)
    }

    /// Unit id the latest request of `kind` was created for.
    pub fn unit_id(&self, kind: AdUnitKind) -> Option<AdUnitId> {
        let state = self.state.lock();
        let request = state.latest.get(&kind)?;
        state.requests.get(request).map(|r| r.unit_id.clone())
    }

    /// Push an event onto a request's stream. Returns false once released.
    pub fn emit(&self, request: AdRequestId, event: AdEvent) -> bool {
        self.state
            .lock()
            .requests
            .get(&request)
            .is_some_and(|r| r.events.send(event).is_ok())
    }

    fn queue(&self, request: AdRequestId, events: &[AdEvent]) -> Result<AdUnitKind, AdError> {
        let state = self.state.lock();
        let entry = state
            .requests
            .get(&request)
            .ok_or(AdError::UnknownRequest(request))?;
        for event in events {
            let _ = entry.events.send(event.clone());
        }
        Ok(entry.kind)
    }

    fn kind_of(&self, request: AdRequestId) -> Result<AdUnitKind, AdError> {
        self.queue(request, &[])
    }
}

impl Default for ScriptedAdNetwork {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdNetworkEffects for ScriptedAdNetwork {
    async fn initialize(&self) -> Result<(), AdError> {
        if let Some(reason) = &self.init_failure {
            return Err(AdError::InitializationFailed(reason.clone()));
        }
        self.state.lock().initialized = true;
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn create_request(
        &self,
        kind: AdUnitKind,
        unit_id: &AdUnitId,
    ) -> Result<AdRequestId, AdError> {
        if !self.available {
            return Err(AdError::Unavailable);
        }
        let request = AdRequestId::new();
        let (events, stream) = mpsc::unbounded_channel();
        let mut state = self.state.lock();
        state.requests.insert(
            request,
            Request {
                kind,
                unit_id: unit_id.clone(),
                events,
                stream: Some(stream),
            },
        );
        state.latest.insert(kind, request);
        state.calls.entry(kind).or_default().created += 1;
        Ok(request)
    }

    fn subscribe(&self, request: AdRequestId) -> Result<AdEventStream, AdError> {
        self.state
            .lock()
            .requests
            .get_mut(&request)
            .and_then(|r| r.stream.take())
            .ok_or(AdError::UnknownRequest(request))
    }

    async fn load(&self, request: AdRequestId) -> Result<(), AdError> {
        let kind = self.kind_of(request)?;
        let script = {
            let mut state = self.state.lock();
            state.calls.entry(kind).or_default().loads += 1;
            state.load.get(&kind).copied().unwrap_or_default()
        };
        match script {
            LoadScript::Succeed => self.queue(request, &[AdEvent::Loaded]).map(|_| ()),
            LoadScript::Fail => Err(AdError::LoadFailed("no fill".into())),
            LoadScript::ErrorEvent => self
                .queue(request, &[AdEvent::Error("no fill".into())])
                .map(|_| ()),
            LoadScript::Hang => Ok(()),
        }
    }

    async fn show(&self, request: AdRequestId) -> Result<(), AdError> {
        let kind = self.kind_of(request)?;
        let script = {
            let mut state = self.state.lock();
            state.calls.entry(kind).or_default().shows += 1;
            state.show.get(&kind).copied().unwrap_or_default()
        };
        let events = match script {
            ShowScript::Close => vec![AdEvent::Closed],
            ShowScript::RewardThenClose => vec![AdEvent::RewardEarned, AdEvent::Closed],
            ShowScript::CloseThenReward => vec![AdEvent::Closed, AdEvent::RewardEarned],
            ShowScript::Fail => return Err(AdError::ShowFailed("presentation refused".into())),
            ShowScript::ErrorEvent => vec![AdEvent::Error("playback error".into())],
            ShowScript::Hold => Vec::new(),
        };
        self.queue(request, &events).map(|_| ())
    }

    async fn release(&self, request: AdRequestId) {
        let mut state = self.state.lock();
        match state.requests.remove(&request) {
            Some(entry) => state.calls.entry(entry.kind).or_default().released += 1,
            None => state.stale_releases += 1,
        }
    }
}
