//! Policy fixture: a simulated device the policy can be started and
//! restarted on.

use std::sync::Arc;

use vesper_ads::{AdPolicy, PolicyEffects};
use vesper_core::AdPolicyConfig;
use vesper_effects::MemoryStorageHandler;

use crate::ads::ScriptedAdNetwork;
use crate::time::SimulatedClock;

/// Clock reading every fixture starts at (2023-11-14T22:13:20Z).
pub const FIXTURE_START_MS: u64 = 1_700_000_000_000;

/// Clock, durable storage and ad network that survive policy restarts.
#[derive(Debug, Clone)]
pub struct PolicyFixture {
    /// Shared simulated clock
    pub clock: SimulatedClock,
    /// Durable storage kept across restarts
    pub storage: MemoryStorageHandler,
    /// Scripted network shared by every started policy
    pub network: ScriptedAdNetwork,
    /// Config passed to `start`
    pub config: AdPolicyConfig,
}

impl PolicyFixture {
    /// Production config, a network that serves everything, empty storage.
    pub fn new() -> Self {
        Self::with_network(ScriptedAdNetwork::new())
    }

    /// Fixture serving ads from `network`.
    pub fn with_network(network: ScriptedAdNetwork) -> Self {
        Self {
            clock: SimulatedClock::at_millis(FIXTURE_START_MS),
            storage: MemoryStorageHandler::new(),
            network,
            config: AdPolicyConfig::default(),
        }
    }

    /// Replace the policy config.
    pub fn with_config(mut self, config: AdPolicyConfig) -> Self {
        self.config = config;
        self
    }

    /// Effect handlers over the fixture's shared state.
    pub fn effects(&self) -> PolicyEffects {
        PolicyEffects::new(
            Arc::new(self.clock.clone()),
            Arc::new(self.storage.clone()),
            Arc::new(self.network.clone()),
        )
    }

    /// Start a policy and let its startup tasks settle.
    pub async fn start(&self) -> AdPolicy {
        let policy = AdPolicy::start(self.config.clone(), self.effects())
            .await
            .expect("fixture config is valid");
        settle().await;
        policy
    }

    /// Simulate a process restart: stop `previous`, keep storage and clock.
    pub async fn restart(&self, previous: AdPolicy) -> AdPolicy {
        previous.shutdown();
        drop(previous);
        tracing::debug!(now_ms = self.clock.now_millis(), "restarting policy");
        self.start().await
    }
}

impl Default for PolicyFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Let spawned policy tasks run until they block.
pub async fn settle() {
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
}
