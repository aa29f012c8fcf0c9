//! Policy facade.
//!
//! [`AdPolicy`] is the one object the UI talks to. It is an injected service:
//! the host builds it once from an [`AdPolicyConfig`] and a set of effect
//! handlers, then clones it into whatever needs it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use vesper_core::effects::{
    AdNetworkEffects, PhysicalTimeEffects, StorageEffects, StoreReviewEffects,
};
use vesper_core::{AdPolicyConfig, ReviewConfig, VesperError};
use vesper_effects::NullAdNetwork;

use crate::banner::{BannerController, BannerFootprint, BannerMount, BannerOffsetPublisher};
use crate::counter::{InteractionCounter, InteractionOutcome};
use crate::launch::{LaunchDecision, LaunchGate};
use crate::lifecycle::{AdUnitLifecycle, LifecycleSnapshot};
use crate::review::ReviewPromptGate;
use crate::reward::{self, RewardFlow};
use crate::store::{InteractionCounterState, PolicyStore};
use crate::suppression::{SuppressionStatus, SuppressionWindow};
use crate::task_registry::TaskRegistry;

/// Effect handlers the policy runs on.
#[derive(Clone)]
pub struct PolicyEffects {
    /// Wall clock
    pub time: Arc<dyn PhysicalTimeEffects>,
    /// Durable key-value store
    pub storage: Arc<dyn StorageEffects>,
    /// Ad network; replaced by the null adapter when unusable
    pub ads: Arc<dyn AdNetworkEffects>,
}

impl PolicyEffects {
    /// Bundle the three handlers.
    pub fn new(
        time: Arc<dyn PhysicalTimeEffects>,
        storage: Arc<dyn StorageEffects>,
        ads: Arc<dyn AdNetworkEffects>,
    ) -> Self {
        Self { time, storage, ads }
    }

    /// Handlers for a runtime with no ad capability.
    pub fn without_ads(
        time: Arc<dyn PhysicalTimeEffects>,
        storage: Arc<dyn StorageEffects>,
    ) -> Self {
        Self::new(time, storage, Arc::new(NullAdNetwork::new()))
    }
}

impl std::fmt::Debug for PolicyEffects {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyEffects")
            .field("ad_capable", &self.ads.is_available())
            .finish_non_exhaustive()
    }
}

/// Ad presentation gating policy.
#[derive(Clone, Debug)]
pub struct AdPolicy {
    inner: Arc<PolicyInner>,
}

#[derive(Debug)]
struct PolicyInner {
    config: AdPolicyConfig,
    ad_capable: bool,
    store: PolicyStore,
    tasks: Arc<TaskRegistry>,
    suppression: Arc<SuppressionWindow>,
    lifecycle: Arc<AdUnitLifecycle>,
    counter: Arc<InteractionCounter>,
    launch: LaunchGate,
    launch_decision: LaunchDecision,
    publisher: Arc<BannerOffsetPublisher>,
    banner: Arc<BannerController>,
}

impl Drop for PolicyInner {
    fn drop(&mut self) {
        self.tasks.shutdown();
        self.suppression.shutdown();
    }
}

impl AdPolicy {
    /// Build the policy and run startup.
    ///
    /// Startup initializes the ad network, falling back to [`NullAdNetwork`]
    /// when initialization fails or the adapter reports no capability, then
    /// restores the persisted suppression window before any gating decision,
    /// then runs the once-per-run launch check. The launch ad itself loads in
    /// the background; its decision is available from
    /// [`AdPolicy::launch_decision`].
    ///
    /// Fails only on an invalid configuration.
    pub async fn start(config: AdPolicyConfig, effects: PolicyEffects) -> Result<Self, VesperError> {
        config.validate()?;

        let PolicyEffects { time, storage, ads } = effects;
        let (ads, ad_capable) = select_network(ads).await;

        let store = PolicyStore::new(storage);
        let tasks = Arc::new(TaskRegistry::new());

        let suppression = SuppressionWindow::new(time.clone(), store.clone(), config.status_heartbeat());
        suppression.restore().await;

        let lifecycle = AdUnitLifecycle::new(
            ads,
            config.units.clone(),
            suppression.clone(),
            tasks.clone(),
        );
        let counter = Arc::new(InteractionCounter::new(
            &config,
            time.clone(),
            store.clone(),
            suppression.clone(),
            lifecycle.clone(),
        ));
        let launch = LaunchGate::new(
            &config,
            time,
            store.clone(),
            suppression.clone(),
            lifecycle.clone(),
            tasks.clone(),
        );

        let publisher = Arc::new(BannerOffsetPublisher::new());
        let banner = Arc::new(BannerController::new(
            &config,
            lifecycle.clone(),
            suppression.clone(),
            publisher.clone(),
            tasks.clone(),
        ));
        banner.watch_suppression();

        let launch_decision = launch.maybe_show().await;

        tracing::info!(
            ad_capable,
            suppressed = suppression.active_until().is_some(),
            ?launch_decision,
            "ad policy started"
        );

        Ok(Self {
            inner: Arc::new(PolicyInner {
                config,
                ad_capable,
                store,
                tasks,
                suppression,
                lifecycle,
                counter,
                launch,
                launch_decision,
                publisher,
                banner,
            }),
        })
    }

    /// Record a qualifying interaction without waiting for the decision.
    pub fn record_interaction(&self) {
        let counter = self.inner.counter.clone();
        self.inner.tasks.spawn(async move {
            counter.record().await;
        });
    }

    /// Record a qualifying interaction and return what it did.
    pub async fn track_interaction(&self) -> InteractionOutcome {
        self.inner.counter.record().await
    }

    /// Persisted interaction counter.
    pub async fn interaction_state(&self) -> InteractionCounterState {
        self.inner.counter.snapshot().await
    }

    /// Whether ads are currently suppressed.
    pub async fn is_suppressed(&self) -> bool {
        self.inner.suppression.is_suppressed().await
    }

    /// Time left in the suppression window.
    pub async fn remaining_suppression(&self) -> Duration {
        self.inner.suppression.remaining().await
    }

    /// Reactive suppression status.
    pub fn suppression_status(&self) -> watch::Receiver<SuppressionStatus> {
        self.inner.suppression.subscribe()
    }

    /// Offer a rewarded ad in exchange for the suppression window.
    ///
    /// Resolves `true` when the reward was earned, or immediately when ads
    /// are already suppressed. Always `false` without ad capability.
    pub fn start_reward_flow(&self) -> RewardFlow {
        reward::start(
            self.inner.ad_capable,
            self.inner.suppression.clone(),
            self.inner.lifecycle.clone(),
            self.inner.config.suppression_duration(),
            &self.inner.tasks,
        )
    }

    /// Receiver for the banner footprint.
    pub fn banner_footprint(&self) -> watch::Receiver<BannerFootprint> {
        self.inner.publisher.subscribe()
    }

    /// Latest banner footprint.
    pub fn current_banner_footprint(&self) -> BannerFootprint {
        self.inner.publisher.current_footprint()
    }

    /// Mount the banner above a bottom inset of `safe_area_bottom_px`.
    pub async fn mount_banner(&self, safe_area_bottom_px: u32) -> BannerMount {
        self.inner.banner.mount(safe_area_bottom_px).await
    }

    /// Remove the banner and zero its footprint.
    pub async fn unmount_banner(&self) {
        self.inner.banner.unmount().await;
    }

    /// Run the launch check. Startup already does this, so a later call
    /// returns [`LaunchDecision::AlreadyAttempted`].
    pub async fn maybe_show_launch_ad(&self) -> LaunchDecision {
        self.inner.launch.maybe_show().await
    }

    /// Decision taken by the launch check during startup.
    pub fn launch_decision(&self) -> LaunchDecision {
        self.inner.launch_decision
    }

    /// Lifecycle state of every ad kind.
    pub fn ad_unit_states(&self) -> watch::Receiver<LifecycleSnapshot> {
        self.inner.lifecycle.subscribe()
    }

    /// Whether a working ad network was selected at startup.
    pub fn is_ad_capable(&self) -> bool {
        self.inner.ad_capable
    }

    /// Validated configuration.
    pub fn config(&self) -> &AdPolicyConfig {
        &self.inner.config
    }

    /// Store review prompt sharing this policy's durable store.
    pub fn review_gate(
        &self,
        review: Arc<dyn StoreReviewEffects>,
        config: ReviewConfig,
    ) -> ReviewPromptGate {
        ReviewPromptGate::new(review, self.inner.store.clone(), config)
    }

    /// Stop all background work. Persisted state is left as is.
    pub fn shutdown(&self) {
        self.inner.tasks.shutdown();
        self.inner.suppression.shutdown();
        tracing::debug!("ad policy shut down");
    }
}

async fn select_network(ads: Arc<dyn AdNetworkEffects>) -> (Arc<dyn AdNetworkEffects>, bool) {
    if !ads.is_available() {
        tracing::info!("no ad capability; ads disabled");
        return (Arc::new(NullAdNetwork::new()), false);
    }
    match ads.initialize().await {
        Ok(()) => (ads, true),
        Err(error) => {
            tracing::warn!(%error, "ad network initialization failed; ads disabled");
            (Arc::new(NullAdNetwork::new()), false)
        }
    }
}
