//! Policy behavior without ad capability or durable storage.

use std::sync::Arc;
use std::time::Duration;

use vesper_ads::{keys, AdPolicy, BannerMount, InteractionOutcome, LaunchDecision, PolicyEffects};
use vesper_core::effects::StorageEffects;
use vesper_core::{AdPolicyConfig, AdUnitKind};
use vesper_testkit::{
    init_test_tracing, settle, FailingStorage, PolicyFixture, ScriptedAdNetwork, ShowScript,
    SimulatedClock, FIXTURE_START_MS,
};

const SPACED: Duration = Duration::from_secs(21);

#[tokio::test]
async fn unavailable_network_degrades_to_no_ads() {
    init_test_tracing();
    let fixture = PolicyFixture::with_network(ScriptedAdNetwork::unavailable());
    let policy = fixture.start().await;

    assert!(!policy.is_ad_capable());
    assert_eq!(policy.launch_decision(), LaunchDecision::Unavailable);
    assert!(!policy.start_reward_flow().await);
    assert!(!policy.is_suppressed().await);
    assert_eq!(policy.mount_banner(0).await, BannerMount::Unavailable);
    assert_eq!(policy.current_banner_footprint().height_px, 0);

    // Counters keep accumulating and resetting as if ads were served.
    for n in 1..=9 {
        assert_eq!(
            policy.track_interaction().await,
            InteractionOutcome::Counted { count: n }
        );
        fixture.clock.advance(SPACED);
    }
    assert_eq!(
        policy.track_interaction().await,
        InteractionOutcome::Triggered { presented: false }
    );
    assert_eq!(policy.interaction_state().await.count, 0);

    assert_eq!(fixture.network.total_requests(), 0);
    assert!(!fixture.network.is_initialized());
}

#[tokio::test]
async fn restored_suppression_does_not_grant_without_ad_capability() {
    let fixture = PolicyFixture::with_network(ScriptedAdNetwork::unavailable());
    let until = FIXTURE_START_MS + 600_000;
    fixture
        .storage
        .store(keys::SUPPRESSED_UNTIL_MS, until.to_string().into_bytes())
        .await
        .unwrap();
    let policy = fixture.start().await;

    assert!(!policy.is_ad_capable());
    assert!(policy.is_suppressed().await);
    assert!(!policy.start_reward_flow().await);
    assert_eq!(fixture.network.total_requests(), 0);
}

#[tokio::test]
async fn failed_initialization_selects_null_network() {
    let fixture = PolicyFixture::with_network(
        ScriptedAdNetwork::failing_init("sdk missing")
            .with_show(AdUnitKind::Rewarded, ShowScript::RewardThenClose),
    );
    let policy = fixture.start().await;

    assert!(!policy.is_ad_capable());
    assert_eq!(policy.launch_decision(), LaunchDecision::Unavailable);
    assert!(!policy.start_reward_flow().await);
    settle().await;
    assert_eq!(fixture.network.total_requests(), 0);
}

#[tokio::test]
async fn without_ads_effects_start_cleanly() {
    let clock = SimulatedClock::at_millis(FIXTURE_START_MS);
    let effects = PolicyEffects::without_ads(
        Arc::new(clock.clone()),
        Arc::new(vesper_effects::MemoryStorageHandler::new()),
    );
    let policy = AdPolicy::start(AdPolicyConfig::default(), effects)
        .await
        .unwrap();

    assert!(!policy.is_ad_capable());
    assert_eq!(
        policy.track_interaction().await,
        InteractionOutcome::Counted { count: 1 }
    );
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let fixture = PolicyFixture::new();
    let config = AdPolicyConfig {
        interstitial_threshold: 0,
        ..AdPolicyConfig::default()
    };
    assert!(AdPolicy::start(config, fixture.effects()).await.is_err());
}

#[tokio::test]
async fn storage_failures_read_as_fresh_state() {
    let clock = SimulatedClock::at_millis(FIXTURE_START_MS);
    let storage = FailingStorage::new();
    let network = ScriptedAdNetwork::new().with_show(AdUnitKind::Rewarded, ShowScript::RewardThenClose);
    let effects = PolicyEffects::new(
        Arc::new(clock.clone()),
        Arc::new(storage.clone()),
        Arc::new(network.clone()),
    );
    let policy = AdPolicy::start(AdPolicyConfig::default(), effects)
        .await
        .unwrap();
    settle().await;

    // No launch history can be read, so the launch ad is allowed.
    assert_eq!(policy.launch_decision(), LaunchDecision::Requested);

    // Nothing persists, so every spaced interaction starts from zero.
    for _ in 0..3 {
        assert_eq!(
            policy.track_interaction().await,
            InteractionOutcome::Counted { count: 1 }
        );
        clock.advance(SPACED);
    }

    // The reward still applies for this run.
    assert!(policy.start_reward_flow().await);
    assert!(policy.is_suppressed().await);

    assert!(storage.read_attempts() > 0);
    assert!(storage.write_attempts() > 0);
}
