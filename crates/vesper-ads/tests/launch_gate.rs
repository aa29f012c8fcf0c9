//! App-launch ad gate across process runs.

use std::time::Duration;

use assert_matches::assert_matches;
use vesper_ads::{keys, LaunchDecision};
use vesper_core::effects::StorageEffects;
use vesper_core::AdUnitKind;
use vesper_testkit::{settle, LoadScript, PolicyFixture, ScriptedAdNetwork, ShowScript, FIXTURE_START_MS};

async fn last_shown(fixture: &PolicyFixture) -> Option<u64> {
    let raw = fixture
        .storage
        .retrieve(keys::LAUNCH_LAST_SHOWN_MS)
        .await
        .unwrap()?;
    String::from_utf8(raw).unwrap().parse().ok()
}

#[tokio::test]
async fn shows_once_per_run() {
    let fixture = PolicyFixture::new();
    let policy = fixture.start().await;

    assert_eq!(policy.launch_decision(), LaunchDecision::Requested);
    assert_eq!(
        policy.maybe_show_launch_ad().await,
        LaunchDecision::AlreadyAttempted
    );
    assert_eq!(
        policy.maybe_show_launch_ad().await,
        LaunchDecision::AlreadyAttempted
    );

    let calls = fixture.network.calls(AdUnitKind::AppLaunch);
    assert_eq!(calls.created, 1);
    assert_eq!(calls.shows, 1);
    assert_eq!(calls.released, 1);
    assert_eq!(last_shown(&fixture).await, Some(FIXTURE_START_MS));
}

#[tokio::test]
async fn cooldown_spans_restarts() {
    let fixture = PolicyFixture::new();
    let policy = fixture.start().await;
    assert_eq!(policy.launch_decision(), LaunchDecision::Requested);

    fixture.clock.advance(Duration::from_secs(3600));
    let policy = fixture.restart(policy).await;
    assert_eq!(
        policy.launch_decision(),
        LaunchDecision::CoolingDown {
            remaining: Duration::from_secs(11 * 3600)
        }
    );

    fixture.clock.advance(Duration::from_secs(11 * 3600 - 1));
    let policy = fixture.restart(policy).await;
    assert_matches!(policy.launch_decision(), LaunchDecision::CoolingDown { .. });

    fixture.clock.advance(Duration::from_secs(1));
    let policy = fixture.restart(policy).await;
    assert_eq!(policy.launch_decision(), LaunchDecision::Requested);
    assert_eq!(fixture.network.calls(AdUnitKind::AppLaunch).shows, 2);
}

#[tokio::test]
async fn failed_load_does_not_start_cooldown() {
    let fixture = PolicyFixture::with_network(
        ScriptedAdNetwork::new().with_load(AdUnitKind::AppLaunch, LoadScript::Fail),
    );
    let policy = fixture.start().await;

    assert_eq!(policy.launch_decision(), LaunchDecision::Requested);
    assert_eq!(fixture.network.calls(AdUnitKind::AppLaunch).shows, 0);
    assert_eq!(last_shown(&fixture).await, None);

    // No retry in the same run.
    assert_eq!(
        policy.maybe_show_launch_ad().await,
        LaunchDecision::AlreadyAttempted
    );
    assert_eq!(fixture.network.calls(AdUnitKind::AppLaunch).created, 1);

    fixture
        .network
        .set_load(AdUnitKind::AppLaunch, LoadScript::Succeed);
    fixture.clock.advance(Duration::from_secs(60));
    let policy = fixture.restart(policy).await;
    assert_eq!(policy.launch_decision(), LaunchDecision::Requested);
    assert_eq!(
        last_shown(&fixture).await,
        Some(FIXTURE_START_MS + 60_000)
    );
}

#[tokio::test]
async fn failed_show_does_not_start_cooldown() {
    let fixture = PolicyFixture::with_network(
        ScriptedAdNetwork::new().with_show(AdUnitKind::AppLaunch, ShowScript::Fail),
    );
    let policy = fixture.start().await;

    assert_eq!(policy.launch_decision(), LaunchDecision::Requested);
    assert_eq!(fixture.network.calls(AdUnitKind::AppLaunch).shows, 1);
    assert_eq!(last_shown(&fixture).await, None);
    policy.shutdown();
}

#[tokio::test]
async fn displayed_time_is_recorded_not_load_time() {
    let fixture = PolicyFixture::with_network(
        ScriptedAdNetwork::new().with_load(AdUnitKind::AppLaunch, LoadScript::Hang),
    );
    let policy = fixture.start().await;
    assert_eq!(policy.launch_decision(), LaunchDecision::Requested);

    fixture.clock.advance(Duration::from_secs(5));
    let request = fixture.network.live_request(AdUnitKind::AppLaunch).unwrap();
    fixture.network.emit(request, vesper_core::AdEvent::Loaded);
    settle().await;

    assert_eq!(last_shown(&fixture).await, Some(FIXTURE_START_MS + 5_000));
    policy.shutdown();
}
