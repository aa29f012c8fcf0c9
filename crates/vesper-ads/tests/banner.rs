//! Banner mounting and the published footprint.

use vesper_ads::{AdUnitState, BannerFootprint, BannerMount};
use vesper_core::{AdEvent, AdUnitKind};
use vesper_testkit::{settle, LoadScript, PolicyFixture, ScriptedAdNetwork, ShowScript};

#[tokio::test]
async fn footprint_follows_banner_load_and_unmount() {
    let fixture = PolicyFixture::with_network(
        ScriptedAdNetwork::new().with_load(AdUnitKind::Banner, LoadScript::Hang),
    );
    let policy = fixture.start().await;
    let mut footprint = policy.banner_footprint();

    assert_eq!(policy.mount_banner(34).await, BannerMount::Mounted);
    settle().await;
    assert_eq!(policy.current_banner_footprint(), BannerFootprint::default());

    let request = fixture.network.live_request(AdUnitKind::Banner).unwrap();
    fixture.network.emit(request, AdEvent::Loaded);
    let loaded = *footprint.wait_for(|f| f.height_px != 0).await.unwrap();
    assert_eq!(loaded.height_px, 134);
    assert_eq!(
        policy.ad_unit_states().borrow().state(AdUnitKind::Banner),
        AdUnitState::Showing
    );
    // Banners never get a discrete show call.
    assert_eq!(fixture.network.calls(AdUnitKind::Banner).shows, 0);

    policy.unmount_banner().await;
    assert_eq!(policy.current_banner_footprint().height_px, 0);
    settle().await;
    assert_eq!(
        policy.ad_unit_states().borrow().state(AdUnitKind::Banner),
        AdUnitState::Idle
    );
    assert_eq!(fixture.network.calls(AdUnitKind::Banner).released, 1);
    assert_eq!(fixture.network.stale_releases(), 0);
}

#[tokio::test]
async fn remount_right_after_unmount_keeps_new_footprint() {
    let fixture = PolicyFixture::new();
    let policy = fixture.start().await;

    assert_eq!(policy.mount_banner(0).await, BannerMount::Mounted);
    settle().await;
    assert_eq!(policy.current_banner_footprint().height_px, 100);

    policy.unmount_banner().await;
    assert_eq!(policy.mount_banner(0).await, BannerMount::Mounted);
    settle().await;

    // The first banner's listener finishes after the second banner shows.
    assert_eq!(
        policy.ad_unit_states().borrow().state(AdUnitKind::Banner),
        AdUnitState::Showing
    );
    assert_eq!(policy.current_banner_footprint().height_px, 100);
    let calls = fixture.network.calls(AdUnitKind::Banner);
    assert_eq!(calls.created, 2);
    assert_eq!(calls.released, 1);
    assert_eq!(fixture.network.stale_releases(), 0);
}

#[tokio::test]
async fn second_mount_is_idempotent() {
    let fixture = PolicyFixture::new();
    let policy = fixture.start().await;

    assert_eq!(policy.mount_banner(0).await, BannerMount::Mounted);
    settle().await;
    assert_eq!(policy.current_banner_footprint().height_px, 100);

    assert_eq!(policy.mount_banner(0).await, BannerMount::AlreadyMounted);
    assert_eq!(fixture.network.calls(AdUnitKind::Banner).created, 1);
}

#[tokio::test]
async fn failed_load_keeps_zero_footprint() {
    let fixture = PolicyFixture::with_network(
        ScriptedAdNetwork::new().with_load(AdUnitKind::Banner, LoadScript::ErrorEvent),
    );
    let policy = fixture.start().await;

    assert_eq!(policy.mount_banner(20).await, BannerMount::Mounted);
    settle().await;
    assert_eq!(policy.current_banner_footprint().height_px, 0);
    assert_eq!(
        policy.ad_unit_states().borrow().state(AdUnitKind::Banner),
        AdUnitState::Idle
    );

    // A later mount retries with a fresh handle.
    fixture.network.set_load(AdUnitKind::Banner, LoadScript::Succeed);
    assert_eq!(policy.mount_banner(20).await, BannerMount::Mounted);
    settle().await;
    assert_eq!(policy.current_banner_footprint().height_px, 120);
}

#[tokio::test]
async fn suppression_unmounts_the_banner() {
    let fixture = PolicyFixture::with_network(
        ScriptedAdNetwork::new().with_show(AdUnitKind::Rewarded, ShowScript::RewardThenClose),
    );
    let policy = fixture.start().await;

    assert_eq!(policy.mount_banner(24).await, BannerMount::Mounted);
    settle().await;
    assert_eq!(policy.current_banner_footprint().height_px, 124);

    assert!(policy.start_reward_flow().await);
    settle().await;
    assert_eq!(policy.current_banner_footprint().height_px, 0);
    assert_eq!(
        policy.ad_unit_states().borrow().state(AdUnitKind::Banner),
        AdUnitState::Idle
    );

    assert_eq!(policy.mount_banner(24).await, BannerMount::Suppressed);
    assert_eq!(policy.current_banner_footprint().height_px, 0);
    assert_eq!(fixture.network.calls(AdUnitKind::Banner).created, 1);
}
