//! Store review prompt.

use std::sync::Arc;

use vesper_ads::ReviewPromptResult;
use vesper_core::{Platform, ReviewConfig};
use vesper_testkit::{PolicyFixture, ScriptedStoreReview};

const PACKAGE: &str = "org.vesper.devotions";

fn android() -> ReviewConfig {
    ReviewConfig {
        platform: Platform::Android,
        android_package: Some(PACKAGE.into()),
        store_url: None,
    }
}

#[tokio::test]
async fn prompts_only_once_per_install() {
    let fixture = PolicyFixture::new();
    let policy = fixture.start().await;
    let review = ScriptedStoreReview::in_app();
    let gate = policy.review_gate(Arc::new(review.clone()), android());

    assert!(!gate.has_prompted().await);
    assert!(gate.maybe_ask_for_review().await);
    assert!(gate.has_prompted().await);
    assert!(!gate.maybe_ask_for_review().await);
    assert_eq!(review.review_requests(), 1);

    // The flag is durable.
    let policy = fixture.restart(policy).await;
    let gate = policy.review_gate(Arc::new(review.clone()), android());
    assert!(!gate.maybe_ask_for_review().await);
    assert_eq!(review.review_requests(), 1);
}

#[tokio::test]
async fn falls_back_to_market_link() {
    let fixture = PolicyFixture::new();
    let policy = fixture.start().await;
    let review = ScriptedStoreReview::without_in_app();
    let gate = policy.review_gate(Arc::new(review.clone()), android());

    assert_eq!(gate.prompt().await, ReviewPromptResult::Store);
    assert_eq!(
        review.opened_urls(),
        vec![format!("market://details?id={PACKAGE}&showAllReviews=true")]
    );
}

#[tokio::test]
async fn falls_back_to_web_listing_when_market_fails() {
    let fixture = PolicyFixture::new();
    let policy = fixture.start().await;
    let review = ScriptedStoreReview::without_in_app().failing_urls("market://");
    let gate = policy.review_gate(Arc::new(review.clone()), android());

    assert_eq!(gate.prompt().await, ReviewPromptResult::Store);
    assert_eq!(
        review.opened_urls(),
        vec![format!(
            "https://play.google.com/store/apps/details?id={PACKAGE}&showAllReviews=true"
        )]
    );
}

#[tokio::test]
async fn configured_store_url_wins_over_package_links() {
    let fixture = PolicyFixture::new();
    let policy = fixture.start().await;
    let review = ScriptedStoreReview::without_in_app().with_store_url("https://reported.example");
    let config = ReviewConfig {
        store_url: Some("https://apps.example/vesper".into()),
        ..android()
    };
    let gate = policy.review_gate(Arc::new(review.clone()), config);

    assert_eq!(gate.prompt().await, ReviewPromptResult::Store);
    assert_eq!(review.opened_urls(), vec!["https://apps.example/vesper".to_string()]);

    let gate = policy.review_gate(Arc::new(review.clone()), android());
    assert_eq!(gate.open_store_listing().await, ReviewPromptResult::Store);
    assert_eq!(review.opened_urls()[1], "https://reported.example");
}

#[tokio::test]
async fn store_listing_skips_in_app_and_all_reviews() {
    let fixture = PolicyFixture::new();
    let policy = fixture.start().await;
    let review = ScriptedStoreReview::in_app();
    let gate = policy.review_gate(Arc::new(review.clone()), android());

    assert_eq!(gate.open_store_listing().await, ReviewPromptResult::Store);
    assert_eq!(review.review_requests(), 0);
    assert_eq!(
        review.opened_urls(),
        vec![format!("market://details?id={PACKAGE}")]
    );
}

#[tokio::test]
async fn unavailable_and_failing_prompts_are_still_marked() {
    let fixture = PolicyFixture::new();
    let policy = fixture.start().await;

    let nothing = ScriptedStoreReview::without_in_app();
    let gate = policy.review_gate(Arc::new(nothing), ReviewConfig::default());
    assert_eq!(gate.prompt().await, ReviewPromptResult::Unavailable);
    assert!(!gate.maybe_ask_for_review().await);
    assert!(gate.has_prompted().await);

    let fixture = PolicyFixture::new();
    let policy = fixture.start().await;
    let broken = ScriptedStoreReview::in_app().failing_request();
    let gate = policy.review_gate(Arc::new(broken), android());
    assert_eq!(gate.prompt().await, ReviewPromptResult::Error);
    assert!(!gate.maybe_ask_for_review().await);
    assert!(gate.has_prompted().await);
}
