//! Scripted store review handler that records what it was asked to do.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use vesper_core::effects::{ReviewError, StoreReviewEffects};

#[derive(Debug, Default)]
struct ReviewState {
    in_app: bool,
    request_fails: bool,
    store_url: Option<String>,
    failing_prefixes: Vec<String>,
    review_requests: usize,
    opened: Vec<String>,
}

/// Scripted [`StoreReviewEffects`] recording requests and opened URLs.
#[derive(Debug, Clone, Default)]
pub struct ScriptedStoreReview {
    state: Arc<Mutex<ReviewState>>,
}

impl ScriptedStoreReview {
    /// Platform with a working in-app review dialog.
    pub fn in_app() -> Self {
        let review = Self::default();
        review.state.lock().in_app = true;
        review
    }

    /// Platform without an in-app review dialog.
    pub fn without_in_app() -> Self {
        Self::default()
    }

    /// Report `url` from `store_url()`.
    pub fn with_store_url(self, url: impl Into<String>) -> Self {
        self.state.lock().store_url = Some(url.into());
        self
    }

    /// Fail `open_url` for every URL starting with `prefix`.
    pub fn failing_urls(self, prefix: impl Into<String>) -> Self {
        self.state.lock().failing_prefixes.push(prefix.into());
        self
    }

    /// Fail the in-app review request.
    pub fn failing_request(self) -> Self {
        self.state.lock().request_fails = true;
        self
    }

    /// In-app review requests made so far.
    pub fn review_requests(&self) -> usize {
        self.state.lock().review_requests
    }

    /// URLs successfully opened, in order.
    pub fn opened_urls(&self) -> Vec<String> {
        self.state.lock().opened.clone()
    }
}

#[async_trait]
impl StoreReviewEffects for ScriptedStoreReview {
    async fn is_available(&self) -> Result<bool, ReviewError> {
        Ok(self.state.lock().in_app)
    }

    async fn has_action(&self) -> Result<bool, ReviewError> {
        Ok(self.state.lock().in_app)
    }

    async fn request_review(&self) -> Result<(), ReviewError> {
        let mut state = self.state.lock();
        state.review_requests += 1;
        if state.request_fails {
            return Err(ReviewError::RequestFailed("review flow crashed".into()));
        }
        Ok(())
    }

    fn store_url(&self) -> Option<String> {
        self.state.lock().store_url.clone()
    }

    async fn open_url(&self, url: &str) -> Result<(), ReviewError> {
        let mut state = self.state.lock();
        if state.failing_prefixes.iter().any(|p| url.starts_with(p.as_str())) {
            return Err(ReviewError::OpenUrlFailed {
                url: url.to_string(),
                reason: "no handler".into(),
            });
        }
        state.opened.push(url.to_string());
        Ok(())
    }
}
