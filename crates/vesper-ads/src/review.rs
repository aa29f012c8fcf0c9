//! Once-per-install store review prompt.
//!
//! Tries the in-app review dialog first, then the configured store listing,
//! then the Play Store links derived from the Android package name.

use std::sync::Arc;

use serde::Serialize;
use vesper_core::effects::{ReviewError, StoreReviewEffects};
use vesper_core::{Platform, ReviewConfig};

use crate::store::{keys, PolicyStore};

/// How a review prompt was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReviewPromptResult {
    /// Native in-app review dialog
    InApp,
    /// Store listing opened through a URL
    Store,
    /// Neither dialog nor listing could be offered
    Unavailable,
    /// The platform call failed
    Error,
}

impl ReviewPromptResult {
    /// Whether the user saw a dialog or a listing.
    pub fn reached_user(self) -> bool {
        matches!(self, Self::InApp | Self::Store)
    }
}

/// Once-per-install store review prompt.
pub struct ReviewPromptGate {
    review: Arc<dyn StoreReviewEffects>,
    store: PolicyStore,
    config: ReviewConfig,
}

impl std::fmt::Debug for ReviewPromptGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewPromptGate")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ReviewPromptGate {
    /// Gate remembering its flag in `store`.
    pub fn new(review: Arc<dyn StoreReviewEffects>, store: PolicyStore, config: ReviewConfig) -> Self {
        Self {
            review,
            store,
            config,
        }
    }

    /// Prompt once per install. Returns whether the prompt reached the user.
    ///
    /// The prompt is marked as done whatever the result, so a broken store
    /// integration is not retried on every launch.
    pub async fn maybe_ask_for_review(&self) -> bool {
        if self.has_prompted().await {
            return false;
        }
        let result = self.prompt().await;
        self.mark_prompted().await;
        tracing::info!(?result, "store review prompt");
        result.reached_user()
    }

    /// Prompt now: in-app dialog first, then the store listing.
    pub async fn prompt(&self) -> ReviewPromptResult {
        match self.try_prompt().await {
            Ok(result) => result,
            Err(error) => {
                tracing::warn!(%error, "store review prompt failed");
                ReviewPromptResult::Error
            }
        }
    }

    /// Open the store listing without the in-app dialog.
    pub async fn open_store_listing(&self) -> ReviewPromptResult {
        match self.open_listing(false).await {
            Ok(result) => result,
            Err(error) => {
                tracing::warn!(%error, "store listing could not be opened");
                ReviewPromptResult::Error
            }
        }
    }

    /// Whether this install was already prompted.
    pub async fn has_prompted(&self) -> bool {
        self.store.load_flag(keys::REVIEW_PROMPTED).await
    }

    /// Persist the prompted flag. Failures are logged.
    pub async fn mark_prompted(&self) {
        if let Err(error) = self.store.save_flag(keys::REVIEW_PROMPTED, true).await {
            tracing::warn!(%error, "failed to persist review prompt flag");
        }
    }

    async fn try_prompt(&self) -> Result<ReviewPromptResult, ReviewError> {
        if self.review.is_available().await? && self.review.has_action().await? {
            self.review.request_review().await?;
            return Ok(ReviewPromptResult::InApp);
        }
        self.open_listing(true).await
    }

    async fn open_listing(&self, all_reviews: bool) -> Result<ReviewPromptResult, ReviewError> {
        let store_url = self
            .config
            .store_url
            .clone()
            .or_else(|| self.review.store_url());
        if let Some(url) = store_url {
            self.review.open_url(&url).await?;
            return Ok(ReviewPromptResult::Store);
        }

        let package = match (&self.config.platform, &self.config.android_package) {
            (Platform::Android, Some(package)) if !package.is_empty() => package,
            _ => return Ok(ReviewPromptResult::Unavailable),
        };
        let query = if all_reviews {
            format!("id={package}&showAllReviews=true")
        } else {
            format!("id={package}")
        };

        let market = format!("market://details?{query}");
        match self.review.open_url(&market).await {
            Ok(()) => Ok(ReviewPromptResult::Store),
            Err(error) => {
                tracing::debug!(%error, "market link failed; trying web listing");
                let web = format!("https://play.google.com/store/apps/details?{query}");
                self.review.open_url(&web).await?;
                Ok(ReviewPromptResult::Store)
            }
        }
    }
}
