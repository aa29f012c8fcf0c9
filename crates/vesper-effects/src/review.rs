//! Null store review handler for runtimes without a review API.

use async_trait::async_trait;
use vesper_core::effects::{ReviewError, StoreReviewEffects};

/// Store review handler that reports nothing available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStoreReview;

#[async_trait]
impl StoreReviewEffects for NullStoreReview {
    async fn is_available(&self) -> Result<bool, ReviewError> {
        Ok(false)
    }

    async fn has_action(&self) -> Result<bool, ReviewError> {
        Ok(false)
    }

    async fn request_review(&self) -> Result<(), ReviewError> {
        Err(ReviewError::RequestFailed("in-app review unavailable".into()))
    }

    fn store_url(&self) -> Option<String> {
        None
    }

    async fn open_url(&self, url: &str) -> Result<(), ReviewError> {
        Err(ReviewError::OpenUrlFailed {
            url: url.to_string(),
            reason: "no URL handler".into(),
        })
    }
}
