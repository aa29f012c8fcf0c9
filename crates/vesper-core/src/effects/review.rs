//! Store review effects.
//!
//! # Effect Classification
//!
//! - **Category**: Platform Effect
//! - **Implementation**: host SDK bridge; `vesper_effects::NullStoreReview`
//! - **Usage**: `vesper-ads` review prompt gate

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error type for store review operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum ReviewError {
    #[error("In-app review request failed: {0}")]
    RequestFailed(String),
    #[error("Could not open {url}: {reason}")]
    OpenUrlFailed { url: String, reason: String },
}

/// In-app review and store link primitives.
#[async_trait]
pub trait StoreReviewEffects: Send + Sync {
    /// Whether the platform offers an in-app review dialog.
    async fn is_available(&self) -> Result<bool, ReviewError>;

    /// Whether requesting a review would currently do anything.
    async fn has_action(&self) -> Result<bool, ReviewError>;

    /// Show the in-app review dialog.
    async fn request_review(&self) -> Result<(), ReviewError>;

    /// Store listing URL configured for this build, if any.
    fn store_url(&self) -> Option<String>;

    /// Open a URL with the system handler.
    async fn open_url(&self, url: &str) -> Result<(), ReviewError>;
}
