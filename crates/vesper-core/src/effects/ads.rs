//! Ad network effects.
//!
//! # Effect Classification
//!
//! - **Category**: Platform Effect
//! - **Implementation**: host SDK bridge; `vesper_effects::NullAdNetwork` when
//!   the runtime has no ad capability
//! - **Usage**: `vesper-ads` lifecycle manager only
//!
//! A request moves through `create_request` → `subscribe` → `load` → (`Loaded`
//! event) → `show` → terminal event, then `release`. Events for a request are
//! delivered on the stream returned by `subscribe`; releasing the request ends
//! that stream, which detaches the listener.

use crate::ads::{AdEvent, AdRequestId, AdUnitId, AdUnitKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Receiving side of a request's event stream.
pub type AdEventStream = mpsc::UnboundedReceiver<AdEvent>;

/// Error type for ad network operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum AdError {
    #[error("Ad capability unavailable")]
    Unavailable,
    #[error("Ad network initialization failed: {0}")]
    InitializationFailed(String),
    #[error("Unknown ad request: {0}")]
    UnknownRequest(AdRequestId),
    #[error("Ad load failed: {0}")]
    LoadFailed(String),
    #[error("Ad show failed: {0}")]
    ShowFailed(String),
    #[error("Ads are suppressed")]
    Suppressed,
    #[error("A {0} ad is already in flight")]
    InFlight(AdUnitKind),
}

/// Per-unit request/load/show primitives of an ad network SDK.
#[async_trait]
pub trait AdNetworkEffects: Send + Sync {
    /// Initialize the SDK. Called once before any request.
    async fn initialize(&self) -> Result<(), AdError>;

    /// Whether this adapter can serve ads at all.
    fn is_available(&self) -> bool {
        true
    }

    /// Create a request for one presentation of `unit_id`.
    async fn create_request(
        &self,
        kind: AdUnitKind,
        unit_id: &AdUnitId,
    ) -> Result<AdRequestId, AdError>;

    /// Attach the event listener for a request. At most one per request.
    fn subscribe(&self, request: AdRequestId) -> Result<AdEventStream, AdError>;

    /// Start loading the creative. Completion arrives as an event.
    async fn load(&self, request: AdRequestId) -> Result<(), AdError>;

    /// Present a loaded creative.
    async fn show(&self, request: AdRequestId) -> Result<(), AdError>;

    /// Drop the request and its listeners. Idempotent.
    async fn release(&self, request: AdRequestId);
}

/// Blanket implementation for Arc<T> where T: AdNetworkEffects
#[async_trait]
impl<T: AdNetworkEffects + ?Sized> AdNetworkEffects for std::sync::Arc<T> {
    async fn initialize(&self) -> Result<(), AdError> {
        (**self).initialize().await
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    async fn create_request(
        &self,
        kind: AdUnitKind,
        unit_id: &AdUnitId,
    ) -> Result<AdRequestId, AdError> {
        (**self).create_request(kind, unit_id).await
    }

    fn subscribe(&self, request: AdRequestId) -> Result<AdEventStream, AdError> {
        (**self).subscribe(request)
    }

    async fn load(&self, request: AdRequestId) -> Result<(), AdError> {
        (**self).load(request).await
    }

    async fn show(&self, request: AdRequestId) -> Result<(), AdError> {
        (**self).show(request).await
    }

    async fn release(&self, request: AdRequestId) {
        (**self).release(request).await;
    }
}
