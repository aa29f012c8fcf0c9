//! Null ad network.
//!
//! Selected when the runtime has no ad capability (web builds, development
//! shells without the native SDK) or when the real adapter fails to
//! initialize. Every request is refused with [`AdError::Unavailable`], so the
//! policy above degrades to "no ad shown" without branching on availability.

use async_trait::async_trait;
use vesper_core::effects::{AdError, AdEventStream, AdNetworkEffects};
use vesper_core::{AdRequestId, AdUnitId, AdUnitKind};

/// Ad network that never serves ads.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAdNetwork;

impl NullAdNetwork {
    /// Create a null ad network
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AdNetworkEffects for NullAdNetwork {
    async fn initialize(&self) -> Result<(), AdError> {
        Ok(())
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn create_request(
        &self,
        kind: AdUnitKind,
        _unit_id: &AdUnitId,
    ) -> Result<AdRequestId, AdError> {
        tracing::trace!(%kind, "null ad network refused request");
        Err(AdError::Unavailable)
    }

    fn subscribe(&self, _request: AdRequestId) -> Result<AdEventStream, AdError> {
        Err(AdError::Unavailable)
    }

    async fn load(&self, _request: AdRequestId) -> Result<(), AdError> {
        Err(AdError::Unavailable)
    }

    async fn show(&self, _request: AdRequestId) -> Result<(), AdError> {
        Err(AdError::Unavailable)
    }

    async fn release(&self, _request: AdRequestId) {}
}
