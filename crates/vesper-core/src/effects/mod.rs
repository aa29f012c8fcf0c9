//! Effect traits.
//!
//! Every external collaborator of the gating policy is reached through one of
//! these traits so the policy can run against production handlers, null
//! handlers on platforms without ad capability, or deterministic test doubles.
//!
//! | trait | category | production handler |
//! |-------|----------|--------------------|
//! | [`PhysicalTimeEffects`] | infrastructure | `vesper_effects::RealTimeHandler` |
//! | [`StorageEffects`] | infrastructure | `vesper_effects::FilesystemStorageHandler` |
//! | [`AdNetworkEffects`] | platform | host SDK bridge, or `vesper_effects::NullAdNetwork` |
//! | [`StoreReviewEffects`] | platform | host SDK bridge, or `vesper_effects::NullStoreReview` |

pub mod ads;
pub mod review;
pub mod storage;
pub mod time;

pub use ads::{AdError, AdEventStream, AdNetworkEffects};
pub use review::{ReviewError, StoreReviewEffects};
pub use storage::{StorageError, StorageEffects};
pub use time::{PhysicalTimeEffects, TimeError};
