//! # Vesper Core - Interface Layer
//!
//! Effect trait definitions, domain types and configuration shared by every
//! Vesper crate. Nothing in this crate performs I/O; production handlers live
//! in `vesper-effects` and deterministic test handlers in `vesper-testkit`.
//!
//! ```text
//! vesper-core      effect traits, types, config, errors
//!     ▲
//! vesper-effects   production handlers (clock, storage, null adapters)
//!     ▲
//! vesper-ads       gating policy, lifecycle, facade
//!     ▲
//! vesper-testkit   simulated clock, scripted ad network, fixtures
//! ```

#![forbid(unsafe_code)]

pub mod ads;
pub mod config;
pub mod effects;
pub mod errors;
pub mod time;

pub use ads::{AdEvent, AdRequestId, AdUnitId, AdUnitKind};
pub use config::{AdPolicyConfig, AdUnitIds, Platform, ReviewConfig};
pub use errors::{Result, VesperError};
pub use time::PhysicalTime;
