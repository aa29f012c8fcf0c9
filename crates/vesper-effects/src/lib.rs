//! # Vesper Effects - Production Handlers
//!
//! Stateless implementations of the effect traits in `vesper-core`.
//!
//! **Layer Constraint**: scripted and simulated handlers belong in
//! `vesper-testkit`. The null handlers here are production code: they are
//! what a build without ad capability runs.

#![forbid(unsafe_code)]

pub mod ads;
pub mod review;
pub mod storage;
pub mod time;

pub use ads::NullAdNetwork;
pub use review::NullStoreReview;
pub use storage::{FilesystemStorageHandler, MemoryStorageHandler};
pub use time::RealTimeHandler;
