//! Vesper Testing Infrastructure
//!
//! Deterministic effect handlers and fixtures for policy tests. Nothing here
//! touches the wall clock, the filesystem or a real ad SDK.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! vesper-testkit = { path = "../vesper-testkit" }
//! ```
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use vesper_testkit::PolicyFixture;
//!
//! # async fn example() {
//! let fixture = PolicyFixture::new();
//! let policy = fixture.start().await;
//! policy.track_interaction().await;
//! fixture.clock.advance(Duration::from_secs(21));
//! # }
//! ```

pub mod ads;
pub mod fixtures;
pub mod logging;
pub mod review;
pub mod storage;
pub mod time;

pub use ads::{LoadScript, ScriptedAdNetwork, ShowScript};
pub use fixtures::{settle, PolicyFixture, FIXTURE_START_MS};
pub use logging::init_test_tracing;
pub use review::ScriptedStoreReview;
pub use storage::FailingStorage;
pub use time::SimulatedClock;
