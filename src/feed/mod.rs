//! Registry polling and aggregation engine
//!
//! Turns raw registry activity into a time-ordered stream of release events.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Registry   │────▶│ Aggregator  │────▶│  Ordering   │────▶ PollOutcome
//! │(feed, docs) │     │(fan-out/in) │     │  (cutoff)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//!                                                ▼
//!                                         ┌─────────────┐
//!                                         │  Detector   │
//!                                         └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`registry`]: Registry trait for discovering and resolving packages
//! - [`registries`]: Concrete registry implementations (npm)
//! - [`aggregator`]: Discovery and watch-list fan-out with failure isolation
//! - [`ordering`]: Sorting, deduplication and cutoff filtering
//! - [`detector`]: Interface to the downstream anomaly detector
//! - [`poller`]: Engine entry point
//! - [`error`]: Error types for registry and poll failures
//! - [`types`]: Common types like `ReleaseEvent` and `PollOutcome`

pub mod aggregator;
pub mod detector;
pub mod error;
pub mod ordering;
pub mod poller;
pub mod registries;
pub mod registry;
pub mod types;
