//! LogCask Storage Layer
//!
//! This crate implements the storage engine for LogCask: an on-disk,
//! segmented, append-only log with an in-memory hash index.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────┐   put/get    ┌──────────────────────────────┐
//! │  HTTP layer │ ───────────► │  Store                       │
//! └─────────────┘              │  - index: key -> (seg, off)  │
//!                              │  - active append handle      │
//!                              └───────┬──────────────────────┘
//!                                      │ append / rotate
//!                                      ▼
//!                     data-segment-0  data-segment-7  data-segment-8
//!                     (merge target)  (sealed)        (active)
//!                                      ▲
//!                                      │ compact sealed segments
//!                              ┌───────┴────────┐
//!                              │ background     │
//!                              │ merge task     │
//!                              └────────────────┘
//! ```
//!
//! ## Main Components
//!
//! - [`Store`] - open/get/put/close over a directory of segments
//! - [`Segment`] - one append-only file and its naming contract
//! - [`StoreConfig`] - size ceiling, file prefix, read-descriptor cap
//!
//! Writes append self-delimited frames to the active segment and update
//! the index afterwards. When the active segment outgrows the ceiling,
//! the engine rotates to a new file and a background task merges the
//! sealed segments into segment 0, keeping only the newest value per
//! key.

pub mod config;
pub mod engine;
pub mod merge;
pub mod segment;

pub use config::StoreConfig;
pub use engine::{Store, StoreStatus};
pub use segment::Segment;
