//! Storage Configuration
//!
//! This module defines configuration for the storage engine.
//!
//! ## StoreConfig
//!
//! Controls how segments are named, rolled, and read:
//!
//! - **max_segment_bytes**: Roll the active segment when its size strictly
//!   exceeds this (default: 10 MiB)
//! - **segment_prefix**: File-name prefix for segment files (default:
//!   `data-segment`, producing `data-segment-0`, `data-segment-1`, ...)
//! - **read_slots**: Maximum number of simultaneously open read file
//!   descriptors (default: 20)
//!
//! ## Usage
//!
//! ```ignore
//! use logcask_store::StoreConfig;
//!
//! // Production config
//! let config = StoreConfig::default();
//!
//! // Test config that rotates on every put
//! let config = StoreConfig {
//!     max_segment_bytes: 1,
//!     ..Default::default()
//! };
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Roll the active segment when its size strictly exceeds this (default: 10 MiB)
    #[serde(default = "default_max_segment_bytes")]
    pub max_segment_bytes: u64,

    /// File-name prefix for segment files (default: "data-segment")
    #[serde(default = "default_segment_prefix")]
    pub segment_prefix: String,

    /// Cap on simultaneously open read file descriptors (default: 20)
    #[serde(default = "default_read_slots")]
    pub read_slots: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_segment_bytes: default_max_segment_bytes(),
            segment_prefix: default_segment_prefix(),
            read_slots: default_read_slots(),
        }
    }
}

fn default_max_segment_bytes() -> u64 {
    10 * 1024 * 1024 // 10 MiB
}

fn default_segment_prefix() -> String {
    "data-segment".to_string()
}

fn default_read_slots() -> usize {
    20
}
