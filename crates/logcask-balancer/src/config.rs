//! Balancer Configuration
//!
//! Mirrors the balancer's command-line flags: listen port, per-request
//! timeout, backend scheme, tracing, and the backend pool itself.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalancerConfig {
    /// Load balancer listen port (default: 8090)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-request and health-probe timeout in seconds (default: 3)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Whether backends speak HTTPS
    #[serde(default)]
    pub https: bool,

    /// Include the `lb-from` tracing header in responses
    #[serde(default)]
    pub trace: bool,

    /// Seconds between health-probe rounds (default: 10)
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,

    /// Backend authorities to balance over
    #[serde(default = "default_backends")]
    pub backends: Vec<String>,
}

impl BalancerConfig {
    pub fn scheme(&self) -> &'static str {
        if self.https {
            "https"
        } else {
            "http"
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            https: false,
            trace: false,
            probe_interval_secs: default_probe_interval_secs(),
            backends: default_backends(),
        }
    }
}

fn default_port() -> u16 {
    8090
}

fn default_timeout_secs() -> u64 {
    3
}

fn default_probe_interval_secs() -> u64 {
    10
}

fn default_backends() -> Vec<String> {
    vec![
        "server1:8080".to_string(),
        "server2:8080".to_string(),
        "server3:8080".to_string(),
    ]
}
