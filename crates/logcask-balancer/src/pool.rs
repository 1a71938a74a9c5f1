//! Backend Pool and Least-Bytes Selection
//!
//! Each backend carries a running tally of the response bytes it has
//! returned through the balancer and a health flag maintained by the
//! probe loop. Selection picks the healthy backend with the smallest
//! tally; with equal-sized responses this degenerates into round-robin,
//! and a slow or chatty backend naturally receives less traffic.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// One upstream backend and its bookkeeping.
#[derive(Debug)]
pub struct Backend {
    address: String,
    bytes_served: AtomicU64,
    healthy: AtomicBool,
}

impl Backend {
    fn new(address: String) -> Self {
        Self {
            address,
            bytes_served: AtomicU64::new(0),
            // Optimistic until the first probe says otherwise.
            healthy: AtomicBool::new(true),
        }
    }

    /// Authority (`host:port`) of this backend.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Total response bytes returned through the balancer so far.
    pub fn bytes_served(&self) -> u64 {
        self.bytes_served.load(Ordering::Relaxed)
    }

    pub fn add_bytes(&self, n: u64) {
        self.bytes_served.fetch_add(n, Ordering::Relaxed);
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::Relaxed);
    }
}

/// Fixed set of backends shared between the proxy and the prober.
#[derive(Debug)]
pub struct BackendPool {
    backends: Vec<Arc<Backend>>,
}

impl BackendPool {
    pub fn new(addresses: impl IntoIterator<Item = String>) -> Self {
        Self {
            backends: addresses
                .into_iter()
                .map(|address| Arc::new(Backend::new(address)))
                .collect(),
        }
    }

    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    /// The healthy backend with the fewest total bytes served, ties
    /// broken by pool order. `None` when every backend is unhealthy.
    pub fn least_loaded(&self) -> Option<Arc<Backend>> {
        self.backends
            .iter()
            .filter(|backend| backend.is_healthy())
            .min_by_key(|backend| backend.bytes_served())
            .cloned()
    }
}
