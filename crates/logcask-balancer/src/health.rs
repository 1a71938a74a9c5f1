//! Periodic Backend Health Probing
//!
//! A background task probes `GET /health` on every backend at a fixed
//! cadence (default: every 10 s) under the balancer's request timeout.
//! The result is logged and written to the backend's health flag, which
//! gates selection: a backend that fails its probe stops receiving
//! traffic until a later probe succeeds.

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::BalancerState;

/// Spawn the probe loop. The first round runs immediately.
pub fn spawn_prober(state: BalancerState) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(state.config.probe_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            probe_all(&state).await;
        }
    })
}

/// Run one probe round over every backend in the pool.
pub async fn probe_all(state: &BalancerState) {
    for backend in state.pool.backends() {
        let healthy = probe(state, backend.address()).await;
        if healthy != backend.is_healthy() {
            info!(backend = backend.address(), healthy, "backend health changed");
        } else {
            debug!(backend = backend.address(), healthy, "health probe");
        }
        backend.set_healthy(healthy);
    }
}

async fn probe(state: &BalancerState, address: &str) -> bool {
    let url = format!("{}://{}/health", state.config.scheme(), address);
    match state.client.get(&url).send().await {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}
