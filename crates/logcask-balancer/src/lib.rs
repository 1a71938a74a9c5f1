//! LogCask Load Balancer
//!
//! An HTTP reverse proxy that fans requests over a pool of stateless
//! LogCask backends. Routing is *least-bytes*: each request goes to the
//! healthy backend that has returned the fewest total response bytes so
//! far, so equal-sized responses rotate the pool and oversized responses
//! shed traffic away from their source.
//!
//! ## Components
//!
//! - [`pool::BackendPool`] - byte tallies, health flags, selection
//! - [`proxy`] - the forwarding fallback handler
//! - [`health`] - the periodic probe loop that gates selection
//! - [`BalancerConfig`] - port, timeout, scheme, tracing, backend list
//!
//! ## Example
//!
//! ```ignore
//! let state = BalancerState::new(BalancerConfig::default())?;
//! health::spawn_prober(state.clone());
//! serve(create_router(state), 8090).await?;
//! ```

use std::sync::Arc;

use axum::Router;

pub mod config;
pub mod health;
pub mod pool;
pub mod proxy;

pub use config::BalancerConfig;
pub use pool::{Backend, BackendPool};

/// Shared state: the configuration, the backend pool, and one reqwest
/// client carrying the per-request timeout for forwards and probes.
#[derive(Clone)]
pub struct BalancerState {
    pub config: Arc<BalancerConfig>,
    pub pool: Arc<BackendPool>,
    pub client: reqwest::Client,
}

impl BalancerState {
    pub fn new(config: BalancerConfig) -> Result<Self, reqwest::Error> {
        let pool = Arc::new(BackendPool::new(config.backends.iter().cloned()));
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            config: Arc::new(config),
            pool,
            client,
        })
    }
}

/// Create the balancer router: every method and path forwards.
pub fn create_router(state: BalancerState) -> Router {
    Router::new().fallback(proxy::forward).with_state(state)
}

/// Bind and serve the router until the process is stopped.
pub async fn serve(router: Router, port: u16) -> std::io::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("load balancer listening on {}", addr);
    axum::serve(listener, router).await
}
