//! LogCask Load Balancer Binary
//!
//! # Flags
//!
//! - `--port` / `BALANCER_PORT`: listen port (default: 8090)
//! - `--timeout-sec`: request and probe timeout in seconds (default: 3)
//! - `--https`: backends speak HTTPS
//! - `--trace`: include the `lb-from` header in responses
//! - `--backend`: backend authority, repeatable
//!   (default: server1:8080, server2:8080, server3:8080)
//! - `RUST_LOG`: log level (default: info)
//!
//! # Example
//!
//! ```bash
//! cargo run --bin balancer -- --trace \
//!     --backend 127.0.0.1:8081 --backend 127.0.0.1:8082
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use logcask_balancer::{create_router, health, serve, BalancerConfig, BalancerState};

#[derive(Parser)]
#[command(name = "logcask-balancer")]
#[command(about = "Least-bytes HTTP load balancer for LogCask backends", long_about = None)]
struct Cli {
    /// Load balancer port
    #[arg(long, env = "BALANCER_PORT", default_value = "8090")]
    port: u16,

    /// Request timeout time in seconds
    #[arg(long = "timeout-sec", default_value = "3")]
    timeout_sec: u64,

    /// Whether backends support HTTPS
    #[arg(long)]
    https: bool,

    /// Whether to include tracing information into responses
    #[arg(long)]
    trace: bool,

    /// Backend authority (host:port), repeatable
    #[arg(long = "backend")]
    backends: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_level = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info".to_string())
        .parse()
        .unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    let mut config = BalancerConfig {
        port: cli.port,
        timeout_secs: cli.timeout_sec,
        https: cli.https,
        trace: cli.trace,
        ..Default::default()
    };
    if !cli.backends.is_empty() {
        config.backends = cli.backends.clone();
    }

    info!("Starting load balancer...");
    info!("  Backends: {:?}", config.backends);
    info!("  Tracing support enabled: {}", config.trace);

    let port = config.port;
    let state = BalancerState::new(config)?;
    health::spawn_prober(state.clone());

    serve(create_router(state), port).await?;
    Ok(())
}
