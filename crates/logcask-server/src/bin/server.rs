//! LogCask Backend Server Binary
//!
//! # Flags / Environment
//!
//! - `--port` / `SERVER_PORT`: HTTP port (default: 8080)
//! - `--dir` / `LOGCASK_DIR`: data directory; a throwaway temp directory
//!   is used when omitted, matching the per-container scratch deployment
//! - `--max-segment-bytes`: active segment size ceiling (default: 10 MiB)
//! - `--seed-value`: value stored under the seed key on startup
//!   (default: today's date, `YYYY-MM-DD`)
//! - `CONF_HEALTH_FAILURE=true`: make `/health` report failure
//! - `RUST_LOG`: log level (default: info)
//!
//! # Example
//!
//! ```bash
//! cargo run --bin server -- --port 8080 --dir ./data
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use logcask_server::{create_router, serve, AppState};
use logcask_store::{Store, StoreConfig};

/// Key seeded on startup so the pool serves a readable record at once.
const SEED_KEY: &str = "solo";

#[derive(Parser)]
#[command(name = "logcask-server")]
#[command(about = "LogCask backend: HTTP facade over the segment store", long_about = None)]
struct Cli {
    /// HTTP port
    #[arg(long, env = "SERVER_PORT", default_value = "8080")]
    port: u16,

    /// Data directory (temp directory when omitted)
    #[arg(long, env = "LOGCASK_DIR")]
    dir: Option<std::path::PathBuf>,

    /// Active segment size ceiling in bytes
    #[arg(long, default_value = "10485760")]
    max_segment_bytes: u64,

    /// Seed value stored under the "solo" key on startup
    #[arg(long)]
    seed_value: Option<String>,
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

    info!("Initializing database backend...");

    // Keep the temp dir guard alive for the whole process.
    let mut scratch: Option<tempfile::TempDir> = None;
    let dir = match &cli.dir {
        Some(dir) => dir.clone(),
        None => {
            let tmp = tempfile::tempdir()?;
            let path = tmp.path().to_path_buf();
            scratch = Some(tmp);
            path
        }
    };

    let store = Store::open(
        &dir,
        StoreConfig {
            max_segment_bytes: cli.max_segment_bytes,
            ..Default::default()
        },
    )
    .await?;

    let seed_value = cli
        .seed_value
        .clone()
        .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%d").to_string());
    store.put(SEED_KEY, &seed_value).await?;
    info!(key = SEED_KEY, value = %seed_value, "seeded record");

    let health_failure = std::env::var("CONF_HEALTH_FAILURE")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);

    let state = AppState {
        store: store.clone(),
        health_failure,
    };
    let router = create_router(state);

    info!("Backend ready");
    info!("  DB:      http://localhost:{}/db/{{key}}", cli.port);
    info!("  Health:  http://localhost:{}/health", cli.port);
    info!("  Swagger: http://localhost:{}/swagger-ui", cli.port);

    serve(router, cli.port).await?;

    store.close().await?;
    drop(scratch);
    Ok(())
}
