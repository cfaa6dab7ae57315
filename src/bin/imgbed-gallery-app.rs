use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;

use imgbed_gallery::app::config_store::{ConfigStore, InMemoryConfigStore};
use imgbed_gallery::app::routes::{AppState, router};
use imgbed_gallery::cache::ResultCache;
use imgbed_gallery::listing::{ListingClient, ListingSource};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct AppArgs {
    #[arg(long, env = "IMGBED_GALLERY_ADDR", default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    /// Domain config file (JSON, or YAML by extension). Without it every
    /// domain has gallery mode disabled.
    #[arg(long, env = "IMGBED_GALLERY_CONFIG")]
    config: Option<PathBuf>,

    /// How long a built gallery index is reused.
    #[arg(long, default_value_t = 60)]
    cache_ttl_secs: u64,

    /// Per-request timeout for ImgBed listing calls.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    imgbed_gallery::logging::init_with_default("info,tower_http=debug")?;

    let args = AppArgs::parse();
    tracing::info!(?args, "starting imgbed-gallery-app");

    let config_store: Arc<dyn ConfigStore> = match &args.config {
        Some(path) => Arc::new(
            InMemoryConfigStore::from_file(path)
                .await
                .context("load domain config")?,
        ),
        None => {
            tracing::warn!("no --config given; gallery mode is disabled for every domain");
            Arc::new(InMemoryConfigStore::default())
        }
    };
    let source: Arc<dyn ListingSource> =
        Arc::new(ListingClient::new(Duration::from_secs(args.timeout_secs))?);
    let cache = Arc::new(ResultCache::with_system_clock(Duration::from_secs(
        args.cache_ttl_secs,
    )));

    let app = router(AppState {
        config_store,
        cache,
        source,
    });

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {}: {err}", args.addr))?;
    tracing::info!(addr = %args.addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(%err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
