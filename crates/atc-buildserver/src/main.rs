use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use atc_buildserver::{AppState, ServerConfig, ServerError, router};
use atc_logging::SubscriberBuilder;
use atc_storage::{BuildRegistry, load_fixture_dir};

#[derive(Parser)]
#[command(name = "atc-events", about = "Serve build event logs as resumable event streams")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Address to listen on (overrides the config file)
    #[arg(long)]
    bind: Option<SocketAddr>,
    /// Directory of <build-id>.jsonl fixtures (overrides the config file)
    #[arg(long)]
    fixtures: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
    /// Human-readable console logs instead of JSONL
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config = config.with_bind(bind);
    }
    if let Some(dir) = cli.fixtures {
        config = config.with_fixtures_dir(dir);
    }
    if let Some(level) = cli.log_level {
        config.log.default_level = level;
    }
    if cli.pretty {
        config.log.console.pretty = true;
        config.log.console.ansi = true;
    }

    let _log_guard = SubscriberBuilder::new()
        .with_config(config.log.clone())
        .try_init()?;

    let registry = BuildRegistry::new();
    if let Some(dir) = &config.fixtures_dir {
        let loaded = load_fixture_dir(dir, &registry).await?;
        info!(dir = %dir.display(), builds = loaded, "Loaded build fixtures");
    }

    let state = AppState::new(registry).with_channel_capacity(config.channel_capacity);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|source| ServerError::Bind {
            addr: config.bind,
            source,
        })?;
    info!(addr = %config.bind, "Serving build event streams");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
