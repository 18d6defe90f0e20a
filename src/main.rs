//! Licensegate server
//!
//! Serves the license verification endpoint, the administrative CRUD API and
//! the loader/gated scripts.
//!
//! Usage:
//!   LICENSEGATE_ADMIN_TOKEN=... licensegate --bind 0.0.0.0:3000 --data-dir /var/lib/licensegate

use anyhow::{Context, Result};
use clap::Parser;
use licensegate::config::{ENV_ADMIN_TOKEN, ENV_BIND, ENV_DATA_DIR, ENV_PUBLIC_DIR};
use licensegate::server::{open_store, serve};
use licensegate::{ServerConfig, StorageConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "licensegate")]
#[command(about = "Domain-bound license verification and admin API")]
struct Args {
    /// Address to listen on
    #[arg(short, long, env = ENV_BIND)]
    bind: Option<SocketAddr>,

    /// Directory for the license snapshot (":memory:" keeps licenses in RAM)
    #[arg(short, long, env = ENV_DATA_DIR)]
    data_dir: Option<String>,

    /// Directory containing license-check.js and core.js
    #[arg(short, long, env = ENV_PUBLIC_DIR)]
    public_dir: Option<PathBuf>,

    /// Bearer token for the admin API
    #[arg(long, env = ENV_ADMIN_TOKEN, hide_env_values = true)]
    admin_token: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> Result<ServerConfig> {
        let mut config = ServerConfig::from_env().context("reading LICENSEGATE_* environment")?;
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        match self.data_dir.as_deref() {
            Some(":memory:") => config.storage = StorageConfig::Memory,
            Some(dir) if !dir.is_empty() => config.storage = StorageConfig::File(PathBuf::from(dir)),
            _ => {}
        }
        if self.public_dir.is_some() {
            config.public_dir = self.public_dir;
        }
        if let Some(token) = self.admin_token {
            config.admin_token = token;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .compact()
        .init();

    let config = args.into_config()?;
    if config.storage == StorageConfig::Memory {
        warn!("licenses are kept in memory and will be lost on exit");
    }

    let store = open_store(&config.storage).context("opening license store")?;
    info!("licensegate starting");

    serve(config, store, shutdown_signal()).await?;
    info!("licensegate stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
