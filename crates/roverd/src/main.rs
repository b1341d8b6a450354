//! roverd binary: configuration resolution, logging setup, and the
//! accept loop, wrapped with ctrl-c shutdown.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rover_core::RoverConfig;
use roverd::Server;

#[derive(Debug, Parser)]
#[command(name = "roverd", version, about = "TCP control server steering remote rovers")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the bind address.
    #[arg(long)]
    bind: Option<String>,

    /// Override the listen port.
    #[arg(long)]
    port: Option<u16>,

    /// Log filter, e.g. "info" or "roverd=debug".
    #[arg(long, default_value = "info")]
    log_filter: String,
}

impl Cli {
    /// Load the config file (defaults when absent) and apply flag
    /// overrides.
    fn resolve_config(&self) -> Result<RoverConfig> {
        let mut config = match &self.config {
            Some(path) => RoverConfig::from_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => RoverConfig::default(),
        };
        if let Some(bind) = &self.bind {
            config.bind_addr.clone_from(bind);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_filter.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = cli.resolve_config()?;
    let server = Server::bind(&config)
        .await
        .with_context(|| format!("binding {}", config.listen_addr()))?;

    tokio::select! {
        result = server.run() => result.context("accept loop failed"),
        _ = tokio::signal::ctrl_c() => {
            info!("ctrl-c received, shutting down");
            Ok(())
        },
    }
}
