//! The DOTS server daemon: loads a [`ServerConfig`], builds the mitigation
//! engine/telemetry/lifetime stack, and serves the signal channel until
//! interrupted.

use clap::Parser;
use dots_config::ServerConfig;
use dots_server::server;
use dots_server::DaemonError;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
struct Args {
    /// Path to the server's YAML configuration file.
    #[arg(long, default_value = "dots-server.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), DaemonError> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = ServerConfig::from_path(&args.config)
        .map_err(|source| DaemonError::Config { path: args.config.clone(), source })?;

    let handle = Arc::new(server::ServerHandle::build(&config));

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");
        signal_cancel.cancel();
    });

    server::run(handle, &config.listen_address, cancel).await
}
