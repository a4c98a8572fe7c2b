//! The DOTS client daemon: loads a [`ClientConfig`], connects a
//! [`UdpClientSession`], and runs the heartbeat/session-supervisor stack
//! plus the local CLI socket until interrupted or the session is
//! permanently lost.

use clap::Parser;
use dots_client::supervisor::SessionSupervisor;
use dots_client::RuntimeParams;
use dots_config::ClientConfig;
use dots_server::client::UdpClientSession;
use dots_server::DaemonError;
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
struct Args {
    /// Path to the client's YAML configuration file.
    #[arg(long, default_value = "dots-client.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), DaemonError> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = ClientConfig::from_path(&args.config)
        .map_err(|source| DaemonError::Config { path: args.config.clone(), source })?;

    let ack_timeout = Duration::from_secs_f64(config.session.idle.ack_timeout.as_f64());
    let session = UdpClientSession::connect(&config.server_address, config.cuid.clone(), ack_timeout)
        .await
        .map_err(|source| DaemonError::Bind { address: config.server_address.clone(), source })?;

    let supervisor = Arc::new(SessionSupervisor::new());
    supervisor.install(Arc::new(session)).await.ok();

    let (session_lost_tx, mut session_lost_rx) = dots_channel::mpsc::channel(1);
    let heartbeat_handle = dots_client::task::spawn(Arc::clone(&supervisor), session_lost_tx);

    let cli_params = Arc::new(RwLock::new(RuntimeParams::default()));
    let cli_cancel = CancellationToken::new();
    let cli_join = {
        let socket_path = config.cli_socket_path.clone();
        let params = Arc::clone(&cli_params);
        let cancel = cli_cancel.clone();
        tokio::spawn(async move { dots_client::cli::run(socket_path, params, cancel).await })
    };

    let shutdown_cancel = cli_cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");
        shutdown_cancel.cancel();
    });

    tokio::select! {
        _ = session_lost_rx.recv() => {
            tracing::warn!("session permanently lost, shutting down");
        }
        () = cli_cancel.cancelled() => {}
    }

    heartbeat_handle.shutdown_and_join().await;
    cli_cancel.cancel();
    if let Ok(result) = cli_join.await {
        result?;
    }
    Ok(())
}
