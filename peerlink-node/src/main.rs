// Peerlink node: connect to the coordination server, run the receive/dispatch
// loop, and serve cached resources to other peers over HTTP.

use std::sync::Arc;

use peerlink_node::{config, MemoryCache, PeerLink, TcpTransport};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> Result<(), Box<dyn std::error::Error>> {
    for arg in std::env::args().skip(1) {
        if arg == "--version" || arg == "-V" {
            println!("peerlink-node {VERSION}");
            return Ok(());
        }
    }

    let cfg = config::load();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&cfg.log_filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let transport = TcpTransport::connect(&cfg.server_addr).await?;
        info!(server = %cfg.server_addr, "connected");

        let link = PeerLink::start(transport, cfg.peer_port).await;
        link.set_handler(Arc::new(MemoryCache::new())).await;
        match link.peer_port() {
            Some(port) => info!(port, "peer serving enabled"),
            None => warn!("running pull-only; peer serving disabled"),
        }

        let mut closed = link.closed();
        tokio::select! {
            r = shutdown_signal() => r?,
            _ = closed.wait_for(|stopped| *stopped) => {
                error!("server link lost; shutting down");
            }
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM (Unix).
async fn shutdown_signal() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }
    Ok(())
}
