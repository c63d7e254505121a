//! HTTP server lifecycle

use std::{io, net::SocketAddr};

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{routes::app, state::AppState};

/// Adaptation server bound to one address
pub struct ApiServer {
    addr: SocketAddr,
    state: AppState,
}

impl ApiServer {
    /// Create a server for `state` listening on `addr`
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        Self { addr, state }
    }

    /// Address the server binds to
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serve until Ctrl-C
    pub async fn run(self) -> io::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        info!("LADA server listening on http://{}", listener.local_addr()?);
        info!(
            "Available models: {}",
            self.state.wrapper.list_models().join(", ")
        );

        axum::serve(listener, app(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
