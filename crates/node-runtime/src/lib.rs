//! # Node Runtime Library
//!
//! This library exposes the internal modules of the node runtime for testing.
//! The main entry point is the `main.rs` binary.
//!
//! ## Modular Structure
//!
//! - `container/` - configuration and subsystem wiring
//! - `adapters/` - port implementations (HTTP transport, in-process bridges)
//! - `handlers/` - axum routes of the peer protocol
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults → file → env → CLI)
//! 2. Build the subsystem container
//! 3. Bind the first free port in `port..port + max_port_attempts`,
//!    reporting every port tried to discovery
//! 4. The join countdown runs from the last report
//! 5. Start the ping and tick loops
//! 6. Serve the peer protocol until shutdown

pub mod adapters;
pub mod container;
pub mod handlers;
pub mod telemetry;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::adapters::HttpTransport;
use crate::container::{NodeConfig, NodeContainer, NodeTransport};
use crate::handlers::router;

/// A running node: subsystems plus the HTTP server.
pub struct NodeRuntime<T: NodeTransport = HttpTransport> {
    container: NodeContainer<T>,
    shutdown_tx: watch::Sender<bool>,
    server: Mutex<Option<JoinHandle<()>>>,
}

impl NodeRuntime<HttpTransport> {
    /// Build a node that talks to its peers over HTTP.
    pub fn new(config: NodeConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(config.request_timeout()));
        Self::with_transport(config, transport)
    }
}

impl<T: NodeTransport> NodeRuntime<T> {
    pub fn with_transport(config: NodeConfig, transport: Arc<T>) -> Result<Self> {
        let container =
            NodeContainer::new(config, transport).context("Failed to initialize subsystems")?;
        Ok(Self::from_container(container))
    }

    pub fn from_container(container: NodeContainer<T>) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            container,
            shutdown_tx,
            server: Mutex::new(None),
        }
    }

    pub fn container(&self) -> &NodeContainer<T> {
        &self.container
    }

    /// Bind, start discovery and round production, and serve.
    ///
    /// Returns the bound address.
    pub async fn start(&self) -> Result<SocketAddr> {
        let config = &self.container.config;
        info!("===========================================");
        info!("  Clockchain Node Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("  Address: {}", self.container.credentials.signing_address());
        info!("===========================================");

        let discovery = &self.container.discovery;
        let listener = bind_with_fallback(
            config.host,
            config.port,
            config.max_port_attempts,
            |candidate| discovery.set_port(candidate),
        )
        .await?;
        let local_addr = listener.local_addr().context("Listener has no local address")?;
        if discovery.local_port() != Some(local_addr.port()) {
            // Port 0 lets the OS choose.
            discovery.set_port(local_addr.port());
        }
        self.container.rounds.spawn();

        let app = router(self.container.app_state());
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let handle = tokio::spawn(async move {
            let result = axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.wait_for(|stop| *stop).await;
            })
            .await;
            if let Err(e) = result {
                error!("HTTP server error: {}", e);
            }
        });
        *self.server.lock() = Some(handle);

        info!(addr = %local_addr, "Node is serving");
        Ok(local_addr)
    }

    /// Stop background loops and drain the HTTP server.
    pub async fn shutdown(&self) {
        info!("Shutting down node runtime");
        self.container.shutdown();
        let _ = self.shutdown_tx.send(true);

        let handle = self.server.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("HTTP server task failed: {}", e);
            }
        }
        info!("Node runtime stopped");
    }
}

/// Bind the first free port in `port..port + attempts`.
///
/// `on_attempt` sees every port before it is tried.
pub async fn bind_with_fallback(
    host: IpAddr,
    port: u16,
    attempts: u16,
    mut on_attempt: impl FnMut(u16),
) -> Result<TcpListener> {
    for offset in 0..attempts {
        let Some(candidate) = port.checked_add(offset) else {
            break;
        };
        on_attempt(candidate);
        match TcpListener::bind(SocketAddr::new(host, candidate)).await {
            Ok(listener) => return Ok(listener),
            Err(e) => debug!(port = candidate, "Port unavailable: {}", e),
        }
    }
    bail!(
        "No free port in {}..{} on {}",
        port,
        port.saturating_add(attempts),
        host
    )
}
