//! HTTP surface of the monitor.
//!
//! A single Axum server takes webhook level reports from the external
//! metering application, serves status snapshots, and streams every
//! published metric to WebSocket subscribers.

mod routes;
mod ws;

pub use routes::{build_router, HealthResponse, HttpServerError, IngestAck};

use std::net::SocketAddr;

use anyhow::Context;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::context::AppContext;

/// Running server; dropping it stops the listener
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<anyhow::Result<()>>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections and wait for the server task
    pub async fn shutdown(mut self) -> anyhow::Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        match self.task.take() {
            Some(task) => task.await.context("joining HTTP server task")?,
            None => Ok(()),
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Bind `addr` and serve the router in a background task
///
/// Port 0 picks a free port; see [`ServerHandle::local_addr`].
pub async fn start_server(context: AppContext, addr: SocketAddr) -> anyhow::Result<ServerHandle> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding HTTP listener on {}", addr))?;
    let addr = listener
        .local_addr()
        .context("reading HTTP listener address")?;
    let router = build_router(context);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
            .context("serving HTTP router")
    });

    log::info!("[HTTP] Listening on {}", addr);

    Ok(ServerHandle {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    })
}
