//! Server lifecycle with bounded graceful shutdown
//!
//! [`AppServer`] owns the listener and the serve task. `stop` drains
//! in-flight requests but races the drain against a timer: when the timer
//! wins, the process must exit anyway, so callers treat [`Shutdown::Forced`]
//! as a nonzero exit.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How a stop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// All in-flight requests drained within the timeout.
    Graceful,
    /// The timeout elapsed (or the drain failed) and exit was forced.
    Forced,
}

#[derive(Default)]
pub struct AppServer {
    listener: Option<TcpListener>,
    local_addr: Option<SocketAddr>,
    shutdown: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<std::io::Result<()>>>,
}

impl AppServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the listener, returning the resolved local address.
    pub async fn bind(&mut self, addr: &str) -> anyhow::Result<SocketAddr> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        self.listener = Some(listener);
        self.local_addr = Some(local_addr);
        Ok(local_addr)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Spawn the serve task on the bound listener.
    pub fn start(&mut self, router: Router) -> anyhow::Result<()> {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| anyhow::anyhow!("start called before bind"))?;

        let (tx, mut rx) = watch::channel(false);
        self.shutdown = Some(tx);

        self.handle = Some(tokio::spawn(async move {
            axum::serve(listener, router.into_make_service())
                .with_graceful_shutdown(async move {
                    let _ = rx.changed().await;
                })
                .await
        }));

        Ok(())
    }

    /// Stop the server: signal the drain, then race it against `timeout`.
    pub async fn stop(mut self, signal: &str, timeout: Duration) -> Shutdown {
        if !signal.is_empty() {
            tracing::info!(signal, "stop requested");
        }

        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(true);
        }

        let Some(handle) = self.handle.take() else {
            return Shutdown::Graceful;
        };

        let drain = async {
            match handle.await {
                Ok(Ok(())) => {
                    tracing::debug!("server drained");
                    Shutdown::Graceful
                }
                Ok(Err(err)) => {
                    tracing::warn!(%err, "server failed while draining");
                    Shutdown::Forced
                }
                Err(err) => {
                    tracing::warn!(%err, "serve task panicked while draining");
                    Shutdown::Forced
                }
            }
        };

        tokio::select! {
            outcome = drain => outcome,
            _ = tokio::time::sleep(timeout) => {
                tracing::warn!(timeout_ms = timeout.as_millis() as u64, "drain timed out, forcing exit");
                Shutdown::Forced
            }
        }
    }
}
