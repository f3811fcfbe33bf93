//! TCP listener with a bounded worker pool.
//!
//! # Responsibilities
//! - Bind to the configured host and port
//! - Hand out one worker permit per accepted connection
//! - Queue further connections in the kernel backlog while all workers are busy

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Failed to bind to address.
    Bind(std::io::Error),
    /// Failed to accept connection.
    Accept(std::io::Error),
    /// The worker pool was shut down.
    Closed,
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Bind(e) => write!(f, "Failed to bind: {}", e),
            ListenerError::Accept(e) => write!(f, "Failed to accept: {}", e),
            ListenerError::Closed => write!(f, "Worker pool closed"),
        }
    }
}

impl std::error::Error for ListenerError {}

/// A TCP listener that serves at most `workers` connections at once.
pub struct Listener {
    inner: TcpListener,
    workers: Arc<Semaphore>,
    max_workers: usize,
}

impl Listener {
    /// Bind `host:port`. Port 0 picks a free port.
    pub async fn bind(host: &str, port: u16, workers: usize) -> Result<Self, ListenerError> {
        let listener = TcpListener::bind((host, port))
            .await
            .map_err(ListenerError::Bind)?;

        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

        tracing::info!(
            address = %local_addr,
            workers,
            "Listener bound"
        );

        Ok(Self {
            inner: listener,
            workers: Arc::new(Semaphore::new(workers)),
            max_workers: workers,
        })
    }

    /// Wait for a free worker, then accept a connection.
    ///
    /// The returned permit must be held for the connection's lifetime.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr, WorkerPermit), ListenerError> {
        let permit = self
            .workers
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ListenerError::Closed)?;

        let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;

        tracing::debug!(
            peer_addr = %addr,
            idle_workers = self.workers.available_permits(),
            "Connection accepted"
        );

        Ok((stream, addr, WorkerPermit { _permit: permit }))
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }

    /// Workers not currently serving a connection.
    pub fn idle_workers(&self) -> usize {
        self.workers.available_permits()
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }
}

/// A busy worker slot, released on drop.
#[derive(Debug)]
pub struct WorkerPermit {
    _permit: OwnedSemaphorePermit,
}
