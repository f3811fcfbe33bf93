//! Server runtime.
//!
//! # Responsibilities
//! - Build the handler chain, cache and router from a validated config
//! - Bind the listener and run the accept loop on start()
//! - Serve each connection with HTTP/1.1, keep-alive off
//! - Cancel in-flight transfers and release the socket on stop()

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::body::Body;
use axum::http::Request;
use axum::Router;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::TcpStream;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use crate::cache::{ByteCache, CacheError};
use crate::config::ValidatedConfig;
use crate::handlers::{HandlerChain, ProxySetupError};
use crate::http::pipeline::{build_router, AppState};
use crate::net::{ConnectionGuard, ConnectionTracker, Listener, ListenerError, WorkerPermit};

/// Errors raised while building or starting the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("listener error: {0}")]
    Listener(#[from] ListenerError),

    #[error("cache setup failed: {0}")]
    Cache(#[from] CacheError),

    #[error("upstream client setup failed: {0}")]
    Proxy(#[from] ProxySetupError),
}

struct RunningServer {
    addr: SocketAddr,
    cancel: CancellationToken,
    accept_task: JoinHandle<()>,
}

/// The shadowing HTTP server.
pub struct ShadowServer {
    config: ValidatedConfig,
    router: Router,
    cache: Option<Arc<ByteCache>>,
    tracker: ConnectionTracker,
    running: Mutex<Option<RunningServer>>,
}

impl ShadowServer {
    /// Build the server. Nothing is bound until [`ShadowServer::start`].
    pub fn new(config: ValidatedConfig) -> Result<Self, ServerError> {
        let chain = Arc::new(HandlerChain::from_config(&config)?);

        let cache = if config.route.cache_enabled {
            Some(Arc::new(ByteCache::new(config.route.cache_max_bytes)?))
        } else {
            None
        };

        let router = build_router(AppState::new(chain, cache.clone()));

        Ok(Self {
            config,
            router,
            cache,
            tracker: ConnectionTracker::new(),
            running: Mutex::new(None),
        })
    }

    /// Bind and start accepting. Returns the bound address.
    ///
    /// Calling this on a running server returns the existing address.
    pub async fn start(&self) -> Result<SocketAddr, ServerError> {
        if let Some(addr) = self.local_addr() {
            return Ok(addr);
        }

        let listener =
            Listener::bind(&self.config.host, self.config.port, self.config.workers).await?;
        let addr = listener.local_addr().map_err(ListenerError::Bind)?;

        let mut running = self.lock_running();
        if let Some(existing) = running.as_ref() {
            return Ok(existing.addr);
        }

        let cancel = CancellationToken::new();
        let accept_task = tokio::spawn(accept_loop(
            listener,
            self.router.clone(),
            cancel.clone(),
            self.tracker.clone(),
        ));

        *running = Some(RunningServer {
            addr,
            cancel,
            accept_task,
        });

        tracing::info!(
            address = %addr,
            upstream = %self.config.route.upstream,
            cache_enabled = self.cache.is_some(),
            "Shadow server started"
        );
        Ok(addr)
    }

    /// Stop accepting and abort in-flight transfers. Safe to call repeatedly.
    ///
    /// Returns once the accept loop has exited, so the listening socket is
    /// closed and the port can be bound again.
    pub async fn stop(&self) {
        let Some(running) = self.take_running() else {
            return;
        };
        running.cancel.cancel();
        if let Err(e) = running.accept_task.await {
            tracing::warn!(address = %running.addr, error = %e, "Accept loop ended abnormally");
        }
        tracing::info!(address = %running.addr, "Shadow server stopped");
    }

    pub fn is_running(&self) -> bool {
        self.lock_running().is_some()
    }

    /// Bound socket address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.lock_running().as_ref().map(|r| r.addr)
    }

    /// `http://host:port` while running.
    pub fn address(&self) -> Option<String> {
        self.local_addr()
            .map(|addr| format!("http://{}:{}", self.config.host, addr.port()))
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    pub fn cache(&self) -> Option<&Arc<ByteCache>> {
        self.cache.as_ref()
    }

    /// The request pipeline, for serving requests in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn active_connections(&self) -> u64 {
        self.tracker.active_count()
    }

    fn lock_running(&self) -> MutexGuard<'_, Option<RunningServer>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_running(&self) -> Option<RunningServer> {
        self.lock_running().take()
    }
}

impl Drop for ShadowServer {
    fn drop(&mut self) {
        // No runtime to wait on here; the socket closes once the aborted task is dropped.
        if let Some(running) = self.take_running() {
            running.cancel.cancel();
            running.accept_task.abort();
        }
    }
}

async fn accept_loop(
    listener: Listener,
    router: Router,
    cancel: CancellationToken,
    tracker: ConnectionTracker,
) {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            accepted = listener.accept() => match accepted {
                Ok((stream, peer, permit)) => {
                    let guard = tracker.track();
                    connections.spawn(serve_connection(
                        stream,
                        peer,
                        permit,
                        guard,
                        router.clone(),
                        cancel.clone(),
                    ));
                }
                Err(ListenerError::Closed) => break,
                Err(e) => tracing::warn!(error = %e, "Accept failed"),
            }
        }
    }

    connections.shutdown().await;
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    _permit: WorkerPermit,
    guard: ConnectionGuard,
    router: Router,
    cancel: CancellationToken,
) {
    let token = cancel.clone();
    let service = service_fn(move |mut req: Request<Incoming>| {
        req.extensions_mut().insert(token.clone());
        router.clone().oneshot(req.map(Body::new))
    });

    let connection = hyper::server::conn::http1::Builder::new()
        .timer(TokioTimer::new())
        .keep_alive(false)
        .serve_connection(TokioIo::new(stream), service);

    tokio::select! {
        result = connection => {
            if let Err(e) = result {
                tracing::debug!(connection_id = %guard.id(), peer = %peer, error = %e, "Connection error");
            }
        }
        _ = cancel.cancelled() => {
            tracing::debug!(connection_id = %guard.id(), peer = %peer, "Connection cancelled");
        }
    }
}
