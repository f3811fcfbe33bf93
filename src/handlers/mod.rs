//! Request handler subsystem.
//!
//! # Data Flow
//! ```text
//! Request
//!     → chain.rs (ordered handlers, first claim wins)
//!         → shadow.rs (prefix match → resolver.rs → local file)
//!         → proxy.rs (URI rewrite → upstream → relayed response)
//!     → Claimed(response) | Declined(request) | HandlerError
//! ```
//!
//! # Design Decisions
//! - Declining hands the untouched request back, so the next handler sees it as received
//! - A handler error stops the chain; only a decline moves on
//! - Bodies are streamed through relay.rs in bounded chunks

pub mod chain;
pub mod proxy;
pub mod relay;
pub mod resolver;
pub mod shadow;

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::response::IntoResponse;
use futures_util::future::BoxFuture;

pub use chain::HandlerChain;
pub use proxy::{ProxyHandler, ProxySetupError};
pub use resolver::{FileResolver, ResolvedFile};
pub use shadow::ShadowHandler;

/// Result of offering a request to a handler.
#[derive(Debug)]
pub enum Outcome {
    /// The handler produced the response.
    Claimed(Response<Body>),
    /// The handler passed; the request is returned unchanged.
    Declined(Request<Body>),
}

/// Failures while producing a response for a claimed request.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[source] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    #[error("invalid upstream URI: {0}")]
    InvalidUri(String),

    #[error("response body failed: {0}")]
    Stream(#[source] axum::Error),
}

impl HandlerError {
    /// Status sent to the client for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::Io(_) | HandlerError::InvalidUri(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HandlerError::Upstream(_) | HandlerError::Stream(_) => StatusCode::BAD_GATEWAY,
            HandlerError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> axum::response::Response {
        let message = match self.status() {
            StatusCode::BAD_GATEWAY => "Upstream request failed",
            StatusCode::GATEWAY_TIMEOUT => "Upstream request timed out",
            _ => "Error serving request",
        };
        (self.status(), message).into_response()
    }
}

/// A step in the handler chain.
pub trait RequestHandler: Send + Sync {
    /// Short name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Claim the request and produce a response, or decline and return it.
    fn try_handle(&self, req: Request<Body>) -> BoxFuture<'_, Result<Outcome, HandlerError>>;
}
