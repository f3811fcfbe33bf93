//! Full-response caching around the handler chain.
//!
//! # Responsibilities
//! - Derive the cache key from the request URI
//! - Replay stored responses without touching the chain
//! - Capture, store and deliver chain responses on a miss

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};

use crate::cache::{ByteCache, WebResponse};
use crate::handlers::{HandlerChain, HandlerError};
use crate::observability::metrics;

/// Cache key for a request: path and query exactly as received.
pub fn cache_key<B>(req: &Request<B>) -> String {
    req.uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string())
}

/// Wraps a [`HandlerChain`] with a [`ByteCache`].
pub struct CacheInterceptor {
    cache: Arc<ByteCache>,
    chain: Arc<HandlerChain>,
}

impl CacheInterceptor {
    pub fn new(cache: Arc<ByteCache>, chain: Arc<HandlerChain>) -> Self {
        Self { cache, chain }
    }

    pub fn cache(&self) -> &Arc<ByteCache> {
        &self.cache
    }

    /// Serve from cache, or run the chain and remember its response.
    pub async fn handle(&self, req: Request<Body>) -> Result<Response<Body>, HandlerError> {
        let key = cache_key(&req);

        // Hit: replay without running the chain.
        if let Some(stored) = self.cache.get(&key) {
            match WebResponse::from_bytes(&stored) {
                Ok(response) => {
                    tracing::info!(path = %req.uri().path(), "Forwarding {} -> cached", req.uri().path());
                    metrics::record_request("cache_hit");
                    return Ok(response.into_response());
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Discarding unreadable cache entry");
                }
            }
        }

        // Miss: buffer the whole response first, store it, then deliver the same bytes.
        let response = self.chain.dispatch(req).await?;
        let (parts, body) = response.into_parts();
        let body = axum::body::to_bytes(body, usize::MAX).await.map_err(|e| {
            tracing::error!(path = %key, error = %e, "Failed to capture response body");
            HandlerError::Stream(e)
        })?;

        let captured = WebResponse::capture(&parts, &body);
        match captured.to_bytes() {
            Ok(encoded) => {
                // A rejected put still delivers the response.
                if !self.cache.put(&key, encoded) {
                    tracing::warn!(key = %key, size = body.len(), "Cache is full");
                }
            }
            Err(e) => tracing::warn!(key = %key, error = %e, "Failed to encode response for cache"),
        }

        Ok(Response::from_parts(parts, Body::from(body)))
    }
}
