//! Serve local files in place of upstream paths.

use std::path::Path;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use futures_util::future::BoxFuture;
use futures_util::TryStreamExt;
use tokio::io::AsyncReadExt;

use crate::config::RouteConfig;
use crate::handlers::relay::{self, cancel_token};
use crate::handlers::{FileResolver, HandlerError, Outcome, RequestHandler};
use crate::observability::metrics;
use crate::routing::PathPrefixMatcher;

/// Content type for a file, guessed from its extension.
pub fn content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Claims requests under the shadow prefix that name an existing local file.
#[derive(Debug, Clone)]
pub struct ShadowHandler {
    matcher: PathPrefixMatcher,
    resolver: FileResolver,
}

impl ShadowHandler {
    pub fn new(prefix: impl Into<String>, resolver: FileResolver) -> Self {
        Self {
            matcher: PathPrefixMatcher::new(prefix),
            resolver,
        }
    }

    pub fn from_route(route: &RouteConfig) -> Self {
        Self::new(
            route.shadow_prefix.clone(),
            FileResolver::new(&route.local_root, route.index_file.clone()),
        )
    }

    async fn serve(&self, req: Request<Body>) -> Result<Outcome, HandlerError> {
        let path = req.uri().path().to_string();

        let Some(sub_path) = self.matcher.sub_path(&path) else {
            return Ok(Outcome::Declined(req));
        };
        let Some(file) = self.resolver.resolve(sub_path).await else {
            return Ok(Outcome::Declined(req));
        };

        // Content-Length is taken from the open handle and the body capped at it.
        let handle = tokio::fs::File::open(&file.path).await?;
        let len = handle.metadata().await?.len();
        tracing::info!(path = %path, file = %file.path.display(), "Shadowing {} -> {}", path, file.path.display());

        let stream_path = path.clone();
        let stream = relay::relay(handle.take(len), cancel_token(req.extensions())).inspect_err(move |e| {
            tracing::error!(path = %stream_path, error = %e, "Failed to stream shadowed file");
        });

        let response = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type(&file.path))
            .header(header::CONTENT_LENGTH, len)
            .header(header::CACHE_CONTROL, "no-cache")
            .body(Body::from_stream(stream))
            .map_err(|e| HandlerError::Io(std::io::Error::other(e)))?;

        metrics::record_request("shadowed");
        Ok(Outcome::Claimed(response))
    }
}

impl RequestHandler for ShadowHandler {
    fn name(&self) -> &'static str {
        "shadow"
    }

    fn try_handle(&self, req: Request<Body>) -> BoxFuture<'_, Result<Outcome, HandlerError>> {
        Box::pin(self.serve(req))
    }
}
