//! Request entry point shared by every connection.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::cache::{ByteCache, CacheInterceptor};
use crate::handlers::HandlerChain;
use crate::observability::metrics;

/// Application state injected into the pipeline.
#[derive(Clone)]
pub struct AppState {
    pub chain: Arc<HandlerChain>,
    pub interceptor: Option<Arc<CacheInterceptor>>,
}

impl AppState {
    /// Wrap the chain with a cache interceptor when a cache is given.
    pub fn new(chain: Arc<HandlerChain>, cache: Option<Arc<ByteCache>>) -> Self {
        let interceptor =
            cache.map(|cache| Arc::new(CacheInterceptor::new(cache, Arc::clone(&chain))));
        Self { chain, interceptor }
    }
}

/// Build the Axum router: every method and path goes to the pipeline.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .fallback(pipeline)
        .with_state(state)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

async fn pipeline(State(state): State<AppState>, req: Request<Body>) -> Response {
    let result = match &state.interceptor {
        Some(interceptor) => interceptor.handle(req).await,
        None => state.chain.dispatch(req).await,
    };

    match result {
        Ok(response) => response,
        Err(e) => {
            metrics::record_request("error");
            e.into_response()
        }
    }
}
