//! Ordered, first-claim-wins handler chain.

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};

use crate::config::ValidatedConfig;
use crate::handlers::proxy::ProxySetupError;
use crate::handlers::{HandlerError, Outcome, ProxyHandler, RequestHandler, ShadowHandler};
use crate::observability::metrics;

/// Body sent when no handler claims a request.
pub const NOT_IMPLEMENTED_BODY: &str = "No request handler available.";

/// Tries each handler in order until one claims the request.
pub struct HandlerChain {
    handlers: Vec<Box<dyn RequestHandler>>,
}

impl HandlerChain {
    pub fn new(handlers: Vec<Box<dyn RequestHandler>>) -> Self {
        Self { handlers }
    }

    /// Shadow first, proxy last.
    pub fn from_config(config: &ValidatedConfig) -> Result<Self, ProxySetupError> {
        let shadow = ShadowHandler::from_route(&config.route);
        let proxy = ProxyHandler::new(
            config.route.upstream.clone(),
            config.connect_timeout,
            config.request_timeout,
        )?;
        Ok(Self::new(vec![Box::new(shadow), Box::new(proxy)]))
    }

    /// Names of the handlers, in order.
    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub async fn dispatch(&self, req: Request<Body>) -> Result<Response<Body>, HandlerError> {
        let path = req.uri().path().to_string();
        let mut req = req;

        for handler in &self.handlers {
            match handler.try_handle(req).await {
                Ok(Outcome::Claimed(response)) => return Ok(response),
                Ok(Outcome::Declined(returned)) => req = returned,
                Err(e) => {
                    tracing::error!(path = %path, handler = handler.name(), error = %e, "Request failed");
                    return Err(e);
                }
            }
        }

        tracing::warn!(path = %path, "No handler claimed request");
        metrics::record_request("not_implemented");
        Ok(not_implemented())
    }
}

fn not_implemented() -> Response<Body> {
    let mut response = Response::new(Body::from(NOT_IMPLEMENTED_BODY));
    *response.status_mut() = StatusCode::NOT_IMPLEMENTED;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
