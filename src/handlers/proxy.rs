//! Forward requests to the upstream origin.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the upstream base path
//! - Translate request and response headers (Host is always overridden)
//! - Stream POST bodies up and every response body back through relay.rs
//!
//! # Design Decisions
//! - Redirects are relayed, never followed
//! - Outbound connections are not pooled; each exchange owns its connection
//! - Connect and header-wait are bounded by the configured timeouts

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, Response, Uri};
use futures_util::future::BoxFuture;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use url::Url;

use crate::handlers::relay::{body_reader, cancel_token, relay_body};
use crate::handlers::{HandlerError, Outcome, RequestHandler};
use crate::observability::metrics;
use crate::routing::join_paths;

/// Outbound HTTP(S) client.
pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Failures while building the outbound client.
#[derive(Debug, thiserror::Error)]
pub enum ProxySetupError {
    #[error("TLS setup failed: {0}")]
    Tls(#[from] rustls::Error),

    #[error("invalid upstream host: {0}")]
    InvalidHost(String),
}

/// Claims every request and relays it to the upstream.
pub struct ProxyHandler {
    upstream: Url,
    host: HeaderValue,
    client: UpstreamClient,
    request_timeout: Duration,
}

impl ProxyHandler {
    /// Build a handler for `upstream`, which must already be normalized.
    pub fn new(
        upstream: Url,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, ProxySetupError> {
        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_connect_timeout(Some(connect_timeout));

        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(rustls::crypto::ring::default_provider())?
            .https_or_http()
            .enable_http1()
            .wrap_connector(http);

        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(0)
            .build(https);

        let host = HeaderValue::from_str(&host_header(&upstream))
            .map_err(|_| ProxySetupError::InvalidHost(upstream.to_string()))?;

        Ok(Self {
            upstream,
            host,
            client,
            request_timeout,
        })
    }

    pub fn upstream(&self) -> &Url {
        &self.upstream
    }

    /// Map an incoming URI onto the upstream, keeping the query.
    pub fn rewrite_uri(&self, incoming: &Uri) -> Result<Uri, HandlerError> {
        let path = join_paths(&[self.upstream.path(), incoming.path()]);
        let path_and_query = match incoming.query() {
            Some(query) => format!("{path}?{query}"),
            None => path,
        };
        let authority = host_header(&self.upstream);

        Uri::builder()
            .scheme(self.upstream.scheme())
            .authority(authority.as_str())
            .path_and_query(path_and_query.as_str())
            .build()
            .map_err(|e| HandlerError::InvalidUri(e.to_string()))
    }

    async fn forward(&self, req: Request<Body>) -> Result<Outcome, HandlerError> {
        let path = req.uri().path().to_string();
        let target = self.rewrite_uri(req.uri())?;
        let cancel = cancel_token(req.extensions());
        let (parts, body) = req.into_parts();

        tracing::info!(path = %path, upstream = %target, "Forwarding {} -> {}", path, target);

        // Only POST bodies travel upstream; other methods go out empty.
        let forward_body = parts.method == Method::POST;
        let outbound_body = if forward_body {
            relay_body(body_reader(body), cancel.clone())
        } else {
            Body::empty()
        };

        let mut outbound = Request::builder()
            .method(parts.method)
            .uri(target)
            .body(outbound_body)
            .map_err(|e| HandlerError::InvalidUri(e.to_string()))?;
        // Host names the upstream, never the local listener.
        *outbound.headers_mut() = copy_request_headers(&parts.headers, &self.host, forward_body);

        // Bounds the wait for response headers; the body streams without a deadline.
        let upstream = tokio::time::timeout(self.request_timeout, self.client.request(outbound))
            .await
            .map_err(|_| HandlerError::Timeout(self.request_timeout))?
            .map_err(HandlerError::Upstream)?;

        // Status and headers as received, redirects included.
        let (parts, body) = upstream.into_parts();
        let mut response = Response::new(relay_body(body_reader(Body::new(body)), cancel));
        *response.status_mut() = parts.status;
        copy_response_headers(&parts.headers, response.headers_mut());

        metrics::record_request("proxied");
        Ok(Outcome::Claimed(response))
    }
}

impl RequestHandler for ProxyHandler {
    fn name(&self) -> &'static str {
        "proxy"
    }

    fn try_handle(&self, req: Request<Body>) -> BoxFuture<'_, Result<Outcome, HandlerError>> {
        Box::pin(self.forward(req))
    }
}

/// `host` or `host:port` when the upstream names a non-default port.
pub fn host_header(upstream: &Url) -> String {
    let host = upstream.host_str().unwrap_or_default();
    match upstream.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

/// Outbound request headers: one comma-joined value per name, Host replaced.
///
/// Framing headers are dropped when the body is not forwarded.
pub fn copy_request_headers(src: &HeaderMap, host: &HeaderValue, forward_body: bool) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(src.keys_len() + 1);

    for name in src.keys() {
        if name == header::HOST {
            continue;
        }
        if !forward_body && (name == header::CONTENT_LENGTH || name == header::TRANSFER_ENCODING) {
            continue;
        }
        if let Some(value) = joined_value(src, name) {
            out.insert(name.clone(), value);
        }
    }

    out.insert(header::HOST, host.clone());
    out
}

/// Copy upstream response headers, keeping every value.
pub fn copy_response_headers(src: &HeaderMap, dst: &mut HeaderMap) {
    for (name, value) in src {
        dst.append(name.clone(), value.clone());
    }
}

fn joined_value(src: &HeaderMap, name: &HeaderName) -> Option<HeaderValue> {
    let values: Vec<&[u8]> = src.get_all(name).iter().map(HeaderValue::as_bytes).collect();
    HeaderValue::from_bytes(&values.join(&b","[..])).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler(upstream: &str) -> ProxyHandler {
        ProxyHandler::new(
            Url::parse(upstream).unwrap(),
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap()
    }

    #[test]
    fn rewrites_onto_upstream_base() {
        let proxy = handler("http://example.com/base/");
        let uri: Uri = "/foo?x=1".parse().unwrap();
        assert_eq!(
            proxy.rewrite_uri(&uri).unwrap(),
            "http://example.com/base/foo?x=1"
        );
    }

    #[test]
    fn rewrite_keeps_trailing_slash_and_collapses_separators() {
        let proxy = handler("https://example.com:8443/");
        let uri: Uri = "/docs//guide/".parse().unwrap();
        assert_eq!(
            proxy.rewrite_uri(&uri).unwrap(),
            "https://example.com:8443/docs/guide/"
        );

        let root: Uri = "/".parse().unwrap();
        assert_eq!(proxy.rewrite_uri(&root).unwrap(), "https://example.com:8443/");
    }

    #[test]
    fn host_header_includes_only_explicit_ports() {
        assert_eq!(host_header(&Url::parse("http://example.com/").unwrap()), "example.com");
        assert_eq!(host_header(&Url::parse("http://example.com:80/").unwrap()), "example.com");
        assert_eq!(
            host_header(&Url::parse("http://example.com:8080/").unwrap()),
            "example.com:8080"
        );
        assert_eq!(
            host_header(&Url::parse("https://example.com:443/").unwrap()),
            "example.com"
        );
    }

    #[test]
    fn request_headers_are_joined_and_host_overridden() {
        let mut src = HeaderMap::new();
        src.insert(header::HOST, HeaderValue::from_static("localhost:8181"));
        src.append("x-multi", HeaderValue::from_static("a"));
        src.append("x-multi", HeaderValue::from_static("b"));
        src.insert("x-empty", HeaderValue::from_static(""));
        src.insert(header::ACCEPT, HeaderValue::from_static("text/html"));
        src.insert(header::ACCEPT_ENCODING, HeaderValue::from_static(""));

        let host = HeaderValue::from_static("example.com");
        let out = copy_request_headers(&src, &host, false);

        assert_eq!(out[header::HOST], "example.com");
        assert_eq!(out.get_all(header::HOST).iter().count(), 1);
        assert_eq!(out["x-multi"], "a,b");
        assert_eq!(out[header::ACCEPT], "text/html");
        assert_eq!(out["x-empty"], "");
        assert_eq!(out[header::ACCEPT_ENCODING], "");
    }

    #[test]
    fn framing_headers_follow_body_forwarding() {
        let mut src = HeaderMap::new();
        src.insert(header::CONTENT_LENGTH, HeaderValue::from_static("7"));
        let host = HeaderValue::from_static("example.com");

        assert!(!copy_request_headers(&src, &host, false).contains_key(header::CONTENT_LENGTH));
        assert_eq!(copy_request_headers(&src, &host, true)[header::CONTENT_LENGTH], "7");
    }

    #[test]
    fn response_headers_keep_every_value() {
        let mut src = HeaderMap::new();
        src.append(header::SET_COOKIE, HeaderValue::from_static("a=1"));
        src.append(header::SET_COOKIE, HeaderValue::from_static("b=2"));
        src.insert(header::LOCATION, HeaderValue::from_static("/login"));
        src.insert("x-empty", HeaderValue::from_static(""));

        let mut dst = HeaderMap::new();
        copy_response_headers(&src, &mut dst);

        let cookies: Vec<_> = dst.get_all(header::SET_COOKIE).iter().collect();
        assert_eq!(cookies, ["a=1", "b=2"]);
        assert_eq!(dst[header::LOCATION], "/login");
        assert_eq!(dst["x-empty"], "");
    }

    #[tokio::test]
    async fn connect_failure_is_reported() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let proxy = handler(&format!("http://127.0.0.1:{port}/"));
        let req = Request::builder().uri("/x").body(Body::empty()).unwrap();
        let err = proxy.try_handle(req).await.unwrap_err();
        assert!(err.status().is_server_error());
    }
}
