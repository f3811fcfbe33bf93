//! Shadowing development server.
//!
//! Serves files from a local directory for one URL prefix and forwards every
//! other request to a remote upstream, with an optional in-memory response cache.

pub mod cache;
pub mod config;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use cache::{ByteCache, CacheInterceptor, WebResponse};
pub use config::{ShadowConfig, ValidatedConfig};
pub use handlers::{HandlerChain, Outcome, ProxyHandler, RequestHandler, ShadowHandler};
pub use http::{ServerError, ShadowServer};
