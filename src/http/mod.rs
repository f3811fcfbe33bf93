//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (net::Listener, one worker permit)
//!     → server.rs (hyper HTTP/1.1, keep-alive off, cancel token in extensions)
//!     → pipeline.rs (request id + trace layers)
//!         → CacheInterceptor (when the cache is enabled)
//!         → HandlerChain
//!     → Response written, connection closed
//! ```

pub mod pipeline;
pub mod server;

pub use pipeline::{build_router, AppState};
pub use server::{ServerError, ShadowServer};
