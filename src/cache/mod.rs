//! Response cache subsystem.
//!
//! # Data Flow
//! ```text
//! Request URI (path + query, verbatim)
//!     → interceptor.rs (cache key)
//!     → byte_cache.rs lookup
//!         hit  → response.rs decode → replay status/headers/body
//!         miss → HandlerChain → capture full response
//!                → response.rs encode → byte_cache.rs store
//!                → deliver captured response
//! ```
//!
//! # Design Decisions
//! - The cache stores opaque bytes; WebResponse owns the encoding
//! - One cache instance per server, injected into the interceptor
//! - Keys ignore method and headers: GET and HEAD of one URI share an entry
//! - A failed store never fails the request

pub mod byte_cache;
pub mod interceptor;
pub mod response;


pub use byte_cache::{ByteCache, CacheEntry, CacheStats};
pub use interceptor::{cache_key, CacheInterceptor};
pub use response::WebResponse;

/// Errors raised when constructing a cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Errors encoding or decoding a cached response.
#[derive(Debug, thiserror::Error)]
#[error("cached response codec failed: {0}")]
pub struct CodecError(#[from] bincode::Error);
