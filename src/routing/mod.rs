//! Path routing helpers.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → matcher.rs (shadow prefix check, sub-path extraction)
//!     → ShadowHandler resolves the sub-path against the local root
//!
//! Upstream base path + incoming path
//!     → paths.rs (join, collapse separators)
//!     → ProxyHandler rewrites the outbound URI
//! ```
//!
//! # Design Decisions
//! - Prefix matching only, case-sensitive, no regex
//! - Prefixes are normalized once at config validation
//! - The same join routine normalizes config paths and proxied paths

pub mod matcher;
pub mod paths;

pub use matcher::PathPrefixMatcher;
pub use paths::join_paths;
