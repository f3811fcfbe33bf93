//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the shadow server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Default in-memory response cache capacity (64 MiB).
pub const DEFAULT_CACHE_MAX_BYTES: u64 = 64 * 1024 * 1024;

/// Root configuration for the shadow server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ShadowConfig {
    /// Listener configuration (bind host/port, worker pool).
    pub listener: ListenerConfig,

    /// Upstream web application being shadowed.
    pub upstream: UpstreamConfig,

    /// Local directory served in place of the upstream.
    pub shadow: ShadowPathConfig,

    /// Full-response cache.
    pub cache: CacheConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host or IP to bind to.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Number of requests served concurrently. Further connections queue.
    pub workers: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8181,
            workers: 5,
        }
    }
}

/// Upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Absolute `http`/`https` URL of the real web application.
    pub url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080/".to_string(),
        }
    }
}

/// Shadowing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShadowPathConfig {
    /// URL path prefix served from `local_root`.
    pub path_prefix: String,

    /// Local directory holding the shadowing files.
    pub local_root: String,

    /// File served when a directory is requested. Blank disables index lookup.
    pub index_file: Option<String>,
}

impl Default for ShadowPathConfig {
    fn default() -> Self {
        Self {
            path_prefix: "/".to_string(),
            local_root: ".".to_string(),
            index_file: Some("index.html".to_string()),
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache full responses keyed by request URI.
    pub enabled: bool,

    /// Capacity in bytes, keys included.
    pub max_bytes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_bytes: DEFAULT_CACHE_MAX_BYTES,
        }
    }
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for the upstream to produce response headers, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9181".to_string(),
        }
    }
}
