//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Normalize the upstream URL and shadow prefix
//! - Resolve the local root to a canonical directory
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Produces a typed `ValidatedConfig`; the server never sees raw strings
//! - Runs before the server is constructed

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::config::schema::ShadowConfig;
use crate::routing::join_paths;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener port must be a positive integer")]
    InvalidPort,

    #[error("listener workers must be at least 1")]
    InvalidWorkers,

    #[error("upstream URL must be a valid URI: {0}")]
    InvalidUpstreamUrl(String),

    #[error("upstream URL must have valid protocol scheme (http or https), got {0:?}")]
    UnsupportedScheme(String),

    #[error("upstream URL must have a valid host name")]
    MissingUpstreamHost,

    #[error("local root {0:?} does not exist or is not a directory")]
    InvalidLocalRoot(String),

    #[error("cache max_bytes must be greater than zero")]
    InvalidCacheCapacity,

    #[error("timeout {0} must be greater than zero")]
    InvalidTimeout(&'static str),
}

/// Routing settings consumed by the handlers and the cache.
#[derive(Debug, Clone)]
pub struct RouteConfig {
    /// Shadow prefix, always starting and ending with `/`.
    pub shadow_prefix: String,
    /// Canonical local root directory.
    pub local_root: PathBuf,
    /// Index file looked up when a directory is requested.
    pub index_file: Option<String>,
    /// Upstream base URL, path always ending with `/`.
    pub upstream: Url,
    pub cache_enabled: bool,
    pub cache_max_bytes: u64,
}

/// Fully validated server settings.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub route: RouteConfig,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

/// Validate and normalize a raw configuration.
pub fn validate_config(config: &ShadowConfig) -> Result<ValidatedConfig, Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::InvalidPort);
    }
    if config.listener.workers == 0 {
        errors.push(ValidationError::InvalidWorkers);
    }

    let upstream = match normalize_upstream(&config.upstream.url) {
        Ok(url) => Some(url),
        Err(e) => {
            errors.push(e);
            None
        }
    };

    let local_root = match std::fs::canonicalize(&config.shadow.local_root) {
        Ok(path) if path.is_dir() => Some(path),
        _ => {
            errors.push(ValidationError::InvalidLocalRoot(
                config.shadow.local_root.clone(),
            ));
            None
        }
    };

    if config.cache.enabled && config.cache.max_bytes == 0 {
        errors.push(ValidationError::InvalidCacheCapacity);
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::InvalidTimeout("connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::InvalidTimeout("request_secs"));
    }

    match (upstream, local_root) {
        (Some(upstream), Some(local_root)) if errors.is_empty() => Ok(ValidatedConfig {
            host: config.listener.host.clone(),
            port: config.listener.port,
            workers: config.listener.workers,
            route: RouteConfig {
                shadow_prefix: normalize_shadow_prefix(&config.shadow.path_prefix),
                local_root,
                index_file: config
                    .shadow
                    .index_file
                    .as_ref()
                    .map(|name| name.trim().to_string())
                    .filter(|name| !name.is_empty()),
                upstream,
                cache_enabled: config.cache.enabled,
                cache_max_bytes: config.cache.max_bytes,
            },
            connect_timeout: Duration::from_secs(config.timeouts.connect_secs),
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
        }),
        _ => Err(errors),
    }
}

/// Normalize a shadow prefix to start and end with `/`.
pub fn normalize_shadow_prefix(prefix: &str) -> String {
    join_paths(&["/", prefix, "/"])
}

/// Parse the upstream URL and make its path end with `/`.
pub fn normalize_upstream(raw: &str) -> Result<Url, ValidationError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ValidationError::InvalidUpstreamUrl(e.to_string()))?;

    let scheme = url.scheme().to_ascii_lowercase();
    if scheme != "http" && scheme != "https" {
        return Err(ValidationError::UnsupportedScheme(scheme));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::MissingUpstreamHost);
    }

    let path = join_paths(&[url.path(), "/"]);
    url.set_path(&path);
    url.set_fragment(None);
    Ok(url)
}
