//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + CLI overrides
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, normalization)
//!     → ValidatedConfig (typed, immutable)
//!     → consumed once when the server is constructed
//! ```
//!
//! # Design Decisions
//! - Config is immutable for the lifetime of a server
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{CacheConfig, ListenerConfig, ShadowConfig, ShadowPathConfig, UpstreamConfig};
pub use validation::{validate_config, RouteConfig, ValidatedConfig, ValidationError};
