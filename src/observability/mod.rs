//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers, cache, server:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and gauges via the metrics facade)
//!
//! Consumers:
//!     → stdout (fmt subscriber)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Every request carries an `x-request-id` set by the HTTP layer
//! - Metrics are cheap no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
