//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build server → start()
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → stop() → Exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Stopping cancels in-flight transfers rather than draining them

pub mod signals;

pub use signals::shutdown_signal;
