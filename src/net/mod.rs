//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (worker permit, then accept)
//!     → connection.rs (id + active-connection tracking)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - The permit is taken before accept(), so excess clients wait in the backlog
//! - Permits and guards are released on drop, even if a connection task panics

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{Listener, ListenerError, WorkerPermit};
