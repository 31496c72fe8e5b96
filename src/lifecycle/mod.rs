//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Open database → Compile routes → Listen
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain in-flight requests
//!     → Drain background tasks → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then storage, then routes, then listener
//! - Shutdown has timeout: background work is abandoned after the grace period

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{BackgroundTasks, Shutdown};
pub use startup::{build_dispatcher, StartupError};
