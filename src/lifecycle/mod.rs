//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     run(ctx) → one task per component → start() → first failure into the slot
//!
//! Trigger (service.rs):
//!     select! { ctx cancelled / deadline, failure slot, termination signal }
//!
//! Shutdown (shutdown.rs):
//!     stop() each component in registration order → drain start tasks → Stopped
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → ShutdownReason::Signal
//! ```
//!
//! # Design Decisions
//! - Components are trait objects; the coordinator knows nothing about HTTP or SQL
//! - First trigger wins, later failures are only logged
//! - Every started component is stopped exactly once, sequentially
//! - Stop time is bounded by the caller's deadline, not by the coordinator

pub mod component;
pub mod context;
pub mod service;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use component::{Component, ComponentError};
pub use context::{Done, RunContext, StopDeadline};
pub use service::{LifecycleError, MicroService};
pub use shutdown::{RunState, ShutdownReason};
pub use signals::SignalKind;
