//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! LoggerConfig (console + file sinks, levels, meta)
//!     → logging.rs builds a tracing Dispatch with one fmt layer per sink
//!     → Logger handle injected into MicroService / HttpServer
//!     → lifecycle + middleware emit structured events (name, address, error, latency)
//!     → Logger::flush at process end drains the file writer
//! ```
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON for machines, logfmt-style text for humans, chosen per sink
//! - The logger is a value passed to its consumers, not ambient global state;
//!   installing it globally is an explicit opt-in

pub mod logging;

pub use logging::{
    ConsoleConfig, ConsoleMode, FileConfig, FileRotation, LogFormat, Logger, LoggerConfig,
    LoggingError,
};
