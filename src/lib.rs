//! Building blocks for HTTP microservices.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────── MicroService (lifecycle) ────────────────────────────┐
//!   │                                                                                   │
//!   │   start() each component on its own task        first of:                         │
//!   │   ┌──────────────┐  ┌──────────────┐            - RunContext cancelled/expired    │
//!   │   │  HttpServer  │  │ your worker  │  ...       - a start() failure (or panic)    │
//!   │   │   (http)     │  │ (Component)  │            - SIGINT / SIGTERM                │
//!   │   └──────┬───────┘  └──────────────┘                      │                       │
//!   │          │                                                ▼                       │
//!   │          │                                  stop() each, in registration order    │
//!   └──────────┼────────────────────────────────────────────────────────────────────────┘
//!              ▼
//!   request id → panic recovery → access log → error handler → timeout → handler
//!                                                                          │
//!                                                   Result<T, ServiceError> (errors)
//!                                                                          │
//!                                                  database::map_error ◀───┘
//!
//!   Cross-cutting: observability::Logger (injected), config::ServiceConfig (TOML)
//! ```

// Core
pub mod errors;
pub mod lifecycle;

// Adapters
pub mod database;
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod observability;

pub use config::ServiceConfig;
pub use errors::{Code, ServiceError};
pub use http::HttpServer;
pub use lifecycle::{Component, ComponentError, MicroService, RunContext, ShutdownReason};
pub use observability::Logger;
