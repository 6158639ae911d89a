//! HTTP transport subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (HttpServer component: bind, serve, graceful drain)
//!     → middleware/ (request id, panic recovery, access log, error handler, timeout)
//!     → handler → Result<T, ServiceError>
//!     → response.rs (status + JSON error body)
//!     → Send to client
//! ```

pub mod config;
pub mod default;
pub mod health;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use config::HttpConfig;
pub use default::{default_router, default_server, default_server_with_readiness};
pub use health::{AlwaysReady, Readiness, SharedReadiness};
pub use request::{RequestIdExt, X_REQUEST_ID};
pub use response::fail;
pub use server::HttpServer;
