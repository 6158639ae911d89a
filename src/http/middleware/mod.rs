//! Middleware stack shared by every HTTP server.
//!
//! # Data Flow
//! ```text
//! request
//!     → logger (attached by HttpServer)
//!     → request id (set + propagate)
//!     → panic recovery
//!     → access log
//!     → error handler
//!     → request timeout
//!     → handler
//! ```

pub mod access_log;
pub mod error_handler;
pub mod logger;
pub mod panic;

pub use logger::with_logger;

use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::Router;
use tower_http::timeout::TimeoutLayer;

use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::HttpConfig;

/// Wrap `router` in the standard stack. Also covers the fallback route.
pub fn apply<S>(router: Router<S>, config: &HttpConfig) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let router = match config.request_timeout() {
        Some(timeout) => router.layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            timeout,
        )),
        None => router,
    };

    // Last layer added runs first.
    router
        .layer(from_fn(error_handler::handle_errors))
        .layer(from_fn(access_log::log_requests))
        .layer(panic::layer(config))
        .layer(propagate_request_id_layer())
        .layer(set_request_id_layer())
}
