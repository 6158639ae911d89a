//! Rendering service errors as HTTP responses.
//!
//! # Responsibilities
//! - Turn a `ServiceError` into status + JSON `{code, message, reason, details}`
//! - Leave the error in the response extensions for the access log and error handler
//!
//! # Design Decisions
//! - Handlers return `Result<T, ServiceError>`; `fail` lifts any error into that shape

use axum::response::{IntoResponse, Response};
use axum::Json;
use std::error::Error as StdError;

use crate::errors::ServiceError;

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let mut response = (self.http_status(), Json(self.body())).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// Abort a handler with `err`, keeping typed errors and coercing the rest to `Internal`.
pub fn fail<T, E>(err: E) -> Result<T, ServiceError>
where
    E: StdError + 'static,
{
    Err(ServiceError::from_untyped(&err))
}
