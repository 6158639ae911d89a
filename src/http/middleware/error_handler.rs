//! Error handler: every error response leaves the service in the `{code, message, reason, details}` shape.
//!
//! Responses rendered from a `ServiceError` pass through untouched. Anything
//! else with a 4xx/5xx status (extractor rejections, unmatched routes, timeouts)
//! is rebuilt from its status and body text.

use axum::extract::Request;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::errors::{Code, Details, ServiceError, DEFAULT_LOCALE};

/// Largest untyped error body read back into the message.
const MAX_ERROR_BODY: usize = 64 * 1024;

pub async fn handle_errors(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let status = response.status();
    if !is_error(status) || response.extensions().get::<ServiceError>().is_some() {
        return response;
    }

    let (parts, body) = response.into_parts();
    let text = match axum::body::to_bytes(body, MAX_ERROR_BODY).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).trim().to_string(),
        Err(error) => {
            tracing::debug!(error = %error, "failed to read error body");
            String::new()
        }
    };

    let mut rendered = coerce(status, &text).into_response();
    for (name, value) in parts.headers.iter() {
        if name == CONTENT_TYPE || name == CONTENT_LENGTH {
            continue;
        }
        if !rendered.headers().contains_key(name) {
            rendered.headers_mut().append(name.clone(), value.clone());
        }
    }
    rendered
}

fn is_error(status: StatusCode) -> bool {
    status.is_client_error() || status.is_server_error()
}

/// Classify an untyped error response.
pub fn coerce(status: StatusCode, body: &str) -> ServiceError {
    let message = if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_lowercase()
    } else {
        body.to_string()
    };
    let details = Details::new().with_locale_message(DEFAULT_LOCALE, message.clone());
    ServiceError::new(Code::from_http_status(status), message).with_details(details)
}
