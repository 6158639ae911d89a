//! The service error type.

use axum::http::StatusCode;
use serde::Serialize;
use std::any::Any;
use std::error::Error as StdError;

use super::code::{Code, RpcCode};
use super::details::{Details, DEFAULT_LOCALE};
use super::reason::Reason;

/// Error raised by handlers and adapters, translated at the service boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("code: {code}, message: {message}{}", render_details(.details))]
pub struct ServiceError {
    code: Code,
    message: String,
    reason: Option<Reason>,
    details: Option<Details>,
}

fn render_details(details: &Option<Details>) -> String {
    match details {
        Some(details) => match serde_json::to_string(details) {
            Ok(json) => format!(", details: {json}"),
            Err(_) => String::new(),
        },
        None => String::new(),
    }
}

/// Wire shape of an error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody<'a> {
    pub code: Code,
    pub message: &'a str,
    pub reason: Option<&'a Reason>,
    pub details: Option<&'a Details>,
}

impl ServiceError {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            reason: None,
            details: None,
        }
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(Code::InvalidParameter, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(Code::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(Code::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(Code::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Code::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(Code::Conflict, message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(Code::TooManyRequests, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Code::Internal, message)
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::new(Code::NotImplemented, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(Code::BadGateway, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(Code::Unavailable, message)
    }

    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::new(Code::GatewayTimeout, message)
    }

    /// Coerce an arbitrary error into `Internal`, keeping its text as a detail.
    pub fn from_untyped(err: &(dyn StdError + 'static)) -> Self {
        if let Some(service_error) = err.downcast_ref::<ServiceError>() {
            return service_error.clone();
        }
        let message = err.to_string();
        let details = Details::new().with_locale_message(DEFAULT_LOCALE, message.clone());
        Self::internal(message).with_details(details)
    }

    pub fn with_reason(mut self, reason: impl Into<Reason>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_details(mut self, details: Details) -> Self {
        self.details = Some(details);
        self
    }

    pub fn code(&self) -> Code {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn reason(&self) -> Option<&Reason> {
        self.reason.as_ref()
    }

    pub fn details(&self) -> Option<&Details> {
        self.details.as_ref()
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn rpc_code(&self) -> RpcCode {
        self.code.rpc_code()
    }

    /// Borrowed response body `{code, message, reason, details}`.
    pub fn body(&self) -> ErrorBody<'_> {
        ErrorBody {
            code: self.code,
            message: &self.message,
            reason: self.reason.as_ref(),
            details: self.details.as_ref(),
        }
    }
}

/// Extract the text carried by a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
