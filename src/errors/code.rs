//! Error codes and their HTTP / RPC status mapping.

use axum::http::StatusCode;
use serde::{Serialize, Serializer};
use std::fmt;

/// Error code carried by every [`ServiceError`](super::ServiceError).
///
/// Web codes reuse the HTTP status number so the value can be written
/// straight into a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    /// Validation failure outside of a request (config, arguments).
    InvalidParameter,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    TooManyRequests,
    Internal,
    NotImplemented,
    BadGateway,
    Unavailable,
    GatewayTimeout,
}

/// Canonical RPC status codes (numeric values match gRPC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum RpcCode {
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    Unauthenticated = 16,
}

impl Code {
    /// Every code, in declaration order.
    pub const ALL: [Code; 12] = [
        Code::InvalidParameter,
        Code::BadRequest,
        Code::Unauthorized,
        Code::Forbidden,
        Code::NotFound,
        Code::Conflict,
        Code::TooManyRequests,
        Code::Internal,
        Code::NotImplemented,
        Code::BadGateway,
        Code::Unavailable,
        Code::GatewayTimeout,
    ];

    /// Numeric value of the code.
    pub fn as_u16(self) -> u16 {
        match self {
            Code::InvalidParameter => 1,
            Code::BadRequest => 400,
            Code::Unauthorized => 401,
            Code::Forbidden => 403,
            Code::NotFound => 404,
            Code::Conflict => 409,
            Code::TooManyRequests => 429,
            Code::Internal => 500,
            Code::NotImplemented => 501,
            Code::BadGateway => 502,
            Code::Unavailable => 503,
            Code::GatewayTimeout => 504,
        }
    }

    /// HTTP status for the code.
    ///
    /// `InvalidParameter` is not an HTTP status and is reported as 400.
    pub fn http_status(self) -> StatusCode {
        StatusCode::from_u16(self.as_u16()).unwrap_or(StatusCode::BAD_REQUEST)
    }

    /// RPC status for the code.
    pub fn rpc_code(self) -> RpcCode {
        match self.as_u16() {
            400 => RpcCode::InvalidArgument,
            401 => RpcCode::Unauthenticated,
            403 => RpcCode::PermissionDenied,
            404 => RpcCode::NotFound,
            409 => RpcCode::AlreadyExists,
            429 => RpcCode::ResourceExhausted,
            500 => RpcCode::Internal,
            501 => RpcCode::Unimplemented,
            502 | 503 => RpcCode::Unavailable,
            504 => RpcCode::DeadlineExceeded,
            _ => RpcCode::Unknown,
        }
    }

    /// Look up a code by its numeric value.
    pub fn from_u16(value: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.as_u16() == value)
    }

    /// Classify an HTTP status that was produced without a [`ServiceError`](super::ServiceError).
    ///
    /// Unlisted 4xx statuses become `BadRequest`, everything else `Internal`.
    pub fn from_http_status(status: StatusCode) -> Self {
        match Self::from_u16(status.as_u16()) {
            Some(code) if code != Code::InvalidParameter => code,
            _ if status.is_client_error() => Code::BadRequest,
            _ => Code::Internal,
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

impl Serialize for Code {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.as_u16())
    }
}

impl RpcCode {
    /// Numeric RPC status value.
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
