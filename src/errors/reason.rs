//! Machine-readable error reasons.

use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

/// Short machine-readable reason attached to an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Reason(Cow<'static, str>);

impl Reason {
    pub const INTERNAL: Reason = Reason::from_static("internal_server_error");
    pub const NOT_FOUND: Reason = Reason::from_static("not_found");
    pub const BAD_REQUEST: Reason = Reason::from_static("bad_request");
    pub const UNAUTHORIZED: Reason = Reason::from_static("unauthorized");
    pub const FORBIDDEN: Reason = Reason::from_static("forbidden");
    pub const TOO_MANY_REQUESTS: Reason = Reason::from_static("too_many_requests");
    pub const CONFLICT: Reason = Reason::from_static("conflict");
    pub const GATEWAY_TIMEOUT: Reason = Reason::from_static("gateway_timeout");
    pub const UNAVAILABLE: Reason = Reason::from_static("unavailable");
    pub const READYZ: Reason = Reason::from_static("readyz");

    pub const fn from_static(reason: &'static str) -> Self {
        Self(Cow::Borrowed(reason))
    }

    /// Build a service-specific reason.
    pub fn custom(reason: impl Into<String>) -> Self {
        Self(Cow::Owned(reason.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Reason {
    fn from(reason: &'static str) -> Self {
        Self::from_static(reason)
    }
}
