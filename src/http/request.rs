//! Request correlation ids.
//!
//! # Responsibilities
//! - Generate a UUID v4 request id when the client sent none
//! - Echo the id back in the `x-request-id` response header
//! - Let handlers and middleware read the id
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A client-supplied id is trusted and kept as-is

use axum::http::request::Parts;
use axum::http::{HeaderMap, Request};
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};

/// Header carrying the request id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Layer that assigns an id to requests lacking one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Layer that copies the request id onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

/// Access to the id assigned by [`set_request_id_layer`].
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;
}

fn lookup<'a>(extension: Option<&'a RequestId>, headers: &'a HeaderMap) -> Option<&'a str> {
    extension
        .map(RequestId::header_value)
        .or_else(|| headers.get(X_REQUEST_ID))
        .and_then(|value| value.to_str().ok())
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<&str> {
        lookup(self.extensions().get::<RequestId>(), self.headers())
    }
}

impl RequestIdExt for Parts {
    fn request_id(&self) -> Option<&str> {
        lookup(self.extensions.get::<RequestId>(), &self.headers)
    }
}
