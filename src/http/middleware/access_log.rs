//! Access log: one event when a request arrives, one when its response leaves.

use axum::body::HttpBody;
use axum::extract::{ConnectInfo, Request};
use axum::http::header::{CONTENT_LENGTH, REFERER, USER_AGENT};
use axum::http::{HeaderMap, HeaderName};
use axum::middleware::Next;
use axum::response::Response;
use std::net::SocketAddr;
use std::time::Instant;

use crate::errors::ServiceError;
use crate::http::request::RequestIdExt;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

struct RequestInfo {
    request_id: String,
    method: String,
    path: String,
    query: String,
    ip: String,
    user_agent: String,
    referer: String,
    request_size: u64,
}

impl RequestInfo {
    fn capture(request: &Request) -> Self {
        let headers = request.headers();
        Self {
            request_id: request.request_id().unwrap_or_default().to_string(),
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
            query: request.uri().query().unwrap_or_default().to_string(),
            ip: client_ip(request),
            user_agent: header_str(headers, &USER_AGENT).to_string(),
            referer: header_str(headers, &REFERER).to_string(),
            request_size: header_str(headers, &CONTENT_LENGTH).parse().unwrap_or(0),
        }
    }
}

macro_rules! completed {
    ($level:ident, $info:ident, $status:expr, $latency_ms:expr, $size:expr, $error:expr) => {
        tracing::$level!(
            request_id = %$info.request_id,
            method = %$info.method,
            path = %$info.path,
            query = %$info.query,
            ip = %$info.ip,
            user_agent = %$info.user_agent,
            referer = %$info.referer,
            request_size = $info.request_size,
            status = $status,
            latency_ms = $latency_ms,
            response_size = $size,
            error = $error,
            "request completed"
        )
    };
}

pub async fn log_requests(request: Request, next: Next) -> Response {
    let info = RequestInfo::capture(&request);
    tracing::info!(
        request_id = %info.request_id,
        method = %info.method,
        path = %info.path,
        query = %info.query,
        ip = %info.ip,
        user_agent = %info.user_agent,
        referer = %info.referer,
        request_size = info.request_size,
        "request received"
    );

    let started = Instant::now();
    let response = next.run(request).await;
    let latency_ms = started.elapsed().as_millis() as u64;

    let status = response.status().as_u16();
    let response_size = response_size(&response);
    let error = response
        .extensions()
        .get::<ServiceError>()
        .map(ToString::to_string);
    let error = error.as_deref();

    if status >= 500 {
        completed!(error, info, status, latency_ms, response_size, error);
    } else if status >= 400 {
        completed!(warn, info, status, latency_ms, response_size, error);
    } else {
        completed!(info, info, status, latency_ms, response_size, error);
    }

    response
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

/// Client address: first `x-forwarded-for` hop, then `x-real-ip`, then the peer address.
fn client_ip(request: &Request) -> String {
    let headers = request.headers();
    if let Some(forwarded) = headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').map(str::trim).find(|hop| !hop.is_empty()) {
            return first.to_string();
        }
    }
    if let Some(real_ip) = headers.get(X_REAL_IP).and_then(|v| v.to_str().ok()) {
        if !real_ip.trim().is_empty() {
            return real_ip.trim().to_string();
        }
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default()
}

fn response_size(response: &Response) -> u64 {
    let declared = header_str(response.headers(), &CONTENT_LENGTH).parse().ok();
    declared
        .or_else(|| response.body().size_hint().exact())
        .unwrap_or(0)
}
