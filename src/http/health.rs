//! Liveness and readiness probes.

use async_trait::async_trait;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{Details, Reason, ServiceError, DEFAULT_LOCALE};

/// Upper bound for one readiness check.
pub const READINESS_TIMEOUT: Duration = Duration::from_millis(500);

/// Something that can tell whether the service may receive traffic.
#[async_trait]
pub trait Readiness: Send + Sync {
    async fn ready(&self) -> bool;
}

/// Always ready; the default when nothing else is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReady;

#[async_trait]
impl Readiness for AlwaysReady {
    async fn ready(&self) -> bool {
        true
    }
}

/// Shared readiness check, usable as router state.
pub type SharedReadiness = Arc<dyn Readiness>;

#[derive(Debug, Serialize)]
pub struct ProbeStatus {
    pub status: &'static str,
}

pub async fn livez() -> Json<ProbeStatus> {
    Json(ProbeStatus { status: "ok" })
}

pub async fn readyz(
    State(readiness): State<SharedReadiness>,
) -> Result<Json<ProbeStatus>, ServiceError> {
    match tokio::time::timeout(READINESS_TIMEOUT, readiness.ready()).await {
        Ok(true) => Ok(Json(ProbeStatus { status: "ready" })),
        Ok(false) => Err(not_ready()),
        Err(_) => {
            tracing::warn!(timeout_ms = READINESS_TIMEOUT.as_millis() as u64, "readiness check timed out");
            Err(not_ready())
        }
    }
}

fn not_ready() -> ServiceError {
    ServiceError::unavailable("not ready")
        .with_reason(Reason::READYZ)
        .with_details(Details::new().with_locale_message(DEFAULT_LOCALE, "not ready"))
}

/// Panics on purpose so recovery can be exercised outside production.
pub async fn panic_probe() -> &'static str {
    panic!("panic probe called")
}
