//! Stop phase and the vocabulary describing how a run ended.

use futures_util::FutureExt;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;

use super::component::{Component, ComponentError};
use super::context::{RunContext, StopDeadline};
use super::signals::SignalKind;
use crate::errors::panic_message;

/// Coordinator state, published through [`MicroService::state`](super::MicroService::state).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

/// What made a run begin shutting down. The first trigger wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    /// The run context was cancelled.
    Cancelled,
    /// The run context's deadline passed.
    DeadlineExpired,
    /// A component's `start` failed or panicked.
    ComponentFailed {
        name: String,
        address: String,
        error: String,
    },
    /// A process termination signal arrived.
    Signal(SignalKind),
}

impl ShutdownReason {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::ComponentFailed { .. })
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("cancelled"),
            Self::DeadlineExpired => f.write_str("deadline expired"),
            Self::ComponentFailed { name, error, .. } => {
                write!(f, "component {name} failed: {error}")
            }
            Self::Signal(kind) => write!(f, "received {kind}"),
        }
    }
}

/// Budget for one `stop`: the run deadline while the context is still live,
/// otherwise unbounded, then capped by the per-stop timeout.
pub(crate) fn stop_deadline(ctx: &RunContext, stop_timeout: Option<Duration>) -> StopDeadline {
    let base = match ctx.deadline() {
        Some(at) if !ctx.is_done() => StopDeadline::at(at),
        _ => StopDeadline::unbounded(),
    };
    match stop_timeout {
        Some(timeout) => base.min(StopDeadline::after(timeout)),
        None => base,
    }
}

/// Stop every component in registration order. Returns how many stops failed.
pub(crate) async fn stop_components(
    components: &[Arc<dyn Component>],
    ctx: &RunContext,
    stop_timeout: Option<Duration>,
) -> usize {
    let mut failed = 0;
    for component in components {
        let deadline = stop_deadline(ctx, stop_timeout);
        let started = Instant::now();

        let outcome = match AssertUnwindSafe(component.stop(deadline)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(payload) => Err(ComponentError::Panicked(panic_message(&*payload))),
        };
        let latency_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(()) | Err(ComponentError::Closed) => tracing::info!(
                name = %component.name(),
                address = %component.address(),
                latency_ms,
                "component stopped"
            ),
            Err(error) => {
                failed += 1;
                tracing::error!(
                    name = %component.name(),
                    address = %component.address(),
                    error = %error,
                    latency_ms,
                    "failed to stop component"
                );
            }
        }
    }
    failed
}

/// Abort start tasks that outlived their component's `stop` and wait for them.
pub(crate) async fn drain(tasks: &mut JoinSet<()>) {
    tasks.abort_all();
    while let Some(joined) = tasks.join_next().await {
        if let Err(error) = joined {
            if error.is_panic() {
                tracing::error!(error = %error, "component task panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn live_context_lends_its_deadline() {
        let ctx = RunContext::new().with_timeout(Duration::from_secs(10));
        let deadline = stop_deadline(&ctx, None);
        assert_eq!(deadline.instant(), ctx.deadline());
    }

    #[tokio::test(start_paused = true)]
    async fn done_context_gives_unbounded_stops() {
        let ctx = RunContext::new().with_timeout(Duration::from_secs(10));
        ctx.cancel();
        assert!(stop_deadline(&ctx, None).is_unbounded());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_timeout_caps_the_budget() {
        let ctx = RunContext::new().with_timeout(Duration::from_secs(10));
        let deadline = stop_deadline(&ctx, Some(Duration::from_secs(2)));
        assert_eq!(deadline.remaining(), Some(Duration::from_secs(2)));

        ctx.cancel();
        let deadline = stop_deadline(&ctx, Some(Duration::from_secs(2)));
        assert_eq!(deadline.remaining(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn reasons_read_well() {
        let reason = ShutdownReason::ComponentFailed {
            name: "api".into(),
            address: "0.0.0.0:8080".into(),
            error: "address in use".into(),
        };
        assert!(reason.is_failure());
        assert_eq!(reason.to_string(), "component api failed: address in use");
        assert_eq!(
            ShutdownReason::Signal(SignalKind::Terminate).to_string(),
            "received SIGTERM"
        );
        assert!(!ShutdownReason::Cancelled.is_failure());
    }
}
