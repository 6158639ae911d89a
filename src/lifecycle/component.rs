//! The capability every long-running unit offers to the coordinator.

use async_trait::async_trait;
use std::sync::Arc;

use super::context::StopDeadline;
use crate::errors::ServiceError;

/// Errors reported by a component's `start` or `stop`.
#[derive(Debug, thiserror::Error)]
pub enum ComponentError {
    /// The component was stopped on purpose. Never treated as a failure.
    #[error("component closed")]
    Closed,

    #[error("component already started")]
    AlreadyStarted,

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serve error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("{name}: stop deadline exceeded")]
    DeadlineExceeded { name: String },

    #[error("component panicked: {0}")]
    Panicked(String),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("{0}")]
    Other(String),
}

impl ComponentError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Whether this is the "stopped intentionally" sentinel.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// A unit that can be started, runs until told to stop, and stops within a deadline.
///
/// `start` resolves only on intentional shutdown (`Ok(())` or
/// `Err(ComponentError::Closed)`) or on a fatal failure. `stop` may be called
/// while `start` is still pending and must make it return.
#[async_trait]
pub trait Component: Send + Sync {
    fn name(&self) -> &str;

    /// Bind target, for diagnostics only.
    fn address(&self) -> &str;

    async fn start(&self) -> Result<(), ComponentError>;

    async fn stop(&self, deadline: StopDeadline) -> Result<(), ComponentError>;
}

#[async_trait]
impl<T> Component for Arc<T>
where
    T: Component + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn address(&self) -> &str {
        (**self).address()
    }

    async fn start(&self) -> Result<(), ComponentError> {
        (**self).start().await
    }

    async fn stop(&self, deadline: StopDeadline) -> Result<(), ComponentError> {
        (**self).stop(deadline).await
    }
}
