//! The microservice coordinator.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::component::Component;
use super::context::{Done, RunContext};
use super::shutdown::{self, RunState, ShutdownReason};
use super::signals::{SignalKind, SignalSource};
use super::startup;
use crate::observability::Logger;

/// Errors that prevent a run from starting at all.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("no components to start")]
    NoComponents,
}

/// Runs a set of components until cancellation, a component failure, or a
/// termination signal, then stops every one of them in registration order.
///
/// `run` consumes the coordinator, so a finished instance cannot be run again:
///
/// ```compile_fail
/// # use toolbox::lifecycle::{MicroService, RunContext};
/// # async fn twice(service: MicroService) {
/// let _ = service.run(RunContext::new()).await;
/// let _ = service.run(RunContext::new()).await;
/// # }
/// ```
pub struct MicroService {
    name: String,
    components: Vec<Arc<dyn Component>>,
    logger: Logger,
    stop_timeout: Option<Duration>,
    signal: SignalSource,
    state: watch::Sender<RunState>,
}

impl MicroService {
    pub fn new(name: impl Into<String>) -> Self {
        let (state, _) = watch::channel(RunState::Idle);
        Self {
            name: name.into(),
            components: Vec::new(),
            logger: Logger::development(),
            stop_timeout: None,
            signal: SignalSource::Os,
            state,
        }
    }

    /// Register a component. Duplicate names are allowed but make logs ambiguous.
    pub fn with_component<C>(self, component: C) -> Self
    where
        C: Component + 'static,
    {
        self.with_shared_component(Arc::new(component))
    }

    /// Register a component the caller keeps a handle to.
    pub fn with_shared_component(mut self, component: Arc<dyn Component>) -> Self {
        self.components.push(component);
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Upper bound for each individual `stop` call.
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = Some(timeout);
        self
    }

    /// Replace OS signal handling with a caller-provided future.
    pub fn with_shutdown_signal<F>(mut self, signal: F) -> Self
    where
        F: Future<Output = SignalKind> + Send + 'static,
    {
        self.signal = SignalSource::Custom(Box::pin(signal));
        self
    }

    pub fn without_os_signals(mut self) -> Self {
        self.signal = SignalSource::Disabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Observe state transitions: `Idle -> Running -> Stopping -> Stopped`.
    pub fn state(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    /// Start every component and block until shutdown completes.
    ///
    /// Every started component gets exactly one `stop` call, whatever triggered
    /// the shutdown. The injected logger handle is released on return; file
    /// output is flushed then only if the caller kept no clone of it.
    pub async fn run(self, ctx: RunContext) -> Result<ShutdownReason, LifecycleError> {
        let logger = self.logger.clone();
        let outcome = logger.instrument(self.execute(ctx)).await;
        logger.flush();
        outcome
    }

    async fn execute(self, ctx: RunContext) -> Result<ShutdownReason, LifecycleError> {
        let MicroService {
            name,
            components,
            logger,
            stop_timeout,
            signal,
            state,
        } = self;

        if components.is_empty() {
            tracing::error!(service = %name, "no components to start");
            return Err(LifecycleError::NoComponents);
        }

        state.send_replace(RunState::Running);
        tracing::info!(
            service = %name,
            components = components.len(),
            "starting microservice"
        );

        let (failure_tx, mut failure_rx) = startup::failure_slot();
        let mut tasks = startup::spawn_components(&components, &failure_tx, &logger);
        drop(failure_tx);

        let signal = signal.into_future();
        let reason = tokio::select! {
            done = ctx.done() => match done {
                Done::Cancelled => ShutdownReason::Cancelled,
                Done::DeadlineExpired => ShutdownReason::DeadlineExpired,
            },
            Some(failure) = failure_rx.recv() => ShutdownReason::ComponentFailed {
                name: failure.name,
                address: failure.address,
                error: failure.error.to_string(),
            },
            kind = signal => ShutdownReason::Signal(kind),
        };
        drop(failure_rx);

        state.send_replace(RunState::Stopping);
        tracing::info!(service = %name, reason = %reason, "stopping microservice");

        let failed = shutdown::stop_components(&components, &ctx, stop_timeout).await;
        shutdown::drain(&mut tasks).await;

        state.send_replace(RunState::Stopped);
        tracing::info!(service = %name, stop_failures = failed, "microservice stopped");
        Ok(reason)
    }
}

impl fmt::Debug for MicroService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.components.iter().map(|c| c.name()).collect();
        f.debug_struct("MicroService")
            .field("name", &self.name)
            .field("components", &names)
            .field("stop_timeout", &self.stop_timeout)
            .field("signal", &self.signal)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_service_fails_fast() {
        let service = MicroService::new("empty").with_logger(Logger::disabled());
        let state = service.state();

        let result = service.run(RunContext::new()).await;

        assert!(matches!(result, Err(LifecycleError::NoComponents)));
        assert_eq!(*state.borrow(), RunState::Idle);
    }

    #[test]
    fn builder_keeps_registration() {
        let service = MicroService::new("svc")
            .without_os_signals()
            .with_stop_timeout(Duration::from_secs(3));
        assert_eq!(service.name(), "svc");
        assert_eq!(service.component_count(), 0);
    }
}
