//! Start phase: one task per component, first failure reported through a single slot.
//!
//! # Responsibilities
//! - Spawn every component's `start` on its own task
//! - Catch panics so a misbehaving component becomes an ordinary failure
//! - Hand the first failure to the coordinator without ever blocking
//!
//! # Design Decisions
//! - The failure slot is a capacity-1 channel written with `try_send`
//! - The sentinel `Closed` and `Ok(())` both count as a clean exit

use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use super::component::{Component, ComponentError};
use crate::errors::panic_message;
use crate::observability::Logger;

/// A component whose `start` ended with something other than the sentinel.
#[derive(Debug)]
pub(crate) struct Failure {
    pub name: String,
    pub address: String,
    pub error: ComponentError,
}

/// Sending half of the failure slot.
pub(crate) type FailureSlot = mpsc::Sender<Failure>;

pub(crate) fn failure_slot() -> (FailureSlot, mpsc::Receiver<Failure>) {
    mpsc::channel(1)
}

/// Spawn `start` for every component.
pub(crate) fn spawn_components(
    components: &[Arc<dyn Component>],
    failures: &FailureSlot,
    logger: &Logger,
) -> JoinSet<()> {
    let mut tasks = JoinSet::new();
    for component in components {
        let component = Arc::clone(component);
        let failures = failures.clone();
        tasks.spawn(logger.instrument(run_start(component, failures)));
    }
    tasks
}

async fn run_start(component: Arc<dyn Component>, failures: FailureSlot) {
    tracing::info!(
        name = %component.name(),
        address = %component.address(),
        "starting component"
    );

    let error = match AssertUnwindSafe(component.start()).catch_unwind().await {
        Ok(Ok(())) | Ok(Err(ComponentError::Closed)) => {
            tracing::info!(
                name = %component.name(),
                address = %component.address(),
                "component exited"
            );
            return;
        }
        Ok(Err(error)) => error,
        Err(payload) => ComponentError::Panicked(panic_message(&*payload)),
    };

    tracing::error!(
        name = %component.name(),
        address = %component.address(),
        error = %error,
        "failed to start component"
    );

    let failure = Failure {
        name: component.name().to_string(),
        address: component.address().to_string(),
        error,
    };
    if let Err(rejected) = failures.try_send(failure) {
        let failure = match rejected {
            mpsc::error::TrySendError::Full(failure) => failure,
            mpsc::error::TrySendError::Closed(failure) => failure,
        };
        tracing::debug!(
            name = %failure.name,
            "shutdown already triggered, failure discarded"
        );
    }
}
