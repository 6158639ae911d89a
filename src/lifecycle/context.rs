//! Cancellation signal handed to `MicroService::run`, and the stop budget handed to components.

use std::future::Future;
use std::time::Duration;
use tokio::time::error::Elapsed;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a [`RunContext`] became done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Done {
    Cancelled,
    DeadlineExpired,
}

/// External "please shut down" signal, optionally carrying a deadline.
///
/// Clones share the same token; [`RunContext::child`] derives a context that is
/// cancelled with its parent but can also be cancelled on its own.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context bounded by an existing token, e.g. one shared with other tasks.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Set a deadline; an earlier existing deadline wins.
    pub fn with_deadline(mut self, at: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(at),
            None => at,
        });
        self
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|at| Instant::now() >= at)
    }

    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.is_expired()
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> Done {
        match self.deadline {
            Some(at) => tokio::select! {
                biased;
                _ = self.token.cancelled() => Done::Cancelled,
                _ = tokio::time::sleep_until(at) => Done::DeadlineExpired,
            },
            None => {
                self.token.cancelled().await;
                Done::Cancelled
            }
        }
    }
}

/// Time budget for a single `stop` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StopDeadline(Option<Instant>);

impl StopDeadline {
    pub fn unbounded() -> Self {
        Self(None)
    }

    pub fn at(instant: Instant) -> Self {
        Self(Some(instant))
    }

    pub fn after(duration: Duration) -> Self {
        Self::at(Instant::now() + duration)
    }

    pub fn instant(&self) -> Option<Instant> {
        self.0
    }

    pub fn is_unbounded(&self) -> bool {
        self.0.is_none()
    }

    /// Time left, `None` when unbounded; zero once passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.0.map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// The tighter of two deadlines.
    pub fn min(self, other: Self) -> Self {
        match (self.0, other.0) {
            (Some(a), Some(b)) => Self::at(a.min(b)),
            (Some(a), None) | (None, Some(a)) => Self::at(a),
            (None, None) => Self::unbounded(),
        }
    }

    /// Race `future` against the deadline.
    pub async fn run<F: Future>(&self, future: F) -> Result<F::Output, Elapsed> {
        match self.0 {
            Some(at) => tokio::time::timeout_at(at, future).await,
            None => Ok(future.await),
        }
    }
}
