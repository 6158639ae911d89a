//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for the process termination signals (SIGINT everywhere, SIGTERM on unix)
//! - Report which one arrived so the shutdown reason can name it
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Registration failures are returned, the coordinator then runs without signals

use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;

/// A termination signal delivered to the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Interrupt,
    Terminate,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => f.write_str("SIGINT"),
            Self::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Wait for the next termination signal.
pub async fn termination() -> io::Result<SignalKind> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind as UnixSignal};

        let mut terminate = signal(UnixSignal::terminate())?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res.map(|()| SignalKind::Interrupt),
            _ = terminate.recv() => Ok(SignalKind::Terminate),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(SignalKind::Interrupt)
    }
}

pub(crate) type SignalFuture = Pin<Box<dyn Future<Output = SignalKind> + Send>>;

/// Where the coordinator gets its termination signal from.
pub(crate) enum SignalSource {
    Os,
    Custom(SignalFuture),
    Disabled,
}

impl SignalSource {
    pub(crate) fn into_future(self) -> SignalFuture {
        match self {
            Self::Os => Box::pin(async {
                match termination().await {
                    Ok(kind) => kind,
                    Err(error) => {
                        tracing::warn!(error = %error, "failed to listen for termination signals");
                        std::future::pending().await
                    }
                }
            }),
            Self::Custom(future) => future,
            Self::Disabled => Box::pin(std::future::pending()),
        }
    }
}

impl fmt::Debug for SignalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Os => f.write_str("Os"),
            Self::Custom(_) => f.write_str("Custom"),
            Self::Disabled => f.write_str("Disabled"),
        }
    }
}
