//! HTTP server as a lifecycle component.
//!
//! # Responsibilities
//! - Bind the configured address and serve an Axum router
//! - Expose the bound address (port 0 works for tests)
//! - Drain in-flight requests on `stop`, within the caller's deadline
//!
//! # Design Decisions
//! - `start` is single-use; a second call is an error, not a restart
//! - `stop` before `start` makes the later `start` return the `Closed` sentinel
//! - Peer addresses are exposed to handlers through `ConnectInfo<SocketAddr>`
//! - Requests run under an explicit logger when one is given, otherwise under
//!   the logger active when `start` is called (the coordinator's)

use async_trait::async_trait;
use axum::Router;
use std::net::SocketAddr;
use std::sync::{Mutex, PoisonError};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::http::{middleware, HttpConfig};
use crate::lifecycle::{Component, ComponentError, StopDeadline};
use crate::observability::Logger;

enum Phase {
    Ready(Router),
    Serving,
    Finished,
    Closed,
}

/// An Axum server driven by the coordinator.
pub struct HttpServer {
    name: String,
    address: String,
    phase: Mutex<Phase>,
    shutdown: CancellationToken,
    bound: watch::Sender<Option<SocketAddr>>,
    finished: watch::Sender<bool>,
    logger: Option<Logger>,
}

impl HttpServer {
    /// Serve `router` as given.
    pub fn new(config: HttpConfig, router: Router) -> Self {
        let (bound, _) = watch::channel(None);
        let (finished, _) = watch::channel(false);
        Self {
            name: config.name.clone(),
            address: config.address(),
            phase: Mutex::new(Phase::Ready(router)),
            shutdown: CancellationToken::new(),
            bound,
            finished,
            logger: None,
        }
    }

    /// Serve `router` wrapped in the standard middleware stack.
    pub fn with_middleware(config: HttpConfig, router: Router) -> Self {
        let router = middleware::apply(router, &config);
        Self::new(config, router)
    }

    /// Run request handling under `logger` instead of the one active at `start`.
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Address actually bound, once listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.bound.borrow()
    }

    /// Wait until the server is listening.
    pub async fn listening(&self) -> SocketAddr {
        let mut rx = self.bound.subscribe();
        loop {
            if let Some(addr) = *rx.borrow_and_update() {
                return addr;
            }
            if rx.changed().await.is_err() {
                // Sender lives as long as `self`.
                std::future::pending::<()>().await;
            }
        }
    }

    fn take_router(&self) -> Result<Router, ComponentError> {
        let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        match std::mem::replace(&mut *phase, Phase::Serving) {
            Phase::Ready(router) => Ok(router),
            Phase::Closed => {
                *phase = Phase::Closed;
                Err(ComponentError::Closed)
            }
            previous @ (Phase::Serving | Phase::Finished) => {
                *phase = previous;
                Err(ComponentError::AlreadyStarted)
            }
        }
    }

    async fn serve(&self, router: Router) -> Result<(), ComponentError> {
        let listener = TcpListener::bind(&self.address)
            .await
            .map_err(|source| ComponentError::Bind {
                address: self.address.clone(),
                source,
            })?;
        let local_addr = listener.local_addr().map_err(ComponentError::Serve)?;
        self.bound.send_replace(Some(local_addr));

        tracing::info!(name = %self.name, address = %local_addr, "HTTP server listening");

        // The router only borrows the writers; the owning handle stays here.
        let logger = match &self.logger {
            Some(logger) => logger.in_scope(Logger::current),
            None => Logger::current(),
        };
        let router = middleware::with_logger(router, logger);
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(self.shutdown.clone().cancelled_owned())
        .await
        .map_err(ComponentError::Serve)?;

        tracing::info!(name = %self.name, "HTTP server stopped");
        Ok(())
    }
}

#[async_trait]
impl Component for HttpServer {
    fn name(&self) -> &str {
        &self.name
    }

    fn address(&self) -> &str {
        &self.address
    }

    async fn start(&self) -> Result<(), ComponentError> {
        let router = self.take_router()?;
        let result = self.serve(router).await;

        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = Phase::Finished;
        self.finished.send_replace(true);
        result
    }

    async fn stop(&self, deadline: StopDeadline) -> Result<(), ComponentError> {
        self.shutdown.cancel();

        let serving = {
            let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
            match &*phase {
                Phase::Ready(_) => {
                    *phase = Phase::Closed;
                    false
                }
                Phase::Serving => true,
                Phase::Finished | Phase::Closed => false,
            }
        };
        if !serving {
            return Ok(());
        }

        let mut finished = self.finished.subscribe();
        let drained = async move {
            let _ = finished.wait_for(|done| *done).await;
        };
        deadline
            .run(drained)
            .await
            .map_err(|_| ComponentError::DeadlineExceeded {
                name: self.name.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use std::sync::Arc;
    use std::time::Duration;

    fn local_config() -> HttpConfig {
        HttpConfig {
            name: "test http".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            ..HttpConfig::default()
        }
    }

    fn server() -> Arc<HttpServer> {
        let router = Router::new().route("/", get(|| async { "hello" }));
        Arc::new(HttpServer::new(local_config(), router))
    }

    #[tokio::test]
    async fn stop_before_start_closes() {
        let server = server();
        server.stop(StopDeadline::unbounded()).await.unwrap();

        let err = server.start().await.unwrap_err();
        assert!(err.is_closed());
    }

    #[tokio::test]
    async fn start_twice_is_rejected() {
        let server = server();
        let running = tokio::spawn({
            let server = Arc::clone(&server);
            async move { server.start().await }
        });
        server.listening().await;

        let err = server.start().await.unwrap_err();
        assert!(matches!(err, ComponentError::AlreadyStarted));

        server
            .stop(StopDeadline::after(Duration::from_secs(5)))
            .await
            .unwrap();
        running.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn serves_until_stopped() {
        let server = server();
        let running = tokio::spawn({
            let server = Arc::clone(&server);
            async move { server.start().await }
        });
        let addr = server.listening().await;
        assert_eq!(server.local_addr(), Some(addr));
        assert_eq!(server.address(), "127.0.0.1:0");

        let body = reqwest::get(format!("http://{addr}/"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "hello");

        server
            .stop(StopDeadline::after(Duration::from_secs(5)))
            .await
            .unwrap();
        running.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn bind_failure_is_reported() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();
        let config = HttpConfig {
            port,
            ..local_config()
        };
        let server = HttpServer::new(config, Router::new());

        let err = server.start().await.unwrap_err();
        assert!(matches!(err, ComponentError::Bind { .. }));
        server.stop(StopDeadline::unbounded()).await.unwrap();
    }
}
