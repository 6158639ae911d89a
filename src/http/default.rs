//! Ready-made server exposing only the probe endpoints.

use axum::routing::get;
use axum::Router;
use std::sync::Arc;

use super::health::{self, AlwaysReady, SharedReadiness};
use super::{middleware, HttpConfig, HttpServer};

/// Probe routes with the standard middleware applied.
///
/// `GET /livez`, `GET /readyz`, and `GET /panic` outside production.
pub fn default_router(config: &HttpConfig, readiness: SharedReadiness) -> Router {
    let mut router = Router::new()
        .route("/livez", get(health::livez))
        .route("/readyz", get(health::readyz));
    if !config.is_production() {
        router = router.route("/panic", get(health::panic_probe));
    }
    middleware::apply(router.with_state(readiness), config)
}

/// Probe server that is always ready.
pub fn default_server(config: HttpConfig) -> HttpServer {
    default_server_with_readiness(config, Arc::new(AlwaysReady))
}

pub fn default_server_with_readiness(config: HttpConfig, readiness: SharedReadiness) -> HttpServer {
    let router = default_router(&config, readiness);
    HttpServer::new(config, router)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::health::Readiness;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    struct Slow;

    #[async_trait]
    impl Readiness for Slow {
        async fn ready(&self) -> bool {
            tokio::time::sleep(Duration::from_secs(2)).await;
            true
        }
    }

    struct Down;

    #[async_trait]
    impl Readiness for Down {
        async fn ready(&self) -> bool {
            false
        }
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn livez_and_readyz() {
        let router = default_router(&HttpConfig::default(), Arc::new(AlwaysReady));

        let (status, body) = get_json(router.clone(), "/livez").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));

        let (status, body) = get_json(router, "/readyz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ready" }));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_readiness_is_unavailable() {
        let router = default_router(&HttpConfig::default(), Arc::new(Slow));
        let (status, body) = get_json(router, "/readyz").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], 503);
        assert_eq!(body["reason"], "readyz");
        assert_eq!(body["details"]["locale_messages"]["en-EN"], "not ready");
    }

    #[tokio::test]
    async fn failed_readiness_is_unavailable() {
        let router = default_router(&HttpConfig::default(), Arc::new(Down));
        let (status, body) = get_json(router, "/readyz").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["message"], "not ready");
    }

    #[tokio::test]
    async fn panic_route_only_outside_production() {
        let dev = default_router(&HttpConfig::default(), Arc::new(AlwaysReady));
        let (status, body) = get_json(dev, "/panic").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["details"]["panic"], "panic probe called");

        let prod_config = HttpConfig {
            environment: "production".to_string(),
            ..HttpConfig::default()
        };
        let prod = default_router(&prod_config, Arc::new(AlwaysReady));
        let (status, _) = get_json(prod, "/panic").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
