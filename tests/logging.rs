//! What the coordinator and the HTTP stack write to an injected logger.

use std::sync::Arc;
use std::time::Duration;

use toolbox::http::{default_server, HttpConfig};
use toolbox::lifecycle::{MicroService, RunContext, ShutdownReason};
use toolbox::observability::Logger;

mod common;
use common::{file_logger, read_log, Journal, Stub};

fn local_config() -> HttpConfig {
    HttpConfig {
        name: "probe".into(),
        host: "127.0.0.1".into(),
        port: 0,
        ..HttpConfig::default()
    }
}

fn lines_with<'a>(log: &'a str, needle: &str) -> Vec<&'a str> {
    log.lines().filter(|line| line.contains(needle)).collect()
}

#[tokio::test]
async fn startup_failure_is_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let logger = file_logger(dir.path());
    let journal = Journal::default();

    let reason = MicroService::new("failing")
        .with_logger(logger.clone())
        .without_os_signals()
        .with_component(Stub::blocking("a", &journal))
        .with_component(Stub::failing("b", Duration::from_millis(20), "address in use", &journal))
        .with_component(Stub::blocking("c", &journal))
        .run(RunContext::new())
        .await
        .unwrap();
    assert!(reason.is_failure());
    assert!(logger.flush());

    let log = read_log(dir.path());
    let failures = lines_with(&log, "failed to start component");
    assert_eq!(failures.len(), 1, "{log}");
    assert!(failures[0].contains("name=b"));
    assert!(failures[0].contains("address in use"));

    let stopped = lines_with(&log, "component stopped");
    assert_eq!(stopped.len(), 3, "{log}");
    for (line, name) in stopped.iter().zip(["a", "b", "c"]) {
        assert!(line.contains(&format!("name={name} ")), "{line}");
    }
    assert!(log.contains("microservice stopped"));
}

#[tokio::test]
async fn request_events_reach_the_injected_logger() {
    let dir = tempfile::tempdir().unwrap();
    let logger = file_logger(dir.path());
    let server = Arc::new(default_server(local_config()));
    let ctx = RunContext::new();

    let run = tokio::spawn(
        MicroService::new("probe-service")
            .with_logger(logger.clone())
            .without_os_signals()
            .with_shared_component(server.clone())
            .run(ctx.clone()),
    );
    let addr = server.listening().await;
    let client = reqwest::Client::new();

    let live = client
        .get(format!("http://{addr}/livez"))
        .send()
        .await
        .unwrap();
    assert_eq!(live.status(), 200);
    let panicked = client
        .get(format!("http://{addr}/panic"))
        .send()
        .await
        .unwrap();
    assert_eq!(panicked.status(), 500);

    ctx.cancel();
    assert_eq!(run.await.unwrap().unwrap(), ShutdownReason::Cancelled);
    drop(server);
    assert!(logger.flush());

    let log = read_log(dir.path());
    let completed = lines_with(&log, "request completed");
    assert!(
        completed.iter().any(|line| line.contains("path=/livez") && line.contains("status=200")),
        "{log}"
    );
    assert!(
        completed.iter().any(|line| line.contains("path=/panic") && line.contains("status=500")),
        "{log}"
    );
    assert!(lines_with(&log, "request received").len() >= 2);
    assert!(
        lines_with(&log, "PANIC")
            .iter()
            .any(|line| line.contains("panic probe called")),
        "{log}"
    );
}

#[tokio::test]
async fn server_logger_overrides_the_coordinator() {
    let dir = tempfile::tempdir().unwrap();
    let logger = file_logger(dir.path());
    let server = Arc::new(default_server(local_config()).with_logger(logger.clone()));
    let ctx = RunContext::new();

    let run = tokio::spawn(
        MicroService::new("quiet")
            .with_logger(Logger::disabled())
            .without_os_signals()
            .with_shared_component(server.clone())
            .run(ctx.clone()),
    );
    let addr = server.listening().await;

    let response = reqwest::get(format!("http://{addr}/readyz")).await.unwrap();
    assert_eq!(response.status(), 200);

    ctx.cancel();
    run.await.unwrap().unwrap();
    drop(server);
    assert!(logger.flush());

    let log = read_log(dir.path());
    assert!(
        lines_with(&log, "request completed")
            .iter()
            .any(|line| line.contains("path=/readyz")),
        "{log}"
    );
    assert!(!log.contains("starting microservice"));
}
