//! Shared stub components for lifecycle integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use toolbox::lifecycle::{Component, ComponentError, StopDeadline};
use toolbox::observability::{FileConfig, FileRotation, LogFormat, Logger, LoggerConfig};

const LOG_FILE: &str = "service.log";

/// Logfmt logger writing only to `dir`, never installed globally.
pub fn file_logger(dir: &Path) -> Logger {
    let mut config = LoggerConfig::default();
    config.console.enabled = false;
    config.file = FileConfig {
        enabled: true,
        directory: dir.to_path_buf(),
        file_name: LOG_FILE.to_string(),
        format: LogFormat::Logfmt,
        level: "info".to_string(),
        rotation: FileRotation::Never,
        max_files: 0,
    };
    Logger::new(&config).unwrap()
}

/// Contents written by [`file_logger`]; call after the last handle is flushed.
pub fn read_log(dir: &Path) -> String {
    std::fs::read_to_string(dir.join(LOG_FILE)).unwrap()
}

/// Ordered record of `start:<name>` / `stop:<name>` events across stubs.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, event: String) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn stops(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.starts_with("stop:"))
            .collect()
    }
}

enum Start {
    /// Run until `stop` is called.
    Blocking,
    /// Fail with the given message after a delay.
    FailAfter(Duration, &'static str),
    /// Panic after a delay.
    PanicAfter(Duration),
}

pub struct Stub {
    name: String,
    address: String,
    start: Start,
    stop_hang: Option<Duration>,
    journal: Journal,
    stop_calls: AtomicUsize,
    stopped: CancellationToken,
}

impl Stub {
    fn new(name: &str, start: Start, journal: &Journal) -> Self {
        Self {
            name: name.to_string(),
            address: format!("stub://{name}"),
            start,
            stop_hang: None,
            journal: journal.clone(),
            stop_calls: AtomicUsize::new(0),
            stopped: CancellationToken::new(),
        }
    }

    pub fn blocking(name: &str, journal: &Journal) -> Self {
        Self::new(name, Start::Blocking, journal)
    }

    pub fn failing(name: &str, after: Duration, message: &'static str, journal: &Journal) -> Self {
        Self::new(name, Start::FailAfter(after, message), journal)
    }

    pub fn panicking(name: &str, after: Duration, journal: &Journal) -> Self {
        Self::new(name, Start::PanicAfter(after), journal)
    }

    /// Make `stop` take this long, bounded by the deadline it receives.
    pub fn with_stop_hang(mut self, hang: Duration) -> Self {
        self.stop_hang = Some(hang);
        self
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl Component for Stub {
    fn name(&self) -> &str {
        &self.name
    }

    fn address(&self) -> &str {
        &self.address
    }

    async fn start(&self) -> Result<(), ComponentError> {
        self.journal.record(format!("start:{}", self.name));
        match self.start {
            Start::Blocking => {
                self.stopped.cancelled().await;
                Err(ComponentError::Closed)
            }
            Start::FailAfter(after, message) => {
                tokio::time::sleep(after).await;
                Err(ComponentError::other(message))
            }
            Start::PanicAfter(after) => {
                tokio::time::sleep(after).await;
                panic!("{} blew up", self.name);
            }
        }
    }

    async fn stop(&self, deadline: StopDeadline) -> Result<(), ComponentError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.journal.record(format!("stop:{}", self.name));
        self.stopped.cancel();

        if let Some(hang) = self.stop_hang {
            deadline
                .run(tokio::time::sleep(hang))
                .await
                .map_err(|_| ComponentError::DeadlineExceeded {
                    name: self.name.clone(),
                })?;
        }
        Ok(())
    }
}
