//! Structured logging.
//!
//! # Responsibilities
//! - Build a subscriber from a [`LoggerConfig`]
//! - Route events to console (stdout, or stdout + stderr split) and rotating files
//! - Attach service-wide metadata to every event
//! - Own the background writer guards so buffered output is flushed on exit

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::instrument::{Instrument, WithSubscriber};
use tracing::level_filters::ParseLevelFilterError;
use tracing::{Dispatch, Level, Span};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{self, RollingFileAppender, Rotation};
use tracing_subscriber::filter::{EnvFilter, LevelFilter, ParseError};
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Errors raised while building a [`Logger`].
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("logger: bad console level {level:?}: {source}")]
    ConsoleLevel {
        level: String,
        source: ParseLevelFilterError,
    },

    #[error("logger: bad file level {level:?}: {source}")]
    FileLevel {
        level: String,
        source: ParseLevelFilterError,
    },

    #[error("logger: bad filter directives {directives:?}: {source}")]
    Directives { directives: String, source: ParseError },

    #[error("logger: file output enabled but directory is empty")]
    MissingFilePath,

    #[error("logger: failed to open log file: {0}")]
    Appender(#[from] rolling::InitError),

    #[error("logger: a global subscriber is already installed")]
    AlreadyInstalled(#[from] tracing::dispatcher::SetGlobalDefaultError),
}

/// Output encoding of a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Logfmt,
    Json,
}

/// Where console output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleMode {
    /// Everything to stdout, errors included.
    #[default]
    All,
    /// `ERROR` to stderr, everything else to stdout.
    Split,
}

/// File rotation period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRotation {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

impl From<FileRotation> for Rotation {
    fn from(rotation: FileRotation) -> Self {
        match rotation {
            FileRotation::Minutely => Rotation::MINUTELY,
            FileRotation::Hourly => Rotation::HOURLY,
            FileRotation::Daily => Rotation::DAILY,
            FileRotation::Never => Rotation::NEVER,
        }
    }
}

/// Console sink settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub enabled: bool,
    pub format: LogFormat,
    pub mode: ConsoleMode,
    /// "trace" | "debug" | "info" | "warn" | "error" | "off"
    pub level: String,
    /// Colored output when the format is logfmt.
    pub ansi: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            format: LogFormat::Logfmt,
            mode: ConsoleMode::All,
            level: "info".to_string(),
            ansi: false,
        }
    }
}

/// File sink settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FileConfig {
    pub enabled: bool,
    pub directory: PathBuf,
    pub file_name: String,
    pub format: LogFormat,
    pub level: String,
    pub rotation: FileRotation,
    /// Rotated files to keep; 0 keeps all.
    pub max_files: usize,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: PathBuf::new(),
            file_name: "service.log".to_string(),
            format: LogFormat::Json,
            level: "info".to_string(),
            rotation: FileRotation::Daily,
            max_files: 7,
        }
    }
}

/// Logger configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub console: ConsoleConfig,
    pub file: FileConfig,
    /// Extra `EnvFilter` directives applied to every sink, e.g. `"hyper=warn"`.
    pub directives: Option<String>,
    /// Key/value metadata attached to all events.
    pub meta: BTreeMap<String, Value>,
}

impl LoggerConfig {
    /// Every configuration problem `Logger::new` would reject, without opening files.
    pub fn problems(&self) -> Vec<LoggingError> {
        let mut problems = Vec::new();
        if self.console.enabled {
            if let Err(source) = parse_level(&self.console.level) {
                problems.push(LoggingError::ConsoleLevel {
                    level: self.console.level.clone(),
                    source,
                });
            }
        }
        if self.file.enabled {
            if let Err(source) = parse_level(&self.file.level) {
                problems.push(LoggingError::FileLevel {
                    level: self.file.level.clone(),
                    source,
                });
            }
            if self.file.directory.as_os_str().is_empty() {
                problems.push(LoggingError::MissingFilePath);
            }
        }
        if let Some(directives) = self.directives.as_deref() {
            if let Err(source) = EnvFilter::try_new(directives) {
                problems.push(LoggingError::Directives {
                    directives: directives.to_string(),
                    source,
                });
            }
        }
        problems
    }
}

/// Handle to a built logging pipeline.
///
/// Cloning is cheap; buffered file output is flushed once the last clone
/// is dropped or [`flush`](Logger::flush)ed.
#[derive(Clone)]
pub struct Logger {
    dispatch: Dispatch,
    span: Span,
    guards: Arc<Vec<WorkerGuard>>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("file_writers", &self.guards.len())
            .finish()
    }
}

impl Logger {
    /// Build a logger from configuration.
    pub fn new(config: &LoggerConfig) -> Result<Self, LoggingError> {
        let mut layers: Vec<BoxedLayer> = Vec::new();
        let mut guards = Vec::new();

        if config.file.enabled {
            let level = parse_level(&config.file.level).map_err(|source| {
                LoggingError::FileLevel {
                    level: config.file.level.clone(),
                    source,
                }
            })?;
            if config.file.directory.as_os_str().is_empty() {
                return Err(LoggingError::MissingFilePath);
            }

            let appender = file_appender(&config.file)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            guards.push(guard);
            layers.push(format_layer(config.file.format, writer, false).with_filter(level).boxed());
        }

        if config.console.enabled {
            let level = parse_level(&config.console.level).map_err(|source| {
                LoggingError::ConsoleLevel {
                    level: config.console.level.clone(),
                    source,
                }
            })?;
            layers.push(console_layer(&config.console, level));
        }

        let directives = config
            .directives
            .as_deref()
            .map(|directives| {
                EnvFilter::try_new(directives).map_err(|source| LoggingError::Directives {
                    directives: directives.to_string(),
                    source,
                })
            })
            .transpose()?;

        let subscriber = tracing_subscriber::registry().with(layers).with(directives);
        Ok(Self::assemble(Dispatch::new(subscriber), guards, &config.meta))
    }

    /// Debug-level logfmt logger on stdout.
    pub fn development() -> Self {
        let console = ConsoleConfig {
            level: "debug".to_string(),
            ..ConsoleConfig::default()
        };
        let subscriber =
            tracing_subscriber::registry().with(console_layer(&console, LevelFilter::DEBUG));
        Self::assemble(Dispatch::new(subscriber), Vec::new(), &BTreeMap::new())
    }

    /// Logger that drops every event.
    pub fn disabled() -> Self {
        Self::assemble(Dispatch::none(), Vec::new(), &BTreeMap::new())
    }

    fn assemble(dispatch: Dispatch, guards: Vec<WorkerGuard>, meta: &BTreeMap<String, Value>) -> Self {
        let span = tracing::dispatcher::with_default(&dispatch, || {
            tracing::info_span!("service", meta = tracing::field::Empty)
        });
        if !meta.is_empty() {
            span.record("meta", render_meta(meta).as_str());
        }

        Self {
            dispatch,
            span,
            guards: Arc::new(guards),
        }
    }

    /// Handle on the dispatcher and span active for the caller.
    ///
    /// Inside a component started by the coordinator this is the injected
    /// logger. The handle owns no file writers, so releasing it never flushes.
    pub fn current() -> Self {
        Self {
            dispatch: tracing::dispatcher::get_default(Dispatch::clone),
            span: Span::current(),
            guards: Arc::new(Vec::new()),
        }
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Root span carrying the configured metadata.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Make this logger the process-wide default.
    pub fn install_global(&self) -> Result<(), LoggingError> {
        tracing::dispatcher::set_global_default(self.dispatch.clone())?;
        Ok(())
    }

    /// Make this logger the default for the current thread until the guard drops.
    pub fn set_default(&self) -> tracing::dispatcher::DefaultGuard {
        tracing::dispatcher::set_default(&self.dispatch)
    }

    /// Run `f` with this logger and its root span active.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, || self.span.in_scope(f))
    }

    /// Attach this logger (and its root span) to a future, including across `.await`s.
    pub fn instrument<F: Future>(&self, future: F) -> impl Future<Output = F::Output> {
        future
            .instrument(self.span.clone())
            .with_subscriber(self.dispatch.clone())
    }

    /// Release this handle.
    ///
    /// Buffered file output is flushed only when this is the last live handle;
    /// returns whether it was. Clones handed to a coordinator or server leave
    /// flushing to whoever drops the final one.
    pub fn flush(self) -> bool {
        Arc::into_inner(self.guards).is_some()
    }
}

fn parse_level(level: &str) -> Result<LevelFilter, ParseLevelFilterError> {
    LevelFilter::from_str(level.trim())
}

fn file_appender(config: &FileConfig) -> Result<RollingFileAppender, rolling::InitError> {
    let mut builder = RollingFileAppender::builder()
        .rotation(config.rotation.into())
        .filename_prefix(config.file_name.as_str());
    if config.max_files > 0 {
        builder = builder.max_log_files(config.max_files);
    }
    builder.build(&config.directory)
}

fn console_layer(config: &ConsoleConfig, level: LevelFilter) -> BoxedLayer {
    let ansi = config.ansi && config.format == LogFormat::Logfmt;
    match config.mode {
        ConsoleMode::All => format_layer(config.format, std::io::stdout, ansi)
            .with_filter(level)
            .boxed(),
        ConsoleMode::Split => {
            let writer = std::io::stderr
                .with_max_level(Level::ERROR)
                .or_else(std::io::stdout);
            format_layer(config.format, writer, ansi)
                .with_filter(level)
                .boxed()
        }
    }
}

fn format_layer<W>(format: LogFormat, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer().with_writer(writer).with_target(true);
    match format {
        LogFormat::Json => layer
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Logfmt => layer.with_ansi(ansi).boxed(),
    }
}

/// Render metadata as `key=value` pairs; strings with whitespace are quoted.
fn render_meta(meta: &BTreeMap<String, Value>) -> String {
    meta.iter()
        .map(|(key, value)| match value {
            Value::String(s) if !s.contains(char::is_whitespace) => format!("{key}={s}"),
            other => format!("{key}={other}"),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
