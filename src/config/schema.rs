//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files and
//! default every field, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::database::DatabaseConfig;
use crate::http::HttpConfig;
use crate::observability::LoggerConfig;

/// Root configuration of a service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service name used in lifecycle logs.
    pub name: String,

    pub logger: LoggerConfig,

    /// Built-in probe server.
    pub http: HttpSection,

    /// PostgreSQL pool; absent means no database.
    pub database: Option<DatabaseConfig>,

    pub shutdown: ShutdownConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "toolbox".to_string(),
            logger: LoggerConfig::default(),
            http: HttpSection::default(),
            database: None,
            shutdown: ShutdownConfig::default(),
        }
    }
}

/// `[http]` table: the server settings plus an on/off switch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpSection {
    pub enabled: bool,

    #[serde(flatten)]
    pub server: HttpConfig,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            enabled: true,
            server: HttpConfig::default(),
        }
    }
}

/// Shutdown settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Upper bound for each component's stop, in seconds. 0 means unbounded.
    pub stop_timeout_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            stop_timeout_secs: 10,
        }
    }
}

impl ShutdownConfig {
    pub fn stop_timeout(&self) -> Option<Duration> {
        (self.stop_timeout_secs > 0).then(|| Duration::from_secs(self.stop_timeout_secs))
    }
}
