//! PostgreSQL connection and pool settings.

use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{Details, Reason, ServiceError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Becomes the session `search_path` when set.
    pub schema: String,
    /// libpq-style mode: disable, allow, prefer, require, verify-ca, verify-full.
    pub ssl_mode: String,
    pub ssl_cert: String,
    pub ssl_key: String,
    pub ssl_root_cert: String,
    pub min_connections: u32,
    pub max_connections: u32,
    /// 0 disables the limit.
    pub max_lifetime_secs: u64,
    /// 0 disables the limit.
    pub idle_timeout_secs: u64,
    pub acquire_timeout_secs: u64,
    /// Directory of forward-only migrations applied at startup.
    pub migrations_path: Option<PathBuf>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            database: "postgres".to_string(),
            schema: String::new(),
            ssl_mode: "disable".to_string(),
            ssl_cert: String::new(),
            ssl_key: String::new(),
            ssl_root_cert: String::new(),
            min_connections: 0,
            max_connections: 10,
            max_lifetime_secs: 30 * 60,
            idle_timeout_secs: 10 * 60,
            acquire_timeout_secs: 30,
            migrations_path: None,
        }
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl DatabaseConfig {
    pub fn max_lifetime(&self) -> Option<Duration> {
        non_zero_secs(self.max_lifetime_secs)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.idle_timeout_secs)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn ssl_mode(&self) -> Result<PgSslMode, ServiceError> {
        PgSslMode::from_str(&self.ssl_mode).map_err(|_| {
            ServiceError::internal(format!("unknown ssl_mode {:?}", self.ssl_mode))
                .with_reason(Reason::INTERNAL)
        })
    }

    /// Client TLS applies only when TLS is on and both cert and key are given.
    pub fn uses_client_tls(&self) -> bool {
        self.ssl_mode != "disable" && !self.ssl_cert.is_empty() && !self.ssl_key.is_empty()
    }

    /// Connection options; reads nothing from the environment.
    pub fn connect_options(&self) -> Result<PgConnectOptions, ServiceError> {
        let mut options = PgConnectOptions::new_without_pgpass()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.database)
            .ssl_mode(self.ssl_mode()?);
        if !self.password.is_empty() {
            options = options.password(&self.password);
        }
        if !self.schema.is_empty() {
            options = options.options([("search_path", self.schema.as_str())]);
        }

        if self.uses_client_tls() {
            if !self.ssl_root_cert.is_empty() {
                options = options.ssl_root_cert(readable(&self.ssl_root_cert)?);
            }
            options = options
                .ssl_client_cert(readable(&self.ssl_cert)?)
                .ssl_client_key(readable(&self.ssl_key)?);
        }

        Ok(options)
    }
}

/// Fail early on unreadable TLS material instead of on first connect.
fn readable(path: &str) -> Result<&Path, ServiceError> {
    let path = Path::new(path);
    std::fs::File::open(path).map_err(|err| {
        ServiceError::internal("failed to read TLS file")
            .with_reason(Reason::INTERNAL)
            .with_details(
                Details::new()
                    .with_field("path", path.display().to_string())
                    .with_field("error", err.to_string()),
            )
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Code;

    #[test]
    fn connect_options_carry_the_target() {
        let config = DatabaseConfig {
            host: "db.internal".to_string(),
            port: 6543,
            user: "svc".to_string(),
            database: "orders".to_string(),
            schema: "billing".to_string(),
            ..DatabaseConfig::default()
        };
        let options = config.connect_options().unwrap();

        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "svc");
        assert_eq!(options.get_database(), Some("orders"));
        assert_eq!(options.get_options(), Some("-c search_path=billing"));
        assert!(matches!(options.get_ssl_mode(), PgSslMode::Disable));
    }

    #[test]
    fn unknown_ssl_mode() {
        let config = DatabaseConfig {
            ssl_mode: "sometimes".to_string(),
            ..DatabaseConfig::default()
        };
        assert_eq!(config.connect_options().unwrap_err().code(), Code::Internal);
    }

    #[test]
    fn missing_tls_files_are_internal_errors() {
        let config = DatabaseConfig {
            ssl_mode: "verify-full".to_string(),
            ssl_cert: "/nonexistent/client.crt".to_string(),
            ssl_key: "/nonexistent/client.key".to_string(),
            ..DatabaseConfig::default()
        };
        assert!(config.uses_client_tls());

        let err = config.connect_options().unwrap_err();
        assert_eq!(err.code(), Code::Internal);
        assert_eq!(err.message(), "failed to read TLS file");
    }

    #[test]
    fn tls_needs_cert_and_key() {
        let config = DatabaseConfig {
            ssl_mode: "require".to_string(),
            ssl_cert: "client.crt".to_string(),
            ..DatabaseConfig::default()
        };
        assert!(!config.uses_client_tls());
        assert!(config.connect_options().is_ok());
    }

    #[test]
    fn zero_durations_disable_limits() {
        let config = DatabaseConfig {
            max_lifetime_secs: 0,
            idle_timeout_secs: 0,
            ..DatabaseConfig::default()
        };
        assert_eq!(config.max_lifetime(), None);
        assert_eq!(config.idle_timeout(), None);
        assert_eq!(config.acquire_timeout(), Duration::from_secs(30));
    }
}
