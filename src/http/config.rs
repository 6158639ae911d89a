//! HTTP server settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for one HTTP server component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Component name used in lifecycle logs.
    pub name: String,
    /// Deployment environment; `production`/`prod` hide panic details.
    pub environment: String,
    pub host: String,
    pub port: u16,
    /// Per-request timeout in seconds; 0 disables it.
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            name: "default http server".to_string(),
            environment: "development".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
        }
    }
}

impl HttpConfig {
    /// `host:port` bind target.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.as_str(), "production" | "prod")
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.address(), "0.0.0.0:8080");
        assert!(!config.is_production());
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn production_aliases() {
        for env in ["production", "prod"] {
            let config = HttpConfig {
                environment: env.to_string(),
                ..HttpConfig::default()
            };
            assert!(config.is_production(), "{env}");
        }
    }

    #[test]
    fn zero_timeout_disables_it() {
        let config = HttpConfig {
            request_timeout_secs: 0,
            ..HttpConfig::default()
        };
        assert_eq!(config.request_timeout(), None);
    }
}
