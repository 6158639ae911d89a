//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ports, pool sizes)
//! - Check that log levels and filter directives parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::config::schema::ServiceConfig;

/// One semantic problem, located by its dotted config path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.name.trim().is_empty() {
        errors.push(ValidationError::new("name", "must not be empty"));
    }

    for problem in config.logger.problems() {
        errors.push(ValidationError::new("logger", problem.to_string()));
    }

    if config.http.enabled {
        let server = &config.http.server;
        if server.host.trim().is_empty() {
            errors.push(ValidationError::new("http.host", "must not be empty"));
        }
        if server.port == 0 {
            errors.push(ValidationError::new("http.port", "must be between 1 and 65535"));
        }
    } else {
        errors.push(ValidationError::new(
            "http.enabled",
            "no components enabled, nothing to run",
        ));
    }

    if let Some(db) = &config.database {
        if db.host.trim().is_empty() {
            errors.push(ValidationError::new("database.host", "must not be empty"));
        }
        if db.database.trim().is_empty() {
            errors.push(ValidationError::new("database.database", "must not be empty"));
        }
        if db.max_connections == 0 {
            errors.push(ValidationError::new("database.max_connections", "must be at least 1"));
        }
        if db.min_connections > db.max_connections {
            errors.push(ValidationError::new(
                "database.min_connections",
                format!(
                    "{} exceeds max_connections {}",
                    db.min_connections, db.max_connections
                ),
            ));
        }
        if db.ssl_mode().is_err() {
            errors.push(ValidationError::new(
                "database.ssl_mode",
                format!("unknown mode {:?}", db.ssl_mode),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
