//! PostgreSQL adapter.
//!
//! # Responsibilities
//! - Build connection options from configuration (search path, client TLS)
//! - Own the connection pool and apply migrations
//! - Translate driver errors into the service error taxonomy
//!
//! # Design Decisions
//! - Configuration never reads `PG*` environment variables or `.pgpass`
//! - The pool doubles as the readiness check for `/readyz`

pub mod config;
pub mod errors;
pub mod pool;

pub use config::DatabaseConfig;
pub use errors::{map_error, map_pg_error, PgErrorReport};
pub use pool::Pool;
