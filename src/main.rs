//! `toolbox` service runner.
//!
//! Loads a TOML configuration, builds the logger, optionally connects to
//! PostgreSQL and applies migrations, registers the probe HTTP server and
//! runs everything under the lifecycle coordinator until a signal arrives.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use toolbox::config::{load_config, validate_config, ConfigError, ServiceConfig};
use toolbox::database::Pool;
use toolbox::http::{default_server_with_readiness, AlwaysReady, SharedReadiness};
use toolbox::lifecycle::{MicroService, RunContext};
use toolbox::observability::{LogFormat, Logger};

#[derive(Parser, Debug)]
#[command(name = "toolbox")]
#[command(about = "Run a microservice assembled from toolbox components", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the level of every log sink (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Override the console log format
    #[arg(long, value_enum)]
    log_format: Option<FormatArg>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Validate the configuration and exit
    #[arg(long)]
    validate_config: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Logfmt,
    Json,
}

impl From<FormatArg> for LogFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Logfmt => LogFormat::Logfmt,
            FormatArg::Json => LogFormat::Json,
        }
    }
}

fn effective_config(cli: &Cli) -> Result<ServiceConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    if let Some(level) = &cli.log_level {
        config.logger.console.level = level.clone();
        config.logger.file.level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.logger.console.format = format.into();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = effective_config(&cli)?;

    if cli.print_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(ExitCode::SUCCESS);
    }
    if cli.validate_config {
        println!("configuration is valid");
        return Ok(ExitCode::SUCCESS);
    }

    let logger = Logger::new(&config.logger)?;
    // Library events (sqlx, hyper) land in the same sinks.
    logger.install_global()?;

    tracing::info!(
        service = %config.name,
        version = env!("CARGO_PKG_VERSION"),
        http_enabled = config.http.enabled,
        database_enabled = config.database.is_some(),
        "Configuration loaded"
    );

    let pool = match &config.database {
        Some(db) => {
            let pool = Pool::connect(db).await?;
            if let Some(path) = &db.migrations_path {
                pool.migrate(path).await?;
            }
            Some(pool)
        }
        None => None,
    };

    let mut service = MicroService::new(config.name.clone()).with_logger(logger.clone());
    if let Some(timeout) = config.shutdown.stop_timeout() {
        service = service.with_stop_timeout(timeout);
    }
    if config.http.enabled {
        let readiness: SharedReadiness = match &pool {
            Some(pool) => Arc::new(pool.clone()),
            None => Arc::new(AlwaysReady),
        };
        service = service.with_component(default_server_with_readiness(
            config.http.server.clone(),
            readiness,
        ));
    }

    let outcome = service.run(RunContext::new()).await;

    if let Some(pool) = pool {
        pool.close().await;
    }

    let code = match outcome {
        Ok(reason) if reason.is_failure() => {
            tracing::error!(reason = %reason, "Shutdown after component failure");
            ExitCode::FAILURE
        }
        Ok(reason) => {
            tracing::info!(reason = %reason, "Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::error!(error = %error, "Service did not start");
            ExitCode::FAILURE
        }
    };

    logger.flush();
    Ok(code)
}
