#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::Parser;
use slowmango::config::{ConfigManager, Settings, URI_ENV};
use slowmango::connection::ConnectionManager;
use slowmango::helpers::{
    database_from_uri, redact_uri_password, validate_mongodb_uri, validate_operation_id,
};
use slowmango::report::{ReportFormat, render};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Diagnose a slow operation recorded in a database's profiling log.
#[derive(Debug, Parser)]
#[command(name = "slowmango", version, about)]
struct Cli {
    /// Profiled operation `_id`, or the comment attached to the command
    operation_id: String,

    /// MongoDB connection string
    #[arg(long, env = URI_ENV)]
    uri: Option<String>,

    /// Database whose system.profile is searched
    #[arg(long, short)]
    database: Option<String>,

    /// Explain timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Explain verbosity (queryPlanner, executionStats, allPlansExecution)
    #[arg(long)]
    verbosity: Option<String>,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    /// Write the effective connection and diagnosis settings back to the config file
    #[arg(long)]
    save: bool,
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the diagnosis completed fully.
fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = ConfigManager::new()?;
    let mut settings = config.load_settings().unwrap_or_else(|err| {
        log::warn!("Ignoring unreadable settings: {err:#}");
        Settings::default()
    });
    apply_overrides(&mut settings, &cli);

    validate_mongodb_uri(&settings.connection.uri).map_err(|msg| anyhow!(msg))?;
    validate_operation_id(&cli.operation_id).map_err(|msg| anyhow!(msg))?;
    let database = settings
        .connection
        .database
        .clone()
        .or_else(|| database_from_uri(&settings.connection.uri))
        .context("No profile database given; pass --database or put one in the URI")?;

    if cli.save {
        config.save_settings(&settings)?;
        log::info!("Saved settings to {}", config.settings_path().display());
    }

    let manager = ConnectionManager::new().context("Failed to start async runtime")?;
    log::info!("Connecting to {}", redact_uri_password(&settings.connection.uri));
    let client = manager
        .connect_with_timeout(&settings.connection.uri, CONNECT_TIMEOUT)
        .context("Failed to connect")?;

    match manager.profiling_status(&client, &database) {
        Ok((0, _)) => log::warn!("Profiling is disabled on {database}; only old entries can match"),
        Ok((level, slow_ms)) => {
            log::debug!("Profiling level {level} on {database} (slowms {slow_ms})")
        }
        Err(err) => log::debug!("Could not read profiling status for {database}: {err}"),
    }

    let response = manager
        .diagnose_operation(&client, &database, &cli.operation_id, settings.diagnosis.to_options())
        .with_context(|| format!("Failed to diagnose {}", cli.operation_id))?;

    println!("{}", render(&response, cli.format)?);
    Ok(response.success)
}

fn apply_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(uri) = &cli.uri {
        settings.connection.uri = uri.clone();
    }
    if let Some(database) = &cli.database {
        settings.connection.database = Some(database.clone());
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        settings.diagnosis.explain_timeout_ms = timeout_ms;
    }
    if let Some(verbosity) = &cli.verbosity {
        settings.diagnosis.verbosity = verbosity.clone();
    }
}
