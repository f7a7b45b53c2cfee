//! Logging and tracing setup

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, prelude::*, util::SubscriberInitExt, EnvFilter};

/// Initialize logging and tracing with defaults
pub fn initialize_logging() -> Result<()> {
    // Set up environment filter
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer().with_target(false).with_thread_names(true).with_ansi(true);

    tracing_subscriber::registry().with(env_filter).with(fmt_layer).try_init().context("Failed to install logger")?;

    Ok(())
}

/// Initialize logging with custom configuration.
///
/// `RUST_LOG` overrides `level` when set. With a `file`, logs are also written
/// to a daily-rolling file next to it; keep the returned guard alive until
/// exit so buffered lines are flushed.
pub fn initialize_logging_with_config(level: &str, format: &str, file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Set up formatting layer based on format
    let fmt_layer = match format {
        "json" => fmt::layer().json().with_target(true).with_thread_names(true).boxed(),
        "pretty" => {
            fmt::layer().pretty().with_target(false).with_file(true).with_line_number(true).with_ansi(true).boxed()
        }
        _ => fmt::layer().compact().with_target(false).with_ansi(true).boxed(),
    };

    let (file_layer, guard) = match file {
        Some(path) => {
            let directory = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
            let file_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_else(|| "app.log".into());

            std::fs::create_dir_all(directory)
                .with_context(|| format!("Failed to create log directory: {:?}", directory))?;

            let appender = tracing_appender::rolling::daily(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install logger")?;

    Ok(guard)
}
