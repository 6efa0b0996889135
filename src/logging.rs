//! Tracing subscriber setup.

use color_eyre::{eyre::eyre, Result};
use std::io;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

const LOG_FILE_NAME: &str = "playit-tasks.log";

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. When a log
/// directory is set, JSON lines are also written to a daily-rotated file; the
/// returned guard must stay alive for those writes to be flushed.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
  let level = parse_level(&config.level)?;
  let filter = || {
    EnvFilter::builder()
      .with_default_directive(level.into())
      .from_env_lossy()
  };

  let stdout_layer = if config.json {
    tracing_subscriber::fmt::layer()
      .json()
      .with_writer(io::stdout)
      .with_target(true)
      .with_filter(filter())
      .boxed()
  } else {
    tracing_subscriber::fmt::layer()
      .with_writer(io::stdout)
      .with_target(true)
      .with_line_number(true)
      .with_filter(filter())
      .boxed()
  };

  let (file_layer, guard) = match config.dir {
    Some(ref dir) => {
      let appender = rolling::daily(dir, LOG_FILE_NAME);
      let (writer, guard) = tracing_appender::non_blocking(appender);
      let layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(filter())
        .boxed();
      (Some(layer), Some(guard))
    }
    None => (None, None),
  };

  tracing_subscriber::registry()
    .with(stdout_layer)
    .with(file_layer)
    .try_init()
    .map_err(|e| eyre!("Failed to install tracing subscriber: {}", e))?;

  Ok(guard)
}

fn parse_level(level: &str) -> Result<Level> {
  match level.to_lowercase().as_str() {
    "trace" => Ok(Level::TRACE),
    "debug" => Ok(Level::DEBUG),
    "info" => Ok(Level::INFO),
    "warn" => Ok(Level::WARN),
    "error" => Ok(Level::ERROR),
    other => Err(eyre!("Invalid log level: {}", other)),
  }
}
