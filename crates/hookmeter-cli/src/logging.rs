//! Tracing setup: a terse stderr layer and an append-only diagnostic file.

use std::{fs, fs::OpenOptions, sync::Arc};

use anyhow::Context as _;
use tracing_subscriber::{
  EnvFilter, Layer as _, Registry, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

use crate::settings::AppConfig;

/// Level shown on stderr when `RUST_LOG` is unset.
const STDERR_LEVEL: &str = "warn";

/// Install the global subscriber. `RUST_LOG` overrides both layers.
pub fn init(config: &AppConfig) -> anyhow::Result<()> {
  let filter = |fallback: &str| {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
  };

  if let Some(parent) = config.log_path.parent()
    && !parent.as_os_str().is_empty()
  {
    fs::create_dir_all(parent)
      .with_context(|| format!("failed to create log directory {}", parent.display()))?;
  }
  let file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(&config.log_path)
    .with_context(|| format!("failed to open log file {}", config.log_path.display()))?;

  let stderr_layer = tracing_subscriber::fmt::layer()
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .with_filter(filter(STDERR_LEVEL));

  let file_layer = tracing_subscriber::fmt::layer()
    .with_writer(Arc::new(file))
    .with_ansi(false)
    .with_line_number(true)
    .with_filter(filter(&config.log_level));

  Registry::default()
    .with(stderr_layer)
    .with(file_layer)
    .try_init()
    .context("failed to install tracing subscriber")?;
  Ok(())
}
