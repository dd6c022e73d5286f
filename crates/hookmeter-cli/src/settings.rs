//! Layered configuration: built-in defaults, an optional TOML file, then
//! `HOOKMETER_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// SQLite database file.
  pub db_path:             PathBuf,
  /// Append-only diagnostic log.
  pub log_path:            PathBuf,
  /// `EnvFilter` directive for the log file when `RUST_LOG` is unset.
  pub log_level:           String,
  /// Notes text that unlocks the special flag question. Empty disables it.
  pub special_flag_phrase: String,
}

impl AppConfig {
  /// Load from `path` (which may not exist) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let builder = defaults()?
      .add_source(File::from(path).required(false))
      .add_source(Environment::with_prefix("HOOKMETER"));
    Self::build(builder)
  }

  fn build(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
    let mut cfg: Self = builder
      .build()
      .context("failed to read config")?
      .try_deserialize()
      .context("failed to deserialise AppConfig")?;
    cfg.db_path = expand_tilde(&cfg.db_path);
    cfg.log_path = expand_tilde(&cfg.log_path);
    Ok(cfg)
  }

  pub fn unlock_phrase(&self) -> Option<&str> {
    let phrase = self.special_flag_phrase.trim();
    (!phrase.is_empty()).then_some(phrase)
  }
}

fn defaults() -> anyhow::Result<ConfigBuilder<DefaultState>> {
  Ok(
    Config::builder()
      .set_default("db_path", "hookmeter.db")?
      .set_default("log_path", "hookmeter.log")?
      .set_default("log_level", "info")?
      .set_default("special_flag_phrase", "stopassole")?,
  )
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
