//! Error type for `hookmeter-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] hookmeter_core::Error),

  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  /// A stored row holds a value the domain types cannot represent.
  #[error("invalid {column} in match {match_id}: {value}")]
  InvalidRow {
    match_id: i64,
    column:   &'static str,
    value:    String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
