//! The `MatchStore` trait.
//!
//! Implemented by storage backends (e.g. `hookmeter-store-sqlite`). The
//! aggregation engine, the transfer functions and the CLI depend on this
//! abstraction, not on any concrete backend.

use crate::{
  catalog::{LookupEntry, LookupTable},
  record::{MatchRecord, NewMatch, TeammateHistory},
};

/// Abstraction over a Hookmeter store backend.
///
/// Matches are write-once. All calls are synchronous; the tracker runs every
/// operation sequentially on a single thread.
pub trait MatchStore {
  /// Backend error. Must be able to carry a core validation error so that
  /// callers see a single error type.
  type Error: std::error::Error + From<crate::Error> + Send + Sync + 'static;

  // ── Reads used by the aggregation engine ──────────────────────────────

  /// Every match with joined lookup entries and teammates, ordered by
  /// `played_at` then id.
  fn list_all_matches(&self) -> Result<Vec<MatchRecord>, Self::Error>;

  /// Every teammate that joined at least one match, with those matches.
  fn list_teammates_with_matches(&self) -> Result<Vec<TeammateHistory>, Self::Error>;

  // ── Writes used by the entry wizard and import ────────────────────────

  /// Validate and persist a match together with its teammates, atomically.
  /// Returns the new match id.
  fn create_match(&self, input: NewMatch) -> Result<i64, Self::Error>;

  /// Return the id of the teammate with this nickname (case-insensitive),
  /// creating it first if needed.
  fn get_or_create_teammate(&self, nickname: &str) -> Result<i64, Self::Error>;

  /// `(id, name)` pairs of a lookup table, ordered case-insensitively.
  fn list_lookup(&self, table: LookupTable) -> Result<Vec<LookupEntry>, Self::Error>;

  /// Delete one match and its teammate links. Returns `false` if no such
  /// match existed.
  fn delete_match(&self, id: i64) -> Result<bool, Self::Error>;
}
