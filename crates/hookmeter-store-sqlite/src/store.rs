//! [`SqliteStore`], the SQLite implementation of [`MatchStore`].

use std::{collections::HashMap, path::Path};

use chrono::Utc;
use rusqlite::{Connection, params};
use strum::IntoEnumIterator;
use tracing::{debug, info};

use hookmeter_core::{
  catalog::{LookupEntry, LookupTable, Teammate, normalize_nickname},
  record::{MatchOutcome, MatchRecord, NewMatch, TeammateHistory, encode_timestamp},
  store::MatchStore,
};

use crate::{
  Result,
  encode::{RawMatch, encode_game_mode},
  error::Error,
  schema::{LEGACY_MATCH_COLUMNS, SCHEMA, SCHEMA_VERSION},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Hookmeter match store backed by a single SQLite file.
pub struct SqliteStore {
  pub(crate) conn: Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    debug!(path = %path.display(), "opening database");
    Self::from_connection(Connection::open(path)?)
  }

  /// Open a throwaway in-memory store.
  pub fn open_in_memory() -> Result<Self> { Self::from_connection(Connection::open_in_memory()?) }

  /// Wrap an existing connection, creating or upgrading the schema in it.
  pub fn from_connection(conn: Connection) -> Result<Self> {
    let store = Self { conn };
    store.init_schema()?;
    Ok(store)
  }

  /// Create missing tables and columns and insert the seed rows.
  ///
  /// Safe to run any number of times: nothing is duplicated or dropped.
  pub fn init_schema(&self) -> Result<()> {
    self.conn.execute_batch(SCHEMA)?;
    self.add_legacy_columns()?;

    let tx = self.conn.unchecked_transaction()?;
    let mut seeded = 0;
    for table in LookupTable::iter().filter(|t| !t.seed().is_empty()) {
      let sql = format!("INSERT OR IGNORE INTO {} (name) VALUES (?1)", table.table_name());
      let mut stmt = tx.prepare(&sql)?;
      for name in table.seed() {
        seeded += stmt.execute([name])?;
      }
    }
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;

    info!(seeded, version = SCHEMA_VERSION, "schema ready");
    Ok(())
  }

  /// Add the `matches` columns that databases from older versions lack.
  fn add_legacy_columns(&self) -> Result<()> {
    let existing = {
      let mut stmt = self.conn.prepare("SELECT name FROM pragma_table_info('matches')")?;
      stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?
    };

    for (column, ddl) in LEGACY_MATCH_COLUMNS {
      if !existing.iter().any(|c| c == column) {
        info!(column, "adding missing column to matches");
        self.conn.execute(ddl, [])?;
      }
    }
    Ok(())
  }

  /// Teammates of every match, keyed by match id, in the order they were
  /// attached.
  fn teammates_by_match(&self) -> Result<HashMap<i64, Vec<Teammate>>> {
    let mut stmt = self.conn.prepare(
      "SELECT mt.match_id, t.id, t.nickname
       FROM match_teammates mt
       JOIN teammates t ON t.id = mt.teammate_id
       ORDER BY mt.match_id, mt.rowid",
    )?;
    let rows = stmt.query_map([], |row| {
      Ok((row.get::<_, i64>(0)?, Teammate { id: row.get(1)?, nickname: row.get(2)? }))
    })?;

    let mut by_match: HashMap<i64, Vec<Teammate>> = HashMap::new();
    for row in rows {
      let (match_id, teammate) = row?;
      by_match.entry(match_id).or_default().push(teammate);
    }
    Ok(by_match)
  }
}

/// Case-insensitive get-or-create on the `COLLATE NOCASE` nickname column.
///
/// Takes a bare connection so it can run inside the `create_match`
/// transaction.
fn upsert_teammate(conn: &Connection, nickname: &str) -> Result<i64> {
  let nickname = normalize_nickname(nickname)?;
  conn.execute(
    "INSERT INTO teammates (nickname) VALUES (?1) ON CONFLICT(nickname) DO NOTHING",
    [nickname],
  )?;
  let id = conn.query_row("SELECT id FROM teammates WHERE nickname = ?1", [nickname], |r| {
    r.get(0)
  })?;
  Ok(id)
}

// ─── MatchStore impl ─────────────────────────────────────────────────────────

impl MatchStore for SqliteStore {
  type Error = Error;

  fn list_all_matches(&self) -> Result<Vec<MatchRecord>> {
    let mut teammates = self.teammates_by_match()?;

    let sql = format!("{} ORDER BY m.played_at, m.id", RawMatch::SELECT);
    let mut stmt = self.conn.prepare(&sql)?;
    let raws = stmt
      .query_map([], RawMatch::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut matches = raws
      .into_iter()
      .map(|raw| {
        let mates = teammates.remove(&raw.id).unwrap_or_default();
        raw.into_record(mates)
      })
      .collect::<Result<Vec<_>>>()?;

    // Legacy naive timestamps do not sort lexically against RFC 3339 ones.
    matches.sort_by_key(|m| (m.played_at, m.id));
    debug!(count = matches.len(), "loaded matches");
    Ok(matches)
  }

  fn list_teammates_with_matches(&self) -> Result<Vec<TeammateHistory>> {
    let mut stmt = self.conn.prepare(
      "SELECT t.id, t.nickname, m.id, m.survived
       FROM teammates t
       JOIN match_teammates mt ON mt.teammate_id = t.id
       JOIN matches m          ON m.id = mt.match_id
       ORDER BY t.nickname COLLATE NOCASE, t.id, m.id",
    )?;
    let rows = stmt.query_map([], |row| {
      Ok((
        Teammate { id: row.get(0)?, nickname: row.get(1)? },
        MatchOutcome {
          match_id: row.get(2)?,
          survived: row.get::<_, Option<bool>>(3)?.unwrap_or(false),
        },
      ))
    })?;

    let mut histories: Vec<TeammateHistory> = Vec::new();
    for row in rows {
      let (teammate, outcome) = row?;
      match histories.last_mut() {
        Some(h) if h.teammate.id == teammate.id => h.matches.push(outcome),
        _ => histories.push(TeammateHistory { teammate, matches: vec![outcome] }),
      }
    }
    Ok(histories)
  }

  fn create_match(&self, input: NewMatch) -> Result<i64> {
    input.validate()?;
    let nicknames = input.teammate_nicknames();
    let played_at = encode_timestamp(input.played_at.unwrap_or_else(Utc::now));

    // Dropping the transaction on any early return rolls the write back.
    let tx = self.conn.unchecked_transaction()?;
    tx.execute(
      "INSERT INTO matches (
         played_at, character_id, map_id,
         item_used_id, item_gained_id, item_lost_id,
         survived, survivor_escape_count, notes, game_mode, special_flag
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
      params![
        played_at,
        input.character_id,
        input.map_id,
        input.item_used_id,
        input.item_gained_id,
        input.item_lost_id,
        input.survived,
        input.survivor_escape_count,
        input.notes,
        encode_game_mode(input.game_mode),
        input.special_flag,
      ],
    )?;
    let match_id = tx.last_insert_rowid();

    for nickname in &nicknames {
      let teammate_id = upsert_teammate(&tx, nickname)?;
      tx.execute(
        "INSERT OR IGNORE INTO match_teammates (match_id, teammate_id) VALUES (?1, ?2)",
        params![match_id, teammate_id],
      )?;
    }
    tx.commit()?;

    debug!(match_id, teammates = nicknames.len(), "match recorded");
    Ok(match_id)
  }

  fn get_or_create_teammate(&self, nickname: &str) -> Result<i64> {
    upsert_teammate(&self.conn, nickname)
  }

  fn list_lookup(&self, table: LookupTable) -> Result<Vec<LookupEntry>> {
    let column = table.name_column();
    let sql = format!(
      "SELECT id, {column} FROM {} ORDER BY {column} COLLATE NOCASE, id",
      table.table_name()
    );
    let mut stmt = self.conn.prepare(&sql)?;
    let entries = stmt
      .query_map([], |row| Ok(LookupEntry::new(row.get(0)?, row.get::<_, String>(1)?)))?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
  }

  fn delete_match(&self, id: i64) -> Result<bool> {
    let removed = self.conn.execute("DELETE FROM matches WHERE id = ?1", [id])?;
    debug!(id, removed, "delete match");
    Ok(removed > 0)
  }
}
