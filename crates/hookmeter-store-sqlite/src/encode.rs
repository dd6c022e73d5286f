//! Encoding and decoding helpers between Hookmeter domain types and the
//! plain values stored in SQLite columns.
//!
//! Timestamps go through [`hookmeter_core::record::encode_timestamp`] and
//! [`hookmeter_core::record::parse_timestamp`]. Game modes are stored by label.

use hookmeter_core::{
  catalog::{LookupEntry, Teammate},
  record::{GameMode, MatchRecord, parse_timestamp},
};
use tracing::warn;

use crate::{Error, Result};

// ─── GameMode ────────────────────────────────────────────────────────────────

pub fn encode_game_mode(mode: Option<GameMode>) -> Option<&'static str> {
  mode.map(GameMode::label)
}

/// Unknown labels read as "no mode" rather than failing the whole history.
pub fn decode_game_mode(match_id: i64, raw: Option<&str>) -> Option<GameMode> {
  let raw = raw?;
  match raw.parse() {
    Ok(mode) => Some(mode),
    Err(_) => {
      warn!(match_id, game_mode = raw, "ignoring unknown stored game mode");
      None
    }
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

fn entry(id: Option<i64>, name: Option<String>) -> Option<LookupEntry> {
  Some(LookupEntry::new(id?, name?))
}

/// Raw values read from a `matches` row left-joined with its lookup tables.
///
/// Legacy rows may hold NULL where the current schema has defaults.
pub struct RawMatch {
  pub id:                    i64,
  pub played_at:             String,
  pub character_id:          Option<i64>,
  pub character_name:        Option<String>,
  pub map_id:                Option<i64>,
  pub map_name:              Option<String>,
  pub item_used_id:          Option<i64>,
  pub item_used_name:        Option<String>,
  pub item_gained_id:        Option<i64>,
  pub item_gained_name:      Option<String>,
  pub item_lost_id:          Option<i64>,
  pub item_lost_name:        Option<String>,
  pub survived:              Option<bool>,
  pub survivor_escape_count: Option<i64>,
  pub notes:                 Option<String>,
  pub game_mode:             Option<String>,
  pub special_flag:          Option<bool>,
}

impl RawMatch {
  /// The column list matching [`RawMatch::from_row`], over `matches m`.
  pub const SELECT: &'static str = "
    SELECT m.id, m.played_at,
           m.character_id, c.name,
           m.map_id, mp.name,
           m.item_used_id, iu.name,
           m.item_gained_id, ig.name,
           m.item_lost_id, il.name,
           m.survived, m.survivor_escape_count, m.notes,
           m.game_mode, m.special_flag
    FROM matches m
    LEFT JOIN characters c ON c.id  = m.character_id
    LEFT JOIN maps mp      ON mp.id = m.map_id
    LEFT JOIN items iu     ON iu.id = m.item_used_id
    LEFT JOIN items ig     ON ig.id = m.item_gained_id
    LEFT JOIN items il     ON il.id = m.item_lost_id";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                    row.get(0)?,
      played_at:             row.get(1)?,
      character_id:          row.get(2)?,
      character_name:        row.get(3)?,
      map_id:                row.get(4)?,
      map_name:              row.get(5)?,
      item_used_id:          row.get(6)?,
      item_used_name:        row.get(7)?,
      item_gained_id:        row.get(8)?,
      item_gained_name:      row.get(9)?,
      item_lost_id:          row.get(10)?,
      item_lost_name:        row.get(11)?,
      survived:              row.get(12)?,
      survivor_escape_count: row.get(13)?,
      notes:                 row.get(14)?,
      game_mode:             row.get(15)?,
      special_flag:          row.get(16)?,
    })
  }

  pub fn into_record(self, teammates: Vec<Teammate>) -> Result<MatchRecord> {
    let count = self.survivor_escape_count.unwrap_or(0);
    let survivor_escape_count = u8::try_from(count).map_err(|_| Error::InvalidRow {
      match_id: self.id,
      column:   "survivor_escape_count",
      value:    count.to_string(),
    })?;

    Ok(MatchRecord {
      id: self.id,
      played_at: parse_timestamp(&self.played_at)?,
      character: entry(self.character_id, self.character_name),
      map: entry(self.map_id, self.map_name),
      item_used: entry(self.item_used_id, self.item_used_name),
      item_gained: entry(self.item_gained_id, self.item_gained_name),
      item_lost: entry(self.item_lost_id, self.item_lost_name),
      survived: self.survived.unwrap_or(false),
      survivor_escape_count,
      notes: self.notes.unwrap_or_default(),
      game_mode: decode_game_mode(self.id, self.game_mode.as_deref()),
      special_flag: self.special_flag,
      teammates,
    })
  }
}
