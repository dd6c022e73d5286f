//! JSON export and import of the match history.
//!
//! Records carry names, not ids, so a file can move between databases whose
//! lookup tables were seeded in a different order. Import also accepts the
//! field names used by older exports.

use std::{collections::HashMap, fmt, io::Write};

use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  catalog::{LookupEntry, LookupTable},
  record::{GameMode, MatchRecord, NewMatch, encode_timestamp, parse_timestamp},
  store::MatchStore,
};

// ─── Wire format ─────────────────────────────────────────────────────────────

/// One match as it appears in an export file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedMatch {
  #[serde(default, alias = "match_date")]
  pub played_at:             Option<String>,
  #[serde(default, alias = "killer_name")]
  pub character_name:        Option<String>,
  #[serde(default)]
  pub map_name:              Option<String>,
  #[serde(default)]
  pub item_used_name:        Option<String>,
  #[serde(default)]
  pub item_gained_name:      Option<String>,
  #[serde(default)]
  pub item_lost_name:        Option<String>,
  #[serde(default, alias = "escaped", deserialize_with = "lenient_bool")]
  pub survived:              bool,
  #[serde(default, alias = "survivors_escaped")]
  pub survivor_escape_count: u8,
  #[serde(default)]
  pub game_mode:             Option<String>,
  #[serde(default)]
  pub notes:                 Option<String>,
  #[serde(default, alias = "jhones_sedex", deserialize_with = "lenient_opt_bool")]
  pub special_flag:          Option<bool>,
  #[serde(default)]
  pub teammates_nicks:       Vec<String>,
}

impl From<&MatchRecord> for ExportedMatch {
  fn from(m: &MatchRecord) -> Self {
    let name = |entry: &Option<LookupEntry>| entry.as_ref().map(|e| e.name.clone());
    Self {
      played_at:             Some(encode_timestamp(m.played_at)),
      character_name:        name(&m.character),
      map_name:              name(&m.map),
      item_used_name:        name(&m.item_used),
      item_gained_name:      name(&m.item_gained),
      item_lost_name:        name(&m.item_lost),
      survived:              m.survived,
      survivor_escape_count: m.survivor_escape_count,
      game_mode:             m.game_mode.map(|mode| mode.label().to_owned()),
      notes:                 Some(m.notes.clone()),
      special_flag:          m.special_flag,
      teammates_nicks:       m.teammates.iter().map(|t| t.nickname.clone()).collect(),
    }
  }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientBool {
  Bool(bool),
  Int(i64),
  Text(String),
}

impl LenientBool {
  fn into_bool<E: de::Error>(self) -> Result<bool, E> {
    match self {
      Self::Bool(b) => Ok(b),
      Self::Int(0) => Ok(false),
      Self::Int(1) => Ok(true),
      Self::Int(n) => Err(E::custom(format!("expected 0 or 1, found {n}"))),
      Self::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(E::custom(format!("expected a boolean, found {s:?}"))),
      },
    }
  }
}

/// Accepts `true`/`false`, `0`/`1` and the strings `"true"`/`"false"`.
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
  LenientBool::deserialize(deserializer)?.into_bool()
}

/// Like [`lenient_bool`], with `null` meaning unanswered.
fn lenient_opt_bool<'de, D: Deserializer<'de>>(
  deserializer: D,
) -> Result<Option<bool>, D::Error> {
  Option::<LenientBool>::deserialize(deserializer)?
    .map(LenientBool::into_bool)
    .transpose()
}

// ─── Export ──────────────────────────────────────────────────────────────────

/// Convert matches to their export form, ordered by `played_at`.
pub fn export_matches(matches: &[MatchRecord]) -> Vec<ExportedMatch> {
  let mut ordered: Vec<&MatchRecord> = matches.iter().collect();
  ordered.sort_by_key(|m| m.played_at);
  ordered.into_iter().map(ExportedMatch::from).collect()
}

/// Write every match in `store` to `writer` as a pretty-printed JSON array.
/// Returns the number of matches written.
pub fn write_export<S, W>(store: &S, writer: W) -> Result<usize, S::Error>
where
  S: MatchStore,
  W: Write,
{
  let exported = export_matches(&store.list_all_matches()?);
  serde_json::to_writer_pretty(writer, &exported).map_err(Error::from)?;
  info!(count = exported.len(), "exported matches");
  Ok(exported.len())
}

// ─── Import ──────────────────────────────────────────────────────────────────

/// Outcome of an import batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
  pub imported: usize,
  /// Records naming a character, map or item the store does not know.
  pub skipped:  usize,
  /// Records that failed to parse or to persist.
  pub errored:  usize,
}

impl fmt::Display for ImportSummary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} imported, {} skipped, {} errored",
      self.imported, self.skipped, self.errored
    )
  }
}

/// Split an import file into its records. The top level must be an array.
pub fn parse_import(raw: &str) -> Result<Vec<Value>> {
  match serde_json::from_str(raw)? {
    Value::Array(records) => Ok(records),
    _ => Err(Error::NotAnArray),
  }
}

enum Resolved {
  Ready(NewMatch),
  Unknown { table: LookupTable, name: String },
}

/// Name → id maps for the seeded lookup tables.
struct NameResolver {
  characters: HashMap<String, i64>,
  maps:       HashMap<String, i64>,
  items:      HashMap<String, i64>,
}

impl NameResolver {
  fn load<S: MatchStore>(store: &S) -> Result<Self, S::Error> {
    let index = |table: LookupTable| -> Result<HashMap<String, i64>, S::Error> {
      Ok(store.list_lookup(table)?.into_iter().map(|e| (e.name, e.id)).collect())
    };
    Ok(Self {
      characters: index(LookupTable::Characters)?,
      maps:       index(LookupTable::Maps)?,
      items:      index(LookupTable::Items)?,
    })
  }

  fn id(&self, table: LookupTable, name: Option<&str>) -> Result<Option<i64>, Resolved> {
    let Some(name) = name else { return Ok(None) };
    let ids = match table {
      LookupTable::Characters => &self.characters,
      LookupTable::Maps => &self.maps,
      _ => &self.items,
    };
    ids
      .get(name)
      .map(|&id| Some(id))
      .ok_or_else(|| Resolved::Unknown { table, name: name.to_owned() })
  }

  /// Character, map and the three item ids, in that order.
  fn ids(&self, record: &ExportedMatch) -> Result<[Option<i64>; 5], Resolved> {
    Ok([
      self.id(LookupTable::Characters, record.character_name.as_deref())?,
      self.id(LookupTable::Maps, record.map_name.as_deref())?,
      self.id(LookupTable::Items, record.item_used_name.as_deref())?,
      self.id(LookupTable::Items, record.item_gained_name.as_deref())?,
      self.id(LookupTable::Items, record.item_lost_name.as_deref())?,
    ])
  }

  fn resolve(&self, record: ExportedMatch) -> Result<Resolved> {
    let [character_id, map_id, item_used_id, item_gained_id, item_lost_id] = match self.ids(&record) {
      Ok(ids) => ids,
      Err(unknown) => return Ok(unknown),
    };

    let played_at = record.played_at.as_deref().map(parse_timestamp).transpose()?;
    let game_mode = record.game_mode.as_deref().and_then(|raw| {
      let parsed = raw.parse::<GameMode>().ok();
      if parsed.is_none() {
        debug!(game_mode = raw, "unrecognised game mode imported as empty");
      }
      parsed
    });

    Ok(Resolved::Ready(NewMatch {
      character_id,
      map_id,
      item_used_id,
      item_gained_id,
      item_lost_id,
      survived: record.survived,
      survivor_escape_count: record.survivor_escape_count,
      notes: record.notes.unwrap_or_default(),
      game_mode,
      special_flag: record.special_flag,
      teammates: record.teammates_nicks,
      played_at,
    }))
  }
}

/// Persist each record through `store`. A bad record is counted and logged,
/// never fatal; only a failure to read the lookup tables aborts the batch.
pub fn import_matches<S: MatchStore>(store: &S, records: Vec<Value>) -> Result<ImportSummary, S::Error> {
  let resolver = NameResolver::load(store)?;
  let mut summary = ImportSummary::default();

  for (index, value) in records.into_iter().enumerate() {
    let resolved = serde_json::from_value::<ExportedMatch>(value)
      .map_err(Error::from)
      .and_then(|record| resolver.resolve(record));

    match resolved {
      Ok(Resolved::Ready(input)) => match store.create_match(input) {
        Ok(id) => {
          debug!(index, id, "imported match");
          summary.imported += 1;
        }
        Err(e) => {
          warn!(index, error = %e, "could not store imported match");
          summary.errored += 1;
        }
      },
      Ok(Resolved::Unknown { table, name }) => {
        warn!(index, %table, name = %name, "skipping match with unknown name");
        summary.skipped += 1;
      }
      Err(e) => {
        warn!(index, error = %e, "skipping malformed match");
        summary.errored += 1;
      }
    }
  }

  info!(
    imported = summary.imported,
    skipped = summary.skipped,
    errored = summary.errored,
    "import finished"
  );
  Ok(summary)
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::testing::MemoryStore;

  fn populated() -> MemoryStore {
    let store = MemoryStore::seeded();
    store.record("The Nurse", true, &["Alex"]);
    store.record("The Hag", false, &[]);
    store.record("The Nurse", false, &["Alex", "Sam"]);
    store
  }

  fn export_of(store: &MemoryStore) -> Vec<ExportedMatch> {
    export_matches(&store.list_all_matches().unwrap())
  }

  #[test]
  fn export_uses_names_and_labels() {
    let exported = export_of(&populated());
    assert_eq!(exported.len(), 3);

    let first = &exported[0];
    assert_eq!(first.character_name.as_deref(), Some("The Nurse"));
    assert_eq!(first.map_name, None);
    assert_eq!(first.game_mode.as_deref(), Some("Duo"));
    assert_eq!(first.teammates_nicks, vec!["Alex"]);
    assert_eq!(first.played_at.as_deref(), Some("2024-01-01T12:02:00.000Z"));

    let value = serde_json::to_value(first).unwrap();
    assert!(value.get("id").is_none());
    assert_eq!(value["survived"], json!(true));
  }

  #[test]
  fn export_then_import_reproduces_matches() {
    let source = populated();
    let mut buf = Vec::new();
    assert_eq!(write_export(&source, &mut buf).unwrap(), 3);

    let target = MemoryStore::seeded();
    let records = parse_import(std::str::from_utf8(&buf).unwrap()).unwrap();
    let summary = import_matches(&target, records).unwrap();

    assert_eq!(summary, ImportSummary { imported: 3, skipped: 0, errored: 0 });
    assert_eq!(export_of(&target), export_of(&source));
  }

  #[test]
  fn accepts_legacy_field_names() {
    let records = vec![json!({
      "match_date": "2023-11-02 21:15:00",
      "killer_name": "The Wraith",
      "escaped": 1,
      "survivors_escaped": 2,
      "game_mode": "Dupla",
      "jhones_sedex": 1,
      "teammates_nicks": ["Alex"],
    })];
    let store = MemoryStore::seeded();
    let summary = import_matches(&store, records).unwrap();
    assert_eq!(summary.imported, 1);

    let m = &store.list_all_matches().unwrap()[0];
    assert_eq!(m.character.as_ref().map(|c| c.name.as_str()), Some("The Wraith"));
    assert!(m.survived);
    assert_eq!(m.survivor_escape_count, 2);
    assert_eq!(m.game_mode, Some(GameMode::Duo));
    assert_eq!(m.teammates[0].nickname, "Alex");
    assert_eq!(encode_timestamp(m.played_at), "2023-11-02T21:15:00.000Z");
    assert_eq!(m.special_flag, Some(true));
  }

  #[test]
  fn special_flag_accepts_null_and_integers() {
    for (raw, expected) in [
      (json!(null), None),
      (json!(0), Some(false)),
      (json!(1), Some(true)),
      (json!(false), Some(false)),
    ] {
      let record: ExportedMatch =
        serde_json::from_value(json!({ "jhones_sedex": raw.clone() })).unwrap();
      assert_eq!(record.special_flag, expected, "{raw}");
    }
    let absent: ExportedMatch = serde_json::from_value(json!({})).unwrap();
    assert_eq!(absent.special_flag, None);
    assert!(serde_json::from_value::<ExportedMatch>(json!({ "special_flag": 3 })).is_err());
  }

  #[test]
  fn survived_is_lenient() {
    for (raw, expected) in [
      (json!(true), true),
      (json!(0), false),
      (json!("false"), false),
      (json!("TRUE"), true),
    ] {
      let record: ExportedMatch = serde_json::from_value(json!({ "survived": raw.clone() })).unwrap();
      assert_eq!(record.survived, expected, "{raw}");
    }
    assert!(serde_json::from_value::<ExportedMatch>(json!({ "survived": "maybe" })).is_err());
    assert!(serde_json::from_value::<ExportedMatch>(json!({ "survived": 2 })).is_err());
  }

  #[test]
  fn unknown_names_skip_and_null_names_store_empty_relations() {
    let records = vec![
      json!({ "character_name": "The Butcher", "survived": false }),
      json!({ "character_name": null, "map_name": "Haddonfield - Lampkin Lane" }),
      json!({ "item_used_name": "Golden Toolbox" }),
    ];
    let store = MemoryStore::seeded();
    let summary = import_matches(&store, records).unwrap();
    assert_eq!(summary, ImportSummary { imported: 1, skipped: 2, errored: 0 });

    let m = &store.list_all_matches().unwrap()[0];
    assert!(m.character.is_none());
    assert_eq!(m.map.as_ref().map(|e| e.name.as_str()), Some("Haddonfield - Lampkin Lane"));
  }

  #[test]
  fn bad_records_are_counted_not_fatal() {
    let records = vec![
      json!("not an object"),
      json!({ "survived": true, "survivor_escape_count": 0 }),
      json!({ "played_at": "last tuesday" }),
      json!({ "survivor_escape_count": 1, "survived": true, "game_mode": "Squad" }),
    ];
    let store = MemoryStore::seeded();
    let summary = import_matches(&store, records).unwrap();
    assert_eq!(summary, ImportSummary { imported: 1, skipped: 0, errored: 3 });
    assert_eq!(summary.to_string(), "1 imported, 0 skipped, 3 errored");

    let m = &store.list_all_matches().unwrap()[0];
    assert_eq!(m.game_mode, None);
  }

  #[test]
  fn top_level_must_be_an_array() {
    assert!(matches!(parse_import(r#"{"matches": []}"#), Err(Error::NotAnArray)));
    assert!(matches!(parse_import("[1,"), Err(Error::Serialization(_))));
    assert_eq!(parse_import("[]").unwrap(), Vec::<Value>::new());
  }
}
