//! Match records, the central fact table of the tracker.
//!
//! A match is written once (by the entry wizard or by an import) and never
//! updated. Every relation is optional so that partial legacy rows still load
//! and aggregate.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{
  Error, Result,
  catalog::{LookupEntry, Teammate},
};

/// Highest value `survivor_escape_count` can take (the whole survivor team).
pub const MAX_ESCAPED_SURVIVORS: u8 = 4;

// ─── Game mode ───────────────────────────────────────────────────────────────

/// The team-size category of a match.
///
/// Parsing is case-insensitive and also accepts the labels older exports
/// used (`Dupla`, `SWF`).
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum GameMode {
  Solo,
  #[strum(to_string = "Duo", serialize = "Dupla")]
  Duo,
  Trio,
  #[strum(to_string = "FullTeam", serialize = "SWF")]
  FullTeam,
}

impl GameMode {
  /// How many teammate nicknames a match in this mode can carry.
  pub fn teammate_slots(self) -> usize {
    match self {
      Self::Solo => 0,
      Self::Duo => 1,
      Self::Trio => 2,
      Self::FullTeam => 3,
    }
  }

  /// Label used in the database and in exports.
  pub fn label(self) -> &'static str { self.into() }
}

// ─── Timestamps ──────────────────────────────────────────────────────────────

/// Naive formats written by older versions; read as UTC.
const LEGACY_TIMESTAMP_FORMATS: &[&str] = &[
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%dT%H:%M:%S",
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%d %H:%M:%S",
];

/// RFC 3339 in UTC with millisecond precision, so that lexical order of the
/// stored strings equals chronological order.
pub fn encode_timestamp(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
  let raw = raw.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Ok(dt.with_timezone(&Utc));
  }
  LEGACY_TIMESTAMP_FORMATS
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    .map(|naive| naive.and_utc())
    .ok_or_else(|| Error::InvalidTimestamp(raw.to_owned()))
}

// ─── Stored match ────────────────────────────────────────────────────────────

/// A persisted match joined with its lookup entries and teammates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
  pub id:                    i64,
  pub played_at:             DateTime<Utc>,
  pub character:             Option<LookupEntry>,
  pub map:                   Option<LookupEntry>,
  pub item_used:             Option<LookupEntry>,
  pub item_gained:           Option<LookupEntry>,
  pub item_lost:             Option<LookupEntry>,
  pub survived:              bool,
  pub survivor_escape_count: u8,
  pub notes:                 String,
  pub game_mode:             Option<GameMode>,
  pub special_flag:          Option<bool>,
  pub teammates:             Vec<Teammate>,
}

/// One match a teammate took part in, as seen by the aggregation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
  pub match_id: i64,
  pub survived: bool,
}

/// A teammate together with every match they joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeammateHistory {
  pub teammate: Teammate,
  pub matches:  Vec<MatchOutcome>,
}

// ─── New match ───────────────────────────────────────────────────────────────

/// Input for [`crate::store::MatchStore::create_match`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewMatch {
  pub character_id:          Option<i64>,
  pub map_id:                Option<i64>,
  pub item_used_id:          Option<i64>,
  pub item_gained_id:        Option<i64>,
  pub item_lost_id:          Option<i64>,
  pub survived:              bool,
  pub survivor_escape_count: u8,
  pub notes:                 String,
  pub game_mode:             Option<GameMode>,
  pub special_flag:          Option<bool>,
  /// Raw nicknames as supplied; see [`NewMatch::teammate_nicknames`].
  pub teammates:             Vec<String>,
  /// Back-dated timestamp for imports; `None` means "now".
  pub played_at:             Option<DateTime<Utc>>,
}

impl NewMatch {
  /// Check the escape-count invariants.
  pub fn validate(&self) -> Result<()> {
    if self.survivor_escape_count > MAX_ESCAPED_SURVIVORS {
      return Err(Error::EscapeCountOutOfRange(self.survivor_escape_count));
    }
    if self.survived && self.survivor_escape_count == 0 {
      return Err(Error::SurvivedWithoutEscapes);
    }
    Ok(())
  }

  /// The nicknames that will actually be persisted.
  ///
  /// Only the first `game_mode.teammate_slots()` entries count; blanks are
  /// dropped, the rest trimmed and de-duplicated case-insensitively.
  pub fn teammate_nicknames(&self) -> Vec<String> {
    let slots = self.game_mode.map_or(0, GameMode::teammate_slots);
    let mut nicknames: Vec<String> = Vec::with_capacity(slots);
    for raw in self.teammates.iter().take(slots) {
      let nick = raw.trim();
      if nick.is_empty() {
        continue;
      }
      if nicknames.iter().any(|n| n.eq_ignore_ascii_case(nick)) {
        continue;
      }
      nicknames.push(nick.to_owned());
    }
    nicknames
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn game_mode_slots() {
    assert_eq!(GameMode::Solo.teammate_slots(), 0);
    assert_eq!(GameMode::Duo.teammate_slots(), 1);
    assert_eq!(GameMode::Trio.teammate_slots(), 2);
    assert_eq!(GameMode::FullTeam.teammate_slots(), 3);
  }

  #[test]
  fn game_mode_parses_labels_and_aliases() {
    assert_eq!("FullTeam".parse::<GameMode>().unwrap(), GameMode::FullTeam);
    assert_eq!("swf".parse::<GameMode>().unwrap(), GameMode::FullTeam);
    assert_eq!("Dupla".parse::<GameMode>().unwrap(), GameMode::Duo);
    assert_eq!("trio".parse::<GameMode>().unwrap(), GameMode::Trio);
    assert!("Squad".parse::<GameMode>().is_err());
    assert_eq!(GameMode::FullTeam.label(), "FullTeam");
    assert_eq!(GameMode::Duo.to_string(), "Duo");
  }

  #[test]
  fn survived_requires_an_escape() {
    let input = NewMatch { survived: true, survivor_escape_count: 0, ..Default::default() };
    assert!(matches!(input.validate(), Err(Error::SurvivedWithoutEscapes)));

    let input = NewMatch { survived: true, survivor_escape_count: 1, ..Default::default() };
    assert!(input.validate().is_ok());
  }

  #[test]
  fn escape_count_is_capped() {
    let input = NewMatch { survivor_escape_count: 5, ..Default::default() };
    assert!(matches!(input.validate(), Err(Error::EscapeCountOutOfRange(5))));
  }

  #[test]
  fn nicknames_limited_to_mode_slots() {
    let input = NewMatch {
      game_mode: Some(GameMode::Trio),
      teammates: vec!["Alex".into(), " Sam ".into(), "Jo".into()],
      ..Default::default()
    };
    assert_eq!(input.teammate_nicknames(), vec!["Alex", "Sam"]);

    let solo = NewMatch {
      game_mode: Some(GameMode::Solo),
      teammates: vec!["Alex".into()],
      ..Default::default()
    };
    assert!(solo.teammate_nicknames().is_empty());
  }

  #[test]
  fn nicknames_skip_blanks_and_case_duplicates() {
    let input = NewMatch {
      game_mode: Some(GameMode::FullTeam),
      teammates: vec!["Alex".into(), "".into(), "ALEX".into()],
      ..Default::default()
    };
    assert_eq!(input.teammate_nicknames(), vec!["Alex"]);
  }

  #[test]
  fn timestamps_roundtrip_and_accept_legacy_formats() {
    let dt = Utc.with_ymd_and_hms(2024, 5, 1, 20, 11, 3).unwrap();
    assert_eq!(encode_timestamp(dt), "2024-05-01T20:11:03.000Z");
    assert_eq!(parse_timestamp(&encode_timestamp(dt)).unwrap(), dt);

    assert_eq!(parse_timestamp("2024-05-01 20:11:03").unwrap(), dt);
    assert_eq!(
      parse_timestamp("2024-05-01T20:11:03.250000").unwrap(),
      dt + chrono::Duration::milliseconds(250)
    );
    assert!(matches!(parse_timestamp("yesterday"), Err(Error::InvalidTimestamp(_))));
  }
}
