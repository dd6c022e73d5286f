//! Test fixtures: record builders and in-memory `MatchStore` fakes.

use std::cell::RefCell;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::{
  Error,
  catalog::{
    LookupEntry, LookupTable, SEED_CHARACTERS, SEED_ITEMS, SEED_MAPS, Teammate, normalize_nickname,
  },
  record::{GameMode, MatchOutcome, MatchRecord, NewMatch, TeammateHistory},
  store::MatchStore,
};

fn epoch() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap() }

// ─── Record builders ─────────────────────────────────────────────────────────

pub struct MatchBuilder {
  record: MatchRecord,
}

impl MatchBuilder {
  pub fn new() -> Self {
    Self {
      record: MatchRecord {
        id:                    0,
        played_at:             epoch(),
        character:             None,
        map:                   None,
        item_used:             None,
        item_gained:           None,
        item_lost:             None,
        survived:              false,
        survivor_escape_count: 0,
        notes:                 String::new(),
        game_mode:             None,
        special_flag:          None,
        teammates:             Vec::new(),
      },
    }
  }

  pub fn character(mut self, name: &str) -> Self {
    self.record.character = Some(LookupEntry::new(0, name));
    self
  }

  pub fn map(mut self, name: &str) -> Self {
    self.record.map = Some(LookupEntry::new(0, name));
    self
  }

  pub fn items(mut self, used: &str, gained: &str, lost: &str) -> Self {
    self.record.item_used = Some(LookupEntry::new(0, used));
    self.record.item_gained = Some(LookupEntry::new(0, gained));
    self.record.item_lost = Some(LookupEntry::new(0, lost));
    self
  }

  pub fn survived(mut self, escaped_survivors: u8) -> Self {
    self.record.survived = true;
    self.record.survivor_escape_count = escaped_survivors;
    self
  }

  pub fn mode(mut self, mode: GameMode) -> Self {
    self.record.game_mode = Some(mode);
    self
  }

  pub fn special_flag(mut self, flag: Option<bool>) -> Self {
    self.record.special_flag = flag;
    self
  }

  pub fn build(self) -> MatchRecord { self.record }
}

pub fn history(id: i64, nickname: &str, outcomes: &[bool]) -> TeammateHistory {
  TeammateHistory {
    teammate: Teammate { id, nickname: nickname.into() },
    matches:  outcomes
      .iter()
      .enumerate()
      .map(|(i, &survived)| MatchOutcome { match_id: i as i64 + 1, survived })
      .collect(),
  }
}

// ─── In-memory store ─────────────────────────────────────────────────────────

#[derive(Default)]
struct Inner {
  characters: Vec<LookupEntry>,
  maps:       Vec<LookupEntry>,
  items:      Vec<LookupEntry>,
  teammates:  Vec<Teammate>,
  matches:    Vec<MatchRecord>,
  next_id:    i64,
}

impl Inner {
  fn table(&self, table: LookupTable) -> Vec<LookupEntry> {
    match table {
      LookupTable::Characters => self.characters.clone(),
      LookupTable::Maps => self.maps.clone(),
      LookupTable::Items => self.items.clone(),
      LookupTable::Teammates => self
        .teammates
        .iter()
        .map(|t| LookupEntry::new(t.id, t.nickname.clone()))
        .collect(),
    }
  }

  fn next_id(&mut self) -> i64 {
    self.next_id += 1;
    self.next_id
  }
}

fn find(entries: &[LookupEntry], id: Option<i64>) -> Option<LookupEntry> {
  id.and_then(|id| entries.iter().find(|e| e.id == id).cloned())
}

/// A `MatchStore` over plain vectors, seeded like a fresh database.
pub struct MemoryStore {
  inner: RefCell<Inner>,
}

impl MemoryStore {
  pub fn seeded() -> Self {
    let entries = |names: &[&str], offset: i64| {
      names
        .iter()
        .enumerate()
        .map(|(i, n)| LookupEntry::new(offset + i as i64, *n))
        .collect::<Vec<_>>()
    };
    Self {
      inner: RefCell::new(Inner {
        characters: entries(SEED_CHARACTERS, 1),
        maps: entries(SEED_MAPS, 1),
        items: entries(SEED_ITEMS, 1),
        ..Default::default()
      }),
    }
  }

  pub fn id_of(&self, table: LookupTable, name: &str) -> i64 {
    self.inner.borrow().table(table).into_iter().find(|e| e.name == name).unwrap().id
  }

  /// Record a match against `character` with one teammate slot per nickname.
  pub fn record(&self, character: &str, survived: bool, teammates: &[&str]) -> i64 {
    let mode = match teammates.len() {
      0 => GameMode::Solo,
      1 => GameMode::Duo,
      2 => GameMode::Trio,
      _ => GameMode::FullTeam,
    };
    let input = NewMatch {
      character_id: Some(self.id_of(LookupTable::Characters, character)),
      survived,
      survivor_escape_count: u8::from(survived),
      game_mode: Some(mode),
      teammates: teammates.iter().map(|t| t.to_string()).collect(),
      ..Default::default()
    };
    self.create_match(input).unwrap()
  }
}

impl MatchStore for MemoryStore {
  type Error = Error;

  fn list_all_matches(&self) -> Result<Vec<MatchRecord>, Error> {
    let mut matches = self.inner.borrow().matches.clone();
    matches.sort_by_key(|m| (m.played_at, m.id));
    Ok(matches)
  }

  fn list_teammates_with_matches(&self) -> Result<Vec<TeammateHistory>, Error> {
    let inner = self.inner.borrow();
    Ok(
      inner
        .teammates
        .iter()
        .map(|t| TeammateHistory {
          teammate: t.clone(),
          matches:  inner
            .matches
            .iter()
            .filter(|m| m.teammates.iter().any(|mt| mt.id == t.id))
            .map(|m| MatchOutcome { match_id: m.id, survived: m.survived })
            .collect(),
        })
        .filter(|h| !h.matches.is_empty())
        .collect(),
    )
  }

  fn create_match(&self, input: NewMatch) -> Result<i64, Error> {
    input.validate()?;
    let mut teammates = Vec::new();
    for nick in input.teammate_nicknames() {
      let id = self.get_or_create_teammate(&nick)?;
      let teammate = self.inner.borrow().teammates.iter().find(|t| t.id == id).cloned();
      teammates.extend(teammate);
    }

    let mut inner = self.inner.borrow_mut();
    let id = inner.next_id();
    let record = MatchRecord {
      id,
      played_at: input.played_at.unwrap_or_else(|| epoch() + Duration::minutes(id)),
      character: find(&inner.characters, input.character_id),
      map: find(&inner.maps, input.map_id),
      item_used: find(&inner.items, input.item_used_id),
      item_gained: find(&inner.items, input.item_gained_id),
      item_lost: find(&inner.items, input.item_lost_id),
      survived: input.survived,
      survivor_escape_count: input.survivor_escape_count,
      notes: input.notes,
      game_mode: input.game_mode,
      special_flag: input.special_flag,
      teammates,
    };
    inner.matches.push(record);
    Ok(id)
  }

  fn get_or_create_teammate(&self, nickname: &str) -> Result<i64, Error> {
    let nickname = normalize_nickname(nickname)?;
    let mut inner = self.inner.borrow_mut();
    if let Some(t) = inner.teammates.iter().find(|t| t.nickname.eq_ignore_ascii_case(nickname)) {
      return Ok(t.id);
    }
    let id = inner.next_id();
    inner.teammates.push(Teammate { id, nickname: nickname.to_owned() });
    Ok(id)
  }

  fn list_lookup(&self, table: LookupTable) -> Result<Vec<LookupEntry>, Error> {
    let mut entries = self.inner.borrow().table(table);
    entries.sort_by_key(|e| e.name.to_lowercase());
    Ok(entries)
  }

  fn delete_match(&self, id: i64) -> Result<bool, Error> {
    let mut inner = self.inner.borrow_mut();
    let before = inner.matches.len();
    inner.matches.retain(|m| m.id != id);
    Ok(inner.matches.len() != before)
  }
}

// ─── Failing store ───────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum OfflineError {
  #[error("storage offline")]
  Offline,

  #[error(transparent)]
  Core(#[from] Error),
}

/// A store whose every operation fails.
pub struct FailingStore;

impl MatchStore for FailingStore {
  type Error = OfflineError;

  fn list_all_matches(&self) -> Result<Vec<MatchRecord>, OfflineError> { Err(OfflineError::Offline) }

  fn list_teammates_with_matches(&self) -> Result<Vec<TeammateHistory>, OfflineError> {
    Err(OfflineError::Offline)
  }

  fn create_match(&self, _input: NewMatch) -> Result<i64, OfflineError> { Err(OfflineError::Offline) }

  fn get_or_create_teammate(&self, _nickname: &str) -> Result<i64, OfflineError> {
    Err(OfflineError::Offline)
  }

  fn list_lookup(&self, _table: LookupTable) -> Result<Vec<LookupEntry>, OfflineError> {
    Err(OfflineError::Offline)
  }

  fn delete_match(&self, _id: i64) -> Result<bool, OfflineError> { Err(OfflineError::Offline) }
}
