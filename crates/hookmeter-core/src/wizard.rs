//! Entry wizard: the step-by-step form that assembles one match.
//!
//! Modelled as an explicit state machine. Each forward transition is only
//! valid from its own step; [`Wizard::commit`] is the terminal guard and only
//! succeeds from [`WizardStep::Notes`] with every required field present.
//!
//! ```text
//! Character → Map → ItemUsed ─┬→ ItemGained ─┬→ Mode → Survived → EscapeCount → Notes
//!                             └→ ItemLost ───┘
//! ```
//!
//! Using the "None" item routes to `ItemGained` (nothing could be lost);
//! any other item routes to `ItemLost` (nothing was gained).

use chrono::{DateTime, Utc};
use strum::Display;

use crate::{
  Error, Result,
  record::{GameMode, MAX_ESCAPED_SURVIVORS, NewMatch},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum WizardStep {
  Character,
  Map,
  ItemUsed,
  ItemGained,
  ItemLost,
  Mode,
  Survived,
  EscapeCount,
  Notes,
}

/// The in-progress match. Fields fill in as the wizard advances.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchDraft {
  pub character_id:          Option<i64>,
  pub map_id:                Option<i64>,
  pub item_used_id:          Option<i64>,
  pub item_gained_id:        Option<i64>,
  pub item_lost_id:          Option<i64>,
  pub game_mode:             Option<GameMode>,
  pub teammates:             Vec<String>,
  pub survived:              Option<bool>,
  pub survivor_escape_count: Option<u8>,
  pub notes:                 String,
  pub special_flag:          Option<bool>,
  pub played_at:             Option<DateTime<Utc>>,
}

pub struct Wizard {
  step:             WizardStep,
  draft:            MatchDraft,
  none_item_id:     i64,
  unlock_phrase:    Option<String>,
  special_unlocked: bool,
}

impl Wizard {
  /// Start a wizard; `none_item_id` is the id of the "None" item.
  pub fn new(none_item_id: i64) -> Self {
    Self {
      step: WizardStep::Character,
      draft: MatchDraft::default(),
      none_item_id,
      unlock_phrase: None,
      special_unlocked: false,
    }
  }

  /// Notes equal to `phrase` (case-insensitive) unlock the special flag
  /// question instead of being stored. A blank phrase leaves it locked.
  pub fn with_unlock_phrase(mut self, phrase: impl Into<String>) -> Self {
    let phrase = phrase.into().trim().to_lowercase();
    self.unlock_phrase = (!phrase.is_empty()).then_some(phrase);
    self
  }

  pub fn step(&self) -> WizardStep { self.step }

  pub fn draft(&self) -> &MatchDraft { &self.draft }

  pub fn special_flag_unlocked(&self) -> bool { self.special_unlocked }

  fn expect(&self, expected: WizardStep) -> Result<()> {
    if self.step != expected {
      return Err(Error::WrongStep { expected, actual: self.step });
    }
    Ok(())
  }

  fn advance(&mut self, to: WizardStep) -> Result<WizardStep> {
    self.step = to;
    Ok(to)
  }

  // ── Forward transitions ───────────────────────────────────────────────

  pub fn select_character(&mut self, character_id: i64) -> Result<WizardStep> {
    self.expect(WizardStep::Character)?;
    self.draft.character_id = Some(character_id);
    self.advance(WizardStep::Map)
  }

  pub fn select_map(&mut self, map_id: i64) -> Result<WizardStep> {
    self.expect(WizardStep::Map)?;
    self.draft.map_id = Some(map_id);
    self.advance(WizardStep::ItemUsed)
  }

  pub fn select_item_used(&mut self, item_id: i64) -> Result<WizardStep> {
    self.expect(WizardStep::ItemUsed)?;
    self.draft.item_used_id = Some(item_id);
    if item_id == self.none_item_id {
      self.draft.item_lost_id = Some(self.none_item_id);
      self.draft.item_gained_id = None;
      self.advance(WizardStep::ItemGained)
    } else {
      self.draft.item_gained_id = Some(self.none_item_id);
      self.draft.item_lost_id = None;
      self.advance(WizardStep::ItemLost)
    }
  }

  pub fn select_item_gained(&mut self, item_id: i64) -> Result<WizardStep> {
    self.expect(WizardStep::ItemGained)?;
    self.draft.item_gained_id = Some(item_id);
    self.advance(WizardStep::Mode)
  }

  pub fn select_item_lost(&mut self, item_id: i64) -> Result<WizardStep> {
    self.expect(WizardStep::ItemLost)?;
    self.draft.item_lost_id = Some(item_id);
    self.advance(WizardStep::Mode)
  }

  /// Choose the mode and the teammates for its slots. Nicknames beyond the
  /// mode's slot count and blank entries are dropped.
  pub fn choose_mode<I, S>(&mut self, mode: GameMode, teammates: I) -> Result<WizardStep>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    self.expect(WizardStep::Mode)?;
    self.draft.game_mode = Some(mode);
    self.draft.teammates = teammates
      .into_iter()
      .take(mode.teammate_slots())
      .map(|nick| nick.as_ref().trim().to_owned())
      .filter(|nick| !nick.is_empty())
      .collect();
    self.advance(WizardStep::Survived)
  }

  pub fn set_survived(&mut self, survived: bool) -> Result<WizardStep> {
    self.expect(WizardStep::Survived)?;
    self.draft.survived = Some(survived);
    self.advance(WizardStep::EscapeCount)
  }

  pub fn set_escape_count(&mut self, count: u8) -> Result<WizardStep> {
    self.expect(WizardStep::EscapeCount)?;
    if count > MAX_ESCAPED_SURVIVORS {
      return Err(Error::EscapeCountOutOfRange(count));
    }
    if self.draft.survived == Some(true) && count == 0 {
      return Err(Error::SurvivedWithoutEscapes);
    }
    self.draft.survivor_escape_count = Some(count);
    self.advance(WizardStep::Notes)
  }

  /// Set the free-text notes. Typing the unlock phrase reveals the special
  /// flag question and leaves the notes empty; any other text hides it again
  /// and clears a previously chosen answer.
  pub fn set_notes(&mut self, notes: &str) -> Result<WizardStep> {
    self.expect(WizardStep::Notes)?;
    let notes = notes.trim();
    let unlocks = self
      .unlock_phrase
      .as_deref()
      .is_some_and(|phrase| notes.to_lowercase() == phrase);

    if unlocks {
      self.special_unlocked = true;
      self.draft.notes.clear();
    } else {
      self.special_unlocked = false;
      self.draft.special_flag = None;
      self.draft.notes = notes.to_owned();
    }
    Ok(self.step)
  }

  pub fn set_special_flag(&mut self, flag: Option<bool>) -> Result<WizardStep> {
    self.expect(WizardStep::Notes)?;
    if !self.special_unlocked {
      return Err(Error::SpecialFlagLocked);
    }
    self.draft.special_flag = flag;
    Ok(self.step)
  }

  /// Back-date the match (e.g. when logging an older game).
  pub fn set_played_at(&mut self, played_at: DateTime<Utc>) { self.draft.played_at = Some(played_at); }

  // ── Backward transition ───────────────────────────────────────────────

  /// Return to the previous step. Values already chosen stay in the draft
  /// until they are overwritten.
  pub fn back(&mut self) -> Result<WizardStep> {
    let previous = match self.step {
      WizardStep::Character => return Err(Error::NoPreviousStep),
      WizardStep::Map => WizardStep::Character,
      WizardStep::ItemUsed => WizardStep::Map,
      WizardStep::ItemGained | WizardStep::ItemLost => WizardStep::ItemUsed,
      WizardStep::Mode => {
        if self.draft.item_used_id == Some(self.none_item_id) {
          WizardStep::ItemGained
        } else {
          WizardStep::ItemLost
        }
      }
      WizardStep::Survived => WizardStep::Mode,
      WizardStep::EscapeCount => WizardStep::Survived,
      WizardStep::Notes => WizardStep::EscapeCount,
    };
    self.advance(previous)
  }

  // ── Terminal transition ───────────────────────────────────────────────

  /// Produce the match to persist. Only valid from the notes step with every
  /// required field filled in.
  pub fn commit(&self) -> Result<NewMatch> {
    self.expect(WizardStep::Notes)?;
    let d = &self.draft;

    let input = NewMatch {
      character_id:          Some(d.character_id.ok_or(Error::IncompleteDraft("character"))?),
      map_id:                Some(d.map_id.ok_or(Error::IncompleteDraft("map"))?),
      item_used_id:          Some(d.item_used_id.ok_or(Error::IncompleteDraft("item used"))?),
      item_gained_id:        Some(d.item_gained_id.ok_or(Error::IncompleteDraft("item gained"))?),
      item_lost_id:          Some(d.item_lost_id.ok_or(Error::IncompleteDraft("item lost"))?),
      survived:              d.survived.ok_or(Error::IncompleteDraft("survival status"))?,
      survivor_escape_count: d
        .survivor_escape_count
        .ok_or(Error::IncompleteDraft("escaped survivor count"))?,
      notes:                 d.notes.clone(),
      game_mode:             Some(d.game_mode.ok_or(Error::IncompleteDraft("game mode"))?),
      special_flag:          if self.special_unlocked { d.special_flag } else { None },
      teammates:             d.teammates.clone(),
      played_at:             d.played_at,
    };
    input.validate()?;
    Ok(input)
  }

  /// Start over after a successful save.
  pub fn reset(&mut self) {
    self.step = WizardStep::Character;
    self.draft = MatchDraft::default();
    self.special_unlocked = false;
  }
}
