//! Error types for `hookmeter-core`.

use thiserror::Error;

use crate::wizard::WizardStep;

#[derive(Debug, Error)]
pub enum Error {
  #[error("survivor escape count {0} is outside 0..=4")]
  EscapeCountOutOfRange(u8),

  #[error("a survived match needs at least one escaped survivor")]
  SurvivedWithoutEscapes,

  #[error("teammate nickname is empty")]
  EmptyNickname,

  #[error("unrecognised timestamp: {0:?}")]
  InvalidTimestamp(String),

  #[error("wizard is at step {actual}, not {expected}")]
  WrongStep {
    expected: WizardStep,
    actual:   WizardStep,
  },

  #[error("the wizard is already at its first step")]
  NoPreviousStep,

  #[error("match draft is missing {0}")]
  IncompleteDraft(&'static str),

  #[error("the special flag question has not been unlocked")]
  SpecialFlagLocked,

  #[error("import data must be a JSON array of matches")]
  NotAnArray,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
