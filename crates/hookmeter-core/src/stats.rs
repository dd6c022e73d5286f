//! Aggregation engine. Turns the match history into a [`StatsReport`].
//!
//! The report is always recomputed from scratch. Maps are keyed by display
//! name (or [`GameMode`]) and stored unsorted; [`ranked`] gives the
//! descending-count view used for display and top-N selection.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
  record::{GameMode, MatchRecord, TeammateHistory},
  store::MatchStore,
};

/// Survival rate (percent) at or above which a rate counts as high.
pub const HIGH_SURVIVAL_RATE: f64 = 60.0;
/// Survival rate (percent) at or above which a rate counts as medium.
pub const MEDIUM_SURVIVAL_RATE: f64 = 30.0;

// ─── Report ──────────────────────────────────────────────────────────────────

/// The entry with the highest count in a frequency map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Leader {
  pub name:  String,
  pub count: u32,
}

/// Co-op outcome with one teammate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TeammateStats {
  pub matches:     u32,
  pub escapes:     u32,
  pub escape_rate: f64,
}

/// Every derived statistic shown on the statistics screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsReport {
  pub total_matches:               u32,
  pub total_escapes:               u32,
  pub overall_survival_rate:       f64,
  pub matches_per_character:       BTreeMap<String, u32>,
  pub survival_rate_per_character: BTreeMap<String, f64>,
  pub most_faced_character:        Option<Leader>,
  /// Excludes the "None" item.
  pub items_used_count:            BTreeMap<String, u32>,
  /// Excludes the "None" item.
  pub items_lost_count:            BTreeMap<String, u32>,
  pub matches_per_map:             BTreeMap<String, u32>,
  pub most_played_map:             Option<Leader>,
  pub matches_per_mode:            BTreeMap<GameMode, u32>,
  pub survival_rate_per_mode:      BTreeMap<GameMode, f64>,
  pub teammate_stats:              BTreeMap<String, TeammateStats>,
  pub special_flag_yes_count:      u32,
  pub special_flag_no_count:       u32,
  pub special_flag_answered_count: u32,
}

impl StatsReport {
  /// Compute the report from the full match list and the teammate join.
  pub fn compute(matches: &[MatchRecord], teammates: &[TeammateHistory]) -> Self {
    let mut report = Self::default();
    let mut escapes_per_character: BTreeMap<String, u32> = BTreeMap::new();
    let mut escapes_per_mode: BTreeMap<GameMode, u32> = BTreeMap::new();

    for m in matches {
      report.total_matches += 1;
      if m.survived {
        report.total_escapes += 1;
      }

      if let Some(character) = &m.character {
        bump(&mut report.matches_per_character, character.name.clone());
        if m.survived {
          bump(&mut escapes_per_character, character.name.clone());
        }
      }

      if let Some(map) = &m.map {
        bump(&mut report.matches_per_map, map.name.clone());
      }

      if let Some(item) = m.item_used.as_ref().filter(|i| !i.is_none_item()) {
        bump(&mut report.items_used_count, item.name.clone());
      }
      if let Some(item) = m.item_lost.as_ref().filter(|i| !i.is_none_item()) {
        bump(&mut report.items_lost_count, item.name.clone());
      }

      if let Some(mode) = m.game_mode {
        bump(&mut report.matches_per_mode, mode);
        if m.survived {
          bump(&mut escapes_per_mode, mode);
        }
      }

      match m.special_flag {
        Some(true) => report.special_flag_yes_count += 1,
        Some(false) => report.special_flag_no_count += 1,
        None => {}
      }
    }

    report.special_flag_answered_count =
      report.special_flag_yes_count + report.special_flag_no_count;
    report.overall_survival_rate = percent(report.total_escapes, report.total_matches);

    report.survival_rate_per_character = report
      .matches_per_character
      .iter()
      .map(|(name, &count)| {
        let escapes = escapes_per_character.get(name).copied().unwrap_or(0);
        (name.clone(), percent(escapes, count))
      })
      .collect();

    report.survival_rate_per_mode = report
      .matches_per_mode
      .iter()
      .map(|(&mode, &count)| {
        let escapes = escapes_per_mode.get(&mode).copied().unwrap_or(0);
        (mode, percent(escapes, count))
      })
      .collect();

    report.most_faced_character = leader(&report.matches_per_character);
    report.most_played_map = leader(&report.matches_per_map);

    for history in teammates {
      let played = history.matches.len() as u32;
      if played == 0 {
        continue;
      }
      let escapes = history.matches.iter().filter(|o| o.survived).count() as u32;
      report.teammate_stats.insert(history.teammate.nickname.clone(), TeammateStats {
        matches:     played,
        escapes,
        escape_rate: percent(escapes, played),
      });
    }

    report
  }

  /// Matches that ended in a sacrifice.
  pub fn total_deaths(&self) -> u32 { self.total_matches - self.total_escapes }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn bump<K: Ord>(counts: &mut BTreeMap<K, u32>, key: K) {
  *counts.entry(key).or_default() += 1;
}

/// `part / whole * 100`, or 0.0 when `whole` is zero.
pub fn percent(part: u32, whole: u32) -> f64 {
  if whole == 0 {
    0.0
  } else {
    f64::from(part) / f64::from(whole) * 100.0
  }
}

/// Entries sorted by descending count; equal counts keep key order
/// (alphabetical for names).
pub fn ranked<K: Ord + Clone>(counts: &BTreeMap<K, u32>) -> Vec<(K, u32)> {
  let mut entries: Vec<(K, u32)> = counts.iter().map(|(k, &n)| (k.clone(), n)).collect();
  // Stable sort over an already key-ordered list keeps the tie-break.
  entries.sort_by(|a, b| b.1.cmp(&a.1));
  entries
}

fn leader(counts: &BTreeMap<String, u32>) -> Option<Leader> {
  ranked(counts)
    .into_iter()
    .next()
    .map(|(name, count)| Leader { name, count })
}

/// Coarse classification of a survival rate for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurvivalBand {
  High,
  Medium,
  Low,
}

impl SurvivalBand {
  pub fn of(rate: f64) -> Self {
    if rate >= HIGH_SURVIVAL_RATE {
      Self::High
    } else if rate >= MEDIUM_SURVIVAL_RATE {
      Self::Medium
    } else {
      Self::Low
    }
  }
}

// ─── Store-backed entry point ────────────────────────────────────────────────

/// A report plus a user-facing diagnostic when the history could not be read.
#[derive(Debug, Clone, Default)]
pub struct ReportOutcome {
  pub report:     StatsReport,
  pub diagnostic: Option<String>,
}

/// Read the history from `store` and compute the report.
///
/// Never fails: a storage error is logged and turned into a zeroed report
/// with a summarized diagnostic.
pub fn build_report<S: MatchStore>(store: &S) -> ReportOutcome {
  let loaded = store
    .list_all_matches()
    .and_then(|matches| Ok((matches, store.list_teammates_with_matches()?)));

  match loaded {
    Ok((matches, teammates)) => {
      tracing::debug!(matches = matches.len(), teammates = teammates.len(), "computing report");
      ReportOutcome { report: StatsReport::compute(&matches, &teammates), diagnostic: None }
    }
    Err(e) => {
      tracing::error!(operation = "build_report", error = %e, "failed to read match history");
      ReportOutcome {
        report:     StatsReport::default(),
        diagnostic: Some(
          "Statistics could not be loaded; details were written to the diagnostic log.".into(),
        ),
      }
    }
  }
}
