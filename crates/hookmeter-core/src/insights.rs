//! Insight generator: short natural-language observations about a report.
//!
//! Candidates are derived deterministically from a [`StatsReport`]; the final
//! selection samples at most [`MAX_INSIGHTS`] of them with an injected random
//! source so tests can fix the seed.

use std::fmt;

use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::Serialize;

use crate::{
  record::GameMode,
  stats::{StatsReport, percent, ranked},
};

/// Below this many matches only [`Insight::PlayMore`] is shown.
pub const MIN_MATCHES_FOR_INSIGHTS: u32 = 5;
/// A character needs this many matches to take part in matchup insights.
pub const MIN_MATCHES_PER_CHARACTER: u32 = 3;
/// Lost/used percentage above which the favourite item gets a warning.
pub const ITEM_LOSS_WARNING_RATE: f64 = 50.0;
pub const MAX_INSIGHTS: usize = 2;

/// `"time"` or `"times"`.
pub fn times(count: u32) -> &'static str {
  if count == 1 { "time" } else { "times" }
}

// ─── Insight ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Insight {
  PlayMore,
  BestMatchup { character: String, survival_rate: f64 },
  WorstMatchup { character: String, survival_rate: f64 },
  FavoriteItem { item: String, count: u32 },
  ItemLossWarning { item: String, loss_rate: f64 },
  FavoriteMode { mode: GameMode, survival_rate: f64 },
  KeepLogging,
}

impl fmt::Display for Insight {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::PlayMore => {
        write!(f, "Log a few more matches to start unlocking insights about your games!")
      }
      Self::BestMatchup { character, survival_rate } => write!(
        f,
        "You seem to do well against '{character}', escaping {survival_rate:.1}% of the time!"
      ),
      Self::WorstMatchup { character, survival_rate } => write!(
        f,
        "'{character}' has been a challenge, with only {survival_rate:.1}% escapes. \
         Time for a new strategy?"
      ),
      Self::FavoriteItem { item, count } => {
        write!(f, "Your favourite item seems to be '{item}', brought {count} {}.", times(*count))
      }
      Self::ItemLossWarning { item, loss_rate } => write!(
        f,
        "Careful! You lost '{item}' in {loss_rate:.1}% of the matches you brought it."
      ),
      Self::FavoriteMode { mode, survival_rate } => write!(
        f,
        "You play {mode} the most. Your escape rate there is {survival_rate:.1}%."
      ),
      Self::KeepLogging => write!(f, "Keep logging your matches to unlock more insights!"),
    }
  }
}

// ─── Candidates ──────────────────────────────────────────────────────────────

/// Every insight the report supports, before sampling.
///
/// Does not apply the [`MIN_MATCHES_FOR_INSIGHTS`] gate.
pub fn candidates(report: &StatsReport) -> Vec<Insight> {
  let mut pool = Vec::new();
  matchup_insights(report, &mut pool);
  item_insights(report, &mut pool);
  mode_insight(report, &mut pool);
  pool
}

fn matchup_insights(report: &StatsReport, pool: &mut Vec<Insight>) {
  let mut best: Option<(&str, f64)> = None;
  let mut worst: Option<(&str, f64)> = None;

  // Alphabetical iteration plus strict comparisons: ties go to the first name.
  for (name, &count) in &report.matches_per_character {
    if count < MIN_MATCHES_PER_CHARACTER {
      continue;
    }
    let rate = report.survival_rate_per_character.get(name).copied().unwrap_or(0.0);
    if best.is_none_or(|(_, b)| rate > b) {
      best = Some((name, rate));
    }
    if worst.is_none_or(|(_, w)| rate < w) {
      worst = Some((name, rate));
    }
  }

  if let Some((character, survival_rate)) = best {
    pool.push(Insight::BestMatchup { character: character.to_owned(), survival_rate });
  }
  if let Some((character, survival_rate)) = worst
    && best.is_none_or(|(b, _)| b != character)
  {
    pool.push(Insight::WorstMatchup { character: character.to_owned(), survival_rate });
  }
}

fn item_insights(report: &StatsReport, pool: &mut Vec<Insight>) {
  let Some((item, used)) = ranked(&report.items_used_count).into_iter().next() else {
    return;
  };
  pool.push(Insight::FavoriteItem { item: item.clone(), count: used });

  if let Some(&lost) = report.items_lost_count.get(&item) {
    let loss_rate = percent(lost, used);
    if loss_rate > ITEM_LOSS_WARNING_RATE {
      pool.push(Insight::ItemLossWarning { item, loss_rate });
    }
  }
}

fn mode_insight(report: &StatsReport, pool: &mut Vec<Insight>) {
  if let Some((mode, _)) = ranked(&report.matches_per_mode).into_iter().next() {
    let survival_rate = report.survival_rate_per_mode.get(&mode).copied().unwrap_or(0.0);
    pool.push(Insight::FavoriteMode { mode, survival_rate });
  }
}

// ─── Generator ───────────────────────────────────────────────────────────────

/// Selects the insights to display, using `R` for sampling.
pub struct InsightGenerator<R = StdRng> {
  rng: R,
}

impl InsightGenerator<StdRng> {
  /// Deterministic generator for tests and reproducible output.
  pub fn seeded(seed: u64) -> Self { Self::new(StdRng::seed_from_u64(seed)) }

  pub fn from_entropy() -> Self { Self::new(StdRng::from_entropy()) }
}

impl<R: Rng> InsightGenerator<R> {
  pub fn new(rng: R) -> Self { Self { rng } }

  /// Between one and [`MAX_INSIGHTS`] insights for `report`.
  pub fn generate(&mut self, report: &StatsReport) -> Vec<Insight> {
    if report.total_matches < MIN_MATCHES_FOR_INSIGHTS {
      return vec![Insight::PlayMore];
    }

    let pool = candidates(report);
    if pool.is_empty() {
      return vec![Insight::KeepLogging];
    }

    pool
      .choose_multiple(&mut self.rng, MAX_INSIGHTS)
      .cloned()
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::MatchBuilder;

  fn report_of(builders: Vec<MatchBuilder>) -> StatsReport {
    let matches: Vec<_> = builders.into_iter().map(MatchBuilder::build).collect();
    StatsReport::compute(&matches, &[])
  }

  fn matchups(character: &str, played: u32, escaped: u32) -> Vec<MatchBuilder> {
    (0..played)
      .map(|i| {
        let b = MatchBuilder::new().character(character);
        if i < escaped { b.survived(1) } else { b }
      })
      .collect()
  }

  #[test]
  fn four_matches_only_prompt_to_play_more() {
    let builders = (0..4)
      .map(|_| {
        MatchBuilder::new()
          .character("The Nurse")
          .items("Toolbox", "None", "Toolbox")
          .mode(GameMode::Solo)
          .survived(1)
      })
      .collect();
    let report = report_of(builders);
    assert!(!candidates(&report).is_empty());
    assert_eq!(report.total_matches, 4);

    for seed in 0..10 {
      let insights = InsightGenerator::seeded(seed).generate(&report);
      assert_eq!(insights, vec![Insight::PlayMore]);
    }
  }

  #[test]
  fn best_and_worst_matchups() {
    let mut builders = matchups("Character A", 10, 7);
    builders.extend(matchups("Character B", 10, 2));
    let pool = candidates(&report_of(builders));

    assert!(pool.contains(&Insight::BestMatchup {
      character:     "Character A".into(),
      survival_rate: 70.0,
    }));
    assert!(pool.contains(&Insight::WorstMatchup {
      character:     "Character B".into(),
      survival_rate: 20.0,
    }));
    let text = pool[0].to_string();
    assert!(text.contains("'Character A'") && text.contains("70.0%"), "{text}");
  }

  #[test]
  fn single_eligible_character_has_no_worst_matchup() {
    let mut builders = matchups("The Hag", 5, 2);
    builders.extend(matchups("The Pig", 2, 0));
    let pool = candidates(&report_of(builders));

    assert!(matches!(&pool[0], Insight::BestMatchup { character, .. } if character == "The Hag"));
    assert!(!pool.iter().any(|i| matches!(i, Insight::WorstMatchup { .. })));
  }

  #[test]
  fn favourite_item_with_loss_warning() {
    let builders = vec![
      MatchBuilder::new().items("Toolbox", "None", "Toolbox"),
      MatchBuilder::new().items("Toolbox", "None", "Toolbox"),
      MatchBuilder::new().items("Toolbox", "None", "None"),
      MatchBuilder::new().items("Flashlight", "None", "None"),
    ];
    let pool = candidates(&report_of(builders));
    assert_eq!(pool[0], Insight::FavoriteItem { item: "Toolbox".into(), count: 3 });
    match &pool[1] {
      Insight::ItemLossWarning { item, loss_rate } => {
        assert_eq!(item, "Toolbox");
        assert!((loss_rate - 66.666).abs() < 0.01);
      }
      other => panic!("expected loss warning, got {other:?}"),
    }
  }

  #[test]
  fn half_lost_is_not_a_warning() {
    let builders = vec![
      MatchBuilder::new().items("Map", "None", "Map"),
      MatchBuilder::new().items("Map", "None", "None"),
    ];
    let pool = candidates(&report_of(builders));
    assert_eq!(pool, vec![Insight::FavoriteItem { item: "Map".into(), count: 2 }]);
  }

  #[test]
  fn favourite_mode_uses_mode_rate() {
    let builders = vec![
      MatchBuilder::new().mode(GameMode::Duo).survived(2),
      MatchBuilder::new().mode(GameMode::Duo),
      MatchBuilder::new().mode(GameMode::Solo),
    ];
    let pool = candidates(&report_of(builders));
    assert_eq!(pool, vec![Insight::FavoriteMode { mode: GameMode::Duo, survival_rate: 50.0 }]);
    assert_eq!(
      pool[0].to_string(),
      "You play Duo the most. Your escape rate there is 50.0%."
    );
  }

  #[test]
  fn empty_pool_falls_back_to_keep_logging() {
    let report = report_of((0..6).map(|_| MatchBuilder::new()).collect());
    let insights = InsightGenerator::seeded(7).generate(&report);
    assert_eq!(insights, vec![Insight::KeepLogging]);
  }

  #[test]
  fn samples_at_most_two_distinct_candidates() {
    let mut builders = matchups("Character A", 10, 7);
    builders.extend(matchups("Character B", 10, 2));
    builders.push(MatchBuilder::new().mode(GameMode::Solo).items("Toolbox", "None", "None"));
    let report = report_of(builders);
    let pool = candidates(&report);
    assert_eq!(pool.len(), 4);

    for seed in 0..20 {
      let insights = InsightGenerator::seeded(seed).generate(&report);
      assert_eq!(insights.len(), MAX_INSIGHTS);
      assert_ne!(insights[0], insights[1]);
      assert!(insights.iter().all(|i| pool.contains(i)));
    }
  }

  #[test]
  fn same_seed_same_selection() {
    let mut builders = matchups("Character A", 10, 7);
    builders.extend(matchups("Character B", 10, 2));
    builders.push(MatchBuilder::new().mode(GameMode::Trio));
    let report = report_of(builders);

    let first = InsightGenerator::seeded(42).generate(&report);
    let second = InsightGenerator::seeded(42).generate(&report);
    assert_eq!(first, second);
  }

  #[test]
  fn pluralises_times() {
    assert_eq!(times(1), "time");
    assert_eq!(times(0), "times");
    assert_eq!(times(3), "times");
  }
}
