//! Plain-text rendering of the statistics report and the match history.

use std::{
  collections::BTreeMap,
  fmt::Display,
  io::{self, Write},
};

use hookmeter_core::{
  catalog::LookupEntry,
  insights::{Insight, times},
  record::MatchRecord,
  stats::{StatsReport, SurvivalBand, ranked},
};

/// Rows shown per frequency table.
const TOP_N: usize = 10;
const BAR_WIDTH: usize = 20;

fn band_label(rate: f64) -> &'static str {
  match SurvivalBand::of(rate) {
    SurvivalBand::High => "high",
    SurvivalBand::Medium => "medium",
    SurvivalBand::Low => "low",
  }
}

/// `[#######.............]` proportional to `rate` (a percentage).
fn bar(rate: f64) -> String {
  let filled = ((rate.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
  format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

fn heading(out: &mut impl Write, title: &str) -> io::Result<()> {
  writeln!(out)?;
  writeln!(out, "== {title} ==")
}

fn frequency_table<K: Ord + Clone + Display>(
  out: &mut impl Write,
  title: &str,
  counts: &BTreeMap<K, u32>,
  rates: Option<&BTreeMap<K, f64>>,
) -> io::Result<()> {
  if counts.is_empty() {
    return Ok(());
  }
  heading(out, title)?;
  for (key, count) in ranked(counts).into_iter().take(TOP_N) {
    let name = key.to_string();
    match rates.and_then(|r| r.get(&key)) {
      Some(&rate) => writeln!(
        out,
        "  {name:<40} {count:>4} {} {rate:>5.1}% {}",
        bar(rate),
        band_label(rate)
      )?,
      None => writeln!(out, "  {name:<40} {count:>4} {}", times(count))?,
    }
  }
  Ok(())
}

/// Write the full statistics screen.
pub fn report(out: &mut impl Write, report: &StatsReport, insights: &[Insight]) -> io::Result<()> {
  writeln!(out, "== Overview ==")?;
  if report.total_matches == 0 {
    writeln!(out, "  No matches logged yet. Record one with `hookmeter record`.")?;
    return Ok(());
  }

  let rate = report.overall_survival_rate;
  writeln!(out, "  Matches logged:  {}", report.total_matches)?;
  writeln!(out, "  Escapes:         {}", report.total_escapes)?;
  writeln!(out, "  Sacrificed:      {}", report.total_deaths())?;
  writeln!(out, "  Survival rate:   {} {rate:.1}% {}", bar(rate), band_label(rate))?;
  if let Some(leader) = &report.most_faced_character {
    writeln!(out, "  Most faced:      {} ({} {})", leader.name, leader.count, times(leader.count))?;
  }
  if let Some(leader) = &report.most_played_map {
    writeln!(out, "  Most played map: {} ({} {})", leader.name, leader.count, times(leader.count))?;
  }
  if report.special_flag_answered_count > 0 {
    writeln!(
      out,
      "  Special flag:    {} yes, {} no",
      report.special_flag_yes_count, report.special_flag_no_count
    )?;
  }

  frequency_table(
    out,
    "Characters",
    &report.matches_per_character,
    Some(&report.survival_rate_per_character),
  )?;
  frequency_table(out, "Maps", &report.matches_per_map, None)?;
  frequency_table(out, "Items brought", &report.items_used_count, None)?;
  frequency_table(out, "Items lost", &report.items_lost_count, None)?;
  frequency_table(out, "Game modes", &report.matches_per_mode, Some(&report.survival_rate_per_mode))?;

  if !report.teammate_stats.is_empty() {
    heading(out, "Teammates")?;
    let mut mates: Vec<_> = report.teammate_stats.iter().collect();
    mates.sort_by(|a, b| b.1.matches.cmp(&a.1.matches));
    for (nick, s) in mates.into_iter().take(TOP_N) {
      writeln!(
        out,
        "  {nick:<40} {:>4} {} {:>5.1}% {}",
        s.matches,
        bar(s.escape_rate),
        s.escape_rate,
        band_label(s.escape_rate)
      )?;
    }
  }

  heading(out, "Insights")?;
  for insight in insights {
    writeln!(out, "  * {insight}")?;
  }
  Ok(())
}

/// One line of `hookmeter history`.
pub fn history_line(m: &MatchRecord) -> String {
  let name = |e: &Option<LookupEntry>| {
    e.as_ref().map_or("-", |e| e.name.as_str()).to_owned()
  };
  let outcome = if m.survived {
    format!("escaped ({}/4 out)", m.survivor_escape_count)
  } else {
    format!("sacrificed ({}/4 out)", m.survivor_escape_count)
  };
  let mode = m.game_mode.map_or("-", |mode| mode.label());
  let mut line = format!(
    "#{:<5} {}  {:<22} {:<8} {:<24} {}",
    m.id,
    m.played_at.format("%Y-%m-%d %H:%M"),
    name(&m.character),
    mode,
    outcome,
    name(&m.map),
  );
  if !m.teammates.is_empty() {
    let nicks: Vec<_> = m.teammates.iter().map(|t| t.nickname.as_str()).collect();
    line.push_str(&format!("  with {}", nicks.join(", ")));
  }
  if !m.notes.is_empty() {
    line.push_str(&format!("  \"{}\"", m.notes));
  }
  line
}
