//! Subcommand implementations. Each writes its user-facing output to `out`.

use std::{
  fs,
  io::{BufWriter, Write},
  path::Path,
};

use anyhow::{Context as _, bail};
use clap::Args;
use hookmeter_core::{
  catalog::{LookupEntry, LookupTable, NONE_ITEM},
  insights::InsightGenerator,
  record::{GameMode, parse_timestamp},
  stats::{ReportOutcome, build_report},
  store::MatchStore,
  transfer::{import_matches, parse_import, write_export},
  wizard::{Wizard, WizardStep},
};
use hookmeter_store_sqlite::SqliteStore;
use serde_json::json;
use tracing::{info, warn};

use crate::render;

// ─── record ──────────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RecordArgs {
  /// Opposing character, as listed by `hookmeter lookup characters`.
  #[arg(long)]
  pub character: String,

  /// Map, as listed by `hookmeter lookup maps`.
  #[arg(long)]
  pub map: String,

  /// Item brought into the match.
  #[arg(long, default_value = NONE_ITEM)]
  pub item_used: String,

  /// Item found and kept. Only valid when no item was brought.
  #[arg(long)]
  pub item_gained: Option<String>,

  /// Item lost. Only valid when an item was brought.
  #[arg(long)]
  pub item_lost: Option<String>,

  /// Solo, Duo, Trio or FullTeam.
  #[arg(long, default_value = "Solo")]
  pub mode: GameMode,

  /// Teammate nickname; repeat once per slot of the mode.
  #[arg(long = "teammate", value_name = "NICK")]
  pub teammates: Vec<String>,

  /// You escaped.
  #[arg(long)]
  pub survived: bool,

  /// Survivors that escaped, yourself included (0-4). Defaults to 1 when
  /// `--survived` is given, 0 otherwise.
  #[arg(long)]
  pub escapes: Option<u8>,

  #[arg(long, default_value = "")]
  pub notes: String,

  /// Answer to the special question. Requires the unlock phrase as notes.
  #[arg(long)]
  pub special_flag: Option<bool>,

  /// When the match was played (RFC 3339). Defaults to now.
  #[arg(long)]
  pub played_at: Option<String>,
}

/// Resolve `name` in `entries`: exact match first, then case-insensitive.
fn find_id(entries: &[LookupEntry], kind: &str, name: &str) -> anyhow::Result<i64> {
  entries
    .iter()
    .find(|e| e.name == name)
    .or_else(|| entries.iter().find(|e| e.name.eq_ignore_ascii_case(name)))
    .map(|e| e.id)
    .with_context(|| format!("unknown {kind} {name:?}"))
}

/// Drive the entry wizard from `args` and save the match.
pub fn record(
  store: &SqliteStore,
  args: RecordArgs,
  unlock_phrase: Option<&str>,
  out: &mut impl Write,
) -> anyhow::Result<i64> {
  let characters = store.list_lookup(LookupTable::Characters)?;
  let maps = store.list_lookup(LookupTable::Maps)?;
  let items = store.list_lookup(LookupTable::Items)?;

  let mut wizard = Wizard::new(find_id(&items, "item", NONE_ITEM)?);
  if let Some(phrase) = unlock_phrase {
    wizard = wizard.with_unlock_phrase(phrase);
  }

  wizard.select_character(find_id(&characters, "character", &args.character)?)?;
  wizard.select_map(find_id(&maps, "map", &args.map)?)?;

  match wizard.select_item_used(find_id(&items, "item", &args.item_used)?)? {
    WizardStep::ItemGained => {
      if args.item_lost.is_some() {
        bail!("--item-lost needs an item to have been brought (--item-used)");
      }
      let gained = args.item_gained.as_deref().unwrap_or(NONE_ITEM);
      wizard.select_item_gained(find_id(&items, "item", gained)?)?;
    }
    _ => {
      if args.item_gained.is_some() {
        bail!("--item-gained only applies when no item was brought");
      }
      let lost = args.item_lost.as_deref().unwrap_or(NONE_ITEM);
      wizard.select_item_lost(find_id(&items, "item", lost)?)?;
    }
  }

  let extra = args.teammates.len().saturating_sub(args.mode.teammate_slots());
  if extra > 0 {
    warn!(mode = %args.mode, extra, "ignoring teammates beyond the mode's slots");
  }
  wizard.choose_mode(args.mode, &args.teammates)?;
  wizard.set_survived(args.survived)?;
  wizard.set_escape_count(args.escapes.unwrap_or(u8::from(args.survived)))?;
  wizard.set_notes(&args.notes)?;
  if let Some(flag) = args.special_flag {
    wizard.set_special_flag(Some(flag))?;
  }
  if let Some(raw) = &args.played_at {
    wizard.set_played_at(parse_timestamp(raw)?);
  }

  let input = wizard.commit()?;
  let id = store.create_match(input).context("failed to save match")?;
  info!(id, "match recorded");
  writeln!(out, "Recorded match #{id}.")?;
  Ok(id)
}

// ─── stats / history / lookup ────────────────────────────────────────────────

pub fn stats(
  store: &SqliteStore,
  seed: Option<u64>,
  as_json: bool,
  out: &mut impl Write,
) -> anyhow::Result<()> {
  let ReportOutcome { report, diagnostic } = build_report(store);
  let insights = match seed {
    Some(seed) => InsightGenerator::seeded(seed).generate(&report),
    None => InsightGenerator::from_entropy().generate(&report),
  };

  if let Some(diagnostic) = &diagnostic {
    writeln!(out, "{diagnostic}")?;
  }
  if as_json {
    serde_json::to_writer_pretty(&mut *out, &json!({ "report": report, "insights": insights }))?;
    writeln!(out)?;
  } else {
    render::report(out, &report, &insights)?;
  }
  Ok(())
}

pub fn history(store: &SqliteStore, limit: usize, out: &mut impl Write) -> anyhow::Result<()> {
  let matches = store.list_all_matches()?;
  if matches.is_empty() {
    writeln!(out, "No matches logged yet.")?;
    return Ok(());
  }
  for m in matches.iter().rev().take(limit) {
    writeln!(out, "{}", render::history_line(m))?;
  }
  Ok(())
}

pub fn lookup(store: &SqliteStore, table: LookupTable, out: &mut impl Write) -> anyhow::Result<()> {
  for entry in store.list_lookup(table)? {
    writeln!(out, "{:>4}  {}", entry.id, entry.name)?;
  }
  Ok(())
}

// ─── export / import / delete ────────────────────────────────────────────────

pub fn export(store: &SqliteStore, path: &Path, out: &mut impl Write) -> anyhow::Result<()> {
  let file = fs::File::create(path)
    .with_context(|| format!("failed to create {}", path.display()))?;
  let mut writer = BufWriter::new(file);
  let count = write_export(store, &mut writer).context("export failed")?;
  writer.flush()?;
  writeln!(out, "Exported {count} matches to {}.", path.display())?;
  Ok(())
}

pub fn import(store: &SqliteStore, path: &Path, out: &mut impl Write) -> anyhow::Result<()> {
  let raw = fs::read_to_string(path)
    .with_context(|| format!("failed to read {}", path.display()))?;
  let records = parse_import(&raw).with_context(|| format!("{} is not a match export", path.display()))?;
  let summary = import_matches(store, records).context("import failed")?;
  writeln!(out, "Import finished: {summary}.")?;
  Ok(())
}

pub fn delete(store: &SqliteStore, id: i64, out: &mut impl Write) -> anyhow::Result<()> {
  if store.delete_match(id)? {
    info!(id, "match deleted");
    writeln!(out, "Deleted match #{id}.")?;
  } else {
    writeln!(out, "No match with id {id}.")?;
  }
  Ok(())
}
