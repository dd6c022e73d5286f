//! `hookmeter`: log Dead by Daylight matches and review statistics.
//!
//! # Usage
//!
//! ```text
//! hookmeter record --character "The Nurse" --map "Ormond - Mount Ormond Resort" \
//!   --item-used Toolbox --item-lost Toolbox --mode Duo --teammate Alex --survived --escapes 2
//! hookmeter stats
//! hookmeter --config ~/.config/hookmeter/hookmeter.toml export matches.json
//! ```

mod commands;
mod logging;
mod render;
mod settings;

use std::{
  fs,
  io::{self, Write},
  path::PathBuf,
  process::ExitCode,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use commands::RecordArgs;
use hookmeter_core::catalog::LookupTable;
use hookmeter_store_sqlite::SqliteStore;
use settings::AppConfig;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "hookmeter", author, version, about = "Dead by Daylight match tracker")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(
    short,
    long,
    global = true,
    env = "HOOKMETER_CONFIG",
    default_value = "hookmeter.toml"
  )]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Create the database and its reference data.
  Init,
  /// Log one match.
  Record(RecordArgs),
  /// Print the statistics report.
  Stats {
    /// Seed for insight selection, for reproducible output.
    #[arg(long)]
    seed: Option<u64>,
    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
  },
  /// List the most recent matches, newest first.
  History {
    #[arg(short = 'n', long, default_value_t = 20)]
    limit: usize,
  },
  /// List a lookup table: characters, maps, items or teammates.
  Lookup { table: LookupTable },
  /// Write every match to a JSON file.
  Export { file: PathBuf },
  /// Read matches from a JSON export.
  Import { file: PathBuf },
  /// Delete one match by id.
  Delete { id: i64 },
}

// ─── Entry point ─────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<ExitCode> {
  let cli = Cli::parse();
  let cfg = AppConfig::load(&cli.config)?;
  logging::init(&cfg)?;

  if let Some(parent) = cfg.db_path.parent()
    && !parent.as_os_str().is_empty()
  {
    fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  // A store that cannot be opened or initialised is fatal.
  let store = SqliteStore::open(&cfg.db_path)
    .with_context(|| format!("failed to open database at {}", cfg.db_path.display()))?;

  let mut out = io::stdout().lock();
  let result = run(&store, &cfg, cli.command, &mut out);
  out.flush().ok();

  match result {
    Ok(()) => Ok(ExitCode::SUCCESS),
    Err(e) => {
      tracing::error!("{e:#}");
      Ok(ExitCode::FAILURE)
    }
  }
}

fn run(
  store: &SqliteStore,
  cfg: &AppConfig,
  command: Command,
  out: &mut impl Write,
) -> anyhow::Result<()> {
  match command {
    Command::Init => {
      writeln!(out, "Database ready at {}.", cfg.db_path.display())?;
    }
    Command::Record(args) => {
      commands::record(store, args, cfg.unlock_phrase(), out)?;
    }
    Command::Stats { seed, json } => commands::stats(store, seed, json, out)?,
    Command::History { limit } => commands::history(store, limit, out)?,
    Command::Lookup { table } => commands::lookup(store, table, out)?,
    Command::Export { file } => commands::export(store, &file, out)?,
    Command::Import { file } => commands::import(store, &file, out)?,
    Command::Delete { id } => commands::delete(store, id, out)?,
  }
  Ok(())
}
