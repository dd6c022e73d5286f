//! SQL schema for the Hookmeter SQLite store.
//!
//! Executed on every open. Creation is idempotent; databases written by older
//! versions are brought up to date by [`LEGACY_MATCH_COLUMNS`].

/// Version written to `PRAGMA user_version` once the schema is in place.
pub const SCHEMA_VERSION: i64 = 1;

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS characters (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name  TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS maps (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name  TEXT NOT NULL UNIQUE
);

-- Includes the 'None' sentinel item.
CREATE TABLE IF NOT EXISTS items (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name  TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS teammates (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    nickname  TEXT NOT NULL UNIQUE COLLATE NOCASE
);

-- Matches are written once and never updated.
CREATE TABLE IF NOT EXISTS matches (
    id                     INTEGER PRIMARY KEY AUTOINCREMENT,
    played_at              TEXT NOT NULL,   -- RFC 3339 UTC, millisecond precision
    character_id           INTEGER REFERENCES characters(id),
    map_id                 INTEGER REFERENCES maps(id),
    item_used_id           INTEGER REFERENCES items(id),
    item_gained_id         INTEGER REFERENCES items(id),
    item_lost_id           INTEGER REFERENCES items(id),
    survived               INTEGER NOT NULL DEFAULT 0 CHECK (survived IN (0, 1)),
    survivor_escape_count  INTEGER NOT NULL DEFAULT 0
                           CHECK (survivor_escape_count BETWEEN 0 AND 4),
    notes                  TEXT NOT NULL DEFAULT '',
    game_mode              TEXT,            -- 'Solo' | 'Duo' | 'Trio' | 'FullTeam'
    special_flag           INTEGER,
    CHECK (survived = 0 OR survivor_escape_count >= 1)
);

CREATE TABLE IF NOT EXISTS match_teammates (
    match_id     INTEGER NOT NULL REFERENCES matches(id) ON DELETE CASCADE,
    teammate_id  INTEGER NOT NULL REFERENCES teammates(id),
    PRIMARY KEY (match_id, teammate_id)
);

CREATE INDEX IF NOT EXISTS matches_played_at_idx     ON matches(played_at);
CREATE INDEX IF NOT EXISTS match_teammates_mate_idx  ON match_teammates(teammate_id);
";

/// Columns added to `matches` after the first release, with their DDL.
pub const LEGACY_MATCH_COLUMNS: &[(&str, &str)] = &[
  ("game_mode", "ALTER TABLE matches ADD COLUMN game_mode TEXT"),
  ("special_flag", "ALTER TABLE matches ADD COLUMN special_flag INTEGER"),
];
