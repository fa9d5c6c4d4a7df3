//! SQL schema for the SOC SQLite store.
//!
//! Executed at connection startup. The layout version is recorded in
//! `PRAGMA user_version`; a file written with any other version is refused
//! rather than migrated.

pub const SCHEMA_VERSION: i64 = 2;

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS soc_major_groups (
    code        TEXT PRIMARY KEY,   -- 'XX-0000'
    title       TEXT NOT NULL,
    description TEXT,
    CHECK (length(code) = 7)
);

CREATE TABLE IF NOT EXISTS soc_minor_groups (
    code             TEXT PRIMARY KEY,   -- 'XX-YY00'
    major_group_code TEXT NOT NULL REFERENCES soc_major_groups(code),
    title            TEXT NOT NULL,
    description      TEXT,
    CHECK (length(code) = 7),
    CHECK (substr(code, 1, 2) = substr(major_group_code, 1, 2))
);

CREATE TABLE IF NOT EXISTS soc_detailed_occupations (
    id                 INTEGER PRIMARY KEY,
    code               TEXT NOT NULL UNIQUE,   -- canonical 'XX-YYZZ'
    title              TEXT NOT NULL,
    description        TEXT,
    minor_group_code   TEXT NOT NULL REFERENCES soc_minor_groups(code),
    alternative_titles TEXT NOT NULL DEFAULT '[]',   -- JSON array
    searchable_text    TEXT NOT NULL,
    CHECK (length(code) = 7),
    CHECK (length(trim(title)) > 0),
    CHECK (substr(code, 1, 5) = substr(minor_group_code, 1, 5))
);

CREATE INDEX IF NOT EXISTS soc_minor_major_idx
    ON soc_minor_groups(major_group_code);
CREATE INDEX IF NOT EXISTS soc_detailed_minor_idx
    ON soc_detailed_occupations(minor_group_code);

-- rowid = soc_detailed_occupations.id. An INTEGER PRIMARY KEY keeps its
-- value across VACUUM, unlike an implicit rowid. Rows are replaced by the
-- writer whenever the occupation is upserted.
CREATE VIRTUAL TABLE IF NOT EXISTS soc_detailed_occupations_fts USING fts5(
    code UNINDEXED,
    title,
    searchable_text,
    tokenize = 'unicode61 remove_diacritics 2'
);

-- Share of an occupation's workforce per NAICS sector.
CREATE TABLE IF NOT EXISTS soc_sector_distribution (
    soc_code     TEXT NOT NULL REFERENCES soc_detailed_occupations(code),
    sector_label TEXT NOT NULL,   -- 'NAICS62'
    sample_size  INTEGER,
    percentage   REAL NOT NULL,
    date_updated TEXT,            -- 'YYYY-MM-DD'
    PRIMARY KEY (soc_code, sector_label),
    CHECK (length(trim(sector_label)) > 0),
    CHECK (percentage BETWEEN 0 AND 100)
);

CREATE INDEX IF NOT EXISTS soc_sector_label_idx
    ON soc_sector_distribution(sector_label, percentage DESC);

-- One row per committed import.
CREATE TABLE IF NOT EXISTS soc_import_runs (
    run_id                TEXT PRIMARY KEY,
    started_at            TEXT NOT NULL,   -- RFC 3339 UTC
    finished_at           TEXT NOT NULL,
    majors_written        INTEGER NOT NULL,
    minors_written        INTEGER NOT NULL,
    detailed_written      INTEGER NOT NULL,
    sector_shares_written INTEGER NOT NULL DEFAULT 0,
    rows_skipped          INTEGER NOT NULL
);

PRAGMA user_version = 2;
";
