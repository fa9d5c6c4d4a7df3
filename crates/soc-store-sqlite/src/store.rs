//! [`SqliteStore`], the SQLite implementation of [`OccupationStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tracing::info;
use uuid::Uuid;

use soc_core::{
  OccupationCode,
  occupation::{DetailedOccupation, MajorGroup, MinorGroup},
  pipeline::PreparedBatch,
  search::{MajorGroupListing, SearchHit, SearchQuery},
  sector::{TopOccupation, effective_top_limit, sector_label},
  store::{ImportRun, OccupationStore, StoreCounts, WriteResult},
};

use crate::{
  Error, Result,
  encode::{
    EncodedBatch, RawDetailed, RawImportRun, RawSearchHit, RawTopOccupation,
  },
  schema::{SCHEMA, SCHEMA_VERSION},
  writer::{RunStamp, write_batch},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An occupation store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(Error::Connection)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(Error::Connection)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    let supported = |version: i64| version == 0 || version == SCHEMA_VERSION;
    let found = self
      .conn
      .call(move |conn| {
        let found: i64 =
          conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if supported(found) {
          conn.execute_batch(SCHEMA)?;
        }
        Ok(found)
      })
      .await
      .map_err(Error::Connection)?;

    if !supported(found) {
      return Err(Error::SchemaVersion { found, expected: SCHEMA_VERSION });
    }
    Ok(())
  }
}

// ─── OccupationStore impl ────────────────────────────────────────────────────

impl OccupationStore for SqliteStore {
  type Error = Error;

  async fn write(&self, batch: &PreparedBatch) -> Result<WriteResult> {
    let encoded = EncodedBatch::new(batch)?;
    let stamp = RunStamp { run_id: Uuid::new_v4(), started_at: Utc::now() };
    let run_id = stamp.run_id;
    let started_at = stamp.started_at;

    let outcome = self
      .conn
      .call(move |conn| Ok(write_batch(conn, &encoded, &stamp)?))
      .await?;
    let (written, finished_at) = outcome?;

    info!(
      %run_id,
      majors = written.majors,
      minors = written.minors,
      detailed = written.detailed,
      sector_shares = written.sector_shares,
      "batch written"
    );

    Ok(WriteResult {
      run_id,
      started_at,
      finished_at,
      majors_written: written.majors,
      minors_written: written.minors,
      detailed_written: written.detailed,
      sector_shares_written: written.sector_shares,
    })
  }

  async fn get_occupation(
    &self,
    code: &OccupationCode,
  ) -> Result<Option<DetailedOccupation>> {
    let code_str = code.to_string();

    let raw: Option<RawDetailed> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT code, title, description, alternative_titles
             FROM soc_detailed_occupations WHERE code = ?1",
            rusqlite::params![code_str],
            RawDetailed::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawDetailed::into_occupation).transpose()
  }

  async fn counts(&self) -> Result<StoreCounts> {
    let counts = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT
             (SELECT COUNT(*) FROM soc_major_groups),
             (SELECT COUNT(*) FROM soc_minor_groups),
             (SELECT COUNT(*) FROM soc_detailed_occupations),
             (SELECT COUNT(*) FROM soc_sector_distribution),
             (SELECT COUNT(*) FROM soc_import_runs)",
          [],
          |row| {
            Ok(StoreCounts {
              majors:        row.get::<_, i64>(0)? as usize,
              minors:        row.get::<_, i64>(1)? as usize,
              detailed:      row.get::<_, i64>(2)? as usize,
              sector_shares: row.get::<_, i64>(3)? as usize,
              import_runs:   row.get::<_, i64>(4)? as usize,
            })
          },
        )?)
      })
      .await?;
    Ok(counts)
  }

  async fn last_run(&self) -> Result<Option<ImportRun>> {
    let raw: Option<RawImportRun> = self
      .conn
      .call(|conn| {
        Ok(conn
          .query_row(
            "SELECT run_id, started_at, finished_at,
                    majors_written, minors_written, detailed_written,
                    sector_shares_written, rows_skipped
             FROM soc_import_runs ORDER BY rowid DESC LIMIT 1",
            [],
            |row| {
              Ok(RawImportRun {
                run_id:                row.get(0)?,
                started_at:            row.get(1)?,
                finished_at:           row.get(2)?,
                majors_written:        row.get(3)?,
                minors_written:        row.get(4)?,
                detailed_written:      row.get(5)?,
                sector_shares_written: row.get(6)?,
                rows_skipped:          row.get(7)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawImportRun::into_run).transpose()
  }

  async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
    let words = query.words();
    if words.is_empty() {
      return Ok(Vec::new());
    }

    // Every word must match, each as a prefix.
    let match_expr = words
      .iter()
      .map(|w| format!("\"{w}\"*"))
      .collect::<Vec<_>>()
      .join(" ");
    // SQLite binds signed 64-bit integers; an offset past that range can
    // only mean "no rows".
    let limit = to_sql_int(query.effective_limit());
    let offset = to_sql_int(query.effective_offset());

    let raws: Vec<RawSearchHit> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT d.code, d.title, d.description, d.alternative_titles,
                  mi.code, mi.title, ma.code, ma.title,
                  bm25(soc_detailed_occupations_fts, 0.0, 10.0, 1.0) AS score
           FROM soc_detailed_occupations_fts f
           JOIN soc_detailed_occupations d ON d.id = f.rowid
           JOIN soc_minor_groups mi ON mi.code = d.minor_group_code
           JOIN soc_major_groups ma ON ma.code = mi.major_group_code
           WHERE soc_detailed_occupations_fts MATCH ?1
           ORDER BY score, d.code
           LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt
          .query_map(
            rusqlite::params![match_expr, limit, offset],
            RawSearchHit::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(|raw| raw.into_hit(&words)).collect()
  }

  async fn browse(&self) -> Result<Vec<MajorGroupListing>> {
    let (majors, minors): (Vec<MajorGroup>, Vec<MinorGroup>) = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT code, title, description FROM soc_major_groups ORDER BY code",
        )?;
        let majors = stmt
          .query_map([], |row| {
            Ok(MajorGroup {
              code:        row.get(0)?,
              title:       row.get(1)?,
              description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
          "SELECT code, major_group_code, title, description
           FROM soc_minor_groups ORDER BY code",
        )?;
        let minors = stmt
          .query_map([], |row| {
            Ok(MinorGroup {
              code:             row.get(0)?,
              major_group_code: row.get(1)?,
              title:            row.get(2)?,
              description:      row
                .get::<_, Option<String>>(3)?
                .unwrap_or_default(),
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((majors, minors))
      })
      .await?;

    let mut listings: Vec<MajorGroupListing> = majors
      .into_iter()
      .map(|major| MajorGroupListing { major, minors: Vec::new() })
      .collect();
    for minor in minors {
      if let Some(listing) = listings
        .iter_mut()
        .find(|l| l.major.code == minor.major_group_code)
      {
        listing.minors.push(minor);
      }
    }
    Ok(listings)
  }

  async fn top_by_sector(
    &self,
    sector: &str,
    limit: Option<usize>,
  ) -> Result<Vec<TopOccupation>> {
    let Some(label) = sector_label(sector) else {
      return Ok(Vec::new());
    };
    let limit = to_sql_int(effective_top_limit(limit));

    let raws: Vec<RawTopOccupation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT d.code, d.title, d.description,
                  s.sector_label, s.percentage, s.sample_size
           FROM soc_sector_distribution s
           JOIN soc_detailed_occupations d ON d.code = s.soc_code
           WHERE s.sector_label = ?1
           ORDER BY s.percentage DESC, d.code
           LIMIT ?2",
        )?;
        let rows = stmt
          .query_map(
            rusqlite::params![label, limit],
            RawTopOccupation::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTopOccupation::into_top).collect()
  }
}

fn to_sql_int(n: usize) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }
