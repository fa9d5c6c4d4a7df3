//! Transactional batch upsert.
//!
//! Runs on the connection thread. Tiers are written parents first; every
//! row-level failure is collected and, if any occurred, the transaction is
//! dropped (rolled back) and the failures are returned together.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, Transaction};
use soc_core::{
  Error as CoreError, ImportError, RowFailure, occupation::EntityKind,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::encode::{
  EncodedBatch, EncodedDetailed, EncodedSectorShare, encode_dt, encode_uuid,
};

/// Rows applied by a committed batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct Written {
  pub majors:        usize,
  pub minors:        usize,
  pub detailed:      usize,
  pub sector_shares: usize,
}

/// Identity of the run recorded in `soc_import_runs`.
pub struct RunStamp {
  pub run_id:     Uuid,
  pub started_at: DateTime<Utc>,
}

/// Outcome of a write: SQL errors outside row handling abort the call
/// outright; everything the caller should see as a domain error is in the
/// inner result.
pub type WriteOutcome = Result<(Written, DateTime<Utc>), CoreError>;

pub fn write_batch(
  conn: &mut rusqlite::Connection,
  batch: &EncodedBatch,
  stamp: &RunStamp,
) -> rusqlite::Result<WriteOutcome> {
  let tx = conn.transaction()?;
  let mut failures = Vec::new();
  let mut written = Written::default();

  // ── Major groups ──────────────────────────────────────────────────────────

  let mut majors_ok: HashSet<&str> = HashSet::new();
  let mut majors_failed: HashSet<&str> = HashSet::new();

  for major in &batch.majors {
    let result = tx.execute(
      "INSERT INTO soc_major_groups (code, title, description)
       VALUES (?1, ?2, ?3)
       ON CONFLICT(code) DO UPDATE SET
         title       = excluded.title,
         description = excluded.description",
      rusqlite::params![major.code, major.title, major.description],
    );
    match result {
      Ok(_) => {
        majors_ok.insert(&major.code);
        written.majors += 1;
      }
      Err(err) => {
        majors_failed.insert(&major.code);
        failures.push(failure(EntityKind::MajorGroup, &major.code, &err));
      }
    }
  }

  // ── Minor groups ──────────────────────────────────────────────────────────

  let mut minors_ok: HashSet<&str> = HashSet::new();
  let mut minors_failed: HashSet<&str> = HashSet::new();

  let majors = Tier::new("soc_major_groups", &majors_ok, &majors_failed);
  for minor in &batch.minors {
    let parent = minor.major_group_code.as_str();
    match majors.check(&tx, parent)? {
      Parent::Present => {}
      Parent::Failed => {
        minors_failed.insert(&minor.code);
        failures.push(parent_failed(
          EntityKind::MinorGroup,
          &minor.code,
          parent,
        ));
        continue;
      }
      Parent::Missing => {
        return Ok(Err(CoreError::ReferentialOrder {
          kind:   EntityKind::MinorGroup,
          child:  minor.code.clone(),
          parent: parent.to_owned(),
        }));
      }
    }

    let result = tx.execute(
      "INSERT INTO soc_minor_groups (code, major_group_code, title, description)
       VALUES (?1, ?2, ?3, ?4)
       ON CONFLICT(code) DO UPDATE SET
         major_group_code = excluded.major_group_code,
         title            = excluded.title,
         description      = excluded.description",
      rusqlite::params![
        minor.code,
        minor.major_group_code,
        minor.title,
        minor.description
      ],
    );
    match result {
      Ok(_) => {
        minors_ok.insert(&minor.code);
        written.minors += 1;
      }
      Err(err) => {
        minors_failed.insert(&minor.code);
        failures.push(failure(EntityKind::MinorGroup, &minor.code, &err));
      }
    }
  }

  // ── Detailed occupations ──────────────────────────────────────────────────

  let mut detailed_ok: HashSet<&str> = HashSet::new();
  let mut detailed_failed: HashSet<&str> = HashSet::new();

  let minors = Tier::new("soc_minor_groups", &minors_ok, &minors_failed);
  for occ in &batch.detailed {
    let parent = occ.minor_group_code.as_str();
    match minors.check(&tx, parent)? {
      Parent::Present => {}
      Parent::Failed => {
        detailed_failed.insert(&occ.code);
        failures.push(parent_failed(
          EntityKind::DetailedOccupation,
          &occ.code,
          parent,
        ));
        continue;
      }
      Parent::Missing => {
        return Ok(Err(CoreError::ReferentialOrder {
          kind:   EntityKind::DetailedOccupation,
          child:  occ.code.clone(),
          parent: parent.to_owned(),
        }));
      }
    }

    match upsert_detailed(&tx, occ) {
      Ok(()) => {
        detailed_ok.insert(&occ.code);
        written.detailed += 1;
      }
      Err(err) => {
        detailed_failed.insert(&occ.code);
        let kind = EntityKind::DetailedOccupation;
        failures.push(failure(kind, &occ.code, &err));
      }
    }
  }

  // ── Sector shares ─────────────────────────────────────────────────────────

  // Each occupation's shares are replaced as a set.
  let mut cleared: HashSet<&str> = HashSet::new();
  let detailed =
    Tier::new("soc_detailed_occupations", &detailed_ok, &detailed_failed);
  for share in &batch.sector_shares {
    let parent = share.soc_code.as_str();
    match detailed.check(&tx, parent)? {
      Parent::Present => {}
      Parent::Failed => {
        let child = format!("{parent}/{}", share.sector_label);
        failures.push(parent_failed(EntityKind::SectorShare, &child, parent));
        continue;
      }
      Parent::Missing => {
        return Ok(Err(CoreError::ReferentialOrder {
          kind:   EntityKind::SectorShare,
          child:  format!("{parent}/{}", share.sector_label),
          parent: parent.to_owned(),
        }));
      }
    }

    if cleared.insert(parent) {
      tx.execute(
        "DELETE FROM soc_sector_distribution WHERE soc_code = ?1",
        rusqlite::params![parent],
      )?;
    }
    match upsert_sector_share(&tx, share) {
      Ok(_) => written.sector_shares += 1,
      Err(err) => {
        let child = format!("{parent}/{}", share.sector_label);
        failures.push(failure(EntityKind::SectorShare, &child, &err));
      }
    }
  }

  if !failures.is_empty() {
    warn!(failures = failures.len(), "rolling back import");
    return Ok(Err(ImportError { failures }.into()));
  }

  // ── Audit row ─────────────────────────────────────────────────────────────

  let finished_at = Utc::now();
  tx.execute(
    "INSERT INTO soc_import_runs (
       run_id, started_at, finished_at,
       majors_written, minors_written, detailed_written,
       sector_shares_written, rows_skipped
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    rusqlite::params![
      encode_uuid(stamp.run_id),
      encode_dt(stamp.started_at),
      encode_dt(finished_at),
      written.majors as i64,
      written.minors as i64,
      written.detailed as i64,
      written.sector_shares as i64,
      batch.rows_skipped as i64,
    ],
  )?;

  tx.commit()?;
  debug!(run_id = %stamp.run_id, "transaction committed");
  Ok(Ok((written, finished_at)))
}

/// Upsert one occupation and replace its search-index row.
///
/// The index row is keyed by the occupation's `id`, which an upsert never
/// changes.
fn upsert_detailed(
  tx: &Transaction<'_>,
  occ: &EncodedDetailed,
) -> rusqlite::Result<()> {
  let id: i64 = tx.query_row(
    "INSERT INTO soc_detailed_occupations (
       code, title, description, minor_group_code,
       alternative_titles, searchable_text
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
     ON CONFLICT(code) DO UPDATE SET
       title              = excluded.title,
       description        = excluded.description,
       minor_group_code   = excluded.minor_group_code,
       alternative_titles = excluded.alternative_titles,
       searchable_text    = excluded.searchable_text
     RETURNING id",
    rusqlite::params![
      occ.code,
      occ.title,
      occ.description,
      occ.minor_group_code,
      occ.alternative_titles,
      occ.searchable_text,
    ],
    |row| row.get(0),
  )?;

  tx.execute(
    "DELETE FROM soc_detailed_occupations_fts WHERE rowid = ?1",
    rusqlite::params![id],
  )?;
  tx.execute(
    "INSERT INTO soc_detailed_occupations_fts
       (rowid, code, title, searchable_text)
     VALUES (?1, ?2, ?3, ?4)",
    rusqlite::params![id, occ.code, occ.title, occ.searchable_text],
  )?;
  Ok(())
}

fn upsert_sector_share(
  tx: &Transaction<'_>,
  share: &EncodedSectorShare,
) -> rusqlite::Result<usize> {
  tx.execute(
    "INSERT INTO soc_sector_distribution (
       soc_code, sector_label, sample_size, percentage, date_updated
     ) VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT(soc_code, sector_label) DO UPDATE SET
       sample_size  = excluded.sample_size,
       percentage   = excluded.percentage,
       date_updated = excluded.date_updated",
    rusqlite::params![
      share.soc_code,
      share.sector_label,
      share.sample_size,
      share.percentage,
      share.date_updated,
    ],
  )
}

// ─── Parent checks ───────────────────────────────────────────────────────────

enum Parent {
  Present,
  /// The parent was in this batch but its own write failed.
  Failed,
  Missing,
}

/// One already-processed tier: its table and what happened to its rows in
/// this batch.
struct Tier<'s, 'a> {
  table:   &'static str,
  written: &'s HashSet<&'a str>,
  failed:  &'s HashSet<&'a str>,
}

impl<'s, 'a> Tier<'s, 'a> {
  fn new(
    table: &'static str,
    written: &'s HashSet<&'a str>,
    failed: &'s HashSet<&'a str>,
  ) -> Self {
    Self { table, written, failed }
  }

  fn check(
    &self,
    tx: &Transaction<'_>,
    code: &str,
  ) -> rusqlite::Result<Parent> {
    if self.written.contains(code) {
      return Ok(Parent::Present);
    }
    if self.failed.contains(code) {
      return Ok(Parent::Failed);
    }
    let exists = tx
      .query_row(
        &format!("SELECT 1 FROM {} WHERE code = ?1", self.table),
        rusqlite::params![code],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false);
    Ok(if exists { Parent::Present } else { Parent::Missing })
  }
}

fn failure(
  entity: EntityKind,
  code: &str,
  err: &rusqlite::Error,
) -> RowFailure {
  warn!(%entity, code, %err, "row failed");
  RowFailure { entity, code: code.to_owned(), cause: err.to_string() }
}

fn parent_failed(entity: EntityKind, code: &str, parent: &str) -> RowFailure {
  warn!(%entity, code, parent, "parent row failed");
  RowFailure {
    entity,
    code: code.to_owned(),
    cause: format!("parent {parent} failed to write"),
  }
}
