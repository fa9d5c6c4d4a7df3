//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as
//! `YYYY-MM-DD`, UUIDs as hyphenated lowercase strings and alternate titles
//! as a compact JSON array.

use chrono::{DateTime, NaiveDate, Utc};
use soc_core::{
  consolidate::consolidate,
  normalize,
  occupation::{DetailedOccupation, MajorGroup, MinorGroup},
  pipeline::PreparedBatch,
  search::{GroupRef, SearchHit},
  sector::{SectorShare, TopOccupation},
  store::ImportRun,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(date: NaiveDate) -> String {
  date.format("%Y-%m-%d").to_string()
}

// ─── Alternate titles ────────────────────────────────────────────────────────

pub fn encode_titles(titles: &[String]) -> Result<String> {
  Ok(serde_json::to_string(titles)?)
}

pub fn decode_titles(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Write-side rows ─────────────────────────────────────────────────────────

/// Owned column values for one batch, ready to move onto the connection
/// thread.
pub struct EncodedBatch {
  pub majors:        Vec<MajorGroup>,
  pub minors:        Vec<MinorGroup>,
  pub detailed:      Vec<EncodedDetailed>,
  pub sector_shares: Vec<EncodedSectorShare>,
  pub rows_skipped:  usize,
}

pub struct EncodedDetailed {
  pub code:               String,
  pub title:              String,
  pub description:        Option<String>,
  pub minor_group_code:   String,
  pub alternative_titles: String,
  pub searchable_text:    String,
}

pub struct EncodedSectorShare {
  pub soc_code:     String,
  pub sector_label: String,
  pub sample_size:  Option<i64>,
  pub percentage:   f64,
  pub date_updated: Option<String>,
}

impl From<&SectorShare> for EncodedSectorShare {
  fn from(share: &SectorShare) -> Self {
    Self {
      soc_code:     share.code.to_string(),
      sector_label: share.sector_label.clone(),
      sample_size:  share.sample_size.map(i64::from),
      percentage:   share.percentage,
      date_updated: share.date_updated.map(encode_date),
    }
  }
}

impl EncodedBatch {
  pub fn new(batch: &PreparedBatch) -> Result<Self> {
    let detailed = batch
      .detailed
      .iter()
      .map(|occ| {
        Ok(EncodedDetailed {
          code:               occ.code().to_string(),
          title:              occ.title().to_owned(),
          description:        occ.description().map(str::to_owned),
          minor_group_code:   occ.minor_group_code(),
          alternative_titles: encode_titles(occ.alternative_titles())?,
          searchable_text:    occ.searchable_text().to_owned(),
        })
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(Self {
      majors: batch.majors.clone(),
      minors: batch.minors.clone(),
      detailed,
      sector_shares: batch.sector_shares.iter().map(Into::into).collect(),
      rows_skipped: batch.rows_skipped(),
    })
  }
}

// ─── Read-side rows ──────────────────────────────────────────────────────────

/// Raw strings read directly from a `soc_detailed_occupations` row.
pub struct RawDetailed {
  pub code:               String,
  pub title:              String,
  pub description:        Option<String>,
  pub alternative_titles: String,
}

impl RawDetailed {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      code:               row.get(0)?,
      title:              row.get(1)?,
      description:        row.get(2)?,
      alternative_titles: row.get(3)?,
    })
  }

  /// Rebuild the occupation through the same consolidation path the
  /// pipeline uses, so derived fields match what was written.
  pub fn into_occupation(self) -> Result<DetailedOccupation> {
    let code = normalize(&self.code)?;
    let alts = decode_titles(&self.alternative_titles)?;
    Ok(consolidate(code, &self.title, self.description.as_deref(), &alts))
  }
}

/// A detailed row joined with its groups and the FTS rank.
pub struct RawSearchHit {
  pub occupation:  RawDetailed,
  pub minor_code:  String,
  pub minor_title: String,
  pub major_code:  String,
  pub major_title: String,
  pub rank:        f64,
}

impl RawSearchHit {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      occupation:  RawDetailed::from_row(row)?,
      minor_code:  row.get(4)?,
      minor_title: row.get(5)?,
      major_code:  row.get(6)?,
      major_title: row.get(7)?,
      rank:        row.get(8)?,
    })
  }

  /// bm25 ranks are negative with lower being better; flip the sign so the
  /// hit score grows with relevance.
  pub fn into_hit(self, words: &[String]) -> Result<SearchHit> {
    Ok(SearchHit::new(
      self.occupation.into_occupation()?,
      GroupRef { code: self.major_code, title: self.major_title },
      GroupRef { code: self.minor_code, title: self.minor_title },
      words,
      -self.rank,
    ))
  }
}

/// A detailed occupation joined with one of its sector shares.
pub struct RawTopOccupation {
  pub code:         String,
  pub title:        String,
  pub description:  Option<String>,
  pub sector_label: String,
  pub percentage:   f64,
  pub sample_size:  Option<i64>,
}

impl RawTopOccupation {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      code:         row.get(0)?,
      title:        row.get(1)?,
      description:  row.get(2)?,
      sector_label: row.get(3)?,
      percentage:   row.get(4)?,
      sample_size:  row.get(5)?,
    })
  }

  pub fn into_top(self) -> Result<TopOccupation> {
    Ok(TopOccupation {
      code:         normalize(&self.code)?,
      title:        self.title,
      description:  self.description,
      sector_label: self.sector_label,
      percentage:   self.percentage,
      sample_size:  self.sample_size.and_then(|n| u32::try_from(n).ok()),
    })
  }
}

/// Raw strings read directly from a `soc_import_runs` row.
pub struct RawImportRun {
  pub run_id:                String,
  pub started_at:            String,
  pub finished_at:           String,
  pub majors_written:        i64,
  pub minors_written:        i64,
  pub detailed_written:      i64,
  pub sector_shares_written: i64,
  pub rows_skipped:          i64,
}

impl RawImportRun {
  pub fn into_run(self) -> Result<ImportRun> {
    Ok(ImportRun {
      run_id:                decode_uuid(&self.run_id)?,
      started_at:            decode_dt(&self.started_at)?,
      finished_at:           decode_dt(&self.finished_at)?,
      majors_written:        decode_count(self.majors_written),
      minors_written:        decode_count(self.minors_written),
      detailed_written:      decode_count(self.detailed_written),
      sector_shares_written: decode_count(self.sector_shares_written),
      rows_skipped:          decode_count(self.rows_skipped),
    })
  }
}

fn decode_count(n: i64) -> usize { usize::try_from(n).unwrap_or_default() }
