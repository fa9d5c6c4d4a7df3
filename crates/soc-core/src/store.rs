//! The `OccupationStore` trait and supporting result types.
//!
//! The trait is implemented by storage backends (e.g. `soc-store-sqlite`).
//! The import binary and the pipeline driver depend on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  code::OccupationCode,
  occupation::DetailedOccupation,
  pipeline::PreparedBatch,
  search::{MajorGroupListing, SearchHit, SearchQuery},
  sector::TopOccupation,
};

/// Rows upserted by one successful [`OccupationStore::write`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteResult {
  /// Identifier of the audit row recorded alongside the data.
  pub run_id:                Uuid,
  pub started_at:            DateTime<Utc>,
  pub finished_at:           DateTime<Utc>,
  pub majors_written:        usize,
  pub minors_written:        usize,
  pub detailed_written:      usize,
  pub sector_shares_written: usize,
}

/// The audit record of one committed import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportRun {
  pub run_id:                Uuid,
  pub started_at:            DateTime<Utc>,
  pub finished_at:           DateTime<Utc>,
  pub majors_written:        usize,
  pub minors_written:        usize,
  pub detailed_written:      usize,
  pub sector_shares_written: usize,
  pub rows_skipped:          usize,
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
  pub majors:        usize,
  pub minors:        usize,
  pub detailed:      usize,
  pub sector_shares: usize,
  pub import_runs:   usize,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the relational store holding the SOC hierarchy.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait OccupationStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Upsert every group and occupation in `batch` in dependency order inside
  /// one transaction, refreshing the search index for each occupation.
  ///
  /// Either the whole batch is applied or none of it is.
  fn write<'a>(
    &'a self,
    batch: &'a PreparedBatch,
  ) -> impl Future<Output = Result<WriteResult, Self::Error>> + Send + 'a;

  /// Look up one detailed occupation by canonical code.
  fn get_occupation<'a>(
    &'a self,
    code: &'a OccupationCode,
  ) -> impl Future<Output = Result<Option<DetailedOccupation>, Self::Error>>
  + Send
  + 'a;

  fn counts(
    &self,
  ) -> impl Future<Output = Result<StoreCounts, Self::Error>> + Send + '_;

  /// The most recently committed import, if any.
  fn last_run(
    &self,
  ) -> impl Future<Output = Result<Option<ImportRun>, Self::Error>> + Send + '_;

  /// Keyword search over the searchable text of detailed occupations.
  fn search<'a>(
    &'a self,
    query: &'a SearchQuery,
  ) -> impl Future<Output = Result<Vec<SearchHit>, Self::Error>> + Send + 'a;

  /// Every major group with its minor groups, ordered by code.
  fn browse(
    &self,
  ) -> impl Future<Output = Result<Vec<MajorGroupListing>, Self::Error>>
  + Send
  + '_;

  /// Occupations with a share in `sector`, largest share first.
  ///
  /// `sector` is a label (`NAICS62`) or bare NAICS digits (`62`). `limit`
  /// follows [`crate::sector::effective_top_limit`].
  fn top_by_sector<'a>(
    &'a self,
    sector: &'a str,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<Vec<TopOccupation>, Self::Error>>
  + Send
  + 'a;
}
