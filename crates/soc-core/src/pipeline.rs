//! Pipeline driver.
//!
//! Stages, each fed explicitly by the previous one:
//!   raw rows
//!     └─ aggregate()        → alternate titles per raw code
//!          └─ normalize()   → canonical code (malformed rows skipped)
//!               └─ consolidate() + Consolidator → one record per code
//!                    └─ build_hierarchy()      → major / minor groups
//!                         └─ with_sector_shares()  → shares per occupation
//!                              └─ OccupationStore::write()

use std::collections::HashSet;

use indexmap::IndexMap;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  Error,
  aggregate::aggregate,
  code::normalize,
  consolidate::{Consolidator, consolidate},
  hierarchy::{GroupTitleCatalog, Hierarchy, build_hierarchy},
  occupation::{
    DetailedOccupation, EntityKind, MajorGroup, MinorGroup, RawAltTitleRow,
    RawOccupationRow,
  },
  sector::{RawSectorShareRow, SectorShare},
  store::OccupationStore,
};

/// An input row that was dropped before consolidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
  pub entity:   EntityKind,
  pub raw_code: String,
  pub reason:   String,
}

impl SkippedRow {
  fn new(entity: EntityKind, raw_code: &str, err: &Error) -> Self {
    warn!(%entity, raw_code, %err, "skipping row");
    Self { entity, raw_code: raw_code.to_owned(), reason: err.to_string() }
  }
}

/// Everything the writer needs for one run, in dependency order.
#[derive(Debug, Clone, Default)]
pub struct PreparedBatch {
  pub majors:            Vec<MajorGroup>,
  pub minors:            Vec<MinorGroup>,
  pub detailed:             Vec<DetailedOccupation>,
  /// Written after `detailed`; every code is one of the batch's occupations.
  pub sector_shares:        Vec<SectorShare>,
  pub skipped:              Vec<SkippedRow>,
  /// Rows folded into an earlier row with the same canonical code.
  pub merged_rows:          usize,
  /// Alternate titles whose raw code matched no occupation row.
  pub orphan_alt_titles:    usize,
  /// Sector shares whose code matched no occupation in this batch.
  pub orphan_sector_shares: usize,
}

impl PreparedBatch {
  pub fn rows_skipped(&self) -> usize { self.skipped.len() }

  /// Attach sector-distribution rows to the prepared occupations.
  ///
  /// Rows that fail to parse are skipped like malformed occupation rows.
  /// Within one `(code, sector)` pair the first row wins.
  pub fn with_sector_shares(mut self, rows: &[RawSectorShareRow]) -> Self {
    let known: HashSet<&str> =
      self.detailed.iter().map(|occ| occ.code().as_str()).collect();
    let mut shares: IndexMap<(String, String), SectorShare> = IndexMap::new();
    let mut skipped = Vec::new();
    let mut orphans = 0;

    for row in rows {
      let share = match SectorShare::parse(row) {
        Ok(share) => share,
        Err(err) => {
          let raw_code = row.raw_code.trim();
          let kind = EntityKind::SectorShare;
          skipped.push(SkippedRow::new(kind, raw_code, &err));
          continue;
        }
      };
      if !known.contains(share.code.as_str()) {
        orphans += 1;
        continue;
      }
      let key = (share.code.to_string(), share.sector_label.clone());
      shares.entry(key).or_insert(share);
    }

    info!(
      input_rows = rows.len(),
      sector_shares = shares.len(),
      skipped = skipped.len(),
      orphan_sector_shares = orphans,
      "attached sector shares"
    );

    self.sector_shares.extend(shares.into_values());
    self.skipped.extend(skipped);
    self.orphan_sector_shares += orphans;
    self
  }
}

/// Per-entity counts reported back to the caller of [`run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
  pub run_id:                Uuid,
  pub majors_written:        usize,
  pub minors_written:        usize,
  pub detailed_written:      usize,
  pub sector_shares_written: usize,
  pub rows_skipped:          usize,
}

/// Run every stage short of persistence.
pub fn prepare(
  occupations: &[RawOccupationRow],
  alt_titles: &[RawAltTitleRow],
  catalog: &GroupTitleCatalog,
) -> PreparedBatch {
  let groups = aggregate(alt_titles);
  let mut consolidator = Consolidator::new();
  let mut skipped = Vec::new();
  let mut joined: HashSet<&str> = HashSet::new();
  let kind = EntityKind::DetailedOccupation;

  for row in occupations {
    let raw_code = row.raw_code.trim();
    let code = match normalize(raw_code) {
      Ok(code) => code,
      Err(err) => {
        skipped.push(SkippedRow::new(kind, raw_code, &err));
        continue;
      }
    };

    if row.title.trim().is_empty() {
      let err = Error::MissingTitle { raw_code: raw_code.to_owned() };
      skipped.push(SkippedRow::new(kind, raw_code, &err));
      continue;
    }

    let alts = groups.get(raw_code).map(Vec::as_slice).unwrap_or_default();
    joined.insert(raw_code);
    consolidator.add(consolidate(
      code,
      &row.title,
      row.description.as_deref(),
      alts,
    ));
  }

  let orphan_alt_titles: usize = groups
    .iter()
    .filter(|(raw_code, _)| !joined.contains(raw_code.as_str()))
    .map(|(_, titles)| titles.len())
    .sum();

  let merged_rows = consolidator.merged();
  let detailed = consolidator.finish();
  let Hierarchy { majors, minors } = build_hierarchy(&detailed, catalog);

  info!(
    input_rows = occupations.len(),
    detailed = detailed.len(),
    majors = majors.len(),
    minors = minors.len(),
    skipped = skipped.len(),
    merged_rows,
    orphan_alt_titles,
    "prepared batch"
  );

  PreparedBatch {
    majors,
    minors,
    detailed,
    skipped,
    merged_rows,
    orphan_alt_titles,
    ..PreparedBatch::default()
  }
}

/// Prepare the batch and hand it to `store` in one transactional write.
pub async fn run<S: OccupationStore>(
  store: &S,
  occupations: &[RawOccupationRow],
  alt_titles: &[RawAltTitleRow],
  sector_shares: &[RawSectorShareRow],
  catalog: &GroupTitleCatalog,
) -> Result<ImportSummary, S::Error> {
  let batch = prepare(occupations, alt_titles, catalog)
    .with_sector_shares(sector_shares);
  let written = store.write(&batch).await?;

  let summary = ImportSummary {
    run_id:                written.run_id,
    majors_written:        written.majors_written,
    minors_written:        written.minors_written,
    detailed_written:      written.detailed_written,
    sector_shares_written: written.sector_shares_written,
    rows_skipped:          batch.rows_skipped(),
  };
  info!(
    run_id = %summary.run_id,
    majors_written = summary.majors_written,
    minors_written = summary.minors_written,
    detailed_written = summary.detailed_written,
    sector_shares_written = summary.sector_shares_written,
    rows_skipped = summary.rows_skipped,
    "import committed"
  );
  Ok(summary)
}
