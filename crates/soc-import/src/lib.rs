//! Batch importer for SOC occupation exports.
//!
//! Reads the occupation table and the optional alternate-title, group-title
//! and sector-distribution tables named in [`ImportConfig`], runs the core
//! pipeline and commits the result to a [`SqliteStore`] in one transaction.

pub mod error;
pub mod settings;
pub mod source;

use soc_core::{
  hierarchy::GroupTitleCatalog,
  pipeline::{self, ImportSummary},
};
use soc_store_sqlite::SqliteStore;
use tracing::info;

pub use error::{Error, Result};
pub use settings::ImportConfig;

/// Resolve the group-title catalog: the standard majors (if enabled)
/// overlaid with any configured enrichment file.
pub fn load_catalog(cfg: &ImportConfig) -> Result<GroupTitleCatalog> {
  let mut catalog = if cfg.standard_major_titles {
    GroupTitleCatalog::standard_majors()
  } else {
    GroupTitleCatalog::new()
  };
  if let Some(path) = &cfg.group_titles_csv {
    catalog.extend(source::read_group_titles(path)?);
  }
  Ok(catalog)
}

/// Run one full import against `store`.
pub async fn import(
  cfg: &ImportConfig,
  store: &SqliteStore,
) -> Result<ImportSummary> {
  let occupations = source::read_occupations(cfg.occupations_csv()?)?;
  let alt_titles = match &cfg.alternate_titles_csv {
    Some(path) => source::read_alt_titles(path)?,
    None => Vec::new(),
  };
  let sector_shares = match &cfg.sector_distribution_csv {
    Some(path) => source::read_sector_shares(path)?,
    None => Vec::new(),
  };
  let catalog = load_catalog(cfg)?;

  info!(
    occupations = occupations.len(),
    alt_titles = alt_titles.len(),
    sector_shares = sector_shares.len(),
    group_titles = catalog.len(),
    "inputs loaded"
  );

  let summary = pipeline::run(
    store,
    &occupations,
    &alt_titles,
    &sector_shares,
    &catalog,
  )
  .await?;
  Ok(summary)
}
