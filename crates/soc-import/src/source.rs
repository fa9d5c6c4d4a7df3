//! Readers for the tabular occupation exports.
//!
//! Files ending in `.txt` or `.tsv` are read as tab-separated (the layout of
//! the O*NET database text release); anything else as comma-separated.
//! Header names are matched case-insensitively against a list of accepted
//! spellings, tried in order.

use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use soc_core::{
  hierarchy::GroupTitleCatalog,
  occupation::{RawAltTitleRow, RawOccupationRow},
  sector::RawSectorShareRow,
};
use tracing::{debug, warn};

use crate::{Error, Result};

const CODE: &[&str] = &["O*NET-SOC Code", "onetsoc_code", "code"];
const TITLE: &[&str] = &["Title", "title"];
const DESCRIPTION: &[&str] = &["Description", "description"];
const ALT_TITLE: &[&str] = &["Alternate Title", "alternate_title", "title"];
const SECTOR: &[&str] = &["sector_label", "sector"];
const SAMPLE_SIZE: &[&str] = &["n", "sample_size"];
const PERCENT: &[&str] = &["percent", "percentage"];
const DATE: &[&str] = &["date_updated", "date"];

// ─── Public readers ──────────────────────────────────────────────────────────

/// Occupation rows: code, title and an optional description column.
pub fn read_occupations(path: &Path) -> Result<Vec<RawOccupationRow>> {
  let mut table = Table::open(path)?;
  let code = table.require("code", CODE)?;
  let title = table.require("title", TITLE)?;
  let description = table.optional(DESCRIPTION);

  let rows = table.map_records(|record| RawOccupationRow {
    raw_code:    field(record, code).unwrap_or_default(),
    title:       field(record, title).unwrap_or_default(),
    description: description.and_then(|i| field(record, i)),
  })?;
  debug!(path = %path.display(), rows = rows.len(), "read occupations");
  Ok(rows)
}

/// Alternate-title rows keyed by the same raw code as the occupation file.
pub fn read_alt_titles(path: &Path) -> Result<Vec<RawAltTitleRow>> {
  let mut table = Table::open(path)?;
  let code = table.require("code", CODE)?;
  let alt_title = table.require("alternate title", ALT_TITLE)?;

  let rows = table.map_records(|record| RawAltTitleRow {
    raw_code:  field(record, code).unwrap_or_default(),
    alt_title: field(record, alt_title),
  })?;
  debug!(path = %path.display(), rows = rows.len(), "read alternate titles");
  Ok(rows)
}

/// Industry-sector distribution rows
/// (`onetsoc_code,sector_label,n,percent,date_updated`).
pub fn read_sector_shares(path: &Path) -> Result<Vec<RawSectorShareRow>> {
  let mut table = Table::open(path)?;
  let code = table.require("code", CODE)?;
  let sector = table.require("sector label", SECTOR)?;
  let percent = table.require("percent", PERCENT)?;
  let sample_size = table.optional(SAMPLE_SIZE);
  let date = table.optional(DATE);

  let rows = table.map_records(|record| RawSectorShareRow {
    raw_code:     field(record, code).unwrap_or_default(),
    sector_label: field(record, sector).unwrap_or_default(),
    sample_size:  sample_size.and_then(|i| field(record, i)),
    percentage:   field(record, percent),
    date_updated: date.and_then(|i| field(record, i)),
  })?;
  debug!(path = %path.display(), rows = rows.len(), "read sector shares");
  Ok(rows)
}

/// Group titles (`code,title[,description]`) for major and minor groups.
///
/// Rows whose code does not normalize are logged and skipped.
pub fn read_group_titles(path: &Path) -> Result<GroupTitleCatalog> {
  let mut table = Table::open(path)?;
  let code = table.require("code", CODE)?;
  let title = table.require("title", TITLE)?;
  let description = table.optional(DESCRIPTION);

  let entries = table.map_records(|record| {
    (
      field(record, code).unwrap_or_default(),
      field(record, title).unwrap_or_default(),
      description.and_then(|i| field(record, i)),
    )
  })?;

  let mut catalog = GroupTitleCatalog::new();
  for (code, title, description) in entries {
    if title.is_empty() {
      warn!(code = %code, "skipping group title row without a title");
      continue;
    }
    if let Err(err) = catalog.insert(&code, title, description) {
      warn!(code = %code, %err, "skipping group title row");
    }
  }
  debug!(path = %path.display(), entries = catalog.len(), "read group titles");
  Ok(catalog)
}

// ─── Table plumbing ──────────────────────────────────────────────────────────

struct Table {
  path:    PathBuf,
  reader:  csv::Reader<std::fs::File>,
  headers: StringRecord,
}

impl Table {
  fn open(path: &Path) -> Result<Self> {
    let csv_err = |source| Error::Csv { path: path.to_path_buf(), source };
    let mut reader = ReaderBuilder::new()
      .delimiter(delimiter_for(path))
      .flexible(true)
      .trim(Trim::All)
      .from_path(path)
      .map_err(csv_err)?;
    let headers = reader.headers().map_err(csv_err)?.clone();
    Ok(Self { path: path.to_path_buf(), reader, headers })
  }

  fn optional(&self, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|alias| {
      self
        .headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(alias))
    })
  }

  fn require(
    &self,
    column: &'static str,
    aliases: &'static [&'static str],
  ) -> Result<usize> {
    self.optional(aliases).ok_or_else(|| Error::MissingColumn {
      path: self.path.clone(),
      column,
      aliases,
    })
  }

  fn map_records<T>(
    &mut self,
    mut f: impl FnMut(&StringRecord) -> T,
  ) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for record in self.reader.records() {
      let record = record.map_err(|source| Error::Csv {
        path: self.path.clone(),
        source,
      })?;
      out.push(f(&record));
    }
    Ok(out)
  }
}

fn delimiter_for(path: &Path) -> u8 {
  match path.extension().and_then(|e| e.to_str()) {
    Some(ext) if ext.eq_ignore_ascii_case("txt") => b'\t',
    Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
    _ => b',',
  }
}

/// Non-empty trimmed cell at `index`.
fn field(record: &StringRecord, index: usize) -> Option<String> {
  record
    .get(index)
    .filter(|s| !s.is_empty())
    .map(str::to_owned)
}
