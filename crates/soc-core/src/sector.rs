//! Industry-sector distribution of detailed occupations.
//!
//! Each share says what percentage of an occupation's sampled workforce is
//! employed in one NAICS sector. Sector labels are stored in O*NET's
//! `NAICS<digits>` spelling; bare digits (`62`) are accepted wherever a label
//! is read and given the prefix.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  code::{OccupationCode, normalize},
};

pub const NAICS_PREFIX: &str = "NAICS";

/// Rows returned by a sector ranking when the caller gives no limit.
pub const DEFAULT_TOP_LIMIT: usize = 10;
pub const MAX_TOP_LIMIT: usize = 50;

/// Date spellings seen in sector exports, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

// ─── Labels ──────────────────────────────────────────────────────────────────

/// Canonical sector label: trimmed, with bare NAICS digits prefixed.
///
/// Returns `None` for a blank label.
pub fn sector_label(raw: &str) -> Option<String> {
  let raw = raw.trim();
  if raw.is_empty() {
    return None;
  }
  if raw.bytes().all(|b| b.is_ascii_digit()) {
    return Some(format!("{NAICS_PREFIX}{raw}"));
  }
  match raw.get(..NAICS_PREFIX.len()) {
    Some(prefix) if prefix.eq_ignore_ascii_case(NAICS_PREFIX) => Some(format!(
      "{NAICS_PREFIX}{}",
      raw[NAICS_PREFIX.len()..].trim_start()
    )),
    _ => Some(raw.to_owned()),
  }
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// One sector-distribution row as read from the source table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSectorShareRow {
  pub raw_code:     String,
  pub sector_label: String,
  pub sample_size:  Option<String>,
  pub percentage:   Option<String>,
  pub date_updated: Option<String>,
}

impl RawSectorShareRow {
  pub fn new(
    raw_code: impl Into<String>,
    sector_label: impl Into<String>,
    percentage: impl Into<String>,
  ) -> Self {
    Self {
      raw_code: raw_code.into(),
      sector_label: sector_label.into(),
      percentage: Some(percentage.into()),
      ..Self::default()
    }
  }
}

/// A validated share, keyed by canonical code and sector label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorShare {
  pub code:         OccupationCode,
  pub sector_label: String,
  pub sample_size:  Option<u32>,
  /// Percent of the sampled workforce, `0.0..=100.0`.
  pub percentage:   f64,
  pub date_updated: Option<NaiveDate>,
}

impl SectorShare {
  /// Normalize the code and parse every numeric and date column.
  ///
  /// Blank optional columns become `None`; a present but unparseable value
  /// is an [`Error::InvalidField`].
  pub fn parse(row: &RawSectorShareRow) -> Result<Self> {
    let raw_code = row.raw_code.trim();
    let code = normalize(raw_code)?;
    let invalid = |field: &'static str, value: &str| Error::InvalidField {
      raw_code: raw_code.to_owned(),
      field,
      value: value.to_owned(),
    };

    let sector_label = sector_label(&row.sector_label)
      .ok_or_else(|| invalid("sector_label", &row.sector_label))?;

    let percentage_raw = present(row.percentage.as_deref()).unwrap_or_default();
    let percentage = percentage_raw
      .parse::<f64>()
      .ok()
      .filter(|p| (0.0..=100.0).contains(p))
      .ok_or_else(|| invalid("percentage", percentage_raw))?;

    let sample_size = present(row.sample_size.as_deref())
      .map(|n| n.parse::<u32>().map_err(|_| invalid("sample_size", n)))
      .transpose()?;

    let date_updated = present(row.date_updated.as_deref())
      .map(|d| parse_date(d).ok_or_else(|| invalid("date_updated", d)))
      .transpose()?;

    Ok(Self { code, sector_label, sample_size, percentage, date_updated })
  }
}

fn present(value: Option<&str>) -> Option<&str> {
  value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(s: &str) -> Option<NaiveDate> {
  // O*NET also publishes month-only dates (`07/2023`).
  let month_only = format!("01/{s}");
  DATE_FORMATS
    .iter()
    .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    .or_else(|| NaiveDate::parse_from_str(&month_only, "%d/%m/%Y").ok())
}

// ─── Rankings ────────────────────────────────────────────────────────────────

/// One entry of a per-sector ranking, highest share first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopOccupation {
  pub code:         OccupationCode,
  pub title:        String,
  pub description:  Option<String>,
  pub sector_label: String,
  pub percentage:   f64,
  pub sample_size:  Option<u32>,
}

/// Requested ranking size, defaulting to [`DEFAULT_TOP_LIMIT`] and clamped
/// to `1..=MAX_TOP_LIMIT`.
pub fn effective_top_limit(limit: Option<usize>) -> usize {
  limit.unwrap_or(DEFAULT_TOP_LIMIT).clamp(1, MAX_TOP_LIMIT)
}
