//! Raw input rows and the three persisted tiers of the SOC hierarchy.

use serde::{Deserialize, Serialize};

use crate::code::OccupationCode;

// ─── Raw input ───────────────────────────────────────────────────────────────

/// One row of an occupation table as supplied by an ingestion source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOccupationRow {
  pub raw_code:    String,
  pub title:       String,
  pub description: Option<String>,
}

impl RawOccupationRow {
  pub fn new(
    raw_code: impl Into<String>,
    title: impl Into<String>,
    description: Option<&str>,
  ) -> Self {
    Self {
      raw_code:    raw_code.into(),
      title:       title.into(),
      description: description.map(str::to_owned),
    }
  }
}

/// One alternate-title row, keyed by the same raw code as the occupation
/// table it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAltTitleRow {
  pub raw_code:  String,
  pub alt_title: Option<String>,
}

impl RawAltTitleRow {
  pub fn new(
    raw_code: impl Into<String>,
    alt_title: impl Into<String>,
  ) -> Self {
    Self { raw_code: raw_code.into(), alt_title: Some(alt_title.into()) }
  }
}

// ─── Entity labels ───────────────────────────────────────────────────────────

/// The tier a persisted row belongs to.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
  MajorGroup,
  MinorGroup,
  DetailedOccupation,
  SectorShare,
}

// ─── Groups ──────────────────────────────────────────────────────────────────

/// Top tier, keyed by `XX-0000`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MajorGroup {
  pub code:        String,
  pub title:       String,
  pub description: String,
}

/// Middle tier, keyed by `XX-YY00`; always belongs to the major group sharing
/// its first two digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinorGroup {
  pub code:             String,
  pub major_group_code: String,
  pub title:            String,
  pub description:      String,
}

// ─── Detailed occupation ─────────────────────────────────────────────────────

/// A consolidated detailed occupation.
///
/// Values are only built by [`crate::consolidate::consolidate`] and never
/// mutated afterwards; merging two records yields a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailedOccupation {
  pub(crate) code:               OccupationCode,
  pub(crate) title:              String,
  pub(crate) description:        Option<String>,
  pub(crate) alternative_titles: Vec<String>,
  pub(crate) searchable_text:    String,
}

impl DetailedOccupation {
  pub fn code(&self) -> &OccupationCode { &self.code }

  pub fn title(&self) -> &str { &self.title }

  pub fn description(&self) -> Option<&str> { self.description.as_deref() }

  pub fn alternative_titles(&self) -> &[String] { &self.alternative_titles }

  /// Title, alternate titles and description joined for full-text indexing.
  pub fn searchable_text(&self) -> &str { &self.searchable_text }

  pub fn minor_group_code(&self) -> String { self.code.minor_group_code() }

  pub fn major_group_code(&self) -> String { self.code.major_group_code() }
}
