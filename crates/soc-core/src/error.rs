//! Error types for `soc-core`.

use thiserror::Error;

use crate::occupation::EntityKind;

#[derive(Debug, Error)]
pub enum Error {
  /// The raw code does not carry enough digits to derive a major group.
  #[error("malformed occupation code {raw:?}: {reason}")]
  MalformedCode { raw: String, reason: &'static str },

  #[error("occupation row {raw_code:?} has no title")]
  MissingTitle { raw_code: String },

  #[error("row {raw_code:?} has an invalid {field}: {value:?}")]
  InvalidField {
    raw_code: String,
    field:    &'static str,
    value:    String,
  },

  /// A child row was about to be written before its parent group.
  #[error("{kind} {child} references {parent}, which has not been written")]
  ReferentialOrder {
    kind:   EntityKind,
    child:  String,
    parent: String,
  },

  #[error(transparent)]
  Import(#[from] ImportError),
}

/// A single row that could not be written during a batch upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
  pub entity: EntityKind,
  pub code:   String,
  pub cause:  String,
}

impl std::fmt::Display for RowFailure {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} {}: {}", self.entity, self.code, self.cause)
  }
}

/// Every row-level cause collected while writing a batch that was rolled
/// back as a whole.
#[derive(Debug, Clone, Error)]
#[error(
  "import rolled back after {} row failure(s): {}",
  .failures.len(),
  render_failures(.failures)
)]
pub struct ImportError {
  pub failures: Vec<RowFailure>,
}

fn render_failures(failures: &[RowFailure]) -> String {
  failures
    .iter()
    .map(RowFailure::to_string)
    .collect::<Vec<_>>()
    .join("; ")
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
