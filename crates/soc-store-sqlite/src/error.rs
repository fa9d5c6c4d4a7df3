//! Error type for `soc-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The store could not be opened or initialised; nothing was written.
  #[error("could not open store: {0}")]
  Connection(#[source] tokio_rusqlite::Error),

  /// The file was written by a different layout of this store.
  #[error("unsupported store schema version {found} (expected {expected})")]
  SchemaVersion { found: i64, expected: i64 },

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// Referential-order violations and aggregated row failures surface here.
  #[error(transparent)]
  Core(#[from] soc_core::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
