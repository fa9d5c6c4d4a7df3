//! Error type for `soc-import`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("config error: {0}")]
  Config(#[from] config::ConfigError),

  #[error("{setting} is not configured")]
  MissingSetting { setting: &'static str },

  #[error("could not read {path:?}: {source}")]
  Csv {
    path:   PathBuf,
    #[source]
    source: csv::Error,
  },

  /// None of the accepted header spellings for a required column was found.
  #[error("{path:?} has no {column} column (expected one of {aliases:?})")]
  MissingColumn {
    path:    PathBuf,
    column:  &'static str,
    aliases: &'static [&'static str],
  },

  #[error("store error: {0}")]
  Store(#[from] soc_store_sqlite::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
