//! Import configuration, read once at start-up.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Runtime configuration, deserialised from `soc-import.toml` and `SOC_*`
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
  #[serde(default = "default_store_path")]
  pub store_path:              PathBuf,
  pub occupations_csv:         Option<PathBuf>,
  pub alternate_titles_csv:    Option<PathBuf>,
  pub group_titles_csv:        Option<PathBuf>,
  /// O*NET industry-sector distribution per occupation.
  pub sector_distribution_csv: Option<PathBuf>,
  /// Seed major-group titles from the 2018 SOC before applying
  /// `group_titles_csv`.
  #[serde(default = "default_true")]
  pub standard_major_titles:   bool,
}

fn default_store_path() -> PathBuf { PathBuf::from("soc.db") }

fn default_true() -> bool { true }

impl ImportConfig {
  /// Layer the optional TOML file at `path` under `SOC_`-prefixed
  /// environment variables and expand `~` in every path.
  pub fn load(path: &Path) -> Result<Self> {
    Self::load_with_env(path, None)
  }

  /// As [`load`](Self::load), reading `SOC_*` variables from `env` instead
  /// of the process environment when it is given.
  fn load_with_env(
    path: &Path,
    env: Option<config::Map<String, String>>,
  ) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("SOC").source(env))
      .build()?;
    let cfg: Self = settings.try_deserialize()?;
    Ok(cfg.expanded())
  }

  fn expanded(self) -> Self {
    let expand = |path: Option<PathBuf>| path.as_deref().map(expand_tilde);
    Self {
      store_path:              expand_tilde(&self.store_path),
      occupations_csv:         expand(self.occupations_csv),
      alternate_titles_csv:    expand(self.alternate_titles_csv),
      group_titles_csv:        expand(self.group_titles_csv),
      sector_distribution_csv: expand(self.sector_distribution_csv),
      ..self
    }
  }

  pub fn occupations_csv(&self) -> Result<&Path> {
    self
      .occupations_csv
      .as_deref()
      .ok_or(Error::MissingSetting { setting: "occupations_csv" })
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
