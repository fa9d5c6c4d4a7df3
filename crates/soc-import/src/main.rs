//! soc-import binary.
//!
//! Reads `soc-import.toml` (or the path given with `--config`), opens the
//! SQLite store and either imports the configured O*NET tables or answers
//! lookups against what is already stored.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use soc_core::{
  search::SearchQuery,
  store::OccupationStore,
};
use soc_import::ImportConfig;
use soc_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "SOC occupation importer")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "soc-import.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Import the configured tables (the default).
  Import,
  /// Keyword search over titles, alternate titles and descriptions.
  Search {
    query: String,
    #[arg(short, long)]
    limit: Option<usize>,
    #[arg(long)]
    offset: Option<usize>,
  },
  /// List every major group with its minor groups.
  Browse,
  /// Occupations most concentrated in one NAICS sector.
  Top {
    /// Sector label (`NAICS62`) or bare NAICS digits (`62`).
    sector: String,
    #[arg(short, long)]
    limit:  Option<usize>,
  },
  /// Row counts and the most recent import.
  Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let cfg = ImportConfig::load(&cli.config)
    .with_context(|| format!("failed to load config from {:?}", cli.config))?;

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;

  match cli.command.unwrap_or(Command::Import) {
    Command::Import => {
      let summary = soc_import::import(&cfg, &store)
        .await
        .context("import failed")?;
      println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Command::Search { query, limit, offset } => {
      let query = SearchQuery { text: query, limit, offset };
      let hits = store.search(&query).await.context("search failed")?;
      if hits.is_empty() {
        println!("no matches");
      }
      for hit in hits {
        let occ = &hit.occupation;
        let minor = &hit.minor_group.title;
        println!("{}  {}  ({minor})", occ.code(), occ.title());
        if hit.is_alternative {
          let aliases = hit.matched_alternatives.join(", ");
          println!("         also known as: {aliases}");
        }
      }
    }
    Command::Browse => {
      for listing in store.browse().await.context("browse failed")? {
        println!("{}  {}", listing.major.code, listing.major.title);
        for minor in listing.minors {
          println!("  {}  {}", minor.code, minor.title);
        }
      }
    }
    Command::Top { sector, limit } => {
      let top = store
        .top_by_sector(&sector, limit)
        .await
        .context("sector ranking failed")?;
      if top.is_empty() {
        println!("no occupations recorded for sector {sector}");
      }
      for entry in top {
        println!(
          "{:>5.1}%  {}  {}",
          entry.percentage, entry.code, entry.title
        );
      }
    }
    Command::Status => {
      let counts = store.counts().await.context("failed to count rows")?;
      println!("major groups: {}", counts.majors);
      println!("minor groups: {}", counts.minors);
      println!("detailed occupations: {}", counts.detailed);
      println!("sector shares: {}", counts.sector_shares);
      println!("imports: {}", counts.import_runs);
      let last = store
        .last_run()
        .await
        .context("failed to read import log")?;
      if let Some(run) = last {
        let at = run.finished_at.to_rfc3339();
        println!("last import: {} at {at}", run.run_id);
      }
    }
  }

  Ok(())
}
