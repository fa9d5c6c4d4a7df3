//! Integration tests for `SqliteStore` against an in-memory database.

use soc_core::{
  Error as CoreError, ImportError, normalize,
  consolidate::consolidate,
  hierarchy::GroupTitleCatalog,
  occupation::{
    EntityKind, MajorGroup, MinorGroup, RawAltTitleRow, RawOccupationRow,
  },
  pipeline::{self, PreparedBatch, prepare},
  search::SearchQuery,
  sector::RawSectorShareRow,
  store::{OccupationStore, StoreCounts},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn occupations() -> Vec<RawOccupationRow> {
  vec![
    RawOccupationRow::new(
      "15-1252.00",
      "Software Developers",
      Some("Research, design, and develop computer software."),
    ),
    RawOccupationRow::new(
      "15-1254.00",
      "Web Developers",
      Some("Develop and implement websites."),
    ),
    RawOccupationRow::new(
      "53-7051.00",
      "Industrial Truck and Tractor Operators",
      Some("Operate industrial trucks or tractors."),
    ),
    RawOccupationRow::new("291141", "Registered Nurses", None),
  ]
}

fn alt_titles() -> Vec<RawAltTitleRow> {
  vec![
    RawAltTitleRow::new("15-1254.00", "Webmaster"),
    RawAltTitleRow::new("15-1254.00", "Web Designer"),
    RawAltTitleRow::new("53-7051.00", "Forklift Driver"),
    RawAltTitleRow::new("53-7051.00", "Tow Motor Operator"),
  ]
}

fn sector_shares() -> Vec<RawSectorShareRow> {
  vec![
    RawSectorShareRow::new("15-1252.00", "NAICS51", "38.2"),
    RawSectorShareRow::new("15-1254.00", "NAICS51", "41.0"),
    RawSectorShareRow::new("15-1252.00", "NAICS54", "30.5"),
    RawSectorShareRow::new("53-7051.00", "NAICS42", "35.0"),
    RawSectorShareRow::new("291141", "62", "81.5"),
  ]
}

fn batch() -> PreparedBatch {
  prepare(&occupations(), &alt_titles(), &GroupTitleCatalog::standard_majors())
}

fn batch_with_shares() -> PreparedBatch {
  batch().with_sector_shares(&sector_shares())
}

fn codes(hits: &[soc_core::search::SearchHit]) -> Vec<&str> {
  hits.iter().map(|h| h.occupation.code().as_str()).collect()
}

// ─── Writing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn write_then_get_occupation() {
  let s = store().await;
  let result = s.write(&batch()).await.unwrap();
  assert_eq!(result.majors_written, 3);
  assert_eq!(result.minors_written, 3);
  assert_eq!(result.detailed_written, 4);
  assert_eq!(result.sector_shares_written, 0);
  assert!(result.finished_at >= result.started_at);

  let code = normalize("15-1254").unwrap();
  let occ = s.get_occupation(&code).await.unwrap().unwrap();
  assert_eq!(occ.title(), "Web Developers");
  assert_eq!(occ.description(), Some("Develop and implement websites."));
  assert_eq!(occ.alternative_titles(), ["Webmaster", "Web Designer"]);
  assert_eq!(
    occ.searchable_text(),
    "Web Developers Webmaster Web Designer Develop and implement websites."
  );
}

#[tokio::test]
async fn get_occupation_missing_returns_none() {
  let s = store().await;
  let code = normalize("99-9999").unwrap();
  assert!(s.get_occupation(&code).await.unwrap().is_none());
}

#[tokio::test]
async fn rerunning_the_same_input_is_idempotent() {
  let s = store().await;
  s.write(&batch()).await.unwrap();
  let first = s.counts().await.unwrap();
  let code = normalize("53-7051").unwrap();
  let before = s.get_occupation(&code).await.unwrap();

  s.write(&batch()).await.unwrap();
  let second = s.counts().await.unwrap();

  assert_eq!(first.majors, second.majors);
  assert_eq!(first.minors, second.minors);
  assert_eq!(first.detailed, second.detailed);
  assert_eq!(second.import_runs, 2);
  assert_eq!(s.get_occupation(&code).await.unwrap(), before);
}

#[tokio::test]
async fn upsert_overwrites_changed_fields() {
  let s = store().await;
  s.write(&batch()).await.unwrap();

  let rows = vec![RawOccupationRow::new(
    "15-1252.00",
    "Software Engineers",
    Some("Build software."),
  )];
  s.write(&prepare(&rows, &[], &GroupTitleCatalog::new()))
    .await
    .unwrap();

  let code = normalize("15-1252").unwrap();
  let occ = s.get_occupation(&code).await.unwrap().unwrap();
  assert_eq!(occ.title(), "Software Engineers");
  assert_eq!(occ.description(), Some("Build software."));

  // The old title is no longer indexed.
  let hits = s.search(&SearchQuery::new("developers")).await.unwrap();
  assert!(hits.iter().all(|h| h.occupation.code() != &code));
}

#[tokio::test]
async fn malformed_row_is_skipped_and_recorded() {
  let s = store().await;
  let mut rows: Vec<_> = (1..=9)
    .map(|i| {
      RawOccupationRow::new(
        format!("15-12{i:02}.00"),
        format!("Occupation {i}"),
        None,
      )
    })
    .collect();
  rows.push(RawOccupationRow::new("X", "Broken", None));

  let catalog = GroupTitleCatalog::new();
  let summary = pipeline::run(&s, &rows, &[], &[], &catalog)
    .await
    .unwrap();
  assert_eq!(summary.detailed_written, 9);
  assert_eq!(summary.rows_skipped, 1);

  let run = s.last_run().await.unwrap().unwrap();
  assert_eq!(run.run_id, summary.run_id);
  assert_eq!(run.detailed_written, 9);
  assert_eq!(run.rows_skipped, 1);
}

// ─── Failure handling ────────────────────────────────────────────────────────

#[tokio::test]
async fn row_failures_roll_back_the_whole_batch() {
  let s = store().await;
  let mut batch = batch();
  batch.detailed.push(consolidate(
    normalize("15-1299").unwrap(),
    "",
    None,
    &[],
  ));
  batch.majors.push(MajorGroup {
    code:        "1-0000".into(),
    title:       "Too Short".into(),
    description: String::new(),
  });
  batch.minors.push(MinorGroup {
    code:             "1-1000".into(),
    major_group_code: "1-0000".into(),
    title:            "Orphaned".into(),
    description:      String::new(),
  });

  let err = s.write(&batch).await.unwrap_err();
  let failures = match err {
    Error::Core(CoreError::Import(ImportError { failures })) => failures,
    other => panic!("expected aggregated import error, got {other:?}"),
  };
  let failed: Vec<_> = failures
    .iter()
    .map(|f| (f.entity, f.code.as_str()))
    .collect();
  assert_eq!(failed, vec![
    (EntityKind::MajorGroup, "1-0000"),
    (EntityKind::MinorGroup, "1-1000"),
    (EntityKind::DetailedOccupation, "15-1299"),
  ]);

  assert_eq!(s.counts().await.unwrap(), StoreCounts::default());
}

#[tokio::test]
async fn failed_batch_leaves_previous_import_intact() {
  let s = store().await;
  s.write(&batch()).await.unwrap();
  let before = s.counts().await.unwrap();

  let mut bad = batch();
  let blank = consolidate(normalize("53-7099").unwrap(), " ", None, &[]);
  bad.detailed.push(blank);
  assert!(s.write(&bad).await.is_err());

  assert_eq!(s.counts().await.unwrap(), before);
  let last = s.last_run().await.unwrap();
  assert_eq!(last.map(|r| r.detailed_written), Some(4));
}

#[tokio::test]
async fn occupations_under_a_failed_minor_group_are_reported() {
  let s = store().await;
  // 15-1200 claims a major group from another prefix and fails its CHECK.
  let mut batch = batch_with_shares();
  for minor in &mut batch.minors {
    if minor.code == "15-1200" {
      minor.major_group_code = "29-0000".into();
    }
  }

  let err = s.write(&batch).await.unwrap_err();
  let failures = match err {
    Error::Core(CoreError::Import(ImportError { failures })) => failures,
    other => panic!("expected aggregated import error, got {other:?}"),
  };
  let failed: Vec<_> = failures
    .iter()
    .map(|f| (f.entity, f.code.as_str(), f.cause.as_str()))
    .filter(|(entity, ..)| *entity != EntityKind::MinorGroup)
    .collect();
  assert_eq!(failed, vec![
    (
      EntityKind::DetailedOccupation,
      "15-1252",
      "parent 15-1200 failed to write"
    ),
    (
      EntityKind::DetailedOccupation,
      "15-1254",
      "parent 15-1200 failed to write"
    ),
    (
      EntityKind::SectorShare,
      "15-1252/NAICS51",
      "parent 15-1252 failed to write"
    ),
    (
      EntityKind::SectorShare,
      "15-1254/NAICS51",
      "parent 15-1254 failed to write"
    ),
    (
      EntityKind::SectorShare,
      "15-1252/NAICS54",
      "parent 15-1252 failed to write"
    ),
  ]);
  assert_eq!(failures[0].entity, EntityKind::MinorGroup);
  assert_eq!(failures[0].code, "15-1200");
  assert_eq!(s.counts().await.unwrap(), StoreCounts::default());
}

#[tokio::test]
async fn child_without_parent_is_a_referential_order_error() {
  let s = store().await;
  let batch = PreparedBatch {
    minors: vec![MinorGroup {
      code:             "47-2000".into(),
      major_group_code: "47-0000".into(),
      title:            "Construction Trades Workers".into(),
      description:      String::new(),
    }],
    ..PreparedBatch::default()
  };

  let err = s.write(&batch).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::ReferentialOrder {
      kind: EntityKind::MinorGroup,
      ref child,
      ref parent,
    }) if child == "47-2000" && parent == "47-0000"
  ));
  assert_eq!(s.counts().await.unwrap(), StoreCounts::default());
}

#[tokio::test]
async fn occupation_without_minor_group_is_a_referential_order_error() {
  let s = store().await;
  let code = normalize("47-2061").unwrap();
  let batch = PreparedBatch {
    detailed: vec![consolidate(code, "Construction Laborers", None, &[])],
    ..PreparedBatch::default()
  };

  let err = s.write(&batch).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::ReferentialOrder {
      kind: EntityKind::DetailedOccupation,
      ref child,
      ref parent,
    }) if child == "47-2061" && parent == "47-2000"
  ));
  assert_eq!(s.counts().await.unwrap(), StoreCounts::default());
  assert!(s.last_run().await.unwrap().is_none());
}

#[tokio::test]
async fn parents_already_stored_satisfy_children() {
  let s = store().await;
  s.write(&batch()).await.unwrap();

  let occ = consolidate(normalize("15-1253").unwrap(), "Testers", None, &[]);
  let only_detailed = PreparedBatch {
    detailed: vec![occ],
    ..PreparedBatch::default()
  };
  let result = s.write(&only_detailed).await.unwrap();
  assert_eq!(result.detailed_written, 1);
  assert_eq!(result.majors_written, 0);
}

// ─── Search and browse ───────────────────────────────────────────────────────

#[tokio::test]
async fn search_finds_occupation_by_alternate_title() {
  let s = store().await;
  s.write(&batch()).await.unwrap();

  let hits = s.search(&SearchQuery::new("forklift")).await.unwrap();
  assert_eq!(hits.len(), 1);
  let hit = &hits[0];
  assert_eq!(hit.occupation.code().as_str(), "53-7051");
  assert!(hit.is_alternative);
  assert_eq!(hit.matched_alternatives, vec!["Forklift Driver"]);
  assert_eq!(hit.minor_group.code, "53-7000");
  assert_eq!(hit.major_group.code, "53-0000");
  assert_eq!(
    hit.major_group.title,
    "Transportation and Material Moving Occupations"
  );
}

#[tokio::test]
async fn search_matches_word_prefixes() {
  let s = store().await;
  s.write(&batch()).await.unwrap();

  let hits = s.search(&SearchQuery::new("develop")).await.unwrap();
  let found = codes(&hits);
  assert_eq!(found.len(), 2);
  assert!(found.contains(&"15-1252"));
  assert!(found.contains(&"15-1254"));
  assert!(hits.iter().all(|h| !h.is_alternative));
}

#[tokio::test]
async fn search_respects_limit() {
  let s = store().await;
  s.write(&batch()).await.unwrap();

  let query = SearchQuery { limit: Some(1), ..SearchQuery::new("develop") };
  assert_eq!(s.search(&query).await.unwrap().len(), 1);
}

#[tokio::test]
async fn offset_beyond_any_result_returns_nothing() {
  let s = store().await;
  s.write(&batch()).await.unwrap();

  let query = SearchQuery { offset: Some(1), ..SearchQuery::new("develop") };
  assert_eq!(s.search(&query).await.unwrap().len(), 1);

  let query = SearchQuery {
    offset: Some(usize::MAX),
    ..SearchQuery::new("develop")
  };
  assert!(s.search(&query).await.unwrap().is_empty());
}

#[tokio::test]
async fn search_index_survives_vacuum() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("soc.db");
  let s = SqliteStore::open(&path).await.unwrap();
  s.write(&batch()).await.unwrap();

  // Leave a gap in the occupation ids, then let VACUUM rebuild the file.
  let raw = rusqlite::Connection::open(&path).unwrap();
  raw
    .execute_batch(
      "DELETE FROM soc_detailed_occupations_fts WHERE code = '15-1252';
       DELETE FROM soc_detailed_occupations WHERE code = '15-1252';
       VACUUM;",
    )
    .unwrap();
  drop(raw);

  let hits = s.search(&SearchQuery::new("webmaster")).await.unwrap();
  assert_eq!(codes(&hits), vec!["15-1254"]);
  let hits = s.search(&SearchQuery::new("forklift")).await.unwrap();
  assert_eq!(codes(&hits), vec!["53-7051"]);

  // Re-adding the deleted row indexes it exactly once.
  s.write(&batch()).await.unwrap();
  let hits = s.search(&SearchQuery::new("develop")).await.unwrap();
  assert_eq!(hits.len(), 2);
  assert!(codes(&hits).contains(&"15-1252"));
}

#[tokio::test]
async fn short_or_empty_queries_return_nothing() {
  let s = store().await;
  s.write(&batch()).await.unwrap();
  assert!(s.search(&SearchQuery::new("w")).await.unwrap().is_empty());
  assert!(s.search(&SearchQuery::new("   ")).await.unwrap().is_empty());
  assert!(s.search(&SearchQuery::new("--")).await.unwrap().is_empty());
}

#[tokio::test]
async fn browse_lists_majors_with_their_minors() {
  let s = store().await;
  s.write(&batch()).await.unwrap();

  let listings = s.browse().await.unwrap();
  let majors: Vec<_> =
    listings.iter().map(|l| l.major.code.as_str()).collect();
  assert_eq!(majors, vec!["15-0000", "29-0000", "53-0000"]);
  let minors: Vec<_> =
    listings[0].minors.iter().map(|m| m.code.as_str()).collect();
  assert_eq!(minors, vec!["15-1200"]);
  assert_eq!(
    listings[1].major.title,
    "Healthcare Practitioners and Technical Occupations"
  );
}

// ─── Sector distribution ─────────────────────────────────────────────────────

#[tokio::test]
async fn top_by_sector_ranks_by_share() {
  let s = store().await;
  let result = s.write(&batch_with_shares()).await.unwrap();
  assert_eq!(result.sector_shares_written, 5);

  let top = s.top_by_sector("51", None).await.unwrap();
  let ranked: Vec<_> = top
    .iter()
    .map(|t| (t.code.as_str(), t.title.as_str(), t.percentage))
    .collect();
  assert_eq!(ranked, vec![
    ("15-1254", "Web Developers", 41.0),
    ("15-1252", "Software Developers", 38.2),
  ]);
  assert_eq!(top[0].sector_label, "NAICS51");
  assert_eq!(
    top[0].description.as_deref(),
    Some("Develop and implement websites.")
  );

  let top = s.top_by_sector("NAICS62", Some(1)).await.unwrap();
  assert_eq!(top.len(), 1);
  assert_eq!(top[0].code.as_str(), "29-1141");

  assert!(s.top_by_sector("NAICS11", None).await.unwrap().is_empty());
  assert!(s.top_by_sector("  ", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn reimported_shares_replace_an_occupations_distribution() {
  let s = store().await;
  s.write(&batch_with_shares()).await.unwrap();
  assert_eq!(s.counts().await.unwrap().sector_shares, 5);

  let update = [RawSectorShareRow::new("15-1252.00", "NAICS51", "40")];
  let result = s
    .write(&batch().with_sector_shares(&update))
    .await
    .unwrap();
  assert_eq!(result.sector_shares_written, 1);

  // 15-1252 lost NAICS54; the other occupations kept theirs.
  assert_eq!(s.counts().await.unwrap().sector_shares, 4);
  assert!(s.top_by_sector("54", None).await.unwrap().is_empty());
  let top = s.top_by_sector("51", None).await.unwrap();
  assert_eq!(top[0].code.as_str(), "15-1254");
  assert_eq!(top[1].percentage, 40.0);

  let run = s.last_run().await.unwrap().unwrap();
  assert_eq!(run.sector_shares_written, 1);
}

#[tokio::test]
async fn last_run_is_none_before_any_import() {
  let s = store().await;
  assert!(s.last_run().await.unwrap().is_none());
}

#[tokio::test]
async fn open_creates_a_file_backed_store() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("soc.db");
  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.write(&batch()).await.unwrap();
  }
  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.counts().await.unwrap().detailed, 4);
}

#[tokio::test]
async fn open_refuses_an_unknown_schema_version() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("old.db");
  rusqlite::Connection::open(&path)
    .unwrap()
    .execute_batch("PRAGMA user_version = 1;")
    .unwrap();

  assert!(matches!(
    SqliteStore::open(&path).await,
    Err(Error::SchemaVersion { found: 1, expected: 2 })
  ));
}
