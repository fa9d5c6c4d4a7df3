//! Query and result types for keyword lookup over detailed occupations.

use serde::Serialize;

use crate::occupation::{DetailedOccupation, MajorGroup, MinorGroup};

pub const DEFAULT_SEARCH_LIMIT: usize = 20;
pub const MAX_SEARCH_LIMIT: usize = 50;
/// Queries shorter than this (after trimming) return no hits.
pub const MIN_QUERY_LEN: usize = 2;

/// Parameters for [`crate::store::OccupationStore::search`].
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
  pub text:   String,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

impl SearchQuery {
  pub fn new(text: impl Into<String>) -> Self {
    Self { text: text.into(), ..Self::default() }
  }

  pub fn effective_limit(&self) -> usize {
    self
      .limit
      .unwrap_or(DEFAULT_SEARCH_LIMIT)
      .clamp(1, MAX_SEARCH_LIMIT)
  }

  pub fn effective_offset(&self) -> usize { self.offset.unwrap_or(0) }

  /// Lowercased alphanumeric words of the query.
  pub fn words(&self) -> Vec<String> {
    if self.text.trim().chars().count() < MIN_QUERY_LEN {
      return Vec::new();
    }
    self
      .text
      .to_lowercase()
      .split(|c: char| !c.is_alphanumeric())
      .filter(|w| !w.is_empty())
      .map(str::to_owned)
      .collect()
  }
}

/// Code and title of a group an occupation belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRef {
  pub code:  String,
  pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
  pub occupation:           DetailedOccupation,
  pub major_group:          GroupRef,
  pub minor_group:          GroupRef,
  /// Alternate titles containing every query word.
  pub matched_alternatives: Vec<String>,
  /// The primary title matched no query word; the hit came from an alternate.
  pub is_alternative:       bool,
  /// Higher is better.
  pub score:                f64,
}

impl SearchHit {
  pub fn new(
    occupation: DetailedOccupation,
    major_group: GroupRef,
    minor_group: GroupRef,
    words: &[String],
    score: f64,
  ) -> Self {
    let matched_alternatives: Vec<String> = occupation
      .alternative_titles()
      .iter()
      .filter(|alt| {
        let alt = alt.to_lowercase();
        !words.is_empty() && words.iter().all(|w| alt.contains(w.as_str()))
      })
      .cloned()
      .collect();

    let title = occupation.title().to_lowercase();
    let title_matches = words.iter().any(|w| title.contains(w.as_str()));
    let is_alternative = !title_matches && !matched_alternatives.is_empty();

    Self {
      occupation,
      major_group,
      minor_group,
      matched_alternatives,
      is_alternative,
      score,
    }
  }
}

/// A major group with its minor groups, for browsing without a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MajorGroupListing {
  pub major:  MajorGroup,
  pub minors: Vec<MinorGroup>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{consolidate::consolidate, normalize};

  fn group(code: &str) -> GroupRef {
    GroupRef { code: code.into(), title: code.into() }
  }

  #[test]
  fn limit_is_clamped() {
    assert_eq!(SearchQuery::new("x").effective_limit(), DEFAULT_SEARCH_LIMIT);
    let q = SearchQuery { limit: Some(500), ..SearchQuery::new("x") };
    assert_eq!(q.effective_limit(), MAX_SEARCH_LIMIT);
    let q = SearchQuery { limit: Some(0), ..SearchQuery::new("x") };
    assert_eq!(q.effective_limit(), 1);
  }

  #[test]
  fn short_queries_have_no_words() {
    assert!(SearchQuery::new(" a ").words().is_empty());
    assert_eq!(SearchQuery::new("Fork-Lift  driver").words(), vec![
      "fork", "lift", "driver"
    ]);
  }

  #[test]
  fn hit_flags_alternate_title_matches() {
    let occ = consolidate(
      normalize("53-7051").unwrap(),
      "Industrial Truck and Tractor Operators",
      None,
      &["Forklift Driver".to_string(), "Tow Motor Operator".to_string()],
    );
    let words = SearchQuery::new("forklift").words();
    let (major, minor) = (group("53-0000"), group("53-7000"));
    let hit = SearchHit::new(occ, major, minor, &words, 1.0);
    assert_eq!(hit.matched_alternatives, vec!["Forklift Driver"]);
    assert!(hit.is_alternative);
  }

  #[test]
  fn title_match_is_not_alternative() {
    let occ = consolidate(
      normalize("53-7051").unwrap(),
      "Industrial Truck and Tractor Operators",
      None,
      &["Truck Loader".to_string()],
    );
    let words = SearchQuery::new("truck").words();
    let (major, minor) = (group("53-0000"), group("53-7000"));
    let hit = SearchHit::new(occ, major, minor, &words, 1.0);
    assert!(!hit.is_alternative);
    assert_eq!(hit.matched_alternatives, vec!["Truck Loader"]);
  }
}
