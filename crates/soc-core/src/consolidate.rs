//! Record consolidation: one [`DetailedOccupation`] per canonical code.

use indexmap::{IndexMap, IndexSet, map::Entry};

use crate::{code::OccupationCode, occupation::DetailedOccupation};

/// Build a detailed occupation from its core fields and alternate titles.
///
/// Whitespace is trimmed everywhere; a blank description counts as missing.
/// Alternate titles are deduplicated keeping first occurrence.
pub fn consolidate(
  code: OccupationCode,
  title: &str,
  description: Option<&str>,
  alt_titles: &[String],
) -> DetailedOccupation {
  let title = title.trim().to_owned();
  let description = description
    .map(str::trim)
    .filter(|d| !d.is_empty())
    .map(str::to_owned);
  let alternative_titles = union_titles(alt_titles.iter(), std::iter::empty());
  build(code, title, description, alternative_titles)
}

fn build(
  code: OccupationCode,
  title: String,
  description: Option<String>,
  alternative_titles: Vec<String>,
) -> DetailedOccupation {
  let searchable_text = format!(
    "{} {} {}",
    title,
    alternative_titles.join(" "),
    description.as_deref().unwrap_or_default()
  );
  DetailedOccupation {
    code,
    title,
    description,
    alternative_titles,
    searchable_text,
  }
}

fn union_titles<'a>(
  first: impl Iterator<Item = &'a String>,
  second: impl Iterator<Item = &'a String>,
) -> Vec<String> {
  first
    .chain(second)
    .map(|t| t.trim())
    .filter(|t| !t.is_empty())
    .collect::<IndexSet<_>>()
    .into_iter()
    .map(str::to_owned)
    .collect()
}

impl DetailedOccupation {
  /// Fold `later` into `self`: core fields of `self` win, alternate titles
  /// are unioned in order.
  pub fn merge(&self, later: &DetailedOccupation) -> DetailedOccupation {
    let alternative_titles = union_titles(
      self.alternative_titles.iter(),
      later.alternative_titles.iter(),
    );
    build(
      self.code.clone(),
      self.title.clone(),
      self.description.clone(),
      alternative_titles,
    )
  }
}

// ─── Accumulator ─────────────────────────────────────────────────────────────

/// Deduplicates consolidated records by canonical code, first row wins.
#[derive(Debug, Default)]
pub struct Consolidator {
  records: IndexMap<OccupationCode, DetailedOccupation>,
  merged:  usize,
}

impl Consolidator {
  pub fn new() -> Self { Self::default() }

  pub fn add(&mut self, record: DetailedOccupation) {
    match self.records.entry(record.code.clone()) {
      Entry::Occupied(mut existing) => {
        let merged = existing.get().merge(&record);
        existing.insert(merged);
        self.merged += 1;
      }
      Entry::Vacant(slot) => {
        slot.insert(record);
      }
    }
  }

  /// Number of rows folded into an earlier record with the same code.
  pub fn merged(&self) -> usize { self.merged }

  pub fn len(&self) -> usize { self.records.len() }

  pub fn is_empty(&self) -> bool { self.records.is_empty() }

  /// Records in order of first appearance.
  pub fn finish(self) -> Vec<DetailedOccupation> {
    self.records.into_values().collect()
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use super::*;
  use crate::normalize;

  fn code(raw: &str) -> OccupationCode { normalize(raw).unwrap() }

  fn titles(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn searchable_text_joins_title_alternates_and_description() {
    let occ = consolidate(
      code("53-7051.00"),
      "Industrial Truck Operators",
      Some("Operate industrial trucks."),
      &titles(&["Forklift Driver", "Lift Truck Operator"]),
    );
    assert_eq!(
      occ.searchable_text(),
      "Industrial Truck Operators Forklift Driver Lift Truck Operator \
       Operate industrial trucks."
    );
  }

  #[test]
  fn missing_description_does_not_leak_none() {
    let occ = consolidate(code("15-1134"), "Web Developers", None, &[]);
    assert!(!occ.searchable_text().contains("None"));
    assert_eq!(occ.searchable_text().trim(), "Web Developers");
    assert_eq!(occ.description(), None);

    let blank = consolidate(code("15-1134"), "Web Developers", Some("  "), &[]);
    assert_eq!(blank.description(), None);
  }

  #[test]
  fn alternate_titles_keep_input_order_and_drop_duplicates() {
    let occ = consolidate(
      code("17-2199"),
      "Engineers, All Other",
      None,
      &titles(&["Widget Tech", "Widget Specialist", "Widget Tech"]),
    );
    assert_eq!(occ.alternative_titles(), ["Widget Tech", "Widget Specialist"]);
  }

  #[test]
  fn first_row_wins_but_alternates_are_unioned() {
    let mut acc = Consolidator::new();
    acc.add(consolidate(
      code("15-1134.00"),
      "Web Developers",
      Some("Design websites."),
      &titles(&["Webmaster"]),
    ));
    acc.add(consolidate(
      code("15-1134.01"),
      "Web Designers",
      Some("Lay out pages."),
      &titles(&["Web Designer", "Webmaster"]),
    ));
    assert_eq!(acc.merged(), 1);

    let records = acc.finish();
    assert_eq!(records.len(), 1);
    let occ = &records[0];
    assert_eq!(occ.title(), "Web Developers");
    assert_eq!(occ.description(), Some("Design websites."));
    assert_eq!(occ.alternative_titles(), ["Webmaster", "Web Designer"]);
    assert!(occ.searchable_text().contains("Web Designer"));
  }

  #[test]
  fn union_is_order_independent_as_a_set() {
    let a = consolidate(code("291141"), "A", None, &titles(&["x", "y"]));
    let b = consolidate(code("29-1141.00"), "B", None, &titles(&["y", "z"]));

    let set = |occ: DetailedOccupation| -> BTreeSet<String> {
      occ.alternative_titles().iter().cloned().collect()
    };
    assert_eq!(set(a.merge(&b)), set(b.merge(&a)));
  }

  #[test]
  fn distinct_codes_keep_first_appearance_order() {
    let mut acc = Consolidator::new();
    acc.add(consolidate(code("29-1141"), "Nurses", None, &[]));
    acc.add(consolidate(code("11-1011"), "Chief Executives", None, &[]));
    let codes: Vec<_> = acc
      .finish()
      .iter()
      .map(|o| o.code().to_string())
      .collect();
    assert_eq!(codes, vec!["29-1141", "11-1011"]);
  }
}
