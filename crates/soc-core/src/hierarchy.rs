//! Derivation of major and minor groups from detailed occupations.

use std::collections::{BTreeMap, HashMap};

use crate::{
  Result,
  code::normalize,
  occupation::{DetailedOccupation, MajorGroup, MinorGroup},
};

// ─── Title catalog ───────────────────────────────────────────────────────────

/// An authoritative title for a group code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTitle {
  pub title:       String,
  pub description: Option<String>,
}

/// Optional enrichment data for group titles.
///
/// Codes missing from the catalog get the deterministic placeholder
/// `"Major Group {code}"` / `"SOC Major Group {code}"` (and likewise for
/// minor groups), so an empty catalog yields stable output.
#[derive(Debug, Clone, Default)]
pub struct GroupTitleCatalog {
  entries: HashMap<String, GroupTitle>,
}

impl GroupTitleCatalog {
  pub fn new() -> Self { Self::default() }

  /// Register a title. `code` accepts any spelling [`normalize`] does, so
  /// `"11"`, `"11-0000"` and `"11-0000.00"` all address the same group.
  pub fn insert(
    &mut self,
    code: &str,
    title: impl Into<String>,
    description: Option<String>,
  ) -> Result<()> {
    let key = normalize(code)?.to_string();
    self.entries.insert(key, GroupTitle { title: title.into(), description });
    Ok(())
  }

  pub fn get(&self, code: &str) -> Option<&GroupTitle> {
    self.entries.get(code)
  }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  /// The 23 major groups of the 2018 SOC.
  pub fn standard_majors() -> Self {
    let mut entries = HashMap::new();
    for (code, title) in STANDARD_MAJOR_TITLES {
      entries.insert(
        (*code).to_owned(),
        GroupTitle { title: (*title).to_owned(), description: None },
      );
    }
    Self { entries }
  }

  /// Merge `other` into `self`; entries in `other` win.
  pub fn extend(&mut self, other: GroupTitleCatalog) {
    self.entries.extend(other.entries);
  }

  fn resolve(&self, code: &str, tier: &str) -> (String, String) {
    let placeholder_description = format!("SOC {tier} Group {code}");
    match self.entries.get(code) {
      Some(entry) => (
        entry.title.clone(),
        entry
          .description
          .clone()
          .unwrap_or(placeholder_description),
      ),
      None => (format!("{tier} Group {code}"), placeholder_description),
    }
  }

  pub fn major_group(&self, code: &str) -> MajorGroup {
    let (title, description) = self.resolve(code, "Major");
    MajorGroup { code: code.to_owned(), title, description }
  }

  pub fn minor_group(&self, code: &str, major_group_code: &str) -> MinorGroup {
    let (title, description) = self.resolve(code, "Minor");
    MinorGroup {
      code: code.to_owned(),
      major_group_code: major_group_code.to_owned(),
      title,
      description,
    }
  }
}

const STANDARD_MAJOR_TITLES: &[(&str, &str)] = &[
  ("11-0000", "Management Occupations"),
  ("13-0000", "Business and Financial Operations Occupations"),
  ("15-0000", "Computer and Mathematical Occupations"),
  ("17-0000", "Architecture and Engineering Occupations"),
  ("19-0000", "Life, Physical, and Social Science Occupations"),
  ("21-0000", "Community and Social Service Occupations"),
  ("23-0000", "Legal Occupations"),
  ("25-0000", "Educational Instruction and Library Occupations"),
  ("27-0000", "Arts, Design, Entertainment, Sports, and Media Occupations"),
  ("29-0000", "Healthcare Practitioners and Technical Occupations"),
  ("31-0000", "Healthcare Support Occupations"),
  ("33-0000", "Protective Service Occupations"),
  ("35-0000", "Food Preparation and Serving Related Occupations"),
  ("37-0000", "Building and Grounds Cleaning and Maintenance Occupations"),
  ("39-0000", "Personal Care and Service Occupations"),
  ("41-0000", "Sales and Related Occupations"),
  ("43-0000", "Office and Administrative Support Occupations"),
  ("45-0000", "Farming, Fishing, and Forestry Occupations"),
  ("47-0000", "Construction and Extraction Occupations"),
  ("49-0000", "Installation, Maintenance, and Repair Occupations"),
  ("51-0000", "Production Occupations"),
  ("53-0000", "Transportation and Material Moving Occupations"),
  ("55-0000", "Military Specific Occupations"),
];

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Group entities implied by a set of detailed occupations, ordered by code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchy {
  pub majors: Vec<MajorGroup>,
  pub minors: Vec<MinorGroup>,
}

/// Derive the unique major and minor groups referenced by `detailed`.
pub fn build_hierarchy(
  detailed: &[DetailedOccupation],
  catalog: &GroupTitleCatalog,
) -> Hierarchy {
  let mut majors: BTreeMap<String, MajorGroup> = BTreeMap::new();
  let mut minors: BTreeMap<String, MinorGroup> = BTreeMap::new();

  for occupation in detailed {
    let major_code = occupation.major_group_code();
    let minor_code = occupation.minor_group_code();

    minors
      .entry(minor_code)
      .or_insert_with_key(|code| catalog.minor_group(code, &major_code));
    majors
      .entry(major_code)
      .or_insert_with_key(|code| catalog.major_group(code));
  }

  Hierarchy {
    majors: majors.into_values().collect(),
    minors: minors.into_values().collect(),
  }
}
