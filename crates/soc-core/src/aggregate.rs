//! Grouping of alternate-title rows by their raw parent code.
//!
//! Grouping happens before normalization: the alternate-title export and the
//! occupation export key off the same raw identifier, so the join is done on
//! that identifier and only the joined result is normalized.

use indexmap::IndexMap;

use crate::occupation::RawAltTitleRow;

/// Alternate titles per raw code, in input order.
pub type AlternateTitleGroups = IndexMap<String, Vec<String>>;

/// Group `rows` by raw code, preserving input order within each group.
///
/// Rows with a missing or blank title are dropped.
pub fn aggregate<'a, I>(rows: I) -> AlternateTitleGroups
where
  I: IntoIterator<Item = &'a RawAltTitleRow>,
{
  let mut groups = AlternateTitleGroups::new();
  for row in rows {
    let Some(title) = row
      .alt_title
      .as_deref()
      .map(str::trim)
      .filter(|t| !t.is_empty())
    else {
      continue;
    };

    groups
      .entry(row.raw_code.trim().to_owned())
      .or_default()
      .push(title.to_owned());
  }
  groups
}
