//! Occupation-code normalization.
//!
//! Upstream sources spell the same SOC code several ways: O*NET's dotted
//! form (`15-1134.00`), bare digit runs (`291141`), and truncated group
//! prefixes (`15-11`). Every spelling is reduced to the canonical
//! `MM-mmdd` form by one of the named strategies in [`STRATEGIES`], chosen
//! by inspecting the stripped input.
//!
//! Rules, in priority order:
//!
//! - `onet_dotted`: a `.` with at least 6 digits before it. The first 6
//!   digits are kept and the suffix is dropped.
//! - `grouped_dotted`: a `.` with 2 to 5 digits before it. The group digits
//!   are padded to 4 and the first 2 suffix digits follow.
//! - `plain`: no `.`, or nothing after it. Digits are padded or truncated
//!   to 6.
//!
//! Padding is always on the right with `0`. Every strategy needs at least
//! two digits before the separator; a lone major digit (`1.15`) is refused
//! rather than padded into a major group the source never named.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Canonical code ──────────────────────────────────────────────────────────

/// A canonical `MM-mmdd` occupation code.
///
/// Only [`normalize`] constructs one, so the layout is always two major
/// digits, a dash, and four digits.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct OccupationCode(String);

impl OccupationCode {
  pub fn as_str(&self) -> &str { &self.0 }

  pub fn major_digits(&self) -> &str { &self.0[..2] }

  pub fn minor_digits(&self) -> &str { &self.0[3..5] }

  /// `XX-0000`
  pub fn major_group_code(&self) -> String {
    format!("{}-0000", self.major_digits())
  }

  /// `XX-YY00`
  pub fn minor_group_code(&self) -> String {
    format!("{}-{}00", self.major_digits(), self.minor_digits())
  }
}

impl fmt::Display for OccupationCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl FromStr for OccupationCode {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { normalize(s) }
}

impl TryFrom<String> for OccupationCode {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> { normalize(&value) }
}

impl From<OccupationCode> for String {
  fn from(code: OccupationCode) -> Self { code.0 }
}

// ─── Stripping ───────────────────────────────────────────────────────────────

/// Digits of a raw code, split at the first `.`.
struct Stripped {
  base:   String,
  suffix: Option<String>,
}

impl Stripped {
  fn from_raw(raw: &str) -> Self {
    let mut base = String::new();
    let mut suffix: Option<String> = None;
    for c in raw.chars() {
      match c {
        c if c.is_ascii_digit() => match suffix.as_mut() {
          Some(s) => s.push(c),
          None => base.push(c),
        },
        '.' if suffix.is_none() => suffix = Some(String::new()),
        _ => {}
      }
    }
    Self { base, suffix: suffix.filter(|s| !s.is_empty()) }
  }
}

/// Right-pad with `0` or truncate `digits` to exactly `width` characters.
fn fit(digits: &str, width: usize) -> String {
  let mut out: String = digits.chars().take(width).collect();
  while out.len() < width {
    out.push('0');
  }
  out
}

// ─── Strategy table ──────────────────────────────────────────────────────────

/// A named raw-code parser. `parse` returns exactly six digits.
pub struct Strategy {
  pub name: &'static str,
  matches:  fn(&Stripped) -> bool,
  parse:    fn(&Stripped) -> String,
}

fn is_onet_dotted(s: &Stripped) -> bool {
  s.suffix.is_some() && s.base.len() >= 6
}

fn parse_onet_dotted(s: &Stripped) -> String { fit(&s.base, 6) }

fn is_grouped_dotted(s: &Stripped) -> bool { s.suffix.is_some() }

fn parse_grouped_dotted(s: &Stripped) -> String {
  let mut digits = fit(&s.base, 4);
  digits.push_str(&fit(s.suffix.as_deref().unwrap_or_default(), 2));
  digits
}

fn is_plain(s: &Stripped) -> bool { s.suffix.is_none() }

fn parse_plain(s: &Stripped) -> String { fit(&s.base, 6) }

pub static STRATEGIES: &[Strategy] = &[
  Strategy {
    name:    "onet_dotted",
    matches: is_onet_dotted,
    parse:   parse_onet_dotted,
  },
  Strategy {
    name:    "grouped_dotted",
    matches: is_grouped_dotted,
    parse:   parse_grouped_dotted,
  },
  Strategy { name: "plain", matches: is_plain, parse: parse_plain },
];

fn strategy_for(stripped: &Stripped) -> Option<&'static Strategy> {
  STRATEGIES.iter().find(|s| (s.matches)(stripped))
}

/// Name of the strategy that would parse `raw`, if any.
pub fn classify(raw: &str) -> Option<&'static str> {
  strategy_for(&Stripped::from_raw(raw)).map(|s| s.name)
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Canonicalize a raw occupation code into `MM-mmdd`.
///
/// Fails with [`Error::MalformedCode`] when fewer than two digits precede the
/// separator, since not even a major group can be derived.
pub fn normalize(raw: &str) -> Result<OccupationCode> {
  let stripped = Stripped::from_raw(raw);
  if stripped.base.len() < 2 {
    return Err(Error::MalformedCode {
      raw:    raw.to_owned(),
      reason: "fewer than two digits before the separator",
    });
  }

  let strategy = strategy_for(&stripped).ok_or_else(|| Error::MalformedCode {
    raw:    raw.to_owned(),
    reason: "no parsing strategy matches",
  })?;

  let digits = (strategy.parse)(&stripped);
  tracing::trace!(raw, strategy = strategy.name, %digits, "normalized code");
  Ok(OccupationCode(format!("{}-{}", &digits[..2], &digits[2..])))
}
