//! Timestamp ledger — the ordered, append-only phase markers on a case.
//!
//! Two raw entry formats coexist in persisted data and both stay legal
//! forever: the legacy `label:timestamp` form and the current
//! `label:timestamp:uuid` form. Parsing therefore splits on the *first*
//! colon only — the segment before it is the phase label, everything after
//! is an opaque payload. The timestamp itself contains colons, which is why
//! no fixed field count can be assumed.

use std::collections::HashSet;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  case::Case,
  error::{Error, Result},
  phase::Phase,
};

/// Label reported for entries that carry no colon at all.
pub const UNKNOWN_LABEL: &str = "unknown";

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// A raw entry split into its phase label and opaque payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedEntry<'a> {
  pub label:   &'a str,
  pub payload: &'a str,
}

/// Split a raw entry on the first colon. Entries without a colon get the
/// [`UNKNOWN_LABEL`] and keep the whole text as payload.
pub fn split_entry(raw: &str) -> ParsedEntry<'_> {
  match raw.split_once(':') {
    Some((label, payload)) => ParsedEntry { label, payload },
    None => ParsedEntry { label: UNKNOWN_LABEL, payload: raw },
  }
}

/// The workflow phase a raw entry is labelled with, if the label is one of
/// the four known phases.
pub fn entry_phase(raw: &str) -> Option<Phase> {
  split_entry(raw).label.parse().ok()
}

/// Parse every ledger entry of `case`, in insertion order.
pub fn entries(case: &Case) -> Vec<ParsedEntry<'_>> {
  case.ledger().into_iter().map(split_entry).collect()
}

/// The first intake (`erfassung`) entry, raw. This entry functions as the
/// case's creation identity and must never change once present.
pub fn intake_entry(case: &Case) -> Option<&str> {
  case
    .ledger()
    .into_iter()
    .find(|raw| entry_phase(raw) == Some(Phase::Intake))
}

// ─── Generation ──────────────────────────────────────────────────────────────

/// Generate a fresh raw entry: `"{label}:{rfc3339-utc}:{uuid}"`.
///
/// The UUID suffix keeps entries globally unique even when two are generated
/// within the same clock tick or by concurrent processes.
pub fn generate_entry(phase: Phase) -> String {
  let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
  format!("{}:{}:{}", phase.label(), timestamp, Uuid::new_v4())
}

/// Append a freshly generated entry for `phase` and return it. Always a pure
/// append; existing entries are never touched.
pub fn append(case: &mut Case, phase: Phase) -> String {
  let entry = generate_entry(phase);
  case.push_ledger_entry(entry.clone());
  entry
}

/// Remove every entry labelled with `phase` and return how many were
/// dropped. This is the one supported non-append mutation; the retreat
/// operation uses it, filtering by label so duplicate entries all go.
pub fn strip_phase(case: &mut Case, phase: Phase) -> usize {
  let before = case.ledger().len();
  let kept: Vec<String> = case
    .ledger()
    .into_iter()
    .filter(|raw| entry_phase(raw) != Some(phase))
    .map(str::to_owned)
    .collect();
  let removed = before - kept.len();
  if removed > 0 {
    case.set_ledger(kept);
  }
  removed
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// Result of a ledger uniqueness scan.
#[derive(Debug, Clone, Serialize)]
pub struct UniquenessReport {
  /// Every entry that appeared more than once, one element per extra
  /// occurrence.
  pub duplicates: Vec<String>,
  pub total:      usize,
  pub unique:     usize,
}

impl UniquenessReport {
  pub fn is_unique(&self) -> bool {
    self.duplicates.is_empty()
  }
}

/// Scan `entries` for byte-identical duplicates.
pub fn uniqueness_report<'a>(
  entries: impl IntoIterator<Item = &'a str>,
) -> UniquenessReport {
  let mut seen = HashSet::new();
  let mut duplicates = Vec::new();
  let mut total = 0;

  for entry in entries {
    total += 1;
    if !seen.insert(entry) {
      duplicates.push(entry.to_owned());
    }
  }

  UniquenessReport { duplicates, total, unique: seen.len() }
}

/// Fail with [`Error::DuplicateTimestamp`] if the case's ledger contains
/// byte-identical entries.
pub fn ensure_unique(case: &Case) -> Result<()> {
  let report = uniqueness_report(case.ledger());
  if report.is_unique() {
    Ok(())
  } else {
    Err(Error::DuplicateTimestamp { duplicates: report.duplicates })
  }
}

/// Fail with [`Error::ImmutableTimestamp`] if `updated` changed or removed
/// the intake entry that `existing` already carried. Cases that never had an
/// intake entry pass unconditionally.
pub fn ensure_intake_unchanged(existing: &Case, updated: &Case) -> Result<()> {
  let Some(original) = intake_entry(existing) else {
    return Ok(());
  };
  match intake_entry(updated) {
    Some(current) if current == original => Ok(()),
    _ => Err(Error::ImmutableTimestamp { original: original.to_owned() }),
  }
}
