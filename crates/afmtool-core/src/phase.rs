//! Workflow phases and highest-watermark status derivation.
//!
//! A case's status is never stored. It is derived from the ledger on every
//! read: the most advanced phase label present wins, regardless of entry
//! order or duplicates.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{case::Case, ledger};

/// The four workflow phases, in progression order. The derive order doubles
/// as the watermark order: `Intake < Processing < Validated < Archived`.
///
/// Wire labels are the German phase names found in persisted ledgers.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
pub enum Phase {
  #[serde(rename = "erfassung")]
  #[strum(serialize = "erfassung")]
  Intake,

  #[serde(rename = "verarbeitung")]
  #[strum(serialize = "verarbeitung")]
  Processing,

  #[serde(rename = "validierung")]
  #[strum(serialize = "validierung")]
  Validated,

  #[serde(rename = "archivierung")]
  #[strum(serialize = "archivierung")]
  Archived,
}

impl Phase {
  /// The label used in raw ledger entries (`"{label}:{payload}"`).
  pub const fn label(self) -> &'static str {
    match self {
      Self::Intake => "erfassung",
      Self::Processing => "verarbeitung",
      Self::Validated => "validierung",
      Self::Archived => "archivierung",
    }
  }

  /// The next phase reachable by a manual advance. Archival is an
  /// administrative transition, so `Validated` and `Archived` have none.
  pub const fn next_manual(self) -> Option<Self> {
    match self {
      Self::Intake => Some(Self::Processing),
      Self::Processing => Some(Self::Validated),
      Self::Validated | Self::Archived => None,
    }
  }

  /// The phase a manual retreat falls back to. Neither `Intake` nor
  /// `Archived` can be retreated from.
  pub const fn previous_manual(self) -> Option<Self> {
    match self {
      Self::Processing => Some(Self::Intake),
      Self::Validated => Some(Self::Processing),
      Self::Intake | Self::Archived => None,
    }
  }
}

// ─── Status derivation ───────────────────────────────────────────────────────

/// Derive the case's current status from its ledger.
///
/// Highest watermark: the most advanced phase label present anywhere in the
/// ledger decides, so out-of-order and duplicate entries cannot regress the
/// status. An empty ledger (and one with only unparseable labels) reads as
/// [`Phase::Intake`].
pub fn derive_status(case: &Case) -> Phase {
  case
    .ledger()
    .into_iter()
    .filter_map(ledger::entry_phase)
    .max()
    .unwrap_or(Phase::Intake)
}

/// True iff the case is still at intake with exactly its creation marker:
/// one ledger entry, labelled `erfassung`. Collaborators use this to decide
/// whether an edit should auto-advance the case.
pub fn is_first_edit(case: &Case) -> bool {
  let entries = case.ledger();
  derive_status(case) == Phase::Intake
    && entries.len() == 1
    && ledger::entry_phase(entries[0]) == Some(Phase::Intake)
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn case_with_ledger(entries: &[&str]) -> Case {
    serde_json::from_value(json!({ "zeitstempel": entries })).unwrap()
  }

  #[test]
  fn empty_ledger_is_intake() {
    assert_eq!(derive_status(&Case::new()), Phase::Intake);
    assert_eq!(derive_status(&case_with_ledger(&[])), Phase::Intake);
  }

  #[test]
  fn watermark_ignores_entry_order() {
    // Archival recorded before a later (stale) processing entry still wins.
    let case = case_with_ledger(&[
      "erfassung:2025-07-20T08:00:00Z",
      "archivierung:2025-07-23T08:00:00Z",
      "verarbeitung:2025-07-21T08:00:00Z",
    ]);
    assert_eq!(derive_status(&case), Phase::Archived);
  }

  #[test]
  fn unknown_labels_do_not_count() {
    let case = case_with_ledger(&[
      "erfassung:2025-07-20T08:00:00Z",
      "export:2025-07-22T08:00:00Z",
      "plain-note-without-colon",
    ]);
    assert_eq!(derive_status(&case), Phase::Intake);
  }

  #[test]
  fn manual_transition_maps() {
    assert_eq!(Phase::Intake.next_manual(), Some(Phase::Processing));
    assert_eq!(Phase::Processing.next_manual(), Some(Phase::Validated));
    assert_eq!(Phase::Validated.next_manual(), None);
    assert_eq!(Phase::Archived.next_manual(), None);

    assert_eq!(Phase::Processing.previous_manual(), Some(Phase::Intake));
    assert_eq!(Phase::Validated.previous_manual(), Some(Phase::Processing));
    assert_eq!(Phase::Intake.previous_manual(), None);
    assert_eq!(Phase::Archived.previous_manual(), None);
  }

  #[test]
  fn labels_round_trip_through_strum() {
    for phase in [
      Phase::Intake,
      Phase::Processing,
      Phase::Validated,
      Phase::Archived,
    ] {
      assert_eq!(phase.label().parse::<Phase>().ok(), Some(phase));
      assert_eq!(phase.to_string(), phase.label());
    }
    assert!("unbekannt".parse::<Phase>().is_err());
  }

  #[test]
  fn first_edit_requires_exactly_the_creation_marker() {
    assert!(is_first_edit(&case_with_ledger(&[
      "erfassung:2025-07-20T08:00:00Z"
    ])));

    // A second entry of any kind disqualifies.
    assert!(!is_first_edit(&case_with_ledger(&[
      "erfassung:2025-07-20T08:00:00Z",
      "verarbeitung:2025-07-21T08:00:00Z",
    ])));

    // No ledger at all is not a first edit either.
    assert!(!is_first_edit(&Case::new()));
  }
}
