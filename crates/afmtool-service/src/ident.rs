//! Stable short case identifiers and case-number grouping.
//!
//! Positional indices are the compatibility handle but go stale under
//! mutation. The short id is derived from the intake entry's payload — the
//! one part of a case that never changes — so it is reproducible from the
//! case itself and never stored stale.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use afmtool_core::{case::Case, ledger};

/// Field the id backfill writes the derived short id into.
pub const FIELD_UUID: &str = "uuid";
/// The user-assigned case number field.
pub const FIELD_FALLNUMMER: &str = "fallnummer";

/// Case-number values that count as "not assigned".
const PLACEHOLDERS: &[&str] = &["", "LEER", "NONE", "NULL"];

/// Derive the 5-hex-uppercase short id from the intake entry's payload.
/// `None` for cases that were never taken in.
pub fn short_id(case: &Case) -> Option<String> {
  let intake = ledger::intake_entry(case)?;
  let payload = ledger::split_entry(intake).payload;
  let digest = Sha256::digest(payload.as_bytes());
  Some(hex::encode(digest)[..5].to_uppercase())
}

/// The case's normalized case number: the trimmed `fallnummer` field, or an
/// `AUTO-<short id>` fallback when the field is blank or a placeholder.
pub fn case_number(case: &Case) -> Option<String> {
  let raw = case.text(FIELD_FALLNUMMER).trim();
  if !PLACEHOLDERS.contains(&raw) {
    return Some(raw.to_owned());
  }
  short_id(case).map(|id| format!("AUTO-{id}"))
}

/// Bucket short ids by case number. Cases without an intake entry have no
/// derivable member id and are omitted.
pub fn group_by_case_number(cases: &[Case]) -> BTreeMap<String, Vec<String>> {
  let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
  for case in cases {
    let Some(id) = short_id(case) else { continue };
    let Some(number) = case_number(case) else { continue };
    groups.entry(number).or_default().push(id);
  }
  groups
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn case_from(value: serde_json::Value) -> Case {
    serde_json::from_value(value).unwrap()
  }

  #[test]
  fn short_id_depends_only_on_the_intake_entry() {
    let mut case = case_from(json!({
      "quelle": "A",
      "zeitstempel": ["erfassung:2025-07-20T08:00:00Z"],
    }));
    let id = short_id(&case).unwrap();
    assert_eq!(id.len(), 5);
    assert_eq!(id, id.to_uppercase());

    // Field edits and later phases leave the id untouched.
    case.set("quelle", "edited");
    case.push_ledger_entry("verarbeitung:2025-07-21T08:00:00Z".into());
    assert_eq!(short_id(&case).unwrap(), id);
  }

  #[test]
  fn short_id_requires_an_intake_entry() {
    assert!(short_id(&case_from(json!({ "quelle": "A" }))).is_none());
  }

  #[test]
  fn placeholder_case_numbers_fall_back_to_auto() {
    for placeholder in ["", "  ", "LEER", "NONE", "NULL"] {
      let case = case_from(json!({
        "fallnummer": placeholder,
        "zeitstempel": ["erfassung:2025-07-20T08:00:00Z"],
      }));
      let number = case_number(&case).unwrap();
      assert!(number.starts_with("AUTO-"), "{placeholder:?} -> {number}");
    }

    let real = case_from(json!({
      "fallnummer": " F-2025/17 ",
      "zeitstempel": ["erfassung:2025-07-20T08:00:00Z"],
    }));
    assert_eq!(case_number(&real).unwrap(), "F-2025/17");
  }

  #[test]
  fn grouping_buckets_by_case_number() {
    let cases = vec![
      case_from(json!({
        "fallnummer": "F-1",
        "zeitstempel": ["erfassung:2025-07-20T08:00:00Z"],
      })),
      case_from(json!({
        "fallnummer": "F-1",
        "zeitstempel": ["erfassung:2025-07-21T08:00:00Z"],
      })),
      case_from(json!({
        "zeitstempel": ["erfassung:2025-07-22T08:00:00Z"],
      })),
      // No intake entry: no member id, omitted.
      case_from(json!({ "fallnummer": "F-2" })),
    ];

    let groups = group_by_case_number(&cases);
    assert_eq!(groups["F-1"].len(), 2);
    assert_eq!(groups.len(), 2);
    assert!(groups.keys().any(|k| k.starts_with("AUTO-")));
    assert!(!groups.contains_key("F-2"));
  }
}
