//! The derived AFM field — a canonical serialization of a case's content.
//!
//! The AFM string is a JSON object (as text) holding every *filled* field of
//! the case except itself, with keys sorted recursively. Re-deriving it from
//! the same case content always yields byte-identical output, which makes
//! tampering and partial writes detectable by diffing — no separate checksum
//! needed.
//!
//! "Filled" means: not `null` and not the empty string. Other falsy values
//! (`0`, `false`, `[]`) are content and stay in.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
  case::{Case, CaseFile, FIELD_AFM_STRING, FIELD_QUELLE},
  error::Result,
};

/// Fields excluded from the derived serialization by default — the derived
/// field itself, so it never feeds its own computation.
pub const DEFAULT_EXCLUDED: &[&str] = &[FIELD_AFM_STRING];

/// Marker reported when a stored AFM string does not parse as a JSON object.
pub const INVALID_JSON: &str = "INVALID_JSON";

// ─── Generation ──────────────────────────────────────────────────────────────

fn is_filled(value: &Value) -> bool {
  !value.is_null() && value.as_str() != Some("")
}

/// Recursively sort object keys so serialization order never depends on
/// insertion order.
fn canonical(value: &Value) -> Value {
  match value {
    Value::Object(map) => {
      let mut entries: Vec<(&String, &Value)> = map.iter().collect();
      entries.sort_by(|a, b| a.0.cmp(b.0));

      let mut sorted = Map::new();
      for (key, value) in entries {
        sorted.insert(key.clone(), canonical(value));
      }
      Value::Object(sorted)
    }
    Value::Array(items) => {
      Value::Array(items.iter().map(canonical).collect())
    }
    other => other.clone(),
  }
}

/// Serialize every filled, non-excluded field of `case` to canonical JSON
/// text (compact, recursively sorted keys).
pub fn generate_with_exclusions(
  case: &Case,
  exclude: &[&str],
) -> Result<String> {
  let mut filled = Map::new();
  for (key, value) in case.fields() {
    if exclude.contains(&key.as_str()) || !is_filled(value) {
      continue;
    }
    filled.insert(key.clone(), value.clone());
  }
  Ok(serde_json::to_string(&canonical(&Value::Object(filled)))?)
}

/// [`generate_with_exclusions`] with the default exclusion list.
pub fn generate(case: &Case) -> Result<String> {
  generate_with_exclusions(case, DEFAULT_EXCLUDED)
}

/// Recompute the AFM string and store it on the case. Idempotent: calling
/// twice without an intervening field change writes the same bytes twice.
pub fn regenerate(case: &mut Case) -> Result<()> {
  let afm = generate(case)?;
  case.set(FIELD_AFM_STRING, afm);
  Ok(())
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// Per-case audit result from [`validate`].
#[derive(Debug, Clone, Serialize)]
pub struct AfmReport {
  pub case_index:     usize,
  /// The case's source text, `"Unbekannt"` when absent.
  pub quelle:         String,
  pub has_afm_string: bool,
  pub afm_valid:      bool,
  /// Filled fields absent from the stored AFM string, or the single marker
  /// [`INVALID_JSON`] when the stored string does not parse as an object.
  pub missing_fields: Vec<String>,
  /// Keys actually present in the stored AFM string.
  pub afm_fields:     Vec<String>,
  pub all_fields:     Vec<String>,
}

/// Audit every case: re-derive the expected field set and diff it against
/// the keys present in the stored AFM string.
pub fn validate(file: &CaseFile) -> Vec<AfmReport> {
  file
    .cases
    .iter()
    .enumerate()
    .map(|(index, case)| validate_case(index, case))
    .collect()
}

fn validate_case(index: usize, case: &Case) -> AfmReport {
  let quelle = match case.get(FIELD_QUELLE).and_then(Value::as_str) {
    Some(text) => text.to_owned(),
    None => "Unbekannt".to_owned(),
  };

  let mut report = AfmReport {
    case_index: index,
    quelle,
    has_afm_string: case.contains(FIELD_AFM_STRING),
    afm_valid: false,
    missing_fields: Vec::new(),
    afm_fields: Vec::new(),
    all_fields: case.fields().keys().cloned().collect(),
  };

  let stored = case.afm_string();
  if stored.is_empty() {
    // Never derived (or blanked); nothing further to diff.
    return report;
  }

  match serde_json::from_str::<Value>(stored) {
    Ok(Value::Object(afm_data)) => {
      report.afm_fields = afm_data.keys().cloned().collect();
      report.missing_fields = case
        .fields()
        .iter()
        .filter(|(key, value)| {
          key.as_str() != FIELD_AFM_STRING
            && is_filled(value)
            && !afm_data.contains_key(key.as_str())
        })
        .map(|(key, _)| key.clone())
        .collect();
      report.afm_valid = report.missing_fields.is_empty();
    }
    _ => {
      report.missing_fields = vec![INVALID_JSON.to_owned()];
    }
  }

  report
}
