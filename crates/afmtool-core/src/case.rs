//! Case — the open-schema record tracked by AFMTool.
//!
//! A case is a mapping from field name to JSON value. Two text fields carry
//! the record's meaning (`quelle`, `fundstellen`); everything else is dynamic
//! and must survive load/save untouched. The ledger and the derived field
//! live in well-known keys but are ordinary map entries underneath.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Source text — where the record came from.
pub const FIELD_QUELLE: &str = "quelle";
/// Location reference text.
pub const FIELD_FUNDSTELLEN: &str = "fundstellen";
/// The derived canonical serialization of the case (see [`crate::afm`]).
pub const FIELD_AFM_STRING: &str = "afm_string";
/// The append-only phase-marker ledger (see [`crate::ledger`]).
pub const FIELD_ZEITSTEMPEL: &str = "zeitstempel";

// ─── Case ────────────────────────────────────────────────────────────────────

/// One tracked record. Serialises transparently as a JSON object, preserving
/// unknown fields and their insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Case {
  fields: Map<String, Value>,
}

impl Case {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_fields(fields: Map<String, Value>) -> Self {
    Self { fields }
  }

  pub fn fields(&self) -> &Map<String, Value> {
    &self.fields
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.fields.get(key)
  }

  pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
    self.fields.insert(key.into(), value.into());
  }

  pub fn remove(&mut self, key: &str) -> Option<Value> {
    self.fields.remove(key)
  }

  pub fn contains(&self, key: &str) -> bool {
    self.fields.contains_key(key)
  }

  /// The string value of `key`, or `""` when the field is absent or not a
  /// string.
  pub fn text(&self, key: &str) -> &str {
    self.fields.get(key).and_then(Value::as_str).unwrap_or("")
  }

  pub fn quelle(&self) -> &str {
    self.text(FIELD_QUELLE)
  }

  pub fn fundstellen(&self) -> &str {
    self.text(FIELD_FUNDSTELLEN)
  }

  pub fn afm_string(&self) -> &str {
    self.text(FIELD_AFM_STRING)
  }

  /// The raw ledger entries, in insertion order. Non-string array elements
  /// and a missing or non-array `zeitstempel` field read as empty.
  pub fn ledger(&self) -> Vec<&str> {
    self
      .fields
      .get(FIELD_ZEITSTEMPEL)
      .and_then(Value::as_array)
      .map(|a| a.iter().filter_map(Value::as_str).collect())
      .unwrap_or_default()
  }

  /// Replace the whole ledger. Callers are responsible for running the
  /// immutability and uniqueness guards first (see [`crate::ledger`]).
  pub fn set_ledger(&mut self, entries: Vec<String>) {
    self.fields.insert(
      FIELD_ZEITSTEMPEL.to_owned(),
      Value::Array(entries.into_iter().map(Value::String).collect()),
    );
  }

  /// Append one raw entry, creating the ledger field if necessary.
  pub fn push_ledger_entry(&mut self, entry: String) {
    match self.fields.get_mut(FIELD_ZEITSTEMPEL).and_then(Value::as_array_mut)
    {
      Some(entries) => entries.push(Value::String(entry)),
      None => self.set_ledger(vec![entry]),
    }
  }

  /// True when both semantic text fields are empty or whitespace-only.
  /// Blank cases are swept by the cleanup pass.
  pub fn is_blank(&self) -> bool {
    self.quelle().trim().is_empty() && self.fundstellen().trim().is_empty()
  }

  /// Merge `updates` onto this case, overwriting existing keys.
  pub fn apply_updates(&mut self, updates: Map<String, Value>) {
    for (key, value) in updates {
      self.fields.insert(key, value);
    }
  }
}

// ─── CaseFile ────────────────────────────────────────────────────────────────

/// The persisted document: `{"cases": [ ... ]}`. A missing `cases` key loads
/// as an empty collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseFile {
  #[serde(default)]
  pub cases: Vec<Case>,
}

impl CaseFile {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.cases.len()
  }

  pub fn is_empty(&self) -> bool {
    self.cases.is_empty()
  }

  pub fn case(&self, index: usize) -> Option<&Case> {
    self.cases.get(index)
  }

  pub fn case_mut(&mut self, index: usize) -> Option<&mut Case> {
    self.cases.get_mut(index)
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn case_from(value: serde_json::Value) -> Case {
    serde_json::from_value(value).unwrap()
  }

  #[test]
  fn unknown_fields_survive_a_round_trip() {
    let case = case_from(json!({
      "quelle": "Registerauszug",
      "fundstellen": "Band 12, Blatt 3",
      "kategorie": "Markenrecht",
      "prioritaet": 0,
    }));

    let text = serde_json::to_string(&case).unwrap();
    let back: Case = serde_json::from_str(&text).unwrap();

    assert_eq!(back, case);
    assert_eq!(back.get("kategorie"), Some(&json!("Markenrecht")));
    assert_eq!(back.get("prioritaet"), Some(&json!(0)));
  }

  #[test]
  fn blankness_ignores_whitespace() {
    let blank = case_from(json!({ "quelle": "  ", "fundstellen": "" }));
    assert!(blank.is_blank());

    let filled = case_from(json!({ "quelle": "", "fundstellen": "B" }));
    assert!(!filled.is_blank());

    // Missing fields count as empty.
    assert!(Case::new().is_blank());
  }

  #[test]
  fn ledger_accessor_tolerates_odd_shapes() {
    assert!(Case::new().ledger().is_empty());

    let odd = case_from(json!({ "zeitstempel": "not-an-array" }));
    assert!(odd.ledger().is_empty());

    let mixed = case_from(json!({ "zeitstempel": ["erfassung:t", 7] }));
    assert_eq!(mixed.ledger(), vec!["erfassung:t"]);
  }

  #[test]
  fn push_creates_the_ledger_field() {
    let mut case = Case::new();
    case.push_ledger_entry("erfassung:2025-07-23T09:00:00Z".into());
    case.push_ledger_entry("verarbeitung:2025-07-24T09:00:00Z".into());
    assert_eq!(case.ledger().len(), 2);
  }

  #[test]
  fn missing_cases_key_loads_as_empty() {
    let file: CaseFile = serde_json::from_str("{}").unwrap();
    assert!(file.is_empty());
  }
}
