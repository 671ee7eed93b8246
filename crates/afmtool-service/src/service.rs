//! [`CaseService`] — the operations layer collaborators call.
//!
//! Every operation is load → validate → mutate → save against the injected
//! backend. All guards run before the save, so a failed operation never
//! leaves a partially-updated document. There are no retries; backend errors
//! surface to the caller as [`Error::Store`].

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::{debug, info};

use afmtool_core::{
  afm::{self, AfmReport},
  backend::CaseBackend,
  case::{Case, CaseFile, FIELD_FUNDSTELLEN, FIELD_QUELLE},
  ledger::{self, UniquenessReport},
  phase::{self, Phase},
};

use crate::{
  error::{Error, Result},
  ident,
};

/// Case operations over a storage backend.
///
/// Positional indices are the addressing handle, checked against the
/// collection on every call. They are only stable between mutations — the
/// single-user, single-process model collaborators already live with.
pub struct CaseService<B> {
  backend: B,
}

impl<B: CaseBackend> CaseService<B> {
  pub fn new(backend: B) -> Self {
    Self { backend }
  }

  pub fn backend(&self) -> &B {
    &self.backend
  }

  pub fn into_backend(self) -> B {
    self.backend
  }

  fn load(&self) -> Result<CaseFile> {
    self.backend.load().map_err(|e| Error::Store(Box::new(e)))
  }

  fn save(&self, file: &CaseFile) -> Result<()> {
    self.backend.save(file).map_err(|e| Error::Store(Box::new(e)))
  }

  fn check_index(file: &CaseFile, index: usize) -> Result<()> {
    if index < file.len() {
      Ok(())
    } else {
      Err(Error::IndexOutOfRange { index, len: file.len() })
    }
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  pub fn cases(&self) -> Result<Vec<Case>> {
    Ok(self.load()?.cases)
  }

  pub fn count(&self) -> Result<usize> {
    Ok(self.load()?.len())
  }

  pub fn case(&self, index: usize) -> Result<Case> {
    let file = self.load()?;
    Self::check_index(&file, index)?;
    Ok(file.cases[index].clone())
  }

  /// The most recently appended case, with its index.
  pub fn latest(&self) -> Result<Option<(usize, Case)>> {
    let file = self.load()?;
    Ok(file.cases.last().map(|c| (file.len() - 1, c.clone())))
  }

  /// The last `n` cases, oldest first.
  pub fn recent(&self, n: usize) -> Result<Vec<Case>> {
    let file = self.load()?;
    let skip = file.len().saturating_sub(n);
    Ok(file.cases.into_iter().skip(skip).collect())
  }

  /// The case's current workflow status, derived from its ledger.
  pub fn status(&self, index: usize) -> Result<Phase> {
    Ok(phase::derive_status(&self.case(index)?))
  }

  /// True iff the case still carries exactly its creation marker — the cue
  /// for collaborators to auto-advance on the first real edit.
  pub fn is_first_edit(&self, index: usize) -> Result<bool> {
    Ok(phase::is_first_edit(&self.case(index)?))
  }

  // ── CRUD ──────────────────────────────────────────────────────────────

  /// Build a case from `fields`, stamp it with an intake entry (unless the
  /// caller supplied one), derive its AFM string, append and persist it.
  pub fn create(&self, fields: Map<String, Value>) -> Result<Case> {
    let mut file = self.load()?;

    let mut case = Case::from_fields(fields);
    if ledger::intake_entry(&case).is_none() {
      ledger::append(&mut case, Phase::Intake);
    }
    ledger::ensure_unique(&case)?;
    afm::regenerate(&mut case)?;

    file.cases.push(case.clone());
    self.save(&file)?;

    info!(index = file.len() - 1, quelle = case.quelle(), "created case");
    Ok(case)
  }

  /// Create a blank case for the edit-immediately flow and return its
  /// index. Sweeps out previously abandoned blank cases first.
  pub fn create_empty(&self) -> Result<usize> {
    self.cleanup_empty()?;

    let mut file = self.load()?;
    let mut case = Case::new();
    case.set(FIELD_QUELLE, "");
    case.set(FIELD_FUNDSTELLEN, "");
    ledger::append(&mut case, Phase::Intake);
    afm::regenerate(&mut case)?;

    file.cases.push(case);
    self.save(&file)?;

    let index = file.len() - 1;
    debug!(index, "created empty case");
    Ok(index)
  }

  /// Merge `updates` onto the case at `index`.
  ///
  /// The ledger may be replaced wholesale through this path, but only if
  /// the intake entry survives byte-identical and the result is
  /// duplicate-free. The AFM string is *not* regenerated here — callers
  /// decide when (see [`Self::regenerate_afm`]).
  pub fn update(
    &self,
    index: usize,
    updates: Map<String, Value>,
  ) -> Result<()> {
    let mut file = self.load()?;
    Self::check_index(&file, index)?;

    let existing = file.cases[index].clone();
    let mut updated = existing.clone();
    updated.apply_updates(updates);

    ledger::ensure_intake_unchanged(&existing, &updated)?;
    ledger::ensure_unique(&updated)?;

    file.cases[index] = updated;
    self.save(&file)?;

    debug!(index, "updated case");
    Ok(())
  }

  /// Remove and return the case at `index`. Hard delete — no tombstone, no
  /// history.
  pub fn delete(&self, index: usize) -> Result<Case> {
    let mut file = self.load()?;
    Self::check_index(&file, index)?;

    let deleted = file.cases.remove(index);
    self.save(&file)?;

    info!(index, quelle = deleted.quelle(), "deleted case");
    Ok(deleted)
  }

  /// Remove every case whose `quelle` and `fundstellen` are both empty or
  /// whitespace-only. Persists only when the collection actually shrank;
  /// returns how many cases were removed.
  pub fn cleanup_empty(&self) -> Result<usize> {
    let mut file = self.load()?;
    let before = file.len();
    file.cases.retain(|case| !case.is_blank());
    let removed = before - file.len();

    if removed > 0 {
      self.save(&file)?;
      info!(removed, "cleaned up blank cases");
    }
    Ok(removed)
  }

  // ── Workflow ──────────────────────────────────────────────────────────

  /// Advance the case to its next manual phase. Returns the new status, or
  /// `Ok(None)` without touching anything when the case is already at the
  /// last manually-reachable phase (archival is administrative).
  pub fn advance(&self, index: usize) -> Result<Option<Phase>> {
    let mut file = self.load()?;
    Self::check_index(&file, index)?;

    let case = &mut file.cases[index];
    let current = phase::derive_status(case);
    let Some(next) = current.next_manual() else {
      debug!(index, status = %current, "advance refused at terminal phase");
      return Ok(None);
    };

    ledger::append(case, next);
    ledger::ensure_unique(case)?;
    afm::regenerate(case)?;

    self.save(&file)?;
    info!(index, from = %current, to = %next, "advanced case");
    Ok(Some(next))
  }

  /// Retreat the case to its previous manual phase by stripping *every*
  /// ledger entry of the current phase (duplicates included), so the
  /// derived status is guaranteed to fall back. Returns the new status, or
  /// `Ok(None)` when no retreat is legal.
  pub fn retreat(&self, index: usize) -> Result<Option<Phase>> {
    let mut file = self.load()?;
    Self::check_index(&file, index)?;

    let case = &mut file.cases[index];
    let current = phase::derive_status(case);
    let Some(previous) = current.previous_manual() else {
      debug!(index, status = %current, "retreat refused");
      return Ok(None);
    };

    let removed = ledger::strip_phase(case, current);
    afm::regenerate(case)?;

    self.save(&file)?;
    info!(index, from = %current, to = %previous, removed, "retreated case");
    Ok(Some(previous))
  }

  // ── Derived-field maintenance ─────────────────────────────────────────

  /// Re-derive the AFM string for one case and persist.
  pub fn regenerate_afm(&self, index: usize) -> Result<()> {
    let mut file = self.load()?;
    Self::check_index(&file, index)?;

    afm::regenerate(&mut file.cases[index])?;
    self.save(&file)?;
    Ok(())
  }

  /// Re-derive the AFM string for every case, persist once, and return how
  /// many strings actually changed. Idempotent repair operation.
  pub fn regenerate_all(&self) -> Result<usize> {
    let mut file = self.load()?;
    let mut changed = 0;

    for case in &mut file.cases {
      let before = case.afm_string().to_owned();
      afm::regenerate(case)?;
      if case.afm_string() != before {
        changed += 1;
      }
    }

    self.save(&file)?;
    info!(changed, total = file.len(), "regenerated AFM strings");
    Ok(changed)
  }

  /// Audit every stored AFM string against the re-derived field set.
  pub fn validate_afm(&self) -> Result<Vec<AfmReport>> {
    Ok(afm::validate(&self.load()?))
  }

  /// Scan every case's ledger for byte-identical duplicates. Reports are
  /// index-aligned with the collection.
  pub fn validate_ledger(&self) -> Result<Vec<UniquenessReport>> {
    let file = self.load()?;
    Ok(
      file
        .cases
        .iter()
        .map(|case| ledger::uniqueness_report(case.ledger()))
        .collect(),
    )
  }

  // ── Identity ──────────────────────────────────────────────────────────

  /// Write the derived short id into every case lacking a `uuid` field and
  /// persist once. Returns how many cases were stamped; running it again
  /// stamps zero.
  pub fn assign_missing_ids(&self) -> Result<usize> {
    let mut file = self.load()?;
    let mut assigned = 0;

    for case in &mut file.cases {
      if case.contains(ident::FIELD_UUID) {
        continue;
      }
      if let Some(id) = ident::short_id(case) {
        case.set(ident::FIELD_UUID, id);
        afm::regenerate(case)?;
        assigned += 1;
      }
    }

    if assigned > 0 {
      self.save(&file)?;
      info!(assigned, "assigned short ids");
    }
    Ok(assigned)
  }

  /// Bucket the collection's derived short ids by case number.
  pub fn groups(&self) -> Result<BTreeMap<String, Vec<String>>> {
    Ok(ident::group_by_case_number(&self.load()?.cases))
  }
}
