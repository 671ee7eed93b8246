//! [`MemoryStore`] — an in-memory backend, useful for testing and for
//! embedding without a file.

use std::sync::{Mutex, PoisonError};

use afmtool_core::{
  backend::CaseBackend,
  case::{Case, CaseFile},
};

use crate::{Error, Result};

/// A case store held entirely in memory. `load` returns a snapshot of the
/// current document; `save` replaces it.
#[derive(Debug, Default)]
pub struct MemoryStore {
  file: Mutex<CaseFile>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_cases(cases: Vec<Case>) -> Self {
    Self { file: Mutex::new(CaseFile { cases }) }
  }

  /// The current document, cloned.
  pub fn snapshot(&self) -> CaseFile {
    self.lock().clone()
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, CaseFile> {
    // A poisoned lock only means a panic elsewhere; the data is still the
    // last fully-written document.
    self.file.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl CaseBackend for MemoryStore {
  type Error = Error;

  fn load(&self) -> Result<CaseFile> {
    Ok(self.lock().clone())
  }

  fn save(&self, file: &CaseFile) -> Result<()> {
    *self.lock() = file.clone();
    Ok(())
  }
}
