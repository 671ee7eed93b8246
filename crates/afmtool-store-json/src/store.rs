//! [`JsonStore`] — the file implementation of [`CaseBackend`].

use std::{
  fs,
  io::ErrorKind,
  path::{Path, PathBuf},
};

use tracing::debug;

use afmtool_core::{backend::CaseBackend, case::CaseFile};

use crate::{Error, Result, StoreConfig};

/// A case store backed by a single JSON document on disk.
///
/// Construction does no I/O; the document is read on every [`load`] and
/// replaced on every [`save`].
///
/// [`load`]: CaseBackend::load
/// [`save`]: CaseBackend::save
#[derive(Debug, Clone)]
pub struct JsonStore {
  path:   PathBuf,
  pretty: bool,
}

impl JsonStore {
  /// A store over the document at `path`, pretty-printed on save.
  pub fn open(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into(), pretty: true }
  }

  pub fn from_config(config: &StoreConfig) -> Self {
    Self { path: config.path.clone(), pretty: config.pretty }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Copy the current document to a `<stem>_backup_<suffix>.json` sibling
  /// and return its path. Returns `Ok(None)` when there is no document yet.
  ///
  /// Migrations (e.g. the id backfill) take a backup before their first
  /// save.
  pub fn backup(&self, suffix: &str) -> Result<Option<PathBuf>> {
    let stem = self
      .path
      .file_stem()
      .and_then(|s| s.to_str())
      .unwrap_or("cases");
    let backup_path = self.path.with_file_name(format!(
      "{stem}_backup_{suffix}.json"
    ));

    match fs::copy(&self.path, &backup_path) {
      Ok(_) => {
        debug!(backup = %backup_path.display(), "wrote case file backup");
        Ok(Some(backup_path))
      }
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(source) => Err(Error::Io { path: backup_path, source }),
    }
  }

  fn temp_path(&self) -> PathBuf {
    let mut os = self.path.clone().into_os_string();
    os.push(".tmp");
    PathBuf::from(os)
  }
}

impl CaseBackend for JsonStore {
  type Error = Error;

  fn load(&self) -> Result<CaseFile> {
    let text = match fs::read_to_string(&self.path) {
      Ok(text) => text,
      // Bootstrap case: no document yet means an empty collection.
      Err(e) if e.kind() == ErrorKind::NotFound => {
        return Ok(CaseFile::default());
      }
      Err(source) => {
        return Err(Error::Io { path: self.path.clone(), source });
      }
    };

    let file: CaseFile = serde_json::from_str(&text)
      .map_err(|source| Error::Corrupt { path: self.path.clone(), source })?;

    debug!(
      path = %self.path.display(),
      cases = file.cases.len(),
      "loaded case file"
    );
    Ok(file)
  }

  fn save(&self, file: &CaseFile) -> Result<()> {
    let json = if self.pretty {
      serde_json::to_string_pretty(file)
    } else {
      serde_json::to_string(file)
    }
    .map_err(|source| Error::Corrupt { path: self.path.clone(), source })?;

    // Write to a sibling temp file, then rename over the document. The
    // rename is atomic on the same filesystem, so a crash mid-write leaves
    // the previous document intact.
    let temp = self.temp_path();
    fs::write(&temp, json)
      .map_err(|source| Error::Io { path: temp.clone(), source })?;
    fs::rename(&temp, &self.path)
      .map_err(|source| Error::Io { path: self.path.clone(), source })?;

    debug!(
      path = %self.path.display(),
      cases = file.cases.len(),
      "saved case file"
    );
    Ok(())
  }
}
