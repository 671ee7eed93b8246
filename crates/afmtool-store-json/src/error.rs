//! Error type for `afmtool-store-json`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Filesystem failure while reading or writing the document.
  #[error("i/o error on case file {path}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The persisted document exists but is not parseable JSON.
  #[error("case file {path} is not valid JSON: {source}")]
  Corrupt {
    path:   PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
