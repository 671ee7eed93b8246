//! Error types for `afmtool-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Two or more ledger entries are byte-identical.
  #[error("duplicate ledger entries: {duplicates:?}")]
  DuplicateTimestamp { duplicates: Vec<String> },

  /// An update tried to change or remove the intake entry.
  #[error("intake entry is immutable once recorded: {original}")]
  ImmutableTimestamp { original: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
