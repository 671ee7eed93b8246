//! Error type for `afmtool-service`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The positional case handle does not point into the collection.
  #[error("case index {index} out of range (collection has {len} cases)")]
  IndexOutOfRange { index: usize, len: usize },

  #[error("core error: {0}")]
  Core(#[from] afmtool_core::Error),

  /// A backend load or save failed; the operation made no change.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
