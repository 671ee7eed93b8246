//! Store configuration.

use std::path::PathBuf;

use serde::Deserialize;

/// Configuration for a [`crate::JsonStore`], deserialised from the embedding
/// application's configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
  /// Path of the JSON document holding the case collection.
  pub path:   PathBuf,
  /// Pretty-print the document on save. On by default — the document is
  /// meant to stay diffable and hand-inspectable.
  #[serde(default = "default_pretty")]
  pub pretty: bool,
}

fn default_pretty() -> bool {
  true
}

impl StoreConfig {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into(), pretty: true }
  }
}
