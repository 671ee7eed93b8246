//! The `CaseBackend` trait — the injected persistence abstraction.
//!
//! The trait is implemented by storage backends (e.g. `afmtool-store-json`).
//! Higher layers (`afmtool-service`) depend on this abstraction, not on any
//! concrete backend, so the document can live in a file, in memory, or in a
//! future real database without touching the operations layer.

use crate::case::CaseFile;

/// Abstraction over a case-file storage backend.
///
/// Deliberately synchronous: the substrate is a single local document that is
/// read and written whole, every operation blocks until the bytes are down,
/// and callers serialise their own access. There is no locking here — two
/// processes writing the same document concurrently clobber each other, last
/// write wins.
pub trait CaseBackend {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read the whole document. A backend whose document does not exist yet
  /// returns an empty collection, never an error.
  fn load(&self) -> Result<CaseFile, Self::Error>;

  /// Replace the whole document.
  fn save(&self, file: &CaseFile) -> Result<(), Self::Error>;
}
