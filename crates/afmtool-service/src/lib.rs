//! Case operations for AFMTool — CRUD, workflow transitions, and
//! derived-field maintenance over any [`afmtool_core::backend::CaseBackend`].
//!
//! UI, reporting, and CLI layers are external collaborators: they hold a
//! [`CaseService`] and call its operations; nothing here renders, draws, or
//! prompts.

pub mod error;
pub mod ident;
pub mod service;

pub use error::{Error, Result};
pub use service::CaseService;
