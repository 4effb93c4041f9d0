//! Static analysis engine for GML.
//!
//! Source text is tokenized ([`token`]), parsed into a recovering concrete syntax tree
//! ([`cst`]) and resolved in two passes against a per-project arena of types and
//! symbols ([`types`]). [`project::Project`] owns all of it, keeps files consistent
//! across edits and answers queries.

pub mod config;
pub mod cst;
pub mod diagnostics;
pub mod jsdoc;
pub mod native;
pub mod project;
pub mod scope;
pub mod token;
pub mod types;
mod visit;

pub use config::AnalysisConfig;
pub use diagnostics::{Diagnostic, DiagnosticCollection, DiagnosticsListener, Severity};
pub use project::{AssetKind, AssetSpec, Project};
pub use types::{FileId, SignifierId, TypeId};
