//! Named per-file diagnostic collections.
//!
//! Each pass owns the collections it fills and replaces them wholesale on every run,
//! so a collection never holds findings from an earlier version of the file.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::token::Span;
use crate::types::FileId;

/// Collections are ordered by name, which is also the emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCollection {
    GlobalSelf,
    InvalidOperation,
    Jsdoc,
    JsdocMismatch,
    MissingEventInherited,
    MissingRequiredArgument,
    SyntaxError,
    TooManyArguments,
    UndeclaredGlobalReference,
    UndeclaredVariableReference,
    Unused,
}

impl DiagnosticCollection {
    pub const ALL: [DiagnosticCollection; 11] = [
        DiagnosticCollection::GlobalSelf,
        DiagnosticCollection::InvalidOperation,
        DiagnosticCollection::Jsdoc,
        DiagnosticCollection::JsdocMismatch,
        DiagnosticCollection::MissingEventInherited,
        DiagnosticCollection::MissingRequiredArgument,
        DiagnosticCollection::SyntaxError,
        DiagnosticCollection::TooManyArguments,
        DiagnosticCollection::UndeclaredGlobalReference,
        DiagnosticCollection::UndeclaredVariableReference,
        DiagnosticCollection::Unused,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCollection::GlobalSelf => "GLOBAL_SELF",
            DiagnosticCollection::InvalidOperation => "INVALID_OPERATION",
            DiagnosticCollection::Jsdoc => "JSDOC",
            DiagnosticCollection::JsdocMismatch => "JSDOC_MISMATCH",
            DiagnosticCollection::MissingEventInherited => "MISSING_EVENT_INHERITED",
            DiagnosticCollection::MissingRequiredArgument => "MISSING_REQUIRED_ARGUMENT",
            DiagnosticCollection::SyntaxError => "SYNTAX_ERROR",
            DiagnosticCollection::TooManyArguments => "TOO_MANY_ARGUMENTS",
            DiagnosticCollection::UndeclaredGlobalReference => "UNDECLARED_GLOBAL_REFERENCE",
            DiagnosticCollection::UndeclaredVariableReference => "UNDECLARED_VARIABLE_REFERENCE",
            DiagnosticCollection::Unused => "UNUSED",
        }
    }
}

impl fmt::Display for DiagnosticCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub collection: DiagnosticCollection,
    pub severity: Severity,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(collection: DiagnosticCollection, severity: Severity, message: impl Into<String>, span: Span) -> Self {
        Self {
            collection,
            severity,
            message: message.into(),
            span,
        }
    }

    pub fn error(collection: DiagnosticCollection, message: impl Into<String>, span: Span) -> Self {
        Self::new(collection, Severity::Error, message, span)
    }

    pub fn warning(collection: DiagnosticCollection, message: impl Into<String>, span: Span) -> Self {
        Self::new(collection, Severity::Warning, message, span)
    }

    pub fn info(collection: DiagnosticCollection, message: impl Into<String>, span: Span) -> Self {
        Self::new(collection, Severity::Info, message, span)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} [{}] {}", self.span, self.severity, self.collection, self.message)
    }
}

/// All collections of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileDiagnostics {
    collections: BTreeMap<DiagnosticCollection, Vec<Diagnostic>>,
}

impl FileDiagnostics {
    /// Replace the whole collection.
    pub fn set(&mut self, collection: DiagnosticCollection, items: Vec<Diagnostic>) {
        self.collections.insert(collection, items);
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.collections
            .entry(diagnostic.collection)
            .or_default()
            .push(diagnostic);
    }

    pub fn clear(&mut self, collection: DiagnosticCollection) {
        self.collections.remove(&collection);
    }

    pub fn clear_all(&mut self) {
        self.collections.clear();
    }

    pub fn get(&self, collection: DiagnosticCollection) -> &[Diagnostic] {
        self.collections.get(&collection).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every diagnostic ordered by collection, then emission, capped at `max`.
    pub fn all(&self, max: usize) -> Vec<Diagnostic> {
        self.collections.values().flatten().take(max).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Receives the full diagnostic set of a file after each reload.
pub trait DiagnosticsListener {
    fn on_diagnostics(&mut self, file: FileId, path: &str, diagnostics: &[Diagnostic]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Position;

    fn span() -> Span {
        Span::single(Position::start())
    }

    #[test]
    fn test_collections_sort_by_name() {
        let mut names: Vec<&str> = DiagnosticCollection::ALL.iter().map(|c| c.as_str()).collect();
        let listed = names.clone();
        names.sort();
        assert_eq!(names, listed);
    }

    #[test]
    fn test_all_is_ordered_and_capped() {
        let mut diags = FileDiagnostics::default();
        diags.push(Diagnostic::warning(DiagnosticCollection::Unused, "b", span()));
        diags.push(Diagnostic::error(DiagnosticCollection::SyntaxError, "a1", span()));
        diags.push(Diagnostic::error(DiagnosticCollection::SyntaxError, "a2", span()));

        let messages: Vec<String> = diags.all(usize::MAX).into_iter().map(|d| d.message).collect();
        assert_eq!(messages, vec!["a1", "a2", "b"]);
        assert_eq!(diags.all(2).len(), 2);
        assert_eq!(diags.len(), 3);
    }

    #[test]
    fn test_set_replaces_collection() {
        let mut diags = FileDiagnostics::default();
        diags.push(Diagnostic::info(DiagnosticCollection::Unused, "old", span()));
        diags.set(
            DiagnosticCollection::Unused,
            vec![Diagnostic::info(DiagnosticCollection::Unused, "new", span())],
        );
        assert_eq!(diags.get(DiagnosticCollection::Unused).len(), 1);
        assert_eq!(diags.get(DiagnosticCollection::Unused)[0].message, "new");
        diags.clear(DiagnosticCollection::Unused);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_display() {
        let d = Diagnostic::warning(DiagnosticCollection::GlobalSelf, "msg", span());
        assert_eq!(d.to_string(), "1:1-1 warning [GLOBAL_SELF] msg");
    }
}
