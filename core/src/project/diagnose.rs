use std::collections::BTreeSet;

use tracing::trace;

use super::{CallRecord, Project};
use crate::diagnostics::{Diagnostic, DiagnosticCollection, FileDiagnostics};
use crate::token::{Position, Span};
use crate::types::{FileId, Flags, PrimitiveKind, SignifierId};

/// Name of the rest parameter of variadic functions.
const REST_PARAM: &str = "...";

impl Project {
    /// Rebuild every collection of `id` from its parse and pass results and the
    /// current state of the symbols it references, then notify the listener.
    pub(crate) fn diagnose(&mut self, id: FileId) {
        let Some(file) = self.file(id) else {
            return;
        };
        let mut out = FileDiagnostics::default();

        if let Some(parsed) = &file.parsed {
            for err in &parsed.lex_errors {
                out.push(Diagnostic::error(DiagnosticCollection::SyntaxError, err.message.clone(), err.span));
            }
            for err in &parsed.syntax_errors {
                let span = err.span.unwrap_or_else(|| Span::single(Position::start()));
                out.push(Diagnostic::error(DiagnosticCollection::SyntaxError, err.message.clone(), span));
            }
        }
        for diagnostic in file.global_diagnostics.iter().chain(&file.local_diagnostics) {
            out.push(diagnostic.clone());
        }
        for diagnostic in self.undeclared(id) {
            out.push(diagnostic);
        }
        for call in &file.calls {
            for diagnostic in self.call_arguments(call) {
                out.push(diagnostic);
            }
        }
        if let Some(diagnostic) = self.missing_event_inherited(id) {
            out.push(diagnostic);
        }
        for diagnostic in self.unused(id) {
            out.push(diagnostic);
        }

        let toggles = &self.config().diagnostics;
        let disabled = [
            (toggles.undeclared, DiagnosticCollection::UndeclaredGlobalReference),
            (toggles.undeclared, DiagnosticCollection::UndeclaredVariableReference),
            (toggles.unused, DiagnosticCollection::Unused),
            (toggles.missing_event_inherited, DiagnosticCollection::MissingEventInherited),
            (toggles.jsdoc, DiagnosticCollection::Jsdoc),
            (toggles.jsdoc, DiagnosticCollection::JsdocMismatch),
        ];
        for (enabled, collection) in disabled {
            if !enabled {
                out.clear(collection);
            }
        }

        let max = self.config().diagnostics.max_per_file;
        let file = &mut self.files[id.index()];
        file.diagnostics = out;
        trace!(file = %file.path, count = file.diagnostics.len(), "diagnosed");
        if let Some(listener) = self.listener.as_mut() {
            let emitted = file.diagnostics.all(max);
            listener.on_diagnostics(id, &file.path, &emitted);
        }
    }

    /// One warning per symbol this file references that nothing declares.
    fn undeclared(&self, id: FileId) -> Vec<Diagnostic> {
        let Some(file) = self.file(id) else {
            return Vec::new();
        };
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for r in &file.refs {
            let sig = self.reg.sig(r.item);
            if sig.is_declared() || !seen.insert(r.item) {
                continue;
            }
            out.push(Diagnostic::warning(
                DiagnosticCollection::UndeclaredVariableReference,
                format!("Undeclared symbol `{}`", sig.name),
                r.span,
            ));
        }
        out
    }

    fn call_arguments(&self, call: &CallRecord) -> Vec<Diagnostic> {
        let params = self.reg.params(call.function);
        let name = self.function_name(call.function);
        let supplied = |idx: usize| call.args.get(idx).is_some_and(|a| a.has_expression);
        let mut out = Vec::new();

        let missing = params
            .iter()
            .enumerate()
            .take_while(|(_, p)| self.reg.sig(**p).name != REST_PARAM)
            .find(|(idx, p)| !self.reg.sig(**p).is_optional() && !supplied(*idx));
        if let Some((_, param)) = missing {
            out.push(Diagnostic::error(
                DiagnosticCollection::MissingRequiredArgument,
                format!("Missing required argument `{}` for function `{}`.", self.reg.sig(*param).name, name),
                call.span,
            ));
        }

        let variadic = params.last().is_some_and(|p| self.reg.sig(*p).name == REST_PARAM);
        let empty_call = params.is_empty() && call.args.len() == 1 && !supplied(0);
        if !variadic && !empty_call {
            for extra in call.args.iter().skip(params.len()) {
                out.push(Diagnostic::warning(
                    DiagnosticCollection::TooManyArguments,
                    format!("Extra argument for function `{name}`."),
                    extra.span,
                ));
            }
        }
        out
    }

    pub(crate) fn function_name(&self, function: crate::types::TypeId) -> String {
        let ty = self.reg.ty(function);
        ty.name
            .clone()
            .or_else(|| ty.signifier.map(|s| self.reg.sig(s).name.clone()))
            .unwrap_or_else(|| "anonymous".to_string())
    }

    fn missing_event_inherited(&self, id: FileId) -> Option<Diagnostic> {
        let file = self.file(id)?;
        let asset = self.assets.get(file.asset)?;
        let parent = asset.parent.as_deref()?;
        if !file.is_create_event() || file.calls_super || self.asset(parent).is_none() {
            return None;
        }
        Some(Diagnostic::warning(
            DiagnosticCollection::MissingEventInherited,
            "Event does not call `event_inherited()`, so it will not inherit from its parent.",
            Span::single(Position::start()),
        ))
    }

    /// Script functions defined here that no file ever refers to.
    fn unused(&self, id: FileId) -> Vec<Diagnostic> {
        let Some(file) = self.file(id) else {
            return Vec::new();
        };
        let mut seen: BTreeSet<SignifierId> = BTreeSet::new();
        let mut out = Vec::new();
        for r in file.refs.iter().filter(|r| r.is_def) {
            let sig = self.reg.sig(r.item);
            let is_function = self.reg.kind(sig.ty) == PrimitiveKind::Function;
            if !seen.insert(r.item)
                || !is_function
                || sig.parent != self.global
                || !sig.is(Flags::GLOBAL)
                || sig.is_native()
                || sig.refs().any(|(_, rec)| !rec.is_def)
            {
                continue;
            }
            out.push(Diagnostic::info(
                DiagnosticCollection::Unused,
                format!("Unused function `{}`", sig.name),
                r.span,
            ));
        }
        out
    }
}
