use std::collections::BTreeMap;

use anyhow::Result;
use rustc_hash::FxHashSet;
use serde::Serialize;

use super::{ArgRange, Project, Reference};
use crate::diagnostics::Diagnostic;
use crate::scope::Scope;
use crate::token::Span;
use crate::types::{FileId, Flags, PrimitiveKind, SignifierId, TypeId};

/// A symbol occurrence, addressed project-wide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub file: FileId,
    pub path: String,
    pub span: Span,
    pub is_def: bool,
}

/// The call argument under the cursor, for signature help.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgumentHelp {
    pub function: TypeId,
    pub param_idx: usize,
    pub span: Span,
    /// `function name(p: T, q?: T): Ret`
    pub code: String,
}

impl Project {
    /// Diagnostics of one file, capped at the configured maximum.
    pub fn diagnostics(&self, file: FileId) -> Result<Vec<Diagnostic>> {
        let file = self.live_file(file)?;
        Ok(file.diagnostics.all(self.config().diagnostics.max_per_file))
    }

    /// Every file with diagnostics, keyed by path.
    pub fn all_diagnostics(&self) -> BTreeMap<String, Vec<Diagnostic>> {
        let max = self.config().diagnostics.max_per_file;
        self.files()
            .filter(|f| !f.diagnostics.is_empty())
            .map(|f| (f.path.clone(), f.diagnostics.all(max)))
            .collect()
    }

    /// The reference whose span covers `offset`, ends included.
    pub fn reference_at(&self, file: FileId, offset: usize) -> Option<&Reference> {
        self.file(file)?
            .refs
            .iter()
            .filter(|r| r.span.contains(offset))
            .min_by_key(|r| r.span.end.offset - r.span.start.offset)
    }

    pub fn signifier_at(&self, file: FileId, offset: usize) -> Option<SignifierId> {
        self.reference_at(file, offset).map(|r| r.item)
    }

    pub fn type_at(&self, file: FileId, offset: usize) -> Option<TypeId> {
        self.signifier_at(file, offset).map(|s| self.reg.sig(s).ty)
    }

    pub fn scope_at(&self, file: FileId, offset: usize) -> Option<&Scope> {
        self.file(file)?.scopes.at(offset)
    }

    /// Every occurrence of `sig` in live files, ordered by file then position.
    pub fn references_of(&self, sig: SignifierId) -> Vec<Location> {
        let mut out: Vec<Location> = self
            .reg
            .sig(sig)
            .refs()
            .filter_map(|(file, rec)| {
                let f = self.file(file)?;
                Some(Location {
                    file,
                    path: f.path.clone(),
                    span: rec.span,
                    is_def: rec.is_def,
                })
            })
            .collect();
        out.sort_by_key(|l| (l.file, l.span.start.offset));
        out
    }

    /// Where `sig` is defined, if in a project file.
    pub fn definition_of(&self, sig: SignifierId) -> Option<Location> {
        let def = self.reg.sig(sig).def?;
        let (file, span) = (def.file?, def.span?);
        Some(Location {
            file,
            path: self.file(file)?.path.clone(),
            span,
            is_def: true,
        })
    }

    /// Symbols completion offers at `offset`.
    ///
    /// After a dot only the accessed container's members are listed; on the global
    /// table those are limited to project globals other than macros and enums.
    /// Elsewhere local, self and global members are merged, the nearest scope winning
    /// on name clashes.
    pub fn in_scope_symbols_at(&self, file: FileId, offset: usize) -> Vec<SignifierId> {
        let Some(scope) = self.scope_at(file, offset) else {
            return Vec::new();
        };
        let declared = |sig: &SignifierId| self.reg.sig(*sig).is_declared();

        if scope.is_dot_accessor {
            let members = self.reg.list_members(scope.self_ty).into_iter();
            if scope.self_ty == self.global {
                return members
                    .filter(|s| {
                        let sig = self.reg.sig(*s);
                        sig.def_file().is_some() && !sig.is(Flags::MACRO) && !sig.is(Flags::ENUM)
                    })
                    .collect();
            }
            return members.filter(declared).collect();
        }

        let mut containers = vec![scope.local];
        if scope.self_ty != self.global {
            containers.push(scope.self_ty);
        }
        containers.push(self.global);

        let mut names = FxHashSet::default();
        let mut out = Vec::new();
        for container in containers {
            for sig in self.reg.list_members(container) {
                let is_local = container == scope.local;
                if (is_local || declared(&sig)) && names.insert(self.reg.sig(sig).name.as_str()) {
                    out.push(sig);
                }
            }
        }
        out
    }

    /// The innermost call argument covering `offset`.
    pub fn function_arg_range_at(&self, file: FileId, offset: usize) -> Option<ArgumentHelp> {
        let range: &ArgRange = self
            .file(file)?
            .calls
            .iter()
            .flat_map(|c| c.args.iter())
            .filter(|a| a.span.contains(offset))
            .max_by_key(|a| a.span.start.offset)?;
        Some(ArgumentHelp {
            function: range.function,
            param_idx: range.param_idx,
            span: range.span,
            code: self.reg.code(range.function),
        })
    }

    /// Hover text: the symbol's signature or `name: Type`, its description and a
    /// deprecation note.
    pub fn hover(&self, file: FileId, offset: usize) -> Option<String> {
        let sig = self.reg.sig(self.signifier_at(file, offset)?);
        let mut text = if self.reg.kind(sig.ty) == PrimitiveKind::Function {
            self.reg.code(sig.ty)
        } else {
            format!("{}: {}", sig.name, self.reg.to_feather_string(sig.ty))
        };
        let description = sig
            .description
            .as_deref()
            .or_else(|| self.reg.ty(sig.ty).description.as_deref());
        if let Some(description) = description {
            text.push_str("\n\n");
            text.push_str(description);
        }
        if sig.deprecated {
            text.push_str("\n\n*Deprecated*");
        }
        Some(text)
    }

    /// Globals declared by project files, in declaration order.
    pub fn global_symbols(&self) -> Vec<SignifierId> {
        self.reg
            .list_members(self.global)
            .into_iter()
            .filter(|s| self.reg.sig(*s).def_file().is_some())
            .collect()
    }
}
