use super::locals::LocalsVisitor;
use crate::cst::{Expression, VarDeclaration};
use crate::diagnostics::{DiagnosticCollection, Severity};
use crate::jsdoc::Jsdoc;
use crate::token::{Token, TokenKind};
use crate::types::{Flags, SignifierId, TypeId};

impl LocalsVisitor<'_> {
    /// Type of an assigned value, with a documented `@type` taking precedence.
    fn assigned_type(&mut self, value: &Expression, doc: Option<&Jsdoc>) -> TypeId {
        let inferred = match value {
            Expression::Function(func) => self.function(func, doc),
            _ => self.expression(value),
        };
        match doc.and_then(|d| d.ty.as_deref()) {
            Some(documented) => self.reg.parse_feather_type_string(documented),
            None => inferred,
        }
    }

    /// `target op value`. Only `=` and `??=` define; compound operators read the target.
    pub(super) fn assignment(
        &mut self,
        target: &Expression,
        operator: &Token,
        value: &Expression,
        doc: Option<&Jsdoc>,
    ) -> TypeId {
        let ty = self.assigned_type(value, doc);
        let defines = matches!(operator.kind, TokenKind::Assign | TokenKind::NullishAssign);
        match target {
            Expression::Accessor(acc) if defines => {
                self.accessor(acc, Some(ty));
            }
            _ => {
                self.expression(target);
            }
        }
        ty
    }

    /// `name = value` with no accessor suffixes.
    pub(super) fn assign_variable(&mut self, name: &str, span: crate::token::Span, ty: TypeId) -> TypeId {
        if let Some(sig) = self.lookup(name) {
            let is_def = self.define_if_new(sig, span);
            self.reference(sig, span, is_def);
            self.merge_assigned(sig, ty);
            return self.reg.sig(sig).ty;
        }
        if self.self_is_global() {
            self.diagnostic(
                DiagnosticCollection::UndeclaredGlobalReference,
                Severity::Warning,
                format!("`{name}` is not declared anywhere but is assigned in global scope."),
                span,
            );
            return ty;
        }
        let self_ty = self.self_ty();
        let Some(sig) = self.add_member(self_ty, name, Some(ty), span) else {
            return ty;
        };
        self.reg.sig_mut(sig).flags.insert(Flags::INSTANCE);
        let is_def = self.define_if_new(sig, span);
        self.reference(sig, span, is_def);
        self.reg.sig(sig).ty
    }

    /// Widen the symbol's type with an assigned one. Built-ins keep their declared type.
    pub(super) fn merge_assigned(&mut self, sig: SignifierId, ty: TypeId) {
        if !self.reg.sig(sig).is_native() {
            self.reg.add_type_to(sig, ty);
        }
    }

    /// `var` and `static` declarations.
    pub(super) fn var_declarations(&mut self, decls: &[VarDeclaration], doc: Option<&Jsdoc>, is_static: bool) {
        for decl in decls {
            let ty = decl.value.as_ref().map(|value| self.assigned_type(value, doc));
            let (container, flags) = if is_static {
                (self.self_ty(), Flags::STATIC | Flags::INSTANCE)
            } else {
                (self.local(), Flags::LOCAL)
            };
            let Some(sig) = self.add_member(container, &decl.name.name, None, decl.name.span) else {
                continue;
            };
            if let Some(ty) = ty {
                self.merge_assigned(sig, ty);
            }
            let s = self.reg.sig_mut(sig);
            s.flags.insert(flags);
            if let Some(doc) = doc {
                if doc.description.is_some() {
                    s.description = doc.description.clone();
                }
                s.deprecated |= doc.deprecated;
            }
            let is_def = self.define_if_new(sig, decl.name.span);
            self.reference(sig, decl.name.span, is_def);
        }
    }
}
