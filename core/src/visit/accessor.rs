//! Identifier accessor chains: `head.a[0](x).b`, walked left to right while tracking
//! the type the next suffix applies to.

use super::locals::LocalsVisitor;
use crate::cst::{AccessorHead, AccessorSuffix, Expression, FunctionArguments, Identifier, IdentifierAccessor};
use crate::diagnostics::{DiagnosticCollection, Severity};
use crate::project::{ArgRange, CallRecord};
use crate::token::{Position, Span};
use crate::types::{Flags, PrimitiveKind, TypeId};

impl LocalsVisitor<'_> {
    /// Resolve the chain and return the type it evaluates to. With `assigned`, the last
    /// link is the target of a defining assignment of that type.
    pub(super) fn accessor(&mut self, acc: &IdentifierAccessor, assigned: Option<TypeId>) -> TypeId {
        let count = acc.suffixes.len();
        let mut current = self.head(acc, if count == 0 { assigned } else { None });
        for (i, suffix) in acc.suffixes.iter().enumerate() {
            let is_last = i + 1 == count;
            let assigned = if is_last { assigned } else { None };
            current = match suffix {
                AccessorSuffix::Dot { dot, name } => self.dot(current, *dot, name.as_ref(), assigned),
                AccessorSuffix::Index { args, .. } => {
                    for arg in args {
                        self.expression(arg);
                    }
                    match self.reg.ty(current).items {
                        Some(items) => items,
                        None => self.reg.unknown(),
                    }
                }
                AccessorSuffix::Call(args) => self.call(current, args, is_last && acc.new_kw.is_some()),
            };
        }
        current
    }

    fn head(&mut self, acc: &IdentifierAccessor, assigned: Option<TypeId>) -> TypeId {
        match acc.head_kind {
            AccessorHead::Identifier => match assigned {
                Some(ty) => self.assign_variable(&acc.head.name, acc.head.span, ty),
                None => self.identifier(&acc.head),
            },
            AccessorHead::Global => self.global,
            AccessorHead::SelfKw => {
                if self.self_is_global() {
                    self.diagnostic(
                        DiagnosticCollection::GlobalSelf,
                        Severity::Warning,
                        "Unnecessary use of `self` in global scope".to_string(),
                        acc.head.span,
                    );
                }
                self.self_ty()
            }
            AccessorHead::Other => match self.selves.len().checked_sub(2).and_then(|i| self.selves.get(i)) {
                Some(other) => *other,
                None => self.reg.any(),
            },
            AccessorHead::All => match self.reg.known("Id.Instance") {
                Some(instance) => instance,
                None => self.reg.any(),
            },
            AccessorHead::Noone => self.reg.scalar(PrimitiveKind::Undefined),
        }
    }

    /// A bare identifier being read.
    fn identifier(&mut self, ident: &Identifier) -> TypeId {
        if let Some(sig) = self.lookup(&ident.name) {
            self.reference(sig, ident.span, false);
            return self.reg.sig(sig).ty;
        }
        if self.self_is_global() {
            self.diagnostic(
                DiagnosticCollection::UndeclaredGlobalReference,
                Severity::Warning,
                "This signifier is not declared anywhere.".to_string(),
                ident.span,
            );
            return self.reg.any();
        }
        let self_ty = self.self_ty();
        match self.add_member(self_ty, &ident.name, None, ident.span) {
            Some(sig) => {
                self.reg.sig_mut(sig).flags.insert(Flags::INSTANCE);
                self.reference(sig, ident.span, false);
                self.reg.sig(sig).ty
            }
            None => self.reg.any(),
        }
    }

    /// `.name` applied to a value of type `current`.
    fn dot(&mut self, current: TypeId, dot: Span, name: Option<&Identifier>, assigned: Option<TypeId>) -> TypeId {
        let kind = self.reg.kind(current);
        match kind {
            PrimitiveKind::Struct | PrimitiveKind::Enum | PrimitiveKind::IdInstance | PrimitiveKind::AssetGMObject => {}
            PrimitiveKind::Any | PrimitiveKind::Unknown | PrimitiveKind::Mixed | PrimitiveKind::Union => {
                return self.reg.any();
            }
            _ => {
                let rendered = self.reg.to_feather_string(current);
                let span = name.map(|n| dot.to(n.span)).unwrap_or(dot);
                self.diagnostic(
                    DiagnosticCollection::InvalidOperation,
                    Severity::Error,
                    format!("Type `{rendered}` does not allow dot accessors."),
                    span,
                );
                return self.reg.any();
            }
        }

        let (local, self_ty) = (self.local(), self.self_ty());
        self.scopes.next_scope(dot.start, local, current, true);
        // One past the name, so completion right after a partial name stays on members.
        let last = name.map_or(dot.end, |n| n.span.end);
        let restore = Position {
            column: last.column + 1,
            offset: last.offset + 1,
            ..last
        };
        let result = match name {
            Some(name) => self.member(current, kind, name, assigned),
            None => self.reg.unknown(),
        };
        self.scopes.next_scope(restore, local, self_ty, false);
        result
    }

    fn member(&mut self, container: TypeId, kind: PrimitiveKind, name: &Identifier, assigned: Option<TypeId>) -> TypeId {
        if let Some(sig) = self.reg.get_member(container, &name.name) {
            let is_def = assigned.is_some() && self.define_if_new(sig, name.span);
            let already_recorded = self.reg.sig(sig).def.is_some_and(|d| {
                d.file == Some(self.file) && d.span == Some(name.span)
            });
            self.reference(sig, name.span, is_def || already_recorded);
            if let Some(ty) = assigned {
                self.merge_assigned(sig, ty);
            }
            return self.reg.sig(sig).ty;
        }
        match kind {
            PrimitiveKind::Struct | PrimitiveKind::IdInstance => {
                let Some(sig) = self.add_member(container, &name.name, assigned, name.span) else {
                    return self.reg.any();
                };
                let flag = if container == self.global {
                    Flags::GLOBAL
                } else {
                    Flags::INSTANCE
                };
                self.reg.sig_mut(sig).flags.insert(flag);
                let is_def = assigned.is_some() && self.define_if_new(sig, name.span);
                self.reference(sig, name.span, is_def);
                self.reg.sig(sig).ty
            }
            PrimitiveKind::Enum => {
                let Some(sig) = self.add_member(container, &name.name, None, name.span) else {
                    return self.reg.any();
                };
                self.reg.sig_mut(sig).flags.insert(Flags::ENUM_MEMBER);
                self.reference(sig, name.span, false);
                self.reg.unknown()
            }
            _ => self.reg.any(),
        }
    }

    /// `(args)` applied to a value of type `callee`.
    fn call(&mut self, callee: TypeId, args: &FunctionArguments, constructs: bool) -> TypeId {
        let function = self
            .reg
            .variants(callee)
            .into_iter()
            .find(|v| self.reg.kind(*v) == PrimitiveKind::Function);
        let is_method = function.is_some() && function == self.reg.known("Function.method");

        let mut arg_types = Vec::with_capacity(args.args.len());
        for (idx, arg) in args.args.iter().enumerate() {
            let ty = match arg {
                Some(Expression::Function(func)) if is_method && idx == 1 => {
                    self.pending_context = arg_types.first().copied().flatten().filter(|t| {
                        matches!(
                            self.reg.kind(*t),
                            PrimitiveKind::Struct | PrimitiveKind::IdInstance
                        )
                    });
                    Some(self.function(func, None))
                }
                Some(expr) => Some(self.expression(expr)),
                None => None,
            };
            arg_types.push(ty);
        }

        let Some(function) = function else {
            return self.reg.any();
        };
        self.record_call(function, args);

        if is_method {
            return match arg_types.get(1).copied().flatten() {
                Some(bound) => bound,
                None => self.reg.any(),
            };
        }
        let ty = self.reg.ty(function);
        let (result, generic) = match constructs {
            true => (ty.constructs.or(ty.returns), ty.generic),
            false => (ty.returns, ty.generic),
        };
        let Some(result) = result else {
            return self.reg.any();
        };
        match generic {
            Some(generic) => match self.bind_generic(function, generic, &arg_types) {
                Some(bound) => self.reg.substitute(result, generic, bound),
                None => result,
            },
            None => result,
        }
    }

    /// The concrete type the argument bound to the generic parameter supplies.
    fn bind_generic(&self, function: TypeId, generic: TypeId, arg_types: &[Option<TypeId>]) -> Option<TypeId> {
        for (idx, param) in self.reg.params(function).iter().enumerate() {
            let Some(arg) = arg_types.get(idx).copied().flatten() else {
                continue;
            };
            let param_ty = self.reg.sig(*param).ty;
            if param_ty == generic {
                return Some(arg);
            }
            if self.reg.ty(param_ty).items == Some(generic) {
                if let Some(items) = self.reg.ty(arg).items {
                    return Some(items);
                }
            }
        }
        None
    }

    /// Argument ranges run between consecutive delimiters, so an empty slot still
    /// has a position.
    pub(super) fn record_call(&mut self, function: TypeId, args: &FunctionArguments) {
        let call = self.calls.len();
        let mut ranges = Vec::with_capacity(args.args.len());
        for (idx, arg) in args.args.iter().enumerate() {
            let Some(open) = args.delimiters.get(idx) else {
                break;
            };
            let end = args.delimiters.get(idx + 1).map(|d| d.start).unwrap_or(args.span.end);
            ranges.push(ArgRange {
                function,
                call,
                param_idx: idx,
                span: Span::new(open.end, end),
                has_expression: arg.is_some(),
            });
        }
        self.calls.push(CallRecord {
            function,
            span: args.span,
            args: ranges,
        });
    }
}
