use super::locals::LocalsVisitor;
use crate::cst::{ConstructorParent, FunctionExpression, Identifier};
use crate::diagnostics::{DiagnosticCollection, Severity};
use crate::jsdoc::Jsdoc;
use crate::types::{Def, Flags, PrimitiveKind, SignifierId, Type, TypeId};

impl LocalsVisitor<'_> {
    /// Walk a function expression or declaration and return its function type.
    ///
    /// The body runs with a fresh local scope. Self is, in order of preference: the
    /// struct a constructor builds, the documented `@self`, a context handed down by the
    /// enclosing expression, a fresh struct for mixins, or the enclosing self.
    pub(super) fn function(&mut self, func: &FunctionExpression, doc: Option<&Jsdoc>) -> TypeId {
        let pending = self.pending_context.take();
        let (function, sig) = self.function_type(func);

        if let Some(sig) = sig {
            if let Some(doc) = doc {
                let s = self.reg.sig_mut(sig);
                if doc.description.is_some() {
                    s.description = doc.description.clone();
                }
                s.deprecated |= doc.deprecated;
                if doc.mixin {
                    s.flags.insert(Flags::MIXIN);
                }
            }
        }
        if let Some(description) = doc.and_then(|d| d.description.clone()) {
            self.reg.ty_mut(function).description = Some(description);
        }

        let constructs = if func.is_constructor {
            Some(self.constructs(function, func, sig))
        } else {
            self.reg.ty_mut(function).constructs = None;
            None
        };
        let documented_self = doc
            .and_then(|d| d.self_type.as_deref())
            .map(|name| self.reg.from_identifier(name))
            .filter(|ty| self.reg.kind(*ty).is_withable());
        let context = match (constructs, documented_self, pending) {
            (Some(ty), _, _) | (None, Some(ty), _) | (None, None, Some(ty)) => ty,
            _ if doc.is_some_and(|d| d.mixin) => self.reg.new_type(PrimitiveKind::Struct),
            _ => self.self_ty(),
        };
        self.reg.ty_mut(function).context = Some(context);

        let local = self.reg.new_type(PrimitiveKind::Struct);
        self.push_scope(func.params_span.start, local, context);
        self.params(function, func, doc);
        if let Some(parent) = &func.parent {
            self.parent_call(parent, sig.is_some_and(|s| self.is_global_function(s)));
        }

        self.returns.push(Vec::new());
        self.block(&func.body);
        let returned = self.returns.pop().unwrap_or_default();
        let returns = match doc.and_then(|d| d.returns.as_deref()) {
            Some(documented) => self.reg.parse_feather_type_string(documented),
            None if returned.is_empty() => self.reg.scalar(PrimitiveKind::Undefined),
            None => self.reg.union_of(&returned),
        };
        self.reg.ty_mut(function).returns = Some(returns);
        self.pop_scope(func.body.span.end);
        function
    }

    /// The function type for `func` and the symbol naming it. Script functions reuse
    /// the type registered for them in the first pass; other named functions become
    /// members of self, or of the local scope when self is the global table.
    fn function_type(&mut self, func: &FunctionExpression) -> (TypeId, Option<SignifierId>) {
        let Some(name) = &func.name else {
            return (self.reg.new_type(PrimitiveKind::Function), None);
        };
        if let Some(sig) = self.registered_global(name) {
            let ty = self.reg.sig(sig).ty;
            if self.reg.kind(ty) == PrimitiveKind::Function {
                return (ty, Some(sig));
            }
        }

        let function = self.reg.alloc(Type::new(PrimitiveKind::Function).named(name.name.clone()));
        let (container, flag) = if self.self_is_global() {
            (self.local(), Flags::LOCAL)
        } else {
            (self.self_ty(), Flags::INSTANCE)
        };
        let Some(sig) = self.add_member(container, &name.name, None, name.span) else {
            return (function, None);
        };
        self.reg.set_type(sig, function);
        self.reg.sig_mut(sig).flags.insert(flag);
        self.reg.ty_mut(function).signifier = Some(sig);
        let is_def = self.define_if_new(sig, name.span);
        self.reference(sig, name.span, is_def);
        (function, Some(sig))
    }

    /// Global symbol whose definition is exactly this name occurrence.
    fn registered_global(&self, name: &Identifier) -> Option<SignifierId> {
        let sig = self.reg.own_member(self.global, &name.name)?;
        let expected = Def {
            file: Some(self.file),
            span: Some(name.span),
        };
        (self.reg.sig(sig).def == Some(expected)).then_some(sig)
    }

    fn is_global_function(&self, sig: SignifierId) -> bool {
        self.reg.sig(sig).parent == self.global && self.reg.sig(sig).is(Flags::GLOBAL)
    }

    fn constructs(&mut self, function: TypeId, func: &FunctionExpression, sig: Option<SignifierId>) -> TypeId {
        let constructs = match self.reg.ty(function).constructs {
            Some(ty) => ty,
            None => {
                let mut ty = Type::new(PrimitiveKind::Struct);
                ty.name = func.name.as_ref().map(|n| n.name.clone());
                ty.signifier = sig;
                let ty = self.reg.alloc(ty);
                self.reg.ty_mut(function).constructs = Some(ty);
                ty
            }
        };
        if let Some(parent) = &func.parent {
            let parent_constructs = self
                .lookup(&parent.name.name)
                .map(|p| self.reg.sig(p).ty)
                .and_then(|ty| self.reg.ty(ty).constructs);
            if let Some(parent_constructs) = parent_constructs.filter(|p| *p != constructs) {
                self.reg.ty_mut(constructs).parent = Some(parent_constructs);
            }
        }
        constructs
    }

    /// `: Parent(args)` is checked like a call to the parent constructor.
    fn parent_call(&mut self, parent: &ConstructorParent, already_referenced: bool) {
        let parent_sig = self.lookup(&parent.name.name);
        if let Some(sig) = parent_sig.filter(|_| !already_referenced) {
            self.reference(sig, parent.name.span, false);
        }
        for arg in parent.args.args.iter().flatten() {
            self.expression(arg);
        }
        let function = parent_sig
            .map(|sig| self.reg.sig(sig).ty)
            .filter(|ty| self.reg.kind(*ty) == PrimitiveKind::Function);
        if let Some(function) = function {
            self.record_call(function, &parent.args);
        }
    }

    /// Declare parameters as locals and bind them into the function's parameter list.
    /// Documented parameters beyond the declared ones stay on the function as optional.
    fn params(&mut self, function: TypeId, func: &FunctionExpression, doc: Option<&Jsdoc>) {
        let local = self.local();
        for (idx, param) in func.params.iter().enumerate() {
            let default_ty = param.default.as_ref().map(|d| self.expression(d));
            let documented = doc.and_then(|d| d.params.get(idx));
            if let Some(documented) = documented.filter(|d| d.name != param.name.name) {
                self.diagnostic(
                    DiagnosticCollection::JsdocMismatch,
                    Severity::Warning,
                    "Parameter name mismatch".to_string(),
                    documented.span,
                );
            }
            let documented_ty = documented
                .and_then(|d| d.ty.as_deref())
                .map(|t| self.reg.parse_feather_type_string(t));
            let ty = documented_ty.or(default_ty);
            let Some(sig) = self.add_member(local, &param.name.name, ty, param.name.span) else {
                continue;
            };
            if let Err(err) = self.reg.bind_param(function, idx, sig) {
                self.fail(err);
                continue;
            }
            let optional = param.default.is_some() || documented.is_some_and(|d| d.optional);
            let s = self.reg.sig_mut(sig);
            s.flags.insert(Flags::LOCAL | Flags::PARAMETER);
            s.flags.set(Flags::OPTIONAL, optional);
            if let Some(description) = documented.and_then(|d| d.description.clone()) {
                s.description = Some(description);
            }
            let is_def = self.define_if_new(sig, param.name.span);
            self.reference(sig, param.name.span, is_def);
        }

        let declared = func.params.len();
        let mut count = declared;
        if let Some(doc) = doc {
            for (idx, extra) in doc.params.iter().enumerate().skip(declared) {
                let ty = match extra.ty.as_deref() {
                    Some(t) => self.reg.parse_feather_type_string(t),
                    None => self.reg.any(),
                };
                match self.reg.set_param(function, idx, &extra.name, ty) {
                    Ok(sig) => {
                        let s = self.reg.sig_mut(sig);
                        s.flags.insert(Flags::OPTIONAL);
                        s.description = extra.description.clone();
                        count = idx + 1;
                    }
                    Err(err) => {
                        self.fail(err);
                        break;
                    }
                }
            }
        }
        self.reg.truncate_params(function, count);
    }
}
