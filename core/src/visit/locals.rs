//! Pass 2: walk one file with explicit local and self stacks.
//!
//! Names resolve local first, then self (unless self is the global table), then global.
//! Every construct that changes either binding appends a record to the file's
//! [`ScopeRanges`], which is what position queries later consult.

use anyhow::Result;

use super::record_ref;
use crate::cst::{Block, File, Statement, StatementKind};
use crate::diagnostics::{Diagnostic, DiagnosticCollection, Severity};
use crate::jsdoc::{Jsdoc, parse_jsdoc};
use crate::project::{CallRecord, Reference};
use crate::scope::ScopeRanges;
use crate::token::{Position, Span};
use crate::types::{FileId, Flags, PrimitiveKind, SignifierId, TypeId, TypeRegistry};

#[derive(Debug, Default)]
pub(crate) struct LocalsOutput {
    pub scopes: ScopeRanges,
    pub refs: Vec<Reference>,
    pub calls: Vec<CallRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

pub(crate) struct LocalsVisitor<'a> {
    pub(super) reg: &'a mut TypeRegistry,
    pub(super) file: FileId,
    pub(super) global: TypeId,
    pub(super) locals: Vec<TypeId>,
    pub(super) selves: Vec<TypeId>,
    pub(super) scopes: ScopeRanges,
    pub(super) refs: Vec<Reference>,
    pub(super) calls: Vec<CallRecord>,
    pub(super) diagnostics: Vec<Diagnostic>,
    /// Types of `return` statements, one frame per enclosing function.
    pub(super) returns: Vec<Vec<TypeId>>,
    /// Self context for the next function expression: the first argument of a
    /// `method(...)` call, or the struct literal holding it.
    pub(super) pending_context: Option<TypeId>,
    error: Option<anyhow::Error>,
}

impl<'a> LocalsVisitor<'a> {
    pub(crate) fn new(reg: &'a mut TypeRegistry, file: FileId, global: TypeId, self_ty: TypeId) -> Self {
        let local = reg.new_type(PrimitiveKind::Struct);
        Self {
            scopes: ScopeRanges::new(local, self_ty),
            reg,
            file,
            global,
            locals: vec![local],
            selves: vec![self_ty],
            refs: Vec::new(),
            calls: Vec::new(),
            diagnostics: Vec::new(),
            returns: Vec::new(),
            pending_context: None,
            error: None,
        }
    }

    pub(crate) fn run(mut self, file: &File) -> Result<LocalsOutput> {
        for stmt in &file.statements {
            self.statement(stmt);
        }
        self.scopes.close(file.span.end);
        if let Some(err) = self.error {
            return Err(err);
        }
        Ok(LocalsOutput {
            scopes: self.scopes,
            refs: self.refs,
            calls: self.calls,
            diagnostics: self.diagnostics,
        })
    }

    pub(super) fn fail(&mut self, err: anyhow::Error) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    pub(super) fn local(&self) -> TypeId {
        self.locals.last().copied().unwrap_or(self.global)
    }

    pub(super) fn self_ty(&self) -> TypeId {
        self.selves.last().copied().unwrap_or(self.global)
    }

    /// Identity comparison with the global table decides between reporting an
    /// undeclared global and creating an instance member.
    pub(super) fn self_is_global(&self) -> bool {
        self.self_ty() == self.global
    }

    pub(super) fn push_scope(&mut self, at: Position, local: TypeId, self_ty: TypeId) {
        self.locals.push(local);
        self.selves.push(self_ty);
        self.scopes.next_scope(at, local, self_ty, false);
    }

    pub(super) fn pop_scope(&mut self, at: Position) {
        if self.locals.len() > 1 {
            self.locals.pop();
        }
        if self.selves.len() > 1 {
            self.selves.pop();
        }
        let (local, self_ty) = (self.local(), self.self_ty());
        self.scopes.next_scope(at, local, self_ty, false);
    }

    /// Rebind self only, keeping the current local scope.
    pub(super) fn push_self(&mut self, at: Position, self_ty: TypeId) {
        let local = self.local();
        self.push_scope(at, local, self_ty);
    }

    pub(super) fn reference(&mut self, item: SignifierId, span: Span, is_def: bool) {
        record_ref(self.reg, &mut self.refs, self.file, item, span, is_def);
    }

    pub(super) fn diagnostic(&mut self, collection: DiagnosticCollection, severity: Severity, message: String, span: Span) {
        self.diagnostics.push(Diagnostic::new(collection, severity, message, span));
    }

    /// Resolve `name` local > self > global.
    pub(super) fn lookup(&self, name: &str) -> Option<SignifierId> {
        if let Some(sig) = self.reg.get_member(self.local(), name) {
            return Some(sig);
        }
        if !self.self_is_global() {
            if let Some(sig) = self.reg.get_member(self.self_ty(), name) {
                return Some(sig);
            }
        }
        self.reg.own_member(self.global, name)
    }

    /// Add a member to `container`, reporting containers that cannot hold one.
    pub(super) fn add_member(&mut self, container: TypeId, name: &str, ty: Option<TypeId>, span: Span) -> Option<SignifierId> {
        if !self.reg.kind(container).is_container() {
            self.diagnostic(
                DiagnosticCollection::InvalidOperation,
                Severity::Warning,
                "Cannot add variables to this type.".to_string(),
                span,
            );
            return None;
        }
        match self.reg.add_member(container, name, ty) {
            Ok(sig) => Some(sig),
            Err(err) => {
                self.fail(err);
                None
            }
        }
    }

    /// Give `sig` this occurrence as its definition if it has none yet.
    pub(super) fn define_if_new(&mut self, sig: SignifierId, span: Span) -> bool {
        let s = self.reg.sig_mut(sig);
        if s.is_declared() {
            return false;
        }
        s.set_def(self.file, span);
        true
    }

    fn docs(&mut self, stmt: &Statement) -> Option<Jsdoc> {
        if stmt.docs.is_empty() {
            return None;
        }
        let doc = parse_jsdoc(&stmt.docs);
        for problem in &doc.problems {
            self.diagnostics.push(Diagnostic::warning(
                DiagnosticCollection::Jsdoc,
                problem.message.clone(),
                problem.span,
            ));
        }
        Some(doc)
    }

    pub(super) fn block(&mut self, block: &Block) {
        for stmt in &block.statements {
            self.statement(stmt);
        }
    }

    pub(super) fn statement(&mut self, stmt: &Statement) {
        let doc = self.docs(stmt);
        let doc = doc.as_ref();
        match &stmt.kind {
            StatementKind::Function(func) => {
                self.function(func, doc);
            }
            StatementKind::LocalVar(decls) => self.var_declarations(decls, doc, false),
            StatementKind::StaticVar(decls) => self.var_declarations(decls, doc, true),
            StatementKind::GlobalVar(_) | StatementKind::Break | StatementKind::Continue | StatementKind::Exit => {}
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.expression(condition);
                self.statement(then_branch);
                if let Some(else_branch) = else_branch {
                    self.statement(else_branch);
                }
            }
            StatementKind::Try { body, catch, finally } => {
                self.block(body);
                if let Some(catch) = catch {
                    if let Some(binding) = &catch.binding {
                        let error_ty = self.reg.new_type(PrimitiveKind::Struct);
                        let local = self.local();
                        if let Some(sig) = self.add_member(local, &binding.name, Some(error_ty), binding.span) {
                            self.reg.sig_mut(sig).flags.insert(Flags::LOCAL);
                            let is_def = self.define_if_new(sig, binding.span);
                            self.reference(sig, binding.span, is_def);
                        }
                    }
                    self.block(&catch.body);
                }
                if let Some(finally) = finally {
                    self.block(finally);
                }
            }
            StatementKind::While { condition, body } => {
                self.expression(condition);
                self.statement(body);
            }
            StatementKind::DoUntil { body, condition } => {
                self.statement(body);
                self.expression(condition);
            }
            StatementKind::For {
                init,
                condition,
                update,
                body,
            } => {
                if let Some(init) = init {
                    self.statement(init);
                }
                if let Some(condition) = condition {
                    self.expression(condition);
                }
                if let Some(update) = update {
                    self.statement(update);
                }
                self.statement(body);
            }
            StatementKind::Repeat { count, body } => {
                self.expression(count);
                self.statement(body);
            }
            StatementKind::Switch {
                discriminant, cases, ..
            } => {
                self.expression(discriminant);
                for case in cases {
                    if let Some(test) = &case.test {
                        self.expression(test);
                    }
                    for stmt in &case.body {
                        self.statement(stmt);
                    }
                }
            }
            StatementKind::With { target, body } => self.with(target, body, doc),
            StatementKind::Enum(decl) => {
                for member in &decl.members {
                    if let Some(value) = &member.value {
                        self.expression(value);
                    }
                }
            }
            StatementKind::Macro(decl) => {
                if let Some(value) = &decl.value {
                    self.expression(value);
                }
            }
            StatementKind::Return(value) => {
                let ty = match value {
                    Some(value) => self.expression(value),
                    None => self.reg.scalar(PrimitiveKind::Undefined),
                };
                if let Some(frame) = self.returns.last_mut() {
                    frame.push(ty);
                }
            }
            StatementKind::Throw(value) | StatementKind::Delete(value) => {
                self.expression(value);
            }
            StatementKind::Expression(expr) => self.statement_expression(expr, doc),
            StatementKind::Block(block) => self.block(block),
            StatementKind::Empty => {}
        }
    }

    /// `with (target) body`: self becomes the instance or struct `target` denotes.
    fn with(&mut self, target: &crate::cst::Expression, body: &Statement, doc: Option<&Jsdoc>) {
        let target_ty = self.expression(target);
        let documented = doc
            .and_then(|d| d.self_type.as_deref())
            .map(|name| self.reg.from_identifier(name));
        let bound = match documented {
            Some(ty) if self.reg.kind(ty).is_withable() => ty,
            _ => self.withable(target_ty),
        };
        self.push_self(body.span.start, bound);
        self.statement(body);
        self.pop_scope(body.span.end);
    }

    /// The struct a `with` over a value of type `ty` runs in.
    fn withable(&mut self, ty: TypeId) -> TypeId {
        match self.reg.kind(ty) {
            PrimitiveKind::AssetGMObject => match self.reg.ty(ty).parent {
                Some(instance) if self.reg.kind(instance) == PrimitiveKind::IdInstance => instance,
                _ => ty,
            },
            PrimitiveKind::Struct | PrimitiveKind::IdInstance => ty,
            _ => self.reg.new_type(PrimitiveKind::Struct),
        }
    }
}
