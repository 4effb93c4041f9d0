//! Pass 1: register functions, constructors, enums, macros and globals of one file on
//! the project-wide global table.
//!
//! Existing global symbols are reused rather than replaced, so references other files
//! hold keep pointing at the same symbol across edits.

use anyhow::Result;
use tracing::trace;

use super::{literal_type, record_ref};
use crate::cst::visit::{self, Visitor};
use crate::cst::{
    AccessorHead, AccessorSuffix, EnumDeclaration, Expression, File, FunctionExpression, Identifier,
    IdentifierAccessor, MacroDeclaration, Statement, StatementKind,
};
use crate::diagnostics::{Diagnostic, DiagnosticCollection};
use crate::jsdoc::parse_jsdoc;
use crate::project::Reference;
use crate::token::{Span, TokenKind};
use crate::types::{FileId, Flags, PrimitiveKind, SignifierId, Type, TypeId, TypeRegistry};

#[derive(Debug, Default)]
pub(crate) struct GlobalsOutput {
    pub refs: Vec<Reference>,
    pub diagnostics: Vec<Diagnostic>,
    pub calls_super: bool,
}

pub(crate) struct GlobalsVisitor<'a> {
    reg: &'a mut TypeRegistry,
    global: TypeId,
    file: FileId,
    /// Only top-level functions of scripts are global.
    registers_functions: bool,
    depth: usize,
    out: GlobalsOutput,
    error: Option<anyhow::Error>,
}

impl<'a> GlobalsVisitor<'a> {
    pub(crate) fn new(reg: &'a mut TypeRegistry, global: TypeId, file: FileId, registers_functions: bool) -> Self {
        Self {
            reg,
            global,
            file,
            registers_functions,
            depth: 0,
            out: GlobalsOutput::default(),
            error: None,
        }
    }

    pub(crate) fn run(mut self, file: &File) -> Result<GlobalsOutput> {
        visit::walk_file(&mut self, file);
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.out),
        }
    }

    fn fail(&mut self, err: anyhow::Error) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    fn ensure_global(&mut self, name: &str) -> Option<SignifierId> {
        match self.reg.add_member(self.global, name, None) {
            Ok(sig) => {
                let sig_ref = self.reg.sig_mut(sig);
                if !sig_ref.is_native() {
                    sig_ref.flags.insert(Flags::GLOBAL);
                }
                Some(sig)
            }
            Err(err) => {
                self.fail(err);
                None
            }
        }
    }

    /// Create or update a global. With `is_def`, this occurrence becomes its definition;
    /// otherwise it is recorded as a plain reference.
    fn register(&mut self, name: &str, span: Span, is_def: bool) -> Option<SignifierId> {
        let sig = self.ensure_global(name)?;
        let native = self.reg.sig(sig).is_native();
        if is_def && native {
            self.out.diagnostics.push(Diagnostic::warning(
                DiagnosticCollection::InvalidOperation,
                format!("`{name}` already exists as a built-in symbol."),
                span,
            ));
        }
        let def = is_def && !native;
        if def {
            let sig = self.reg.sig_mut(sig);
            sig.set_def(self.file, span);
            sig.flags.remove(Flags::MACRO);
            sig.flags.remove(Flags::ENUM);
            sig.flags.insert(Flags::WRITABLE);
        }
        record_ref(self.reg, &mut self.out.refs, self.file, sig, span, def);
        Some(sig)
    }

    /// The symbol's type if it already has `kind`, else a fresh one named `name`.
    fn typed(&mut self, sig: SignifierId, kind: PrimitiveKind, name: &str) -> TypeId {
        let current = self.reg.sig(sig).ty;
        let ty = if self.reg.kind(current) == kind {
            current
        } else {
            match self.reg.known(&format!("{}.{}", kind.as_str(), name)) {
                Some(known) if self.reg.kind(known) == kind => known,
                _ => self.reg.alloc(Type::new(kind).named(name)),
            }
        };
        self.reg.set_type(sig, ty);
        self.reg.ty_mut(ty).signifier = Some(sig);
        self.reg.register_known(format!("{}.{}", kind.as_str(), name), ty);
        ty
    }

    fn constructs_of(&mut self, function: TypeId, sig: SignifierId, name: &str) -> TypeId {
        let key = format!("Struct.{name}");
        let constructs = match self.reg.ty(function).constructs.or_else(|| self.reg.known(&key)) {
            Some(ty) if self.reg.kind(ty) == PrimitiveKind::Struct => ty,
            _ => self.reg.alloc(Type::new(PrimitiveKind::Struct).named(name)),
        };
        self.reg.ty_mut(function).constructs = Some(constructs);
        self.reg.ty_mut(constructs).signifier = Some(sig);
        self.reg.register_known(key, constructs);
        constructs
    }

    fn register_function(&mut self, func: &FunctionExpression, name: &Identifier) {
        let mut parent_constructs = None;
        if let Some(parent) = &func.parent {
            if let Some(parent_sig) = self.register(&parent.name.name, parent.name.span, false) {
                if !self.reg.sig(parent_sig).is_native() {
                    let parent_fn = self.typed(parent_sig, PrimitiveKind::Function, &parent.name.name);
                    parent_constructs = Some(self.constructs_of(parent_fn, parent_sig, &parent.name.name));
                }
            }
        }

        let Some(sig) = self.register(&name.name, name.span, true) else {
            return;
        };
        if self.reg.sig(sig).is_native() {
            return;
        }
        let function = self.typed(sig, PrimitiveKind::Function, &name.name);
        self.reg.ty_mut(function).constructs = None;
        if func.is_constructor {
            let constructs = self.constructs_of(function, sig, &name.name);
            if parent_constructs != Some(constructs) {
                self.reg.ty_mut(constructs).parent = parent_constructs;
            }
        }
        trace!(name = %name.name, constructor = func.is_constructor, "registered global function");
    }

    fn register_docs(&mut self, stmt: &Statement) {
        let doc = parse_jsdoc(&stmt.docs);
        for global in &doc.globals {
            if let Some(sig) = self.register(&global.name, global.span, true) {
                if self.reg.sig(sig).is_native() {
                    continue;
                }
                let ty = self.reg.parse_feather_type_string(global.ty.as_deref().unwrap_or("Any"));
                self.reg.set_type(sig, ty);
                self.reg.sig_mut(sig).description = doc.description.clone();
            }
        }
    }

    /// `global.name`, if `acc` is exactly that.
    fn global_member(acc: &IdentifierAccessor) -> Option<&Identifier> {
        if acc.head_kind != AccessorHead::Global {
            return None;
        }
        match acc.suffixes.first() {
            Some(AccessorSuffix::Dot { name: Some(name), .. }) => Some(name),
            _ => None,
        }
    }
}

impl Visitor for GlobalsVisitor<'_> {
    fn visit_statement(&mut self, stmt: &Statement) {
        if !stmt.docs.is_empty() {
            self.register_docs(stmt);
        }
        match &stmt.kind {
            StatementKind::GlobalVar(names) => {
                for name in names {
                    self.register(&name.name, name.span, true);
                }
            }
            _ => visit::walk_statement(self, stmt),
        }
    }

    fn visit_expression(&mut self, expr: &Expression) {
        if let Expression::Assignment { target, operator, .. } = expr {
            let defines = matches!(operator.kind, TokenKind::Assign | TokenKind::NullishAssign);
            if let (true, Expression::Accessor(acc)) = (defines, target.as_ref()) {
                if let Some(name) = Self::global_member(acc).filter(|_| acc.suffixes.len() == 1) {
                    if let Some(sig) = self.ensure_global(&name.name) {
                        let sig = self.reg.sig_mut(sig);
                        if !sig.is_native() && sig.def.is_none() {
                            sig.set_def(self.file, name.span);
                        }
                    }
                }
            }
        }
        visit::walk_expression(self, expr);
    }

    fn visit_function(&mut self, func: &FunctionExpression) {
        if self.depth == 0 && self.registers_functions {
            if let Some(name) = &func.name {
                self.register_function(func, name);
            }
        }
        self.depth += 1;
        visit::walk_function(self, func);
        self.depth -= 1;
    }

    fn visit_accessor(&mut self, acc: &IdentifierAccessor) {
        if let Some(name) = Self::global_member(acc) {
            self.ensure_global(&name.name);
        } else if acc.head_kind == AccessorHead::Identifier
            && acc.head.name == "event_inherited"
            && matches!(acc.suffixes.first(), Some(AccessorSuffix::Call(_)))
        {
            self.out.calls_super = true;
        }
        visit::walk_accessor(self, acc);
    }

    fn visit_enum(&mut self, decl: &EnumDeclaration) {
        let name = &decl.name.name;
        let Some(sig) = self.register(name, decl.name.span, true) else {
            return;
        };
        if self.reg.sig(sig).is_native() {
            return;
        }
        self.reg.sig_mut(sig).flags.insert(Flags::ENUM);
        let ty = self.typed(sig, PrimitiveKind::Enum, name);
        for (idx, member) in decl.members.iter().enumerate() {
            let member_sig = match self.reg.add_member(ty, &member.name.name, None) {
                Ok(m) => m,
                Err(err) => {
                    self.fail(err);
                    return;
                }
            };
            if self.reg.kind(self.reg.sig(member_sig).ty) != PrimitiveKind::EnumMember {
                let member_ty = self
                    .reg
                    .alloc(Type::new(PrimitiveKind::EnumMember).named(member.name.name.clone()));
                self.reg.set_type(member_sig, member_ty);
                self.reg.ty_mut(member_ty).signifier = Some(member_sig);
            }
            let m = self.reg.sig_mut(member_sig);
            m.flags.insert(Flags::ENUM_MEMBER);
            m.flags.remove(Flags::WRITABLE);
            m.idx = Some(idx);
            m.set_def(self.file, member.name.span);
            record_ref(self.reg, &mut self.out.refs, self.file, member_sig, member.name.span, true);
        }
        visit::walk_enum(self, decl);
    }

    fn visit_macro(&mut self, decl: &MacroDeclaration) {
        let Some(sig) = self.register(&decl.name.name, decl.name.span, true) else {
            return;
        };
        if self.reg.sig(sig).is_native() {
            return;
        }
        let ty = match decl.value.as_ref().and_then(|v| literal_type(self.reg, v)) {
            Some(ty) => ty,
            None => self.reg.any(),
        };
        self.reg.set_type(sig, ty);
        let sig = self.reg.sig_mut(sig);
        sig.flags.insert(Flags::MACRO);
        sig.flags.remove(Flags::WRITABLE);
        if let Some(value) = &decl.value {
            self.visit_expression(value);
        }
    }
}
