use super::literal_type;
use super::locals::LocalsVisitor;
use crate::cst::{Expression, StructEntry, TemplatePart};
use crate::jsdoc::{Jsdoc, parse_jsdoc};
use crate::token::{Span, Token, TokenKind};
use crate::types::{Flags, PrimitiveKind, TypeId};

impl LocalsVisitor<'_> {
    /// Expression in statement position, the only place `=` assigns.
    pub(super) fn statement_expression(&mut self, expr: &Expression, doc: Option<&Jsdoc>) {
        match expr {
            Expression::Assignment { target, operator, value } => {
                self.assignment(target, operator, value, doc);
            }
            _ => {
                self.expression(expr);
            }
        }
    }

    /// Resolve names inside `expr` and infer its type.
    pub(super) fn expression(&mut self, expr: &Expression) -> TypeId {
        match expr {
            Expression::Literal { .. } | Expression::Str(_) => match literal_type(self.reg, expr) {
                Some(ty) => ty,
                None => self.reg.unknown(),
            },
            Expression::Template { parts, .. } => {
                for part in parts {
                    if let TemplatePart::Interpolation(inner) = part {
                        self.expression(inner);
                    }
                }
                self.reg.scalar(PrimitiveKind::String)
            }
            Expression::Accessor(acc) => self.accessor(acc, None),
            Expression::Paren { inner, .. } => self.expression(inner),
            Expression::Array { items, .. } => {
                let types: Vec<TypeId> = items.iter().map(|item| self.expression(item)).collect();
                if types.is_empty() {
                    self.reg.new_type(PrimitiveKind::Array)
                } else {
                    let item = self.reg.union_of(&types);
                    self.reg.array_of(item)
                }
            }
            Expression::Struct { entries, span } => self.struct_literal(entries, *span),
            Expression::Function(func) => self.function(func, None),
            Expression::Unary { operator, operand } => {
                self.expression(operand);
                let kind = if operator.kind == TokenKind::Not {
                    PrimitiveKind::Bool
                } else {
                    PrimitiveKind::Real
                };
                self.reg.scalar(kind)
            }
            Expression::Postfix { operand, .. } => {
                self.expression(operand);
                self.reg.scalar(PrimitiveKind::Real)
            }
            Expression::Binary { left, operator, right } => {
                let left = self.expression(left);
                let right = self.expression(right);
                self.binary(operator, left, right)
            }
            Expression::Ternary {
                condition,
                if_true,
                if_false,
            } => {
                self.expression(condition);
                let a = self.expression(if_true);
                let b = self.expression(if_false);
                self.reg.union_of(&[a, b])
            }
            Expression::Assignment { target, operator, value } => self.assignment(target, operator, value, None),
            Expression::Missing(_) => self.reg.unknown(),
        }
    }

    fn binary(&mut self, operator: &Token, left: TypeId, right: TypeId) -> TypeId {
        let kind = match operator.kind {
            TokenKind::NullishCoalesce => return self.reg.union_of(&[left, right]),
            TokenKind::Eq
            | TokenKind::Ne
            | TokenKind::Lt
            | TokenKind::Le
            | TokenKind::Gt
            | TokenKind::Ge
            | TokenKind::Assign
            | TokenKind::And
            | TokenKind::Or
            | TokenKind::Xor => PrimitiveKind::Bool,
            TokenKind::Add if self.is_string(left) || self.is_string(right) => PrimitiveKind::String,
            _ => PrimitiveKind::Real,
        };
        self.reg.scalar(kind)
    }

    fn is_string(&self, ty: TypeId) -> bool {
        self.reg.kind(ty) == PrimitiveKind::String
    }

    /// `{ key: value, ... }`. Values resolve in the enclosing scope; function values
    /// run with the new struct as self.
    fn struct_literal(&mut self, entries: &[StructEntry], span: Span) -> TypeId {
        let ty = self.reg.new_type(PrimitiveKind::Struct);
        for entry in entries {
            let doc = if entry.docs.is_empty() {
                None
            } else {
                Some(parse_jsdoc(&entry.docs))
            };
            let value_ty = match &entry.value {
                Some(Expression::Function(func)) => {
                    self.pending_context = Some(ty);
                    self.function(func, doc.as_ref())
                }
                Some(value) => self.expression(value),
                None => self.accessor_name_type(&entry.key.name, entry.key.span),
            };
            let documented = doc
                .as_ref()
                .and_then(|d| d.ty.as_deref())
                .map(|t| self.reg.parse_feather_type_string(t));
            let Some(member) = self.add_member(ty, &entry.key.name, Some(documented.unwrap_or(value_ty)), span)
            else {
                continue;
            };
            let m = self.reg.sig_mut(member);
            m.flags.insert(Flags::INSTANCE);
            if let Some(doc) = &doc {
                m.description = doc.description.clone();
                m.deprecated = doc.deprecated;
            }
            let is_def = self.define_if_new(member, entry.key.span);
            self.reference(member, entry.key.span, is_def);
        }
        ty
    }

    /// Type of the shorthand entry `{ name }`, resolving `name` in the current scope.
    fn accessor_name_type(&mut self, name: &str, span: Span) -> TypeId {
        match self.lookup(name) {
            Some(sig) => {
                self.reference(sig, span, false);
                self.reg.sig(sig).ty
            }
            None => self.reg.unknown(),
        }
    }
}
