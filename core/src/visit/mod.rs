//! The two resolution passes.
//!
//! Pass 1 ([`globals`]) registers everything visible project-wide. Pass 2 ([`locals`])
//! walks one file with a local/self scope stack, resolving every identifier, inferring
//! types and recording references, scopes and call argument ranges.

mod accessor;
mod assign;
mod expression;
mod function;
mod globals;
mod locals;

pub(crate) use globals::{GlobalsOutput, GlobalsVisitor};
pub(crate) use locals::{LocalsOutput, LocalsVisitor};

use crate::cst::{Expression, LiteralKind};
use crate::project::Reference;
use crate::token::Span;
use crate::types::{FileId, PrimitiveKind, SignifierId, TypeId, TypeRegistry};

/// Record an occurrence both on the file and on the symbol.
fn record_ref(
    reg: &mut TypeRegistry,
    refs: &mut Vec<Reference>,
    file: FileId,
    item: SignifierId,
    span: Span,
    is_def: bool,
) {
    reg.sig_mut(item).add_ref(file, span, is_def);
    refs.push(Reference { item, span, is_def });
}

/// Type of a literal or literal-like expression, without resolving names.
fn literal_type(reg: &mut TypeRegistry, expr: &Expression) -> Option<TypeId> {
    let kind = match expr {
        Expression::Literal { kind, .. } => match kind {
            LiteralKind::Real => PrimitiveKind::Real,
            LiteralKind::Bool => PrimitiveKind::Bool,
            LiteralKind::Undefined => PrimitiveKind::Undefined,
            LiteralKind::Pointer => PrimitiveKind::Pointer,
        },
        Expression::Str(_) | Expression::Template { .. } => PrimitiveKind::String,
        Expression::Paren { inner, .. } => return literal_type(reg, inner),
        _ => return None,
    };
    Some(reg.scalar(kind))
}
