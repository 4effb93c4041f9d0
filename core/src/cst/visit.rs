use super::nodes::*;

/// Per-rule hooks over the CST. Every method defaults to walking its children, so an
/// implementation overrides only the constructs it handles and calls the matching
/// `walk_*` function to keep descending.
pub trait Visitor {
    fn visit_statement(&mut self, stmt: &Statement) {
        walk_statement(self, stmt);
    }

    fn visit_expression(&mut self, expr: &Expression) {
        walk_expression(self, expr);
    }

    fn visit_function(&mut self, func: &FunctionExpression) {
        walk_function(self, func);
    }

    fn visit_accessor(&mut self, acc: &IdentifierAccessor) {
        walk_accessor(self, acc);
    }

    fn visit_enum(&mut self, decl: &EnumDeclaration) {
        walk_enum(self, decl);
    }

    fn visit_macro(&mut self, decl: &MacroDeclaration) {
        if let Some(value) = &decl.value {
            self.visit_expression(value);
        }
    }
}

pub fn walk_enum<V: Visitor + ?Sized>(v: &mut V, decl: &EnumDeclaration) {
    for member in &decl.members {
        if let Some(value) = &member.value {
            v.visit_expression(value);
        }
    }
}

pub fn walk_file<V: Visitor + ?Sized>(v: &mut V, file: &File) {
    for stmt in &file.statements {
        v.visit_statement(stmt);
    }
}

fn walk_block<V: Visitor + ?Sized>(v: &mut V, block: &Block) {
    for stmt in &block.statements {
        v.visit_statement(stmt);
    }
}

pub fn walk_statement<V: Visitor + ?Sized>(v: &mut V, stmt: &Statement) {
    match &stmt.kind {
        StatementKind::Function(func) => v.visit_function(func),
        StatementKind::LocalVar(decls) | StatementKind::StaticVar(decls) => {
            for decl in decls {
                if let Some(value) = &decl.value {
                    v.visit_expression(value);
                }
            }
        }
        StatementKind::GlobalVar(_) => {}
        StatementKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            v.visit_expression(condition);
            v.visit_statement(then_branch);
            if let Some(else_branch) = else_branch {
                v.visit_statement(else_branch);
            }
        }
        StatementKind::Try { body, catch, finally } => {
            walk_block(v, body);
            if let Some(catch) = catch {
                walk_block(v, &catch.body);
            }
            if let Some(finally) = finally {
                walk_block(v, finally);
            }
        }
        StatementKind::While { condition, body } => {
            v.visit_expression(condition);
            v.visit_statement(body);
        }
        StatementKind::DoUntil { body, condition } => {
            v.visit_statement(body);
            v.visit_expression(condition);
        }
        StatementKind::For {
            init,
            condition,
            update,
            body,
        } => {
            if let Some(init) = init {
                v.visit_statement(init);
            }
            if let Some(condition) = condition {
                v.visit_expression(condition);
            }
            if let Some(update) = update {
                v.visit_statement(update);
            }
            v.visit_statement(body);
        }
        StatementKind::Repeat { count, body } => {
            v.visit_expression(count);
            v.visit_statement(body);
        }
        StatementKind::Switch {
            discriminant, cases, ..
        } => {
            v.visit_expression(discriminant);
            for case in cases {
                if let Some(test) = &case.test {
                    v.visit_expression(test);
                }
                for stmt in &case.body {
                    v.visit_statement(stmt);
                }
            }
        }
        StatementKind::With { target, body } => {
            v.visit_expression(target);
            v.visit_statement(body);
        }
        StatementKind::Enum(decl) => v.visit_enum(decl),
        StatementKind::Macro(decl) => v.visit_macro(decl),
        StatementKind::Return(value) => {
            if let Some(value) = value {
                v.visit_expression(value);
            }
        }
        StatementKind::Throw(value) | StatementKind::Delete(value) | StatementKind::Expression(value) => {
            v.visit_expression(value)
        }
        StatementKind::Block(block) => walk_block(v, block),
        StatementKind::Break | StatementKind::Continue | StatementKind::Exit | StatementKind::Empty => {}
    }
}

pub fn walk_expression<V: Visitor + ?Sized>(v: &mut V, expr: &Expression) {
    match expr {
        Expression::Literal { .. } | Expression::Str(_) | Expression::Missing(_) => {}
        Expression::Template { parts, .. } => {
            for part in parts {
                if let TemplatePart::Interpolation(inner) = part {
                    v.visit_expression(inner);
                }
            }
        }
        Expression::Accessor(acc) => v.visit_accessor(acc),
        Expression::Paren { inner, .. } => v.visit_expression(inner),
        Expression::Array { items, .. } => {
            for item in items {
                v.visit_expression(item);
            }
        }
        Expression::Struct { entries, .. } => {
            for entry in entries {
                if let Some(value) = &entry.value {
                    v.visit_expression(value);
                }
            }
        }
        Expression::Function(func) => v.visit_function(func),
        Expression::Unary { operand, .. } | Expression::Postfix { operand, .. } => v.visit_expression(operand),
        Expression::Binary { left, right, .. } => {
            v.visit_expression(left);
            v.visit_expression(right);
        }
        Expression::Ternary {
            condition,
            if_true,
            if_false,
        } => {
            v.visit_expression(condition);
            v.visit_expression(if_true);
            v.visit_expression(if_false);
        }
        Expression::Assignment { target, value, .. } => {
            v.visit_expression(target);
            v.visit_expression(value);
        }
    }
}

pub fn walk_function<V: Visitor + ?Sized>(v: &mut V, func: &FunctionExpression) {
    for param in &func.params {
        if let Some(default) = &param.default {
            v.visit_expression(default);
        }
    }
    if let Some(parent) = &func.parent {
        walk_arguments(v, &parent.args);
    }
    walk_block(v, &func.body);
}

pub fn walk_accessor<V: Visitor + ?Sized>(v: &mut V, acc: &IdentifierAccessor) {
    for suffix in &acc.suffixes {
        match suffix {
            AccessorSuffix::Dot { .. } => {}
            AccessorSuffix::Index { args, .. } => {
                for arg in args {
                    v.visit_expression(arg);
                }
            }
            AccessorSuffix::Call(args) => walk_arguments(v, args),
        }
    }
}

fn walk_arguments<V: Visitor + ?Sized>(v: &mut V, args: &FunctionArguments) {
    for arg in args.args.iter().flatten() {
        v.visit_expression(arg);
    }
}
