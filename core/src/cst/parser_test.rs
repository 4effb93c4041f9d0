use crate::cst::{AccessorHead, AccessorSuffix, Expression, IndexKind, StatementKind, TemplatePart, parse};
use crate::token::TokenKind;

fn parse_ok(src: &str) -> crate::cst::File {
    let result = parse(src);
    assert!(result.lex_errors.is_empty(), "lex errors: {:?}", result.lex_errors);
    assert!(result.syntax_errors.is_empty(), "syntax errors: {:?}", result.syntax_errors);
    result.file
}

#[test]
fn test_function_declaration() {
    let file = parse_ok("function add(a, b = 2) { return a + b; }");
    assert_eq!(file.statements.len(), 1);
    let StatementKind::Function(func) = &file.statements[0].kind else {
        panic!("expected function, got {:?}", file.statements[0].kind);
    };
    assert_eq!(func.name.as_ref().map(|n| n.name.as_str()), Some("add"));
    assert_eq!(func.params.len(), 2);
    assert!(func.params[0].default.is_none());
    assert!(func.params[1].default.is_some());
    assert!(!func.is_constructor);
    assert_eq!(func.body.statements.len(), 1);
}

#[test]
fn test_constructor_with_parent() {
    let file = parse_ok("function Child(x) : Parent(x, 1) constructor { static count = 0; }");
    let StatementKind::Function(func) = &file.statements[0].kind else {
        panic!("expected function");
    };
    assert!(func.is_constructor);
    let parent = func.parent.as_ref().expect("parent clause");
    assert_eq!(parent.name.name, "Parent");
    assert_eq!(parent.args.args.len(), 2);
    assert!(matches!(func.body.statements[0].kind, StatementKind::StaticVar(_)));
}

#[test]
fn test_accessor_suffixes_are_flat_and_ordered() {
    let file = parse_ok("a.b[0][? \"k\"](1, 2).c = 3;");
    let StatementKind::Expression(Expression::Assignment { target, .. }) = &file.statements[0].kind else {
        panic!("expected assignment");
    };
    let Expression::Accessor(acc) = target.as_ref() else {
        panic!("expected accessor");
    };
    assert_eq!(acc.head.name, "a");
    assert_eq!(acc.suffixes.len(), 5);
    assert!(matches!(acc.suffixes[0], AccessorSuffix::Dot { .. }));
    assert!(matches!(
        acc.suffixes[1],
        AccessorSuffix::Index {
            kind: IndexKind::Array,
            ..
        }
    ));
    assert!(matches!(
        acc.suffixes[2],
        AccessorSuffix::Index {
            kind: IndexKind::Map,
            ..
        }
    ));
    assert!(matches!(acc.suffixes[3], AccessorSuffix::Call(_)));
    assert!(matches!(acc.suffixes[4], AccessorSuffix::Dot { .. }));
}

#[test]
fn test_call_argument_delimiters() {
    let file = parse_ok("f(); g(a, , b); h(x,);");
    let calls: Vec<_> = file
        .statements
        .iter()
        .map(|s| match &s.kind {
            StatementKind::Expression(Expression::Accessor(acc)) => match &acc.suffixes[0] {
                AccessorSuffix::Call(args) => args.clone(),
                other => panic!("expected call, got {:?}", other),
            },
            other => panic!("expected expression, got {:?}", other),
        })
        .collect();
    assert_eq!(calls[0].args.len(), 1);
    assert!(calls[0].args[0].is_none());
    assert_eq!(calls[0].delimiters.len(), 2);

    assert_eq!(calls[1].args.len(), 3);
    assert!(calls[1].args[1].is_none());
    assert_eq!(calls[1].delimiters.len(), 4);

    assert_eq!(calls[2].args.len(), 2);
    assert!(calls[2].args[0].is_some());
    assert!(calls[2].args[1].is_none());
}

#[test]
fn test_equals_is_comparison_inside_expressions() {
    let file = parse_ok("if a = b { c = 1; }");
    let StatementKind::If { condition, .. } = &file.statements[0].kind else {
        panic!("expected if");
    };
    let Expression::Binary { operator, .. } = condition else {
        panic!("expected binary condition");
    };
    assert_eq!(operator.kind, TokenKind::Assign);
}

#[test]
fn test_precedence() {
    let file = parse_ok("x = 1 + 2 * 3;");
    let StatementKind::Expression(Expression::Assignment { value, .. }) = &file.statements[0].kind else {
        panic!("expected assignment");
    };
    let Expression::Binary { operator, right, .. } = value.as_ref() else {
        panic!("expected binary");
    };
    assert_eq!(operator.kind, TokenKind::Add);
    assert!(matches!(right.as_ref(), Expression::Binary { .. }));
}

#[test]
fn test_struct_and_array_literals() {
    let file = parse_ok("var s = { a: 1, \"b\": [1, 2,], c, };");
    let StatementKind::LocalVar(decls) = &file.statements[0].kind else {
        panic!("expected var");
    };
    let Some(Expression::Struct { entries, .. }) = &decls[0].value else {
        panic!("expected struct literal");
    };
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[1].key.name, "b");
    assert!(matches!(entries[1].value, Some(Expression::Array { ref items, .. }) if items.len() == 2));
    assert!(entries[2].value.is_none());
}

#[test]
fn test_template_string_parts() {
    let file = parse_ok("s = $\"hp: {hp} of {max_hp}\";");
    let StatementKind::Expression(Expression::Assignment { value, .. }) = &file.statements[0].kind else {
        panic!("expected assignment");
    };
    let Expression::Template { parts, .. } = value.as_ref() else {
        panic!("expected template");
    };
    let interps = parts
        .iter()
        .filter(|p| matches!(p, TemplatePart::Interpolation(_)))
        .count();
    assert_eq!(interps, 2);
}

#[test]
fn test_control_flow_statements() {
    let src = r#"
        for (var i = 0; i < 10; i++) { continue; }
        while (true) break;
        do { x += 1; } until x > 3;
        repeat (3) exit;
        switch (v) { case 1: a(); break; default: b(); }
        with (obj_player) { hp = 0; }
        try { throw "x"; } catch (e) { show(e); } finally { done(); }
        delete s;
    "#;
    let file = parse_ok(src);
    let kinds: Vec<_> = file
        .statements
        .iter()
        .map(|s| std::mem::discriminant(&s.kind))
        .collect();
    assert_eq!(kinds.len(), 8);
    let StatementKind::Switch { cases, .. } = &file.statements[4].kind else {
        panic!("expected switch");
    };
    assert_eq!(cases.len(), 2);
    assert!(cases[1].test.is_none());
    let StatementKind::Try { catch, finally, .. } = &file.statements[6].kind else {
        panic!("expected try");
    };
    assert_eq!(catch.as_ref().and_then(|c| c.binding.as_ref()).map(|b| b.name.as_str()), Some("e"));
    assert!(finally.is_some());
}

#[test]
fn test_enum_and_macro() {
    let file = parse_ok("enum Color { Red, Green = 5, Blue }\n#macro LIMIT 10\n#macro Debug:VERBOSE true\nx = LIMIT;");
    let StatementKind::Enum(decl) = &file.statements[0].kind else {
        panic!("expected enum");
    };
    assert_eq!(decl.members.len(), 3);
    let StatementKind::Macro(m) = &file.statements[1].kind else {
        panic!("expected macro");
    };
    assert_eq!(m.name.name, "LIMIT");
    assert!(m.value.is_some());
    let StatementKind::Macro(m) = &file.statements[2].kind else {
        panic!("expected macro");
    };
    assert_eq!(m.config.as_ref().map(|c| c.name.as_str()), Some("Debug"));
    assert_eq!(m.name.name, "VERBOSE");
    assert_eq!(file.statements.len(), 4);
}

#[test]
fn test_macro_value_continues_across_lines() {
    let file = parse_ok("#macro SUM 1 + \\\n    2 * \\\n    3\n#macro NEXT 4\nx = SUM;");
    assert_eq!(file.statements.len(), 3);
    let StatementKind::Macro(m) = &file.statements[0].kind else {
        panic!("expected macro");
    };
    assert_eq!(m.name.name, "SUM");
    let Some(Expression::Binary { right, .. }) = &m.value else {
        panic!("expected a binary value, got {:?}", m.value);
    };
    assert!(matches!(right.as_ref(), Expression::Binary { .. }));
    let StatementKind::Macro(m) = &file.statements[1].kind else {
        panic!("expected macro");
    };
    assert_eq!(m.name.name, "NEXT");
}

#[test]
fn test_jsdoc_attaches_to_next_statement() {
    let file = parse_ok("/// @param {Real} a\n/// @returns {Real}\nfunction f(a) { return a; }\n/// @globalvar SCORE");
    assert_eq!(file.statements.len(), 2);
    assert_eq!(file.statements[0].docs.len(), 2);
    assert!(matches!(file.statements[1].kind, StatementKind::Empty));
    assert_eq!(file.statements[1].docs.len(), 1);
}

#[test]
fn test_new_and_special_heads() {
    let file = parse_ok("var p = new Point(1, 2); self.x = other.y; global.z = all;");
    let StatementKind::LocalVar(decls) = &file.statements[0].kind else {
        panic!("expected var");
    };
    let Some(Expression::Accessor(acc)) = &decls[0].value else {
        panic!("expected accessor");
    };
    assert!(acc.new_kw.is_some());
    let StatementKind::Expression(Expression::Assignment { target, .. }) = &file.statements[2].kind else {
        panic!("expected assignment");
    };
    let Expression::Accessor(acc) = target.as_ref() else {
        panic!("expected accessor");
    };
    assert_eq!(acc.head_kind, AccessorHead::Global);
}

#[test]
fn test_reparse_is_identical() {
    let src = "function a(x) { var y = x.z; return y; }\nb = a(1);";
    assert_eq!(parse(src).file, parse(src).file);
}
