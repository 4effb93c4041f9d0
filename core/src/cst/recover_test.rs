use crate::cst::{AccessorSuffix, Expression, StatementKind, parse};

#[test]
fn recovers_after_bad_statement() {
    let src = "var a = ;\nvar b = 2;\nfunction f() { return 1; }";
    let result = parse(src);
    assert_eq!(result.syntax_errors.len(), 1, "errors: {:?}", result.syntax_errors);
    let names: Vec<_> = result
        .file
        .statements
        .iter()
        .filter_map(|s| match &s.kind {
            StatementKind::LocalVar(decls) => Some(decls[0].name.name.clone()),
            StatementKind::Function(f) => f.name.as_ref().map(|n| n.name.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(names, vec!["b".to_string(), "f".to_string()]);
}

#[test]
fn collects_multiple_errors() {
    let src = "x = ) ;\ny = ] ;\nz = 3;";
    let result = parse(src);
    assert!(result.syntax_errors.len() >= 2, "expected two errors, got {:?}", result.syntax_errors);
    assert!(
        result
            .file
            .statements
            .iter()
            .any(|s| matches!(&s.kind, StatementKind::Expression(Expression::Assignment { .. })))
    );
}

#[test]
fn error_inside_block_does_not_escape_block() {
    let src = "function f() {\n  var = 1;\n  var ok = 2;\n}\nfunction g() {}";
    let result = parse(src);
    assert_eq!(result.syntax_errors.len(), 1, "errors: {:?}", result.syntax_errors);
    assert_eq!(result.file.statements.len(), 2);
    let StatementKind::Function(f) = &result.file.statements[0].kind else {
        panic!("expected function");
    };
    assert_eq!(f.body.statements.len(), 1);
}

#[test]
fn dangling_dot_keeps_accessor_for_completion() {
    let src = "player.\n";
    let result = parse(src);
    assert_eq!(result.syntax_errors.len(), 1);
    let StatementKind::Expression(Expression::Accessor(acc)) = &result.file.statements[0].kind else {
        panic!("expected accessor statement, got {:?}", result.file.statements);
    };
    assert!(matches!(acc.suffixes[0], AccessorSuffix::Dot { name: None, .. }));
}

#[test]
fn unclosed_call_keeps_arguments() {
    let src = "show(a, ";
    let result = parse(src);
    assert!(!result.syntax_errors.is_empty());
    let StatementKind::Expression(Expression::Accessor(acc)) = &result.file.statements[0].kind else {
        panic!("expected accessor statement");
    };
    let AccessorSuffix::Call(args) = &acc.suffixes[0] else {
        panic!("expected call");
    };
    assert_eq!(args.args.len(), 2);
    assert!(args.args[1].is_none());
    assert_eq!(args.delimiters.len(), 3);
}

#[test]
fn unterminated_comment_still_parses_prefix() {
    let src = "var a = 1;\n/* oops\nvar b = 2;";
    let result = parse(src);
    assert_eq!(result.lex_errors.len(), 1);
    assert!(result.syntax_errors.is_empty());
    assert_eq!(result.file.statements.len(), 1);
}

#[test]
fn missing_closing_brace_at_eof() {
    let src = "function f() {\n var a = 1;";
    let result = parse(src);
    assert_eq!(result.syntax_errors.len(), 1);
    assert!(result.syntax_errors[0].message.contains("`}`"));
    assert_eq!(result.file.statements.len(), 1);
}
