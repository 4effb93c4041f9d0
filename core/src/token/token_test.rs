use crate::token::{TokenKind, tokenize};

fn kinds(src: &str) -> Vec<TokenKind> {
    tokenize(src).significant().iter().map(|t| t.kind).collect()
}

fn round_trip(src: &str) -> String {
    tokenize(src).tokens.iter().map(|t| t.text.as_str()).collect()
}

#[test]
fn basic() {
    let k = kinds(r#"1.3 + * / mod == "str1" true false undefined"#);
    assert_eq!(
        k,
        vec![
            TokenKind::Real,
            TokenKind::Add,
            TokenKind::Mul,
            TokenKind::Div,
            TokenKind::Mod,
            TokenKind::Eq,
            TokenKind::StringLiteral,
            TokenKind::True,
            TokenKind::False,
            TokenKind::Undefined,
        ]
    );
}

#[test]
fn test_compound_assignment_tokens() {
    let k = kinds("+= -= *= /= %= ??= &= |= ^= :=");
    assert_eq!(
        k,
        vec![
            TokenKind::AddAssign,
            TokenKind::SubAssign,
            TokenKind::MulAssign,
            TokenKind::DivAssign,
            TokenKind::ModAssign,
            TokenKind::NullishAssign,
            TokenKind::BitAndAssign,
            TokenKind::BitOrAssign,
            TokenKind::BitXorAssign,
            TokenKind::Assign,
        ]
    );
}

#[test]
fn test_accessor_tokens() {
    let k = kinds("a[@ 0] b[$ \"k\"] c[? k] d[| 0] e[# 0, 1]");
    assert!(k.contains(&TokenKind::ArrayMutationAccessor));
    assert!(k.contains(&TokenKind::StructAccessor));
    assert!(k.contains(&TokenKind::MapAccessor));
    assert!(k.contains(&TokenKind::ListAccessor));
    assert!(k.contains(&TokenKind::GridAccessor));
}

#[test]
fn test_numbers() {
    let k = kinds("0xFF $A0 #FF00AA 0b1010 1_000 .5 12.25");
    assert_eq!(
        k,
        vec![
            TokenKind::Hex,
            TokenKind::Hex,
            TokenKind::Hex,
            TokenKind::Binary,
            TokenKind::Real,
            TokenKind::Real,
            TokenKind::Real,
        ]
    );
}

#[test]
fn test_trivia_skipped_but_jsdoc_kept() {
    let src = "// plain\n/// @param {Real} a\n/* block */\n/** doc */\n#region Stuff\nvar a;\n#endregion\n";
    let k = kinds(src);
    assert_eq!(
        k,
        vec![
            TokenKind::JsdocLine,
            TokenKind::JsdocBlock,
            TokenKind::Var,
            TokenKind::Identifier,
            TokenKind::Semicolon,
        ]
    );
}

#[test]
fn test_macro_keyword() {
    let out = tokenize("#macro FOO 10");
    let sig = out.significant();
    assert_eq!(sig[0].kind, TokenKind::Macro);
    assert_eq!(sig[0].text, "#macro");
    assert_eq!(sig[1].kind, TokenKind::Identifier);
    assert!(out.errors.is_empty());
}

#[test]
fn test_template_mode_stack() {
    let k = kinds(r#"$"a{b + {x: 1}.x}c""#);
    assert_eq!(
        k,
        vec![
            TokenKind::TemplateStart,
            TokenKind::TemplateText,
            TokenKind::TemplateInterpStart,
            TokenKind::Identifier,
            TokenKind::Add,
            TokenKind::Begin,
            TokenKind::Identifier,
            TokenKind::Colon,
            TokenKind::Real,
            TokenKind::End,
            TokenKind::Dot,
            TokenKind::Identifier,
            TokenKind::TemplateInterpEnd,
            TokenKind::TemplateText,
            TokenKind::TemplateEnd,
        ]
    );
}

#[test]
fn test_multiline_strings() {
    let out = tokenize("a = @\"line1\nline2\"; b = @'it\"s';");
    let sig = out.significant();
    assert_eq!(sig[2].kind, TokenKind::MultilineDouble);
    assert_eq!(sig[2].text, "@\"line1\nline2\"");
    assert_eq!(sig[6].kind, TokenKind::MultilineSingle);
    assert!(out.errors.is_empty());
    // positions continue on the following line
    assert_eq!(sig[3].span.start.line, 2);
}

#[test]
fn test_string_escapes() {
    let out = tokenize(r#""a\"bé\x41""#);
    assert_eq!(out.tokens.len(), 1);
    assert_eq!(out.tokens[0].kind, TokenKind::StringLiteral);
    assert!(out.errors.is_empty());
}

#[test]
fn test_unterminated_comment_runs_to_eof() {
    let src = "var a = 1;\n/* never closed\nvar b = 2;";
    let out = tokenize(src);
    let last = out.tokens.last().unwrap();
    assert_eq!(last.kind, TokenKind::BlockComment);
    assert_eq!(last.span.end.offset, src.len());
    assert_eq!(out.errors.len(), 1);
    assert!(out.errors[0].message.contains("Unterminated"));
}

#[test]
fn test_unterminated_string_runs_to_eof() {
    let src = "x = \"oops;\ny = 2;";
    let out = tokenize(src);
    let last = out.tokens.last().unwrap();
    assert_eq!(last.kind, TokenKind::StringLiteral);
    assert_eq!(last.span.end.offset, src.len());
    assert_eq!(out.errors.len(), 1);
}

#[test]
fn test_unknown_character_is_reported() {
    let out = tokenize("a ` b");
    assert_eq!(out.errors.len(), 1);
    assert!(out.tokens.iter().any(|t| t.kind == TokenKind::Unknown));
}

#[test]
fn test_round_trip_reproduces_source() {
    let sources = [
        "function add(a, b) { return a + b; } add(1);",
        "/// @desc Hi\nvar s = $\"x{y}z\";\n/* c */ #region r\n\tfoo.bar[| 0] = 'q';\\\n",
        "#macro NAME \"é\" // trailing",
        "enum E { A, B = 2 }\nwith (obj) { x ??= 3; }\n/* unterminated",
    ];
    for src in sources {
        assert_eq!(round_trip(src), src);
    }
}

#[test]
fn test_positions_are_line_aware() {
    let out = tokenize("a\n  bb");
    let sig = out.significant();
    assert_eq!(sig[1].span.start.line, 2);
    assert_eq!(sig[1].span.start.column, 3);
    assert_eq!(sig[1].span.start.offset, 4);
    assert_eq!(sig[1].span.end.offset, 6);
}

#[test]
fn test_line_continuation() {
    let src = "#macro SUM 1 + \\\n  2\nx = a \\ b;\n";
    let lexed = tokenize(src);
    assert_eq!(lexed.continued_lines(), vec![1]);
    assert_eq!(round_trip(src), src);
    assert!(!kinds(src).contains(&TokenKind::LineContinuation));
    // A backslash not ending its line stays plain whitespace.
    assert_eq!(
        lexed.tokens.iter().filter(|t| t.kind == TokenKind::LineContinuation).count(),
        1
    );
}
