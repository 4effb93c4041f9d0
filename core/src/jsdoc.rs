//! Doc comments (`/// @param {Real} x`) attached to statements.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::token::{Span, Token};

static LINE_PREFIX: Lazy<Regex> = Lazy::new(|| pattern(r"^\s*(?:/\*\*|///|\*)?\s?"));
static TAG: Lazy<Regex> = Lazy::new(|| pattern(r"^@([A-Za-z]+)\b\s*(.*)$"));
static TYPE_GROUP: Lazy<Regex> = Lazy::new(|| pattern(r"^\{\s*([^}]*?)\s*\}\s*(.*)$"));
static PARAM_NAME: Lazy<Regex> = Lazy::new(|| {
    pattern(r"^(\[)?\s*([A-Za-z_][A-Za-z0-9_]*|\.\.\.)\s*(=\s*[^\]\s]*(?:\s*[^\]\s]+)*\s*)?(\])?\s*(.*)$")
});
static SELF_TYPE: Lazy<Regex> = Lazy::new(|| pattern(r"^([A-Za-z_][A-Za-z0-9_.]*)\s*(.*)$"));

/// Compile one of the constant patterns above; each is checked by a unit test.
fn pattern(src: &str) -> Regex {
    Regex::new(src).unwrap_or_else(|e| panic!("invalid jsdoc pattern `{src}`: {e}"))
}

fn captures<'t>(re: &Lazy<Regex>, text: &'t str) -> Option<Captures<'t>> {
    re.captures(text)
}

fn group(caps: &Captures<'_>, idx: usize) -> Option<String> {
    caps.get(idx)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsdocParam {
    pub name: String,
    pub ty: Option<String>,
    pub optional: bool,
    pub description: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsdocGlobal {
    pub name: String,
    pub ty: Option<String>,
    pub span: Span,
}

/// A malformed tag.
#[derive(Debug, Clone, PartialEq)]
pub struct JsdocProblem {
    pub message: String,
    pub span: Span,
}

/// Everything the tags of one doc comment say.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Jsdoc {
    pub description: Option<String>,
    pub params: Vec<JsdocParam>,
    pub returns: Option<String>,
    pub returns_description: Option<String>,
    pub self_type: Option<String>,
    pub ty: Option<String>,
    pub deprecated: bool,
    pub is_function: bool,
    pub ignore: bool,
    pub pure: bool,
    pub mixin: bool,
    pub globals: Vec<JsdocGlobal>,
    pub problems: Vec<JsdocProblem>,
}

/// Where continuation lines go.
enum Continues {
    Description,
    Param(usize),
    Returns,
    Nothing,
}

impl Jsdoc {
    pub fn is_empty(&self) -> bool {
        *self == Jsdoc::default()
    }

    /// True when the tags describe a function signature.
    pub fn describes_function(&self) -> bool {
        self.is_function || !self.params.is_empty() || self.returns.is_some()
    }

    pub fn param(&self, name: &str) -> Option<&JsdocParam> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// Split a doc token into `(line text without comment markers, span of that text)`.
fn doc_lines(token: &Token) -> Vec<(String, Span)> {
    let mut out = Vec::new();
    let mut pos = token.span.start;
    let text = token.text.strip_suffix("*/").unwrap_or(&token.text);
    for raw in text.split_inclusive('\n') {
        let line_start = pos;
        pos = pos.advanced_by(raw);
        let line = raw.trim_end_matches(['\n', '\r']);
        let prefix_len = captures(&LINE_PREFIX, line)
            .and_then(|c| c.get(0))
            .map(|m| m.end())
            .unwrap_or(0);
        let content = &line[prefix_len..];
        let start = line_start.advanced_by(&line[..prefix_len]);
        let end = start.advanced_by(content);
        out.push((content.trim_end().to_string(), Span::new(start, end)));
    }
    out
}

fn append(target: &mut Option<String>, text: &str) {
    if text.is_empty() {
        return;
    }
    match target {
        Some(existing) => {
            existing.push('\n');
            existing.push_str(text);
        }
        None => *target = Some(text.to_string()),
    }
}

/// Parse the doc comment tokens preceding a statement.
pub fn parse_jsdoc(tokens: &[Token]) -> Jsdoc {
    let mut doc = Jsdoc::default();
    let mut continues = Continues::Description;

    for token in tokens {
        for (line, span) in doc_lines(token) {
            let Some(tag) = captures(&TAG, &line) else {
                let text = line.trim();
                match continues {
                    Continues::Description => append(&mut doc.description, text),
                    Continues::Param(i) => append(&mut doc.params[i].description, text),
                    Continues::Returns => append(&mut doc.returns_description, text),
                    Continues::Nothing => {}
                }
                continue;
            };
            let name = tag.get(1).map(|m| m.as_str().to_ascii_lowercase()).unwrap_or_default();
            let rest = tag.get(2).map(|m| m.as_str()).unwrap_or("");
            continues = Continues::Nothing;

            match name.as_str() {
                "param" | "parameter" | "arg" | "argument" => {
                    let (ty, after_type) = split_type(rest);
                    match captures(&PARAM_NAME, after_type) {
                        Some(caps) => {
                            let param_name = group(&caps, 2).unwrap_or_default();
                            let bracketed = caps.get(1).is_some();
                            let defaulted = caps.get(3).is_some();
                            doc.params.push(JsdocParam {
                                optional: bracketed || defaulted || param_name == "...",
                                name: param_name,
                                ty,
                                description: group(&caps, 5),
                                span,
                            });
                            continues = Continues::Param(doc.params.len() - 1);
                        }
                        None => doc.problems.push(JsdocProblem {
                            message: "Missing parameter name".to_string(),
                            span,
                        }),
                    }
                }
                "returns" | "return" => {
                    let (ty, after) = split_type(rest);
                    if ty.is_none() {
                        doc.problems.push(JsdocProblem {
                            message: "Expected a `{Type}` after @returns".to_string(),
                            span,
                        });
                    }
                    doc.returns = Some(ty.unwrap_or_else(|| "Any".to_string()));
                    append(&mut doc.returns_description, after.trim());
                    continues = Continues::Returns;
                }
                "self" | "context" => match captures(&SELF_TYPE, rest.trim()) {
                    Some(caps) => doc.self_type = group(&caps, 1),
                    None => doc.problems.push(JsdocProblem {
                        message: "Expected a type after @self".to_string(),
                        span,
                    }),
                },
                "type" => {
                    let (ty, after) = split_type(rest);
                    match ty {
                        Some(ty) => doc.ty = Some(ty),
                        None => doc.problems.push(JsdocProblem {
                            message: "Expected a `{Type}` after @type".to_string(),
                            span,
                        }),
                    }
                    append(&mut doc.description, after.trim());
                    continues = Continues::Description;
                }
                "description" | "desc" => {
                    append(&mut doc.description, rest.trim());
                    continues = Continues::Description;
                }
                "deprecated" => doc.deprecated = true,
                "function" | "func" => doc.is_function = true,
                "ignore" => doc.ignore = true,
                "pure" => doc.pure = true,
                "mixin" => doc.mixin = true,
                "globalvar" => {
                    let (ty, after) = split_type(rest);
                    match captures(&SELF_TYPE, after.trim()).and_then(|c| group(&c, 1)) {
                        Some(global) => doc.globals.push(JsdocGlobal { name: global, ty, span }),
                        None => doc.problems.push(JsdocProblem {
                            message: "Missing name after @globalvar".to_string(),
                            span,
                        }),
                    }
                }
                _ => {}
            }
        }
    }

    doc
}

/// Split a leading `{Type}` group off `text`.
fn split_type(text: &str) -> (Option<String>, &str) {
    let text = text.trim_start();
    match captures(&TYPE_GROUP, text) {
        Some(caps) => {
            let after = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            (group(&caps, 1), after)
        }
        None => (None, text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tokenize;

    #[test]
    fn test_patterns_compile() {
        for re in [&LINE_PREFIX, &TAG, &TYPE_GROUP, &PARAM_NAME, &SELF_TYPE] {
            Lazy::force(re);
        }
        assert!(TAG.is_match("@param {Real} x"));
        assert!(PARAM_NAME.is_match("[count=1] how many"));
    }

    fn docs(src: &str) -> Jsdoc {
        let tokens: Vec<Token> = tokenize(src)
            .tokens
            .into_iter()
            .filter(|t| t.kind.is_jsdoc())
            .collect();
        parse_jsdoc(&tokens)
    }

    #[test]
    fn test_function_docs() {
        let doc = docs(
            "/// @desc This is a multiline\n///       description.\n/// @param {String} first The first\n/// @param {Real} second The second,\n///        continued.\n/// @param {Struct} [third] Optional\n/// @param {Struct} [fourth = \"bleh\" ] Defaulted\n/// @param {Bool} [...] Rest\n/// @returns {Struct} Result\n/// @self Struct.Other\n/// @deprecated\n",
        );
        assert_eq!(doc.description.as_deref(), Some("This is a multiline\ndescription."));
        assert_eq!(doc.params.len(), 5);
        assert_eq!(doc.params[0].name, "first");
        assert_eq!(doc.params[0].ty.as_deref(), Some("String"));
        assert!(!doc.params[0].optional);
        assert_eq!(doc.params[1].description.as_deref(), Some("The second,\ncontinued."));
        assert_eq!(doc.params[2].name, "third");
        assert!(doc.params[2].optional);
        assert_eq!(doc.params[3].name, "fourth");
        assert!(doc.params[3].optional);
        assert_eq!(doc.params[3].description.as_deref(), Some("Defaulted"));
        assert_eq!(doc.params[4].name, "...");
        assert!(doc.params[4].optional);
        assert_eq!(doc.returns.as_deref(), Some("Struct"));
        assert_eq!(doc.self_type.as_deref(), Some("Struct.Other"));
        assert!(doc.deprecated);
        assert!(doc.problems.is_empty());
        assert!(doc.describes_function());
    }

    #[test]
    fn test_block_docs() {
        let doc = docs("/**\n * @param {Real} a\n * @return {Real}\n */");
        assert_eq!(doc.params.len(), 1);
        assert_eq!(doc.params[0].name, "a");
        assert_eq!(doc.returns.as_deref(), Some("Real"));
    }

    #[test]
    fn test_type_and_globalvar() {
        let doc = docs("/// @type {Array<Real>}\n/// @globalvar {Real} SCORE\n");
        assert_eq!(doc.ty.as_deref(), Some("Array<Real>"));
        assert_eq!(doc.globals.len(), 1);
        assert_eq!(doc.globals[0].name, "SCORE");
        assert_eq!(doc.globals[0].ty.as_deref(), Some("Real"));
    }

    #[test]
    fn test_malformed_tags() {
        let doc = docs("/// @param {Real}\n/// @returns nothing\n/// @unknown whatever\n");
        assert_eq!(doc.problems.len(), 2);
        assert_eq!(doc.problems[0].message, "Missing parameter name");
        assert_eq!(doc.problems[0].span.start.line, 1);
        assert_eq!(doc.problems[1].span.start.line, 2);
    }

    #[test]
    fn test_plain_description() {
        let doc = docs("/// Moves the player.\n");
        assert_eq!(doc.description.as_deref(), Some("Moves the player."));
        assert!(!doc.describes_function());
    }
}
