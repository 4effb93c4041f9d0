//! Feather type strings: `Real`, `Array<String>`, `Struct.Point|Undefined`.

use super::{PrimitiveKind, TypeId, TypeRegistry};

/// Name that stands for the argument-bound generic of a native function.
pub const GENERIC_PLACEHOLDER: &str = "ArgumentIdentity";

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Named { name: String, of: Option<Box<Node>> },
    Union(Vec<Node>),
}

struct FeatherParser<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> FeatherParser<'a> {
    fn skip_ws(&mut self) {
        while self.pos < self.src.len() && self.src[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.src.get(self.pos).copied()
    }

    /// Consume a union separator: `|`, `,` or the word `or`.
    fn eat_or(&mut self) -> bool {
        match self.peek() {
            Some(b'|') | Some(b',') => {
                self.pos += 1;
                true
            }
            Some(b'o') | Some(b'O') => {
                let rest = &self.src[self.pos..];
                let word = rest.len() >= 2 && rest[..2].eq_ignore_ascii_case(b"or");
                let bounded = rest.get(2).is_none_or(|c| !c.is_ascii_alphanumeric() && *c != b'_');
                if word && bounded {
                    self.pos += 2;
                }
                word && bounded
            }
            _ => false,
        }
    }

    fn union(&mut self) -> Node {
        let mut variants = vec![self.single()];
        while self.eat_or() {
            variants.push(self.single());
        }
        if variants.len() == 1 {
            variants.remove(0)
        } else {
            Node::Union(variants)
        }
    }

    fn single(&mut self) -> Node {
        self.skip_ws();
        let start = self.pos;
        while self.pos < self.src.len()
            && (self.src[self.pos].is_ascii_alphanumeric() || matches!(self.src[self.pos], b'_' | b'.'))
        {
            self.pos += 1;
        }
        let name = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        let of = if matches!(self.peek(), Some(b'<') | Some(b'[')) {
            self.pos += 1;
            let inner = self.union();
            if matches!(self.peek(), Some(b'>') | Some(b']')) {
                self.pos += 1;
            }
            Some(Box::new(inner))
        } else {
            None
        };
        let name = if name.is_empty() { "Any".to_string() } else { name };
        Node::Named { name, of }
    }
}

impl TypeRegistry {
    /// Parse a feather type string into a type.
    pub fn parse_feather_type_string(&mut self, text: &str) -> TypeId {
        self.parse_feather_with_generic(text, None)
    }

    /// Like [`Self::parse_feather_type_string`], binding the generic placeholder to `generic`.
    pub fn parse_feather_with_generic(&mut self, text: &str, generic: Option<TypeId>) -> TypeId {
        let mut parser = FeatherParser {
            src: text.trim().as_bytes(),
            pos: 0,
        };
        let node = parser.union();
        self.build(&node, generic)
    }

    fn build(&mut self, node: &Node, generic: Option<TypeId>) -> TypeId {
        match node {
            Node::Union(variants) => {
                let built: Vec<TypeId> = variants.iter().map(|v| self.build(v, generic)).collect();
                self.union_of(&built)
            }
            Node::Named { name, of } => {
                let base = match generic {
                    Some(g) if name == GENERIC_PLACEHOLDER => g,
                    _ => self.from_identifier(name),
                };
                let Some(of) = of else {
                    return base;
                };
                let item = self.build(of, generic);
                if !self.kind(base).has_items() {
                    return base;
                }
                let derived = self.derive(base);
                self.ty_mut(derived).items = Some(item);
                derived
            }
        }
    }

    /// Deterministic rendering used for hovers and tests.
    pub fn to_feather_string(&self, id: TypeId) -> String {
        self.render(id, 0)
    }

    fn render(&self, id: TypeId, depth: usize) -> String {
        let ty = self.ty(id);
        if depth > 8 {
            return ty.kind.as_str().to_string();
        }
        match ty.kind {
            PrimitiveKind::Union => {
                let variants = self.variants(id);
                if variants.is_empty() {
                    return PrimitiveKind::Mixed.as_str().to_string();
                }
                variants
                    .iter()
                    .map(|v| self.render(*v, depth + 1))
                    .collect::<Vec<_>>()
                    .join(" | ")
            }
            kind if ty.is_generic => ty.name.clone().unwrap_or_else(|| kind.as_str().to_string()),
            kind => match (&ty.name, ty.items) {
                (Some(name), _) if kind.renders_name() => format!("{}.{}", kind.as_str(), name),
                (_, Some(item)) if kind.has_items() => {
                    format!("{}<{}>", kind.as_str(), self.render(item, depth + 1))
                }
                _ => kind.as_str().to_string(),
            },
        }
    }

    /// Signature-style rendering: `function name(a: Real, b?: String): Real` for
    /// functions, the feather string for everything else.
    pub fn code(&self, id: TypeId) -> String {
        let ty = self.ty(id);
        if ty.kind != PrimitiveKind::Function {
            return self.to_feather_string(id);
        }
        let params: Vec<String> = self
            .params(id)
            .iter()
            .map(|p| {
                let sig = self.sig(*p);
                let optional = if sig.is_optional() { "?" } else { "" };
                format!("{}{}: {}", sig.name, optional, self.to_feather_string(sig.ty))
            })
            .collect();
        let name = ty.name.as_deref().map(|n| format!(" {n}")).unwrap_or_default();
        let result = ty
            .constructs
            .or(ty.returns)
            .map(|r| self.to_feather_string(r))
            .unwrap_or_else(|| PrimitiveKind::Undefined.as_str().to_string());
        format!("function{}({}): {}", name, params.join(", "), result)
    }
}
