use crate::token::{Span, Token, TokenKind};

/// A parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub statements: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

impl Identifier {
    pub fn from_token(token: &Token) -> Self {
        Self {
            name: token.text.clone(),
            span: token.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Consecutive `///` lines or `/** */` blocks directly preceding the statement.
    /// Docs with nothing after them are kept on an `Empty` statement.
    pub docs: Vec<Token>,
    pub kind: StatementKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    Function(Box<FunctionExpression>),
    LocalVar(Vec<VarDeclaration>),
    StaticVar(Vec<VarDeclaration>),
    GlobalVar(Vec<Identifier>),
    If {
        condition: Expression,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },
    Try {
        body: Block,
        catch: Option<CatchClause>,
        finally: Option<Block>,
    },
    While {
        condition: Expression,
        body: Box<Statement>,
    },
    For {
        init: Option<Box<Statement>>,
        condition: Option<Expression>,
        update: Option<Box<Statement>>,
        body: Box<Statement>,
    },
    DoUntil {
        body: Box<Statement>,
        condition: Expression,
    },
    Repeat {
        count: Expression,
        body: Box<Statement>,
    },
    Switch {
        discriminant: Expression,
        cases: Vec<SwitchCase>,
        span: Span,
    },
    With {
        target: Expression,
        body: Box<Statement>,
    },
    Enum(EnumDeclaration),
    Macro(MacroDeclaration),
    Return(Option<Expression>),
    Throw(Expression),
    Delete(Expression),
    Break,
    Continue,
    Exit,
    Block(Block),
    Expression(Expression),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclaration {
    pub name: Identifier,
    pub value: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub binding: Option<Identifier>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// `None` for `default:`.
    pub test: Option<Expression>,
    pub body: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDeclaration {
    pub name: Identifier,
    pub members: Vec<EnumMember>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub name: Identifier,
    pub value: Option<Expression>,
}

/// `#macro [CONFIG:]NAME value`; the value runs to the end of the line.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroDeclaration {
    pub config: Option<Identifier>,
    pub name: Identifier,
    pub value: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionExpression {
    pub keyword: Span,
    pub name: Option<Identifier>,
    pub params: Vec<Parameter>,
    /// From `(` to `)`.
    pub params_span: Span,
    pub parent: Option<ConstructorParent>,
    pub is_constructor: bool,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: Identifier,
    pub default: Option<Expression>,
}

/// `: Parent(args)` clause of a constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorParent {
    pub name: Identifier,
    pub args: FunctionArguments,
}

/// Call arguments. `delimiters` holds the spans of `(`, every `,` and `)` in order,
/// so argument `i` sits between `delimiters[i]` and `delimiters[i + 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionArguments {
    pub args: Vec<Option<Expression>>,
    pub delimiters: Vec<Span>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Array,
    ArrayMutation,
    Struct,
    Map,
    List,
    Grid,
}

impl IndexKind {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        Some(match kind {
            TokenKind::LBracket => IndexKind::Array,
            TokenKind::ArrayMutationAccessor => IndexKind::ArrayMutation,
            TokenKind::StructAccessor => IndexKind::Struct,
            TokenKind::MapAccessor => IndexKind::Map,
            TokenKind::ListAccessor => IndexKind::List,
            TokenKind::GridAccessor => IndexKind::Grid,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AccessorSuffix {
    /// `.name`; `name` is `None` while the user is still typing.
    Dot { dot: Span, name: Option<Identifier> },
    Index { kind: IndexKind, args: Vec<Expression>, span: Span },
    Call(FunctionArguments),
}

impl AccessorSuffix {
    pub fn span(&self) -> Span {
        match self {
            AccessorSuffix::Dot { dot, name } => match name {
                Some(n) => dot.to(n.span),
                None => *dot,
            },
            AccessorSuffix::Index { span, .. } => *span,
            AccessorSuffix::Call(args) => args.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorHead {
    Identifier,
    Global,
    SelfKw,
    Other,
    All,
    Noone,
}

/// An identifier followed by a flat, ordered list of suffixes: `a.b[0](c).d`.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierAccessor {
    pub new_kw: Option<Span>,
    pub head_kind: AccessorHead,
    pub head: Identifier,
    pub suffixes: Vec<AccessorSuffix>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Real,
    Bool,
    Undefined,
    Pointer,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Text(Span),
    Interpolation(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructEntry {
    pub key: Identifier,
    pub docs: Vec<Token>,
    pub value: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal {
        kind: LiteralKind,
        token: Token,
    },
    Str(Token),
    Template {
        parts: Vec<TemplatePart>,
        span: Span,
    },
    Accessor(Box<IdentifierAccessor>),
    Paren {
        inner: Box<Expression>,
        span: Span,
    },
    Array {
        items: Vec<Expression>,
        span: Span,
    },
    Struct {
        entries: Vec<StructEntry>,
        span: Span,
    },
    Function(Box<FunctionExpression>),
    Unary {
        operator: Token,
        operand: Box<Expression>,
    },
    Postfix {
        operand: Box<Expression>,
        operator: Token,
    },
    Binary {
        left: Box<Expression>,
        operator: Token,
        right: Box<Expression>,
    },
    Ternary {
        condition: Box<Expression>,
        if_true: Box<Expression>,
        if_false: Box<Expression>,
    },
    Assignment {
        target: Box<Expression>,
        operator: Token,
        value: Box<Expression>,
    },
    /// Placeholder produced by error recovery.
    Missing(Span),
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::Literal { token, .. } | Expression::Str(token) => token.span,
            Expression::Template { span, .. }
            | Expression::Paren { span, .. }
            | Expression::Array { span, .. }
            | Expression::Struct { span, .. } => *span,
            Expression::Accessor(acc) => acc.span,
            Expression::Function(func) => func.span,
            Expression::Unary { operator, operand } => operator.span.to(operand.span()),
            Expression::Postfix { operand, operator } => operand.span().to(operator.span),
            Expression::Binary { left, right, .. } => left.span().to(right.span()),
            Expression::Ternary {
                condition, if_false, ..
            } => condition.span().to(if_false.span()),
            Expression::Assignment { target, value, .. } => target.span().to(value.span()),
            Expression::Missing(span) => *span,
        }
    }
}
