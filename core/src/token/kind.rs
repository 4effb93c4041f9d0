use serde::Serialize;

use super::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // Trivia, kept in the stream so images round-trip but skipped by the parser
    Whitespace,       // spaces, tabs, newlines, stray `\`
    LineContinuation, // `\` ending a line, which extends a macro value
    LineComment,  // // ...
    BlockComment, // /* ... */
    Region,       // #region / #endregion lines

    // Doc comments
    JsdocLine,  // /// ...
    JsdocBlock, // /** ... */

    Identifier,

    // Literals
    Real,           // 1, 1.5, .5, 1_000
    Hex,            // 0xFF, $FF, #FF00FF
    Binary,         // 0b1010
    True,           // true
    False,          // false
    Undefined,      // undefined
    NaN,            // NaN
    Infinity,       // infinity
    Pi,             // pi
    PointerNull,    // pointer_null
    PointerInvalid, // pointer_invalid
    StringLiteral,  // "..."
    MultilineDouble, // @"..."
    MultilineSingle, // @'...'

    // Template strings: $"text{expr}text"
    TemplateStart,       // $"
    TemplateText,        // literal run inside a template
    TemplateInterpStart, // {
    TemplateInterpEnd,   // }
    TemplateEnd,         // "

    // Keywords
    Begin,       // { or begin
    End,         // } or end
    If,          // if
    Then,        // then
    Else,        // else
    While,       // while
    Do,          // do
    Until,       // until
    For,         // for
    Repeat,      // repeat
    With,        // with
    Switch,      // switch
    Case,        // case
    Default,     // default
    Break,       // break
    Continue,    // continue
    Exit,        // exit
    Return,      // return
    Var,         // var
    Global,      // global
    GlobalVar,   // globalvar
    Enum,        // enum
    Function,    // function
    Static,      // static
    Macro,       // #macro
    Try,         // try
    Catch,       // catch
    Finally,     // finally
    Throw,       // throw
    New,         // new
    Delete,      // delete
    Constructor, // constructor
    SelfKw,      // self
    Other,       // other
    Noone,       // noone
    All,         // all

    // Punctuation
    LParen,    // (
    RParen,    // )
    LBracket,  // [
    RBracket,  // ]
    ArrayMutationAccessor, // [@
    StructAccessor,        // [$
    MapAccessor,           // [?
    ListAccessor,          // [|
    GridAccessor,          // [#
    Comma,     // ,
    Semicolon, // ;
    Colon,     // :
    Dot,       // .
    Question,  // ?

    // Assignment
    Assign,          // = or :=
    NullishAssign,   // ??=
    AddAssign,       // +=
    SubAssign,       // -=
    MulAssign,       // *=
    DivAssign,       // /=
    ModAssign,       // %=
    BitAndAssign,    // &=
    BitOrAssign,     // |=
    BitXorAssign,    // ^=

    // Operators
    NullishCoalesce, // ??
    Eq,        // ==
    Ne,        // != or <>
    Increment, // ++
    Decrement, // --
    Le,        // <=
    Ge,        // >=
    Shl,       // <<
    Shr,       // >>
    And,       // && or and
    Or,        // || or or
    Xor,       // ^^ or xor
    Add,       // +
    Sub,       // -
    Mul,       // *
    Div,       // /
    Mod,       // % or mod
    IntDiv,    // div
    Not,       // ! or not
    Lt,        // <
    Gt,        // >
    BitAnd,    // &
    BitOr,     // |
    BitXor,    // ^
    BitNot,    // ~

    Unknown,
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace
                | TokenKind::LineContinuation
                | TokenKind::LineComment
                | TokenKind::BlockComment
                | TokenKind::Region
        )
    }

    pub fn is_jsdoc(self) -> bool {
        matches!(self, TokenKind::JsdocLine | TokenKind::JsdocBlock)
    }

    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            TokenKind::Assign
                | TokenKind::NullishAssign
                | TokenKind::AddAssign
                | TokenKind::SubAssign
                | TokenKind::MulAssign
                | TokenKind::DivAssign
                | TokenKind::ModAssign
                | TokenKind::BitAndAssign
                | TokenKind::BitOrAssign
                | TokenKind::BitXorAssign
        )
    }

    pub fn is_string_start(self) -> bool {
        matches!(
            self,
            TokenKind::StringLiteral | TokenKind::MultilineDouble | TokenKind::MultilineSingle | TokenKind::TemplateStart
        )
    }

    /// Accessor openers: `[`, `[@`, `[$`, `[?`, `[|`, `[#`.
    pub fn is_index_open(self) -> bool {
        matches!(
            self,
            TokenKind::LBracket
                | TokenKind::ArrayMutationAccessor
                | TokenKind::StructAccessor
                | TokenKind::MapAccessor
                | TokenKind::ListAccessor
                | TokenKind::GridAccessor
        )
    }

    /// Word-like tokens that may still appear where a member name is expected (`a.begin`).
    pub fn is_keyword(self) -> bool {
        keyword_kind_name(self).is_some()
    }
}

fn keyword_kind_name(kind: TokenKind) -> Option<&'static str> {
    KEYWORDS.iter().find(|(_, k)| *k == kind).map(|(w, _)| *w)
}

/// Reserved words, matched case-sensitively.
pub(crate) const KEYWORDS: &[(&str, TokenKind)] = &[
    ("begin", TokenKind::Begin),
    ("end", TokenKind::End),
    ("if", TokenKind::If),
    ("then", TokenKind::Then),
    ("else", TokenKind::Else),
    ("while", TokenKind::While),
    ("do", TokenKind::Do),
    ("until", TokenKind::Until),
    ("for", TokenKind::For),
    ("repeat", TokenKind::Repeat),
    ("with", TokenKind::With),
    ("switch", TokenKind::Switch),
    ("case", TokenKind::Case),
    ("default", TokenKind::Default),
    ("break", TokenKind::Break),
    ("continue", TokenKind::Continue),
    ("exit", TokenKind::Exit),
    ("return", TokenKind::Return),
    ("var", TokenKind::Var),
    ("global", TokenKind::Global),
    ("globalvar", TokenKind::GlobalVar),
    ("enum", TokenKind::Enum),
    ("function", TokenKind::Function),
    ("static", TokenKind::Static),
    ("try", TokenKind::Try),
    ("catch", TokenKind::Catch),
    ("finally", TokenKind::Finally),
    ("throw", TokenKind::Throw),
    ("new", TokenKind::New),
    ("delete", TokenKind::Delete),
    ("constructor", TokenKind::Constructor),
    ("self", TokenKind::SelfKw),
    ("other", TokenKind::Other),
    ("noone", TokenKind::Noone),
    ("all", TokenKind::All),
    ("and", TokenKind::And),
    ("or", TokenKind::Or),
    ("xor", TokenKind::Xor),
    ("not", TokenKind::Not),
    ("mod", TokenKind::Mod),
    ("div", TokenKind::IntDiv),
    ("true", TokenKind::True),
    ("false", TokenKind::False),
    ("undefined", TokenKind::Undefined),
    ("NaN", TokenKind::NaN),
    ("infinity", TokenKind::Infinity),
    ("pi", TokenKind::Pi),
    ("pointer_null", TokenKind::PointerNull),
    ("pointer_invalid", TokenKind::PointerInvalid),
];

/// A lexical unit together with its exact source image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}
