use super::kind::KEYWORDS;
use super::{LexError, Position, Span, Token, TokenKind};

/// Result of tokenizing one file: every token (trivia included) plus lexical issues.
#[derive(Debug, Clone, Default)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
}

impl LexOutput {
    /// Tokens the parser consumes: trivia removed, jsdoc kept.
    pub fn significant(&self) -> Vec<Token> {
        self.tokens.iter().filter(|t| !t.kind.is_trivia()).cloned().collect()
    }

    /// Lines ending in a `\` continuation, ascending.
    pub fn continued_lines(&self) -> Vec<u32> {
        self.tokens
            .iter()
            .filter(|t| t.kind == TokenKind::LineContinuation)
            .map(|t| t.span.start.line)
            .collect()
    }
}

/// Convenience wrapper around [`Lexer`].
pub fn tokenize(input: &str) -> LexOutput {
    Lexer::new(input).run()
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    /// Regular code. `braces` counts `{` opened inside a template interpolation.
    Code { braces: u32 },
    /// Inside `$"..."`, remembering where the template began.
    Template { start: Position },
}

// Longest operators first so a prefix never shadows a longer match.
const OPERATORS: &[(&str, TokenKind)] = &[
    ("??=", TokenKind::NullishAssign),
    ("??", TokenKind::NullishCoalesce),
    ("==", TokenKind::Eq),
    ("!=", TokenKind::Ne),
    ("<>", TokenKind::Ne),
    ("++", TokenKind::Increment),
    ("--", TokenKind::Decrement),
    ("<=", TokenKind::Le),
    (">=", TokenKind::Ge),
    ("<<", TokenKind::Shl),
    (">>", TokenKind::Shr),
    ("&&", TokenKind::And),
    ("||", TokenKind::Or),
    ("^^", TokenKind::Xor),
    ("+=", TokenKind::AddAssign),
    ("-=", TokenKind::SubAssign),
    ("*=", TokenKind::MulAssign),
    ("/=", TokenKind::DivAssign),
    ("%=", TokenKind::ModAssign),
    ("&=", TokenKind::BitAndAssign),
    ("|=", TokenKind::BitOrAssign),
    ("^=", TokenKind::BitXorAssign),
    (":=", TokenKind::Assign),
    ("[@", TokenKind::ArrayMutationAccessor),
    ("[$", TokenKind::StructAccessor),
    ("[?", TokenKind::MapAccessor),
    ("[|", TokenKind::ListAccessor),
    ("[#", TokenKind::GridAccessor),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("[", TokenKind::LBracket),
    ("]", TokenKind::RBracket),
    (",", TokenKind::Comma),
    (";", TokenKind::Semicolon),
    (":", TokenKind::Colon),
    (".", TokenKind::Dot),
    ("?", TokenKind::Question),
    ("=", TokenKind::Assign),
    ("+", TokenKind::Add),
    ("-", TokenKind::Sub),
    ("*", TokenKind::Mul),
    ("/", TokenKind::Div),
    ("%", TokenKind::Mod),
    ("!", TokenKind::Not),
    ("<", TokenKind::Lt),
    (">", TokenKind::Gt),
    ("&", TokenKind::BitAnd),
    ("|", TokenKind::BitOr),
    ("^", TokenKind::BitXor),
    ("~", TokenKind::BitNot),
];

/// Mode-aware GML tokenizer.
///
/// Code, template strings and template interpolations are tracked on an explicit
/// mode stack: `$"` pushes template mode, `{` inside a template pushes code mode
/// again and the matching `}` pops it. Unterminated strings and comments produce a
/// token running to end of input plus a [`LexError`]; lexing never aborts.
pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    cur: Position,
    modes: Vec<Mode>,
    tokens: Vec<Token>,
    errors: Vec<LexError>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            cur: Position::start(),
            modes: vec![Mode::Code { braces: 0 }],
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn run(mut self) -> LexOutput {
        while self.pos < self.bytes.len() {
            match self.modes.last().copied() {
                Some(Mode::Template { .. }) => self.lex_template(),
                _ => self.lex_code(),
            }
        }
        if let Some(Mode::Template { start }) = self.modes.last().copied() {
            self.error("Unterminated template string", Span::new(start, self.cur));
        } else if self.modes.len() > 1 {
            self.error("Unterminated template interpolation", Span::single(self.cur));
        }
        LexOutput {
            tokens: self.tokens,
            errors: self.errors,
        }
    }

    fn peek(&self, ahead: usize) -> u8 {
        self.bytes.get(self.pos + ahead).copied().unwrap_or(0)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Emit the token spanning `start..self.pos` and move the cursor past it.
    fn finish(&mut self, kind: TokenKind, start: Position) -> Span {
        let text = &self.input[start.offset..self.pos];
        let end = start.advanced_by(text);
        let span = Span::new(start, end);
        self.tokens.push(Token::new(kind, text, span));
        self.cur = end;
        span
    }

    fn error(&mut self, message: &str, span: Span) {
        self.errors.push(LexError {
            message: message.to_string(),
            span,
        });
    }

    fn skip_to_line_end(&mut self) {
        while !self.at_end() && self.peek(0) != b'\n' && self.peek(0) != b'\r' {
            self.pos += 1;
        }
    }

    fn lex_template(&mut self) {
        let start = self.cur;
        match self.peek(0) {
            b'"' => {
                self.pos += 1;
                self.finish(TokenKind::TemplateEnd, start);
                self.modes.pop();
            }
            b'{' => {
                self.pos += 1;
                self.finish(TokenKind::TemplateInterpStart, start);
                self.modes.push(Mode::Code { braces: 0 });
            }
            _ => {
                while !self.at_end() {
                    match self.peek(0) {
                        b'"' | b'{' => break,
                        b'\\' => self.pos = (self.pos + 2).min(self.bytes.len()),
                        _ => self.pos += 1,
                    }
                }
                self.snap_to_char_boundary();
                self.finish(TokenKind::TemplateText, start);
            }
        }
    }

    fn snap_to_char_boundary(&mut self) {
        while self.pos < self.bytes.len() && !self.input.is_char_boundary(self.pos) {
            self.pos += 1;
        }
    }

    fn lex_code(&mut self) {
        let start = self.cur;
        let c = self.peek(0);
        match c {
            b'\\' => {
                self.pos += 1;
                while matches!(self.peek(0), b' ' | b'\t' | b'\r') {
                    self.pos += 1;
                }
                if self.peek(0) == b'\n' {
                    self.pos += 1;
                    self.finish(TokenKind::LineContinuation, start);
                } else {
                    self.finish(TokenKind::Whitespace, start);
                }
            }
            b' ' | b'\t' | b'\r' | b'\n' | 0x0b | 0x0c => {
                while matches!(self.peek(0), b' ' | b'\t' | b'\r' | b'\n' | 0x0b | 0x0c) {
                    self.pos += 1;
                }
                self.finish(TokenKind::Whitespace, start);
            }
            b'/' if self.peek(1) == b'/' => {
                let kind = if self.peek(2) == b'/' && self.peek(3) != b'/' {
                    TokenKind::JsdocLine
                } else {
                    TokenKind::LineComment
                };
                self.skip_to_line_end();
                self.finish(kind, start);
            }
            b'/' if self.peek(1) == b'*' => self.lex_block_comment(start),
            b'"' => {
                self.pos += 1;
                self.lex_quoted(start, b'"', true, TokenKind::StringLiteral);
            }
            b'@' if self.peek(1) == b'"' || self.peek(1) == b'\'' => {
                let quote = self.peek(1);
                self.pos += 2;
                let kind = if quote == b'"' {
                    TokenKind::MultilineDouble
                } else {
                    TokenKind::MultilineSingle
                };
                self.lex_quoted(start, quote, false, kind);
            }
            b'$' if self.peek(1) == b'"' => {
                self.pos += 2;
                self.finish(TokenKind::TemplateStart, start);
                self.modes.push(Mode::Template { start });
            }
            b'$' if self.peek(1).is_ascii_hexdigit() => {
                self.pos += 1;
                self.eat_while(|b| b.is_ascii_hexdigit() || b == b'_');
                self.finish(TokenKind::Hex, start);
            }
            b'#' => self.lex_hash(start),
            b'0' if matches!(self.peek(1), b'x' | b'X') && self.peek(2).is_ascii_hexdigit() => {
                self.pos += 2;
                self.eat_while(|b| b.is_ascii_hexdigit() || b == b'_');
                self.finish(TokenKind::Hex, start);
            }
            b'0' if matches!(self.peek(1), b'b' | b'B') && matches!(self.peek(2), b'0' | b'1') => {
                self.pos += 2;
                self.eat_while(|b| b == b'0' || b == b'1' || b == b'_');
                self.finish(TokenKind::Binary, start);
            }
            b'0'..=b'9' => {
                self.eat_while(|b| b.is_ascii_digit() || b == b'_');
                if self.peek(0) == b'.' && self.peek(1).is_ascii_digit() {
                    self.pos += 1;
                    self.eat_while(|b| b.is_ascii_digit() || b == b'_');
                }
                self.finish(TokenKind::Real, start);
            }
            b'.' if self.peek(1).is_ascii_digit() => {
                self.pos += 1;
                self.eat_while(|b| b.is_ascii_digit() || b == b'_');
                self.finish(TokenKind::Real, start);
            }
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.eat_while(|b| b.is_ascii_alphanumeric() || b == b'_');
                let word = &self.input[start.offset..self.pos];
                let kind = KEYWORDS
                    .iter()
                    .find(|(w, _)| *w == word)
                    .map(|(_, k)| *k)
                    .unwrap_or(TokenKind::Identifier);
                self.finish(kind, start);
            }
            b'{' => {
                if let Some(Mode::Code { braces }) = self.modes.last_mut() {
                    *braces += 1;
                }
                self.pos += 1;
                self.finish(TokenKind::Begin, start);
            }
            b'}' => {
                self.pos += 1;
                let in_interpolation = self.modes.len() > 1;
                match self.modes.last_mut() {
                    Some(Mode::Code { braces }) if in_interpolation && *braces == 0 => {
                        self.modes.pop();
                        self.finish(TokenKind::TemplateInterpEnd, start);
                    }
                    Some(Mode::Code { braces }) => {
                        *braces = braces.saturating_sub(1);
                        self.finish(TokenKind::End, start);
                    }
                    _ => {
                        self.finish(TokenKind::End, start);
                    }
                }
            }
            _ => {
                let rest = &self.input[self.pos..];
                if let Some((op, kind)) = OPERATORS.iter().find(|(op, _)| rest.starts_with(op)) {
                    self.pos += op.len();
                    self.finish(*kind, start);
                } else {
                    let width = rest.chars().next().map(char::len_utf8).unwrap_or(1);
                    self.pos += width;
                    let span = self.finish(TokenKind::Unknown, start);
                    self.error("Unexpected character", span);
                }
            }
        }
    }

    fn eat_while(&mut self, pred: impl Fn(u8) -> bool) {
        while !self.at_end() && pred(self.peek(0)) {
            self.pos += 1;
        }
    }

    fn lex_block_comment(&mut self, start: Position) {
        // `/**/` is an empty plain comment, `/** ...` a doc block.
        let kind = if self.peek(2) == b'*' && self.peek(3) != b'/' {
            TokenKind::JsdocBlock
        } else {
            TokenKind::BlockComment
        };
        self.pos += 2;
        match self.input[self.pos..].find("*/") {
            Some(rel) => {
                self.pos += rel + 2;
                self.finish(kind, start);
            }
            None => {
                self.pos = self.bytes.len();
                let span = self.finish(kind, start);
                self.error("Unterminated block comment", span);
            }
        }
    }

    fn lex_quoted(&mut self, start: Position, quote: u8, escapes: bool, kind: TokenKind) {
        loop {
            if self.at_end() {
                self.snap_to_char_boundary();
                let span = self.finish(kind, start);
                self.error("Unterminated string", span);
                return;
            }
            let b = self.peek(0);
            if escapes && b == b'\\' {
                self.pos = (self.pos + 2).min(self.bytes.len());
                continue;
            }
            self.pos += 1;
            if b == quote {
                break;
            }
        }
        self.snap_to_char_boundary();
        self.finish(kind, start);
    }

    fn lex_hash(&mut self, start: Position) {
        let rest = &self.input[self.pos + 1..];
        let word_len = rest
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();
        let word = &rest[..word_len];
        match word {
            "macro" => {
                self.pos += 1 + word_len;
                self.finish(TokenKind::Macro, start);
            }
            "region" | "endregion" => {
                self.skip_to_line_end();
                self.finish(TokenKind::Region, start);
            }
            _ if word_len == 6 && word.bytes().all(|b| b.is_ascii_hexdigit()) => {
                self.pos += 7;
                self.finish(TokenKind::Hex, start);
            }
            _ => {
                self.pos += 1;
                let span = self.finish(TokenKind::Unknown, start);
                self.error("Unexpected character", span);
            }
        }
    }
}
