mod error;
mod kind;
mod lexer;

pub use error::{LexError, ParseError, Position, Span, offset_to_position};
pub use kind::{Token, TokenKind};
pub use lexer::{LexOutput, Lexer, tokenize};

#[cfg(test)]
mod token_test;
