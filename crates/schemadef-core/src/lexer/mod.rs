//! DDL lexer.
//!
//! A hand-written scanner that turns schema text into a flat token stream.
//! Comments and whitespace are dropped; every token keeps the byte span it
//! was read from so the parser can slice the original statement text.

mod span;
mod token;
mod tokenizer;

pub use span::Span;
pub use token::{Keyword, Token, TokenKind};
pub use tokenizer::Lexer;
