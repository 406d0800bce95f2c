//! Lexer implementation using logos
//!
//! `tokenize` never aborts: lexical errors are recorded in the diagnostics
//! accumulator and scanning continues at the next token.

mod token;

pub use token::Token;

use crate::error::{Diagnostics, ErrorKind};
use logos::Logos;
use token::unescape_char;

/// Tokenize source code into `(token, line)` pairs, 1-based lines
pub fn tokenize(source: &str, diagnostics: &mut Diagnostics) -> Vec<(Token, usize)> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);
    let mut line = 1usize;
    let mut pos = 0usize;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        line += source[pos..span.start].bytes().filter(|b| *b == b'\n').count();
        pos = span.start;

        match result {
            Ok(Token::InvalidIdent(name)) => {
                diagnostics.error(
                    ErrorKind::Lexical,
                    line,
                    format!("Illegal identifier '{name}'"),
                );
            }
            Ok(token) => tokens.push((token, line)),
            Err(_) => {
                let slice = lexer.slice();
                if slice.len() >= 2 && slice.starts_with('\'') && slice.ends_with('\'') {
                    // char literal that matched but failed to decode
                    match unescape_char(&slice[1..slice.len() - 1]) {
                        Err(message) => diagnostics.error(ErrorKind::Lexical, line, message),
                        Ok(_) => illegal_character(diagnostics, line, slice),
                    }
                } else {
                    illegal_character(diagnostics, line, slice);
                }
            }
        }
    }

    tokens
}

fn illegal_character(diagnostics: &mut Diagnostics, line: usize, slice: &str) {
    let offending = slice.chars().next().unwrap_or('?');
    diagnostics.error(
        ErrorKind::Lexical,
        line,
        format!("Illegal character {offending}"),
    );
}
