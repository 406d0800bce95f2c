//! Parser implementation using lalrpop

use crate::ast::Program;
use crate::error::{Diagnostics, ErrorKind};
use crate::lexer::Token;


lalrpop_util::lalrpop_mod!(
    #[allow(clippy::all)]
    grammar,
    "/parser/grammar.rs"
);

/// Parse tokens into an AST.
///
/// Syntax errors become one diagnostic and an empty program comes back, so
/// downstream stages can be skipped based on the error count.
pub fn parse(tokens: Vec<(Token, usize)>, diagnostics: &mut Diagnostics) -> Program {
    let token_iter = tokens.into_iter().map(|(tok, line)| (line, tok, line));

    match grammar::ProgramParser::new().parse(token_iter) {
        Ok(program) => program,
        Err(e) => {
            let (lineno, message) = describe(e);
            diagnostics.error(ErrorKind::Syntax, lineno, message);
            Program::default()
        }
    }
}

fn describe<E>(error: lalrpop_util::ParseError<usize, Token, E>) -> (usize, String) {
    use lalrpop_util::ParseError;

    match error {
        ParseError::UnrecognizedToken { token: (line, tok, _), .. } => {
            (line, format!("unexpected token '{tok}'"))
        }
        ParseError::ExtraToken { token: (line, tok, _) } => {
            (line, format!("unexpected token '{tok}'"))
        }
        ParseError::UnrecognizedEof { location, .. } => (location, "unexpected end of file".to_string()),
        ParseError::InvalidToken { location } => (location, "invalid token".to_string()),
        ParseError::User { .. } => (0, "syntax error".to_string()),
    }
}
