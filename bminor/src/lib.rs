//! B-Minor compiler library
//!
//! The pipeline is linear: source text -> tokens -> AST -> annotated AST +
//! symbol tree -> LLVM IR. Every stage records its errors in a shared
//! [`Diagnostics`] accumulator and the later stages are gated on the count,
//! so an input with any error never produces an artifact.

pub mod ast;
pub mod checker;
pub mod codegen;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod symtab;
pub mod types;

pub use error::{CompileError, Diagnostics, ErrorKind, Result};

/// Run the full pipeline over `source`, producing LLVM IR module text.
///
/// Lexical and syntax errors stop the pipeline before checking; semantic
/// errors stop it before emission. In both cases the diagnostics carry the
/// details and `CompileError::Diagnostics` reports the count.
pub fn compile(source: &str, diagnostics: &mut Diagnostics) -> Result<String> {
    let tokens = lexer::tokenize(source, diagnostics);
    let mut program = parser::parse(tokens, diagnostics);

    if diagnostics.count() > 0 {
        return Err(CompileError::Diagnostics(diagnostics.count()));
    }

    checker::Checker::check(&mut program, diagnostics);

    if diagnostics.count() > 0 {
        return Err(CompileError::Diagnostics(diagnostics.count()));
    }

    Ok(codegen::CodeGen::new().generate(&program)?)
}
