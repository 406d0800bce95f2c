//! B-Minor compiler CLI

use std::path::{Path, PathBuf};

use clap::Parser;

use bminor::ast::dot;
use bminor::checker::Checker;
use bminor::error::{self, CompileError, Diagnostics};
use bminor::lexer::tokenize;
use bminor::parser::parse;

#[derive(Parser)]
#[command(name = "bminor", version, about = "Compiler for B-Minor programs")]
struct Cli {
    /// B-Minor program file to compile
    filename: Option<PathBuf>,

    /// Dump the token table
    #[arg(long, group = "mode")]
    scan: bool,

    /// Print the AST and write ast.dot
    #[arg(long, group = "mode")]
    dot: bool,

    /// Dump the symbol table
    #[arg(long, group = "mode")]
    sym: bool,

    /// Emit LLVM IR next to the source file
    #[arg(long, group = "mode")]
    ir: bool,

    /// Print diagnostics as JSON lines
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();

    if !(cli.scan || cli.dot || cli.sym || cli.ir) {
        eprintln!("Usage: bminor --scan|--dot|--sym|--ir <filename>");
        std::process::exit(1);
    }

    let Some(filename) = cli.filename else {
        eprintln!("Error: missing filename");
        std::process::exit(2);
    };

    let source = match std::fs::read_to_string(&filename) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("I/O error: {e}");
            std::process::exit(1);
        }
    };

    let ok = if cli.scan {
        scan(&source, cli.json)
    } else if cli.dot {
        dot_mode(&source, cli.json)
    } else if cli.sym {
        sym(&source, cli.json)
    } else {
        emit_ir(&filename, &source, cli.json)
    };

    if !ok {
        std::process::exit(1);
    }
}

fn report(diagnostics: &Diagnostics, json: bool) {
    if json {
        diagnostics.print_json();
    } else {
        diagnostics.print();
    }
}

/// `--scan`: token table, suppressed when the lexer reported errors
fn scan(source: &str, json: bool) -> bool {
    let mut diagnostics = Diagnostics::new();
    let tokens = tokenize(source, &mut diagnostics);

    if diagnostics.count() > 0 {
        report(&diagnostics, json);
        return false;
    }

    println!("{:<18} {:<28} {:>6}", "Type", "Value", "Line");
    for (token, line) in &tokens {
        println!("{:<18} {:<28} {:>6}", token.kind(), token.to_string(), line);
    }
    true
}

/// `--dot`: print the AST, write ast.dot
fn dot_mode(source: &str, json: bool) -> bool {
    let mut diagnostics = Diagnostics::new();
    let tokens = tokenize(source, &mut diagnostics);
    let program = parse(tokens, &mut diagnostics);

    if diagnostics.count() > 0 {
        report(&diagnostics, json);
        return false;
    }

    match serde_json::to_string_pretty(&program) {
        Ok(tree) => println!("{tree}"),
        Err(e) => eprintln!("Error: {e}"),
    }

    if let Err(e) = std::fs::write("ast.dot", dot::render(&program)) {
        eprintln!("I/O error: {e}");
        return false;
    }
    println!("\nThe AST graph was written to ./ast.dot");
    true
}

/// `--sym`: symbol table tree, after an error-free check
fn sym(source: &str, json: bool) -> bool {
    let mut diagnostics = Diagnostics::new();
    let tokens = tokenize(source, &mut diagnostics);
    let mut program = parse(tokens, &mut diagnostics);

    if diagnostics.count() > 0 {
        report(&diagnostics, json);
        return false;
    }

    let table = Checker::check(&mut program, &mut diagnostics);

    if diagnostics.count() > 0 {
        report(&diagnostics, json);
        return false;
    }

    println!("Symbol Tables:");
    print!("{table}");
    true
}

/// `--ir`: full pipeline, writing `<stem>.ll` next to the source
fn emit_ir(filename: &Path, source: &str, json: bool) -> bool {
    let mut diagnostics = Diagnostics::new();

    match bminor::compile(source, &mut diagnostics) {
        Ok(module) => {
            let out_path = filename.with_extension("ll");
            match std::fs::write(&out_path, module) {
                Ok(()) => {
                    println!("Wrote {}", out_path.display());
                    true
                }
                Err(e) => {
                    eprintln!("I/O error: {e}");
                    false
                }
            }
        }
        Err(CompileError::Diagnostics(_)) => {
            if json {
                diagnostics.print_json();
            } else {
                error::report(&filename.display().to_string(), source, &diagnostics);
            }
            false
        }
        Err(e) => {
            eprintln!("Error: {e}");
            false
        }
    }
}
