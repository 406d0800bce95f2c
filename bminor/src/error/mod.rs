//! Error accumulation and reporting
//!
//! Every stage of the pipeline pushes `Diagnostic` records into a shared
//! `Diagnostics` accumulator and keeps going; downstream stages inspect the
//! count to decide whether they may emit artifacts.

use serde::Serialize;
use thiserror::Error;

use crate::codegen::CodeGenError;

/// Result type alias for the whole-pipeline entry points
pub type Result<T> = std::result::Result<T, CompileError>;

/// Error taxonomy used in user-visible messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    Lexical,
    Syntax,
    Semantic,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Lexical => write!(f, "Lexical"),
            ErrorKind::Syntax => write!(f, "Syntax"),
            ErrorKind::Semantic => write!(f, "Semantic"),
        }
    }
}

/// A single reported error
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub lineno: usize,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} Error at {}: {}", self.kind, self.lineno, self.message)
    }
}

/// Accumulator for errors raised across compilation stages
#[derive(Debug, Default)]
pub struct Diagnostics {
    diagnostics: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error; never aborts the current stage
    pub fn error(&mut self, kind: ErrorKind, lineno: usize, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            kind,
            lineno,
            message: message.into(),
        });
    }

    /// Number of errors detected so far
    pub fn count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Reset the accumulator; test suites rely on starting from zero
    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Canonical output: exactly one line per error
    pub fn print(&self) {
        for diagnostic in &self.diagnostics {
            eprintln!("{diagnostic}");
        }
    }

    /// Machine-readable output, one JSON object per error
    pub fn print_json(&self) {
        for diagnostic in &self.diagnostics {
            if let Ok(line) = serde_json::to_string(diagnostic) {
                println!("{line}");
            }
        }
    }
}

/// Report accumulated errors with ariadne source labels
pub fn report(filename: &str, source: &str, diagnostics: &Diagnostics) {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    for diagnostic in diagnostics.iter() {
        let span = line_span(source, diagnostic.lineno);

        Report::build(ReportKind::Error, (filename, span.clone()))
            .with_message(format!("{} error", diagnostic.kind))
            .with_label(
                Label::new((filename, span))
                    .with_message(&diagnostic.message)
                    .with_color(Color::Red),
            )
            .finish()
            .print((filename, Source::from(source)))
            .ok();
    }
}

/// Byte range of a 1-based source line, trailing newline excluded
fn line_span(source: &str, lineno: usize) -> std::ops::Range<usize> {
    let mut start = 0usize;
    let mut line = 1usize;

    for (offset, byte) in source.bytes().enumerate() {
        if line == lineno {
            start = offset;
            break;
        }
        if byte == b'\n' {
            line += 1;
            start = offset + 1;
        }
    }

    let end = source[start..]
        .find('\n')
        .map(|n| start + n)
        .unwrap_or(source.len());

    start..end.max(start)
}

/// Pipeline-level failure: either accumulated diagnostics or a lowering error
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("compilation failed with {0} error(s)")]
    Diagnostics(usize),

    #[error(transparent)]
    CodeGen(#[from] CodeGenError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display() {
        let diagnostic = Diagnostic {
            kind: ErrorKind::Semantic,
            lineno: 3,
            message: "'x' is not defined".to_string(),
        };
        assert_eq!(format!("{diagnostic}"), "Semantic Error at 3: 'x' is not defined");
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(format!("{}", ErrorKind::Lexical), "Lexical");
        assert_eq!(format!("{}", ErrorKind::Syntax), "Syntax");
        assert_eq!(format!("{}", ErrorKind::Semantic), "Semantic");
    }

    #[test]
    fn test_count_and_clear() {
        let mut diagnostics = Diagnostics::new();
        assert_eq!(diagnostics.count(), 0);

        diagnostics.error(ErrorKind::Lexical, 1, "Illegal character $");
        diagnostics.error(ErrorKind::Semantic, 2, "'y' is not defined");
        assert_eq!(diagnostics.count(), 2);
        assert!(!diagnostics.is_empty());

        diagnostics.clear();
        assert_eq!(diagnostics.count(), 0);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_errors_kept_in_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.error(ErrorKind::Lexical, 1, "first");
        diagnostics.error(ErrorKind::Syntax, 2, "second");

        let lines: Vec<usize> = diagnostics.iter().map(|d| d.lineno).collect();
        assert_eq!(lines, vec![1, 2]);
    }

    #[test]
    fn test_line_span_first_line() {
        let source = "abc\ndef\n";
        assert_eq!(line_span(source, 1), 0..3);
    }

    #[test]
    fn test_line_span_middle_line() {
        let source = "abc\ndef\nghi";
        assert_eq!(line_span(source, 2), 4..7);
        assert_eq!(line_span(source, 3), 8..11);
    }

    #[test]
    fn test_line_span_missing_newline() {
        let source = "abc";
        assert_eq!(line_span(source, 1), 0..3);
    }
}
