//! Token definitions

use logos::Logos;

/// B-Minor token
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*[^/])*\*+/")]
pub enum Token {
    // Reserved words
    #[token("array")]
    Array,
    #[token("auto")]
    Auto,
    #[token("boolean")]
    Boolean,
    #[token("char")]
    Char,
    #[token("do")]
    Do,
    #[token("else")]
    Else,
    #[token("false")]
    False,
    #[token("float")]
    Float,
    #[token("for")]
    For,
    #[token("function")]
    Function,
    #[token("if")]
    If,
    #[token("integer")]
    Integer,
    #[token("print")]
    Print,
    #[token("return")]
    Return,
    #[token("string")]
    String,
    #[token("true")]
    True,
    #[token("void")]
    Void,
    #[token("while")]
    While,

    // Operators
    #[token("!")]
    Not,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token(">=")]
    Ge,
    #[token("==")]
    Eq,
    #[token("!=")]
    Ne,
    #[token("&&")]
    LAnd,
    #[token("||")]
    LOr,
    #[token("++")]
    Inc,
    #[token("--")]
    Dec,

    // Single-character literals
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("^")]
    Caret,
    #[token("=")]
    Assign,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,

    // An identifier may not start with a digit; the whole run is consumed
    // and reported as one lexical error.
    #[regex(r"[0-9]+[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string(), priority = 3)]
    InvalidIdent(String),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),

    #[regex(r"[0-9]*\.[0-9]+", |lex| lex.slice().parse::<f64>().ok(), priority = 3)]
    FloatLit(f64),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok(), priority = 2)]
    IntLit(i64),

    // Broad match; decoding rejects non-printable characters and bad escapes
    #[regex(r"'(\\([^'\n]|0x[^'\n][^'\n])|[^'\\\n])'", |lex| {
        let s = lex.slice();
        unescape_char(&s[1..s.len() - 1]).ok()
    })]
    CharLit(char),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        unescape_string(&s[1..s.len() - 1])
    })]
    StringLit(String),
}

/// Decode the body of a char literal to the represented scalar.
///
/// Accepted forms: one printable ASCII character (0x20-0x7E, quote and
/// backslash excluded by the lexer), a standard escape, or `\0xHH`.
pub(crate) fn unescape_char(inner: &str) -> Result<char, String> {
    let mut chars = inner.chars();

    match chars.next() {
        Some('\\') => {}
        Some(c) if chars.next().is_none() && (' '..='~').contains(&c) => return Ok(c),
        _ => return Err(format!("Invalid char literal: {inner}")),
    }

    let escape: String = chars.collect();
    match escape.as_str() {
        "a" => Ok('\x07'),
        "b" => Ok('\x08'),
        "e" => Ok('\x1b'),
        "f" => Ok('\x0c'),
        "n" => Ok('\n'),
        "r" => Ok('\r'),
        "t" => Ok('\t'),
        "v" => Ok('\x0b'),
        "\\" => Ok('\\'),
        "'" => Ok('\''),
        "\"" => Ok('"'),
        hex if hex.starts_with("0x") => {
            let digits = &hex[2..];
            if digits.len() == 2 {
                if let Ok(value) = u8::from_str_radix(digits, 16) {
                    return Ok(value as char);
                }
            }
            Err(format!("Invalid hex escape: {hex}"))
        }
        _ => Err(format!("Invalid char literal: {inner}")),
    }
}

/// Decode string escapes; unknown escapes keep the backslash.
fn unescape_string(inner: &str) -> String {
    let mut result = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('a') => result.push('\x07'),
                Some('b') => result.push('\x08'),
                Some('e') => result.push('\x1b'),
                Some('f') => result.push('\x0c'),
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('v') => result.push('\x0b'),
                Some('\\') => result.push('\\'),
                Some('\'') => result.push('\''),
                Some('"') => result.push('"'),
                Some('0') => result.push('\0'),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }
    result
}

impl Token {
    /// Token class name for the `--scan` table
    pub fn kind(&self) -> &'static str {
        match self {
            Token::Array => "ARRAY",
            Token::Auto => "AUTO",
            Token::Boolean => "BOOLEAN",
            Token::Char => "CHAR",
            Token::Do => "DO",
            Token::Else => "ELSE",
            Token::False => "FALSE",
            Token::Float => "FLOAT",
            Token::For => "FOR",
            Token::Function => "FUNCTION",
            Token::If => "IF",
            Token::Integer => "INTEGER",
            Token::Print => "PRINT",
            Token::Return => "RETURN",
            Token::String => "STRING",
            Token::True => "TRUE",
            Token::Void => "VOID",
            Token::While => "WHILE",
            Token::Not => "NOT",
            Token::Lt => "LT",
            Token::Le => "LE",
            Token::Gt => "GT",
            Token::Ge => "GE",
            Token::Eq => "EQ",
            Token::Ne => "NE",
            Token::LAnd => "LAND",
            Token::LOr => "LOR",
            Token::Inc => "INC",
            Token::Dec => "DEC",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Caret => "^",
            Token::Assign => "=",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Colon => ":",
            Token::Semi => ";",
            Token::Comma => ",",
            Token::InvalidIdent(_) => "INVALID",
            Token::Ident(_) => "ID",
            Token::FloatLit(_) => "FLOAT_LITERAL",
            Token::IntLit(_) => "INTEGER_LITERAL",
            Token::CharLit(_) => "CHAR_LITERAL",
            Token::StringLit(_) => "STRING_LITERAL",
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Array => write!(f, "array"),
            Token::Auto => write!(f, "auto"),
            Token::Boolean => write!(f, "boolean"),
            Token::Char => write!(f, "char"),
            Token::Do => write!(f, "do"),
            Token::Else => write!(f, "else"),
            Token::False => write!(f, "false"),
            Token::Float => write!(f, "float"),
            Token::For => write!(f, "for"),
            Token::Function => write!(f, "function"),
            Token::If => write!(f, "if"),
            Token::Integer => write!(f, "integer"),
            Token::Print => write!(f, "print"),
            Token::Return => write!(f, "return"),
            Token::String => write!(f, "string"),
            Token::True => write!(f, "true"),
            Token::Void => write!(f, "void"),
            Token::While => write!(f, "while"),
            Token::Not => write!(f, "!"),
            Token::Lt => write!(f, "<"),
            Token::Le => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::Ge => write!(f, ">="),
            Token::Eq => write!(f, "=="),
            Token::Ne => write!(f, "!="),
            Token::LAnd => write!(f, "&&"),
            Token::LOr => write!(f, "||"),
            Token::Inc => write!(f, "++"),
            Token::Dec => write!(f, "--"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Caret => write!(f, "^"),
            Token::Assign => write!(f, "="),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Colon => write!(f, ":"),
            Token::Semi => write!(f, ";"),
            Token::Comma => write!(f, ","),
            Token::InvalidIdent(s) => write!(f, "{s}"),
            Token::Ident(s) => write!(f, "{s}"),
            Token::FloatLit(n) => write!(f, "{n}"),
            Token::IntLit(n) => write!(f, "{n}"),
            Token::CharLit(c) => write!(f, "{c}"),
            Token::StringLit(s) => write!(f, "{s}"),
        }
    }
}
