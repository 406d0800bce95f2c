//! Type tags
//!
//! The six primitive names are the single type representation used by the
//! lexer keywords, the checker, and the code generator. Array and function
//! shapes live on the declarations that introduce them.

use serde::{Deserialize, Serialize};

/// Primitive type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    Integer,
    Float,
    Boolean,
    Char,
    String,
    Void,
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Integer => write!(f, "integer"),
            Type::Float => write!(f, "float"),
            Type::Boolean => write!(f, "boolean"),
            Type::Char => write!(f, "char"),
            Type::String => write!(f, "string"),
            Type::Void => write!(f, "void"),
        }
    }
}
