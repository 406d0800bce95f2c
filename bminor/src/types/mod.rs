//! Operator typing tables
//!
//! Static and monomorphic: a binary or unary operation either has a result
//! type or it is unsupported. No implicit conversions exist.

use crate::ast::{BinOp, Type, UnOp};

/// Result type of `left op right`, or `None` when the combination is
/// unsupported. The `BinOp::Assign` rows serve declaration initializers and
/// assignment statements.
pub fn check_binop(op: BinOp, left: Type, right: Type) -> Option<Type> {
    use BinOp::*;
    use Type::*;

    match (left, op, right) {
        // Integer operations
        (Integer, Add | Sub | Mul | Div | Mod, Integer) => Some(Integer),
        (Integer, Assign, Integer) => Some(Integer),
        (Integer, Lt | Le | Gt | Ge | Eq | Ne, Integer) => Some(Boolean),

        // Float operations
        (Float, Add | Sub | Mul | Div, Float) => Some(Float),
        (Float, Assign, Float) => Some(Float),
        (Float, Lt | Le | Gt | Ge | Eq | Ne, Float) => Some(Boolean),

        // Booleans
        (Boolean, And | Or | Eq | Ne, Boolean) => Some(Boolean),
        (Boolean, Assign, Boolean) => Some(Boolean),

        // Char: assignment, relationals and equality only
        (Char, Assign, Char) => Some(Char),
        (Char, Lt | Le | Gt | Ge | Eq | Ne, Char) => Some(Boolean),

        // Strings: `+` concatenates
        (String, Add, String) => Some(String),
        (String, Assign, String) => Some(String),
        (String, Lt | Le | Gt | Ge | Eq | Ne, String) => Some(Boolean),

        _ => None,
    }
}

/// Result type of a unary operation, or `None` when unsupported
pub fn check_unaryop(op: UnOp, operand: Type) -> Option<Type> {
    use Type::*;
    use UnOp::*;

    match (op, operand) {
        (Plus | Neg, Integer) => Some(Integer),
        (Inc | Dec, Integer) => Some(Integer),
        (Plus | Neg, Float) => Some(Float),
        (Not, Boolean) => Some(Boolean),
        _ => None,
    }
}
