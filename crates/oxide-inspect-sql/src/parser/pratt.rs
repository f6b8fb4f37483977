//! Pratt expression parser tables for MySQL operator precedence.

use crate::ast::{BinaryOp, UnaryOp};
use crate::lexer::{Keyword, TokenKind};

/// Binding power of `NOT` as a prefix operator.
///
/// `NOT a = b` parses as `NOT (a = b)` while `NOT a AND b` parses as
/// `(NOT a) AND b`.
pub const NOT_PREFIX_BP: u8 = 7;

/// Binding power of the predicate operators (`=`, `IS`, `IN`, `LIKE`, ...).
pub const PREDICATE_BP: (u8, u8) = (9, 10);

/// Binding power of unary `-`, `~` and `!`.
pub const UNARY_BP: u8 = 23;

/// Returns the prefix binding power for a unary operator token.
#[must_use]
pub const fn prefix_binding_power(kind: &TokenKind) -> Option<u8> {
    match kind {
        TokenKind::Minus | TokenKind::Plus | TokenKind::BitNot | TokenKind::Bang => {
            Some(UNARY_BP)
        }
        TokenKind::Keyword(Keyword::Not) => Some(NOT_PREFIX_BP),
        _ => None,
    }
}

/// Returns the infix binding power for a token.
///
/// Returns `(left_bp, right_bp)` where:
/// - Higher binding power = binds tighter
/// - Left associative: left_bp < right_bp
///
/// Returns `None` if the token is not an infix operator.
#[must_use]
pub const fn infix_binding_power(kind: &TokenKind) -> Option<(u8, u8)> {
    match kind {
        TokenKind::Keyword(Keyword::Or) | TokenKind::DoublePipe => Some((1, 2)),
        TokenKind::Keyword(Keyword::Xor) => Some((3, 4)),
        TokenKind::Keyword(Keyword::And) | TokenKind::DoubleAmpersand => Some((5, 6)),

        TokenKind::Eq
        | TokenKind::NullSafeEq
        | TokenKind::NotEq
        | TokenKind::Lt
        | TokenKind::LtEq
        | TokenKind::Gt
        | TokenKind::GtEq
        | TokenKind::Keyword(
            Keyword::Is
            | Keyword::In
            | Keyword::Between
            | Keyword::Like
            | Keyword::Regexp
            | Keyword::Not,
        ) => Some(PREDICATE_BP),

        TokenKind::BitOr => Some((11, 12)),
        TokenKind::BitAnd => Some((13, 14)),
        TokenKind::LeftShift | TokenKind::RightShift => Some((15, 16)),
        TokenKind::Plus | TokenKind::Minus => Some((17, 18)),
        TokenKind::Star
        | TokenKind::Slash
        | TokenKind::Percent
        | TokenKind::Keyword(Keyword::Div | Keyword::Mod) => Some((19, 20)),
        TokenKind::BitXor => Some((21, 22)),

        _ => None,
    }
}

/// Converts a token to a plain binary operator.
///
/// Predicates with their own shape (`IS`, `IN`, `BETWEEN`, `NOT ...`) are
/// handled by the parser and return `None` here.
#[must_use]
pub const fn token_to_binary_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Sub),
        TokenKind::Star => Some(BinaryOp::Mul),
        TokenKind::Slash => Some(BinaryOp::Div),
        TokenKind::Keyword(Keyword::Div) => Some(BinaryOp::IntDiv),
        TokenKind::Percent | TokenKind::Keyword(Keyword::Mod) => Some(BinaryOp::Mod),
        TokenKind::Eq => Some(BinaryOp::Eq),
        TokenKind::NullSafeEq => Some(BinaryOp::NullSafeEq),
        TokenKind::NotEq => Some(BinaryOp::NotEq),
        TokenKind::Lt => Some(BinaryOp::Lt),
        TokenKind::LtEq => Some(BinaryOp::LtEq),
        TokenKind::Gt => Some(BinaryOp::Gt),
        TokenKind::GtEq => Some(BinaryOp::GtEq),
        TokenKind::Keyword(Keyword::And) | TokenKind::DoubleAmpersand => Some(BinaryOp::And),
        TokenKind::Keyword(Keyword::Or) | TokenKind::DoublePipe => Some(BinaryOp::Or),
        TokenKind::Keyword(Keyword::Xor) => Some(BinaryOp::Xor),
        TokenKind::Keyword(Keyword::Like) => Some(BinaryOp::Like),
        TokenKind::Keyword(Keyword::Regexp) => Some(BinaryOp::Regexp),
        TokenKind::BitAnd => Some(BinaryOp::BitAnd),
        TokenKind::BitOr => Some(BinaryOp::BitOr),
        TokenKind::BitXor => Some(BinaryOp::BitXor),
        TokenKind::LeftShift => Some(BinaryOp::LeftShift),
        TokenKind::RightShift => Some(BinaryOp::RightShift),
        _ => None,
    }
}

/// Converts a token to a unary operator.
#[must_use]
pub const fn token_to_unary_op(kind: &TokenKind) -> Option<UnaryOp> {
    match kind {
        TokenKind::Minus => Some(UnaryOp::Neg),
        TokenKind::Keyword(Keyword::Not) | TokenKind::Bang => Some(UnaryOp::Not),
        TokenKind::BitNot => Some(UnaryOp::BitNot),
        _ => None,
    }
}
